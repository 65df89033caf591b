use serde::{Deserialize, Serialize};
use std::convert::{Infallible, TryFrom};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use weather_core::{
    GENERIC_USER_MESSAGE, ProviderId, WeatherError, WeatherReport, WeatherService,
};

const DEFAULT_CITY: &str = "Taipei";

#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    city: Option<String>,
    api: Option<String>,
}

#[derive(Serialize)]
struct ErrorMessage {
    message: String,
}

pub async fn run(address: std::net::SocketAddr, service: WeatherService) {
    let service = Arc::new(service);

    let weather_route = warp::path!("api" / "weather")
        .and(warp::get())
        .and(warp::query::<WeatherQuery>())
        .and(with_service(service))
        .and_then(weather);

    log::info!("listening on {address}");
    warp::serve(weather_route).run(address).await
}

fn with_service(
    service: Arc<WeatherService>,
) -> impl Filter<Extract = (Arc<WeatherService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

async fn weather(
    query: WeatherQuery,
    service: Arc<WeatherService>,
) -> Result<impl Reply, Infallible> {
    match respond(query, &service).await {
        Ok(report) => {
            Ok(warp::reply::with_status(warp::reply::json(&report), StatusCode::OK))
        }
        Err(err) => {
            // The cause stays in the log; the client gets one generic message.
            log::error!("weather request failed: {err}");

            let body = ErrorMessage { message: GENERIC_USER_MESSAGE.to_string() };
            Ok(warp::reply::with_status(
                warp::reply::json(&body),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn respond(
    query: WeatherQuery,
    service: &WeatherService,
) -> Result<WeatherReport, WeatherError> {
    let (city, provider) = resolve(&query)?;
    service.get_weather(&city, provider).await
}

/// Apply the documented query defaults: `city=Taipei`, `api=openmeteo`.
fn resolve(query: &WeatherQuery) -> Result<(String, ProviderId), WeatherError> {
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .unwrap_or(DEFAULT_CITY)
        .to_string();

    let provider = match query.api.as_deref() {
        Some(api) => ProviderId::try_from(api)?,
        None => ProviderId::default(),
    };

    Ok((city, provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameters_use_the_documented_defaults() {
        let (city, provider) = resolve(&WeatherQuery::default()).unwrap();
        assert_eq!(city, "Taipei");
        assert_eq!(provider, ProviderId::OpenMeteo);
    }

    #[test]
    fn blank_city_falls_back_to_default() {
        let query = WeatherQuery { city: Some("   ".to_string()), api: None };
        let (city, _) = resolve(&query).unwrap();
        assert_eq!(city, "Taipei");
    }

    #[test]
    fn explicit_parameters_are_honored() {
        let query = WeatherQuery {
            city: Some("Kaohsiung".to_string()),
            api: Some("openweather".to_string()),
        };
        let (city, provider) = resolve(&query).unwrap();
        assert_eq!(city, "Kaohsiung");
        assert_eq!(provider, ProviderId::OpenWeather);
    }

    #[test]
    fn unknown_api_selector_is_rejected() {
        let query = WeatherQuery { city: None, api: Some("acmeweather".to_string()) };
        let err = resolve(&query).unwrap_err();
        assert!(matches!(err, WeatherError::UnsupportedProvider(_)));
    }
}
