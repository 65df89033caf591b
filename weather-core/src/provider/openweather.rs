use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{
        CurrentWeather, FORECAST_DAYS, ForecastDay, TemperatureRange, WeatherReport, weekday_label,
    },
    provider::{http_client, truncate_body},
};

use super::WeatherProvider;

pub const API_LABEL: &str = "OpenWeatherMap";

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// The 3-hourly forecast list is sampled once per day: every 8th entry.
const ENTRIES_PER_DAY: usize = 8;

const UNKNOWN_CONDITION: (&str, &str) = ("未知", "01d");

/// Credentialed secondary provider. Accepts place names directly, so no
/// geocoding step is involved.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: http_client() }
    }

    async fn fetch_current(&self, city: &str) -> Result<OwCurrentResponse, WeatherError> {
        let body = self.get(CURRENT_URL, city, "current").await?;

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::UpstreamUnavailable(format!("invalid OpenWeatherMap current JSON: {e}"))
        })
    }

    async fn fetch_forecast(&self, city: &str) -> Result<OwForecastResponse, WeatherError> {
        let body = self.get(FORECAST_URL, city, "forecast").await?;

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::UpstreamUnavailable(format!("invalid OpenWeatherMap forecast JSON: {e}"))
        })
    }

    async fn get(&self, url: &str, city: &str, what: &str) -> Result<String, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "zh_tw"),
            ])
            .send()
            .await
            .map_err(|e| {
                WeatherError::UpstreamUnavailable(format!(
                    "OpenWeatherMap {what} request failed: {e}"
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::UpstreamUnavailable(format!(
                "failed to read OpenWeatherMap {what} body: {e}"
            ))
        })?;

        if !status.is_success() {
            return Err(WeatherError::UpstreamUnavailable(format!(
                "OpenWeatherMap {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let current = self.fetch_current(city).await?;
        let forecast = self.fetch_forecast(city).await?;

        Ok(WeatherReport {
            current: build_current(&current),
            forecast: build_forecast(&forecast)?,
            api_used: API_LABEL.to_string(),
        })
    }
}

fn build_current(raw: &OwCurrentResponse) -> CurrentWeather {
    let (description, icon) = raw
        .weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| (UNKNOWN_CONDITION.0.to_string(), UNKNOWN_CONDITION.1.to_string()));

    CurrentWeather {
        location: raw.name.clone(),
        temperature: raw.main.temp.round() as i32,
        feels_like: raw.main.feels_like.round() as i32,
        humidity: raw.main.humidity,
        pressure: raw.main.pressure.round() as i32,
        // m/s → km/h
        wind_speed: (raw.wind.speed * 3.6).round() as i32,
        wind_direction: raw.wind.deg.round() as u16 % 360,
        // metres → km
        visibility: (raw.visibility / 1000.0).round() as i32,
        uv_index: 0,
        description,
        icon,
        timestamp: raw.dt * 1000,
    }
}

fn build_forecast(raw: &OwForecastResponse) -> Result<Vec<ForecastDay>, WeatherError> {
    let days: Vec<ForecastDay> = raw
        .list
        .iter()
        .step_by(ENTRIES_PER_DAY)
        .take(FORECAST_DAYS)
        .map(|entry| {
            let when = DateTime::<Utc>::from_timestamp(entry.dt, 0)
                .ok_or_else(|| malformed("entry timestamp"))?;
            let date = when.date_naive();

            let (description, icon) = entry
                .weather
                .first()
                .map(|w| (w.description.clone(), w.icon.clone()))
                .unwrap_or_else(|| {
                    (UNKNOWN_CONDITION.0.to_string(), UNKNOWN_CONDITION.1.to_string())
                });

            Ok(ForecastDay {
                date: date.format("%Y-%m-%d").to_string(),
                day: weekday_label(date).to_string(),
                temperature: TemperatureRange {
                    min: entry.main.temp_min.round() as i32,
                    max: entry.main.temp_max.round() as i32,
                },
                description,
                icon,
                humidity: entry.main.humidity,
                wind_speed: (entry.wind.speed * 3.6).round() as i32,
                precipitation: entry.rain.as_ref().and_then(|r| r.three_hours).unwrap_or(0.0),
            })
        })
        .collect::<Result<_, WeatherError>>()?;

    if days.len() != FORECAST_DAYS {
        return Err(malformed("forecast list"));
    }

    Ok(days)
}

fn malformed(field: &str) -> WeatherError {
    WeatherError::MalformedPayload(format!("OpenWeatherMap payload missing {field}"))
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwCurrentMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
    visibility: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
    #[serde(default)]
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}
