use crate::{
    Config,
    error::WeatherError,
    model::WeatherReport,
    provider::{
        ProviderId, WeatherProvider, open_meteo::OpenMeteoProvider,
        openweather::OpenWeatherProvider,
    },
};

/// Label reported when the secondary provider rescued a failed primary fetch.
pub const FALLBACK_LABEL: &str = "OpenWeatherMap (備援)";

/// One instance serves all requests; it holds no per-request state.
#[derive(Debug)]
pub struct WeatherService {
    primary: Box<dyn WeatherProvider>,
    /// Present only when a usable OpenWeatherMap key is configured.
    secondary: Option<Box<dyn WeatherProvider>>,
}

impl WeatherService {
    pub fn new(
        primary: Box<dyn WeatherProvider>,
        secondary: Option<Box<dyn WeatherProvider>>,
    ) -> Self {
        Self { primary, secondary }
    }

    pub fn from_config(config: &Config) -> Self {
        let secondary = config
            .openweather_key()
            .map(|key| Box::new(OpenWeatherProvider::new(key.to_string())) as Box<dyn WeatherProvider>);

        Self::new(Box::new(OpenMeteoProvider::new()), secondary)
    }

    /// Resolve one dashboard request.
    ///
    /// The default (`openmeteo`) path is the only one with fallback: a primary
    /// failure triggers exactly one secondary attempt when a credential is
    /// configured, and the secondary's own failure is logged while the
    /// original primary error is what the caller sees. Selecting
    /// `openweather` explicitly skips the primary path entirely.
    pub async fn get_weather(
        &self,
        city: &str,
        provider: ProviderId,
    ) -> Result<WeatherReport, WeatherError> {
        match provider {
            ProviderId::OpenMeteo => match self.primary.fetch(city).await {
                Ok(report) => Ok(report),
                Err(primary_err) => self.try_fallback(city, primary_err).await,
            },
            ProviderId::OpenWeather => match &self.secondary {
                Some(secondary) => secondary.fetch(city).await,
                None => Err(WeatherError::UpstreamUnavailable(
                    "OpenWeatherMap API key is not configured".to_string(),
                )),
            },
        }
    }

    async fn try_fallback(
        &self,
        city: &str,
        primary_err: WeatherError,
    ) -> Result<WeatherReport, WeatherError> {
        let Some(secondary) = &self.secondary else {
            return Err(primary_err);
        };

        log::warn!("primary provider failed for '{city}', trying fallback: {primary_err}");

        match secondary.fetch(city).await {
            Ok(mut report) => {
                report.api_used = FALLBACK_LABEL.to_string();
                Ok(report)
            }
            Err(secondary_err) => {
                log::error!("fallback provider also failed for '{city}': {secondary_err}");
                Err(primary_err)
            }
        }
    }
}
