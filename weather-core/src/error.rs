use thiserror::Error;

/// Generic message returned to the dashboard for any failure; the original
/// cause only appears in the server log.
pub const GENERIC_USER_MESSAGE: &str = "無法獲取天氣資料，請稍後再試";

/// Failures of the acquisition pipeline.
///
/// Every variant is collapsed into [`GENERIC_USER_MESSAGE`] at the request
/// handler boundary; the variants exist so the fallback policy and the logs
/// can tell the stages apart.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Geocoding endpoint unreachable or non-success status.
    #[error("geocoding service unavailable: {0}")]
    GeocodingUnavailable(String),

    /// Geocoding answered with zero candidates for the query.
    #[error("no location found for '{0}'")]
    NotFound(String),

    /// Every geocoding candidate was tried and none yielded weather data.
    #[error("no weather data available for '{0}'")]
    NoWeatherData(String),

    /// Provider unreachable, non-success status, or unparseable body.
    #[error("upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Body parsed but lacks the series the normalizer needs.
    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),

    /// Unrecognized `api` selector value.
    #[error("unsupported provider '{0}'")]
    UnsupportedProvider(String),
}
