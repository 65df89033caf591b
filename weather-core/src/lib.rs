//! Core library for the weather dashboard backend.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The two upstream provider clients and their normalization rules
//! - The fallback-orchestrating service
//! - Shared domain models (current conditions, forecast days)
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;

pub use config::Config;
pub use error::{GENERIC_USER_MESSAGE, WeatherError};
pub use model::{CurrentWeather, ForecastDay, GeoCandidate, WeatherReport};
pub use provider::{ProviderId, WeatherProvider};
pub use service::WeatherService;
