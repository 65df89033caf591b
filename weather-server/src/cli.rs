use clap::Parser;
use weather_core::{Config, WeatherService};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather dashboard API server")]
pub struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "WEATHER_SERVER_ADDRESS", default_value = "127.0.0.1:3000")]
    pub address: std::net::SocketAddr,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?.with_env_overrides();
        if !config.is_openweather_configured() {
            log::info!("no OpenWeatherMap key configured, fallback provider disabled");
        }

        let service = WeatherService::from_config(&config);
        crate::server::run(self.address, service).await;

        Ok(())
    }
}
