use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{
        CurrentWeather, FORECAST_DAYS, ForecastDay, GeoCandidate, TemperatureRange, WeatherReport,
        weekday_label,
    },
    provider::{http_client, truncate_body},
};

use super::WeatherProvider;

pub const API_LABEL: &str = "Open-Meteo";

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,surface_pressure,\
                              wind_speed_10m,wind_direction_10m,visibility,weather_code";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,weather_code";

/// Keyless primary provider: geocodes the query, then fetches a combined
/// current + 5-day payload for the best candidate's coordinates.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self { http: http_client() }
    }

    /// Up to 5 geocoding candidates, most populous first.
    async fn geocode(&self, city: &str) -> Result<Vec<GeoCandidate>, WeatherError> {
        let res = self
            .http
            .get(GEOCODING_URL)
            .query(&[("name", city), ("count", "5"), ("language", "en"), ("format", "json")])
            .send()
            .await
            .map_err(|e| WeatherError::GeocodingUnavailable(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::GeocodingUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::GeocodingUnavailable(format!(
                "status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: GeocodingResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::GeocodingUnavailable(format!("invalid JSON: {e}")))?;

        let candidates = parsed.results.unwrap_or_default();
        if candidates.is_empty() {
            return Err(WeatherError::NotFound(city.to_string()));
        }

        Ok(rank_candidates(candidates))
    }

    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<OmForecast, WeatherError> {
        let res = self
            .http
            .get(FORECAST_URL)
            .query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("current", CURRENT_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("daily", DAILY_FIELDS),
                ("timezone", "auto"),
                ("forecast_days", "5"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::UpstreamUnavailable(format!(
                "Open-Meteo forecast failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::UpstreamUnavailable(format!("invalid JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let candidates = self.geocode(city).await?;

        // Candidates are tried strictly in rank order so the most populous
        // match with usable weather data wins.
        let mut selected = None;
        for candidate in candidates {
            match self.fetch_forecast(candidate.latitude, candidate.longitude).await {
                Ok(raw) => {
                    selected = Some((candidate, raw));
                    break;
                }
                Err(err) => {
                    log::debug!("candidate '{}' has no weather data: {err}", candidate.name);
                }
            }
        }

        let (candidate, raw) =
            selected.ok_or_else(|| WeatherError::NoWeatherData(city.to_string()))?;

        // Display name is the city only; the country is dropped.
        build_report(candidate.name, &raw)
    }
}

/// Sort by population, descending. The sort is stable: candidates without a
/// population count as 0 and equally-populous candidates keep the provider's
/// original ranking.
fn rank_candidates(mut candidates: Vec<GeoCandidate>) -> Vec<GeoCandidate> {
    candidates.sort_by(|a, b| b.population.unwrap_or(0).cmp(&a.population.unwrap_or(0)));
    candidates
}

fn build_report(location: String, raw: &OmForecast) -> Result<WeatherReport, WeatherError> {
    let current = &raw.current;
    let (description, icon) = condition(current.weather_code);

    let temperature = current.temperature_2m.round() as i32;
    let current = CurrentWeather {
        location,
        temperature,
        // Open-Meteo has no feels-like field.
        feels_like: temperature,
        humidity: current.relative_humidity_2m.round() as u8,
        pressure: current.surface_pressure.round() as i32,
        wind_speed: kmh(current.wind_speed_10m),
        wind_direction: current.wind_direction_10m.round() as u16 % 360,
        visibility: (current.visibility / 1000.0).round() as i32,
        uv_index: 0,
        description: description.to_string(),
        icon: icon.to_string(),
        timestamp: Utc::now().timestamp_millis(),
    };

    let mut forecast = Vec::with_capacity(FORECAST_DAYS);
    for i in 0..FORECAST_DAYS {
        let date = raw
            .daily
            .time
            .get(i)
            .ok_or_else(|| malformed("daily.time"))?
            .clone();
        let parsed_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| malformed("daily.time"))?;

        let min = *raw.daily.temperature_2m_min.get(i).ok_or_else(|| malformed("daily min"))?;
        let max = *raw.daily.temperature_2m_max.get(i).ok_or_else(|| malformed("daily max"))?;
        let code = *raw.daily.weather_code.get(i).ok_or_else(|| malformed("daily code"))?;

        // Hour 0 of each calendar day, not a daily mean.
        let sample = i * 24;
        let humidity = *raw
            .hourly
            .relative_humidity_2m
            .get(sample)
            .ok_or_else(|| malformed("hourly humidity"))?;
        let wind = *raw
            .hourly
            .wind_speed_10m
            .get(sample)
            .ok_or_else(|| malformed("hourly wind"))?;

        let precipitation = raw.daily.precipitation_sum.get(i).copied().flatten().unwrap_or(0.0);

        let (description, icon) = condition(code);
        forecast.push(ForecastDay {
            day: weekday_label(parsed_date).to_string(),
            date,
            temperature: TemperatureRange {
                min: min.round() as i32,
                max: max.round() as i32,
            },
            description: description.to_string(),
            icon: icon.to_string(),
            humidity: humidity.round() as u8,
            wind_speed: kmh(wind),
            precipitation,
        });
    }

    Ok(WeatherReport { current, forecast, api_used: API_LABEL.to_string() })
}

fn kmh(speed: f64) -> i32 {
    (speed * 3.6).round() as i32
}

fn malformed(field: &str) -> WeatherError {
    WeatherError::MalformedPayload(format!("Open-Meteo payload missing {field}"))
}

/// WMO weather code → (zh-TW description, icon key). Total over all known
/// codes, with a fixed default for anything unmapped.
fn condition(code: u32) -> (&'static str, &'static str) {
    match code {
        0 => ("晴朗", "01d"),
        1 => ("大部分晴朗", "02d"),
        2 => ("部分多雲", "03d"),
        3 => ("多雲", "04d"),
        45 => ("霧", "50d"),
        48 => ("霜霧", "50d"),
        51 => ("小雨", "10d"),
        53 => ("中雨", "10d"),
        55 => ("大雨", "10d"),
        61 | 80 => ("小雨", "09d"),
        63 | 81 => ("中雨", "09d"),
        65 | 82 => ("大雨", "09d"),
        71 | 85 => ("小雪", "13d"),
        73 => ("中雪", "13d"),
        75 | 86 => ("大雪", "13d"),
        77 => ("雪粒", "13d"),
        95 => ("雷雨", "11d"),
        96 => ("雷雨伴冰雹", "11d"),
        99 => ("強雷雨伴冰雹", "11d"),
        _ => ("未知", "01d"),
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeoCandidate>>,
}

#[derive(Debug, Deserialize)]
struct OmForecast {
    current: OmCurrent,
    hourly: OmHourly,
    daily: OmDaily,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    surface_pressure: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
    visibility: f64,
    weather_code: u32,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    relative_humidity_2m: Vec<f64>,
    wind_speed_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_sum: Vec<Option<f64>>,
    weather_code: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, population: Option<u64>) -> GeoCandidate {
        GeoCandidate {
            name: name.to_string(),
            country: Some("Testland".to_string()),
            latitude: 25.0,
            longitude: 121.5,
            population,
        }
    }

    fn sample_forecast() -> OmForecast {
        let mut humidity = vec![50.0; 120];
        let mut wind = vec![1.0; 120];
        for (day, (h, w)) in
            [(55.0, 2.0), (60.0, 2.5), (65.0, 3.0), (70.0, 3.5), (75.2, 4.0)].iter().enumerate()
        {
            humidity[day * 24] = *h;
            wind[day * 24] = *w;
        }

        OmForecast {
            current: OmCurrent {
                temperature_2m: 19.6,
                relative_humidity_2m: 64.0,
                surface_pressure: 1013.4,
                wind_speed_10m: 2.8,
                wind_direction_10m: 123.6,
                visibility: 9800.0,
                weather_code: 0,
            },
            hourly: OmHourly { relative_humidity_2m: humidity, wind_speed_10m: wind },
            daily: OmDaily {
                time: vec![
                    "2026-08-24".to_string(),
                    "2026-08-25".to_string(),
                    "2026-08-26".to_string(),
                    "2026-08-27".to_string(),
                    "2026-08-28".to_string(),
                ],
                temperature_2m_max: vec![30.4, 31.0, 29.6, 28.2, 27.9],
                temperature_2m_min: vec![22.5, 23.1, 21.8, 20.4, 19.9],
                precipitation_sum: vec![Some(1.2), None, Some(0.0), Some(5.5), None],
                weather_code: vec![0, 3, 61, 95, 1],
            },
        }
    }

    #[test]
    fn candidates_rank_by_population_descending() {
        let ranked = rank_candidates(vec![
            candidate("small", Some(10)),
            candidate("big", Some(500)),
            candidate("mid", Some(200)),
        ]);

        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["big", "mid", "small"]);
    }

    #[test]
    fn equally_populous_candidates_keep_provider_order() {
        let ranked = rank_candidates(vec![
            candidate("first", Some(100)),
            candidate("second", Some(100)),
            candidate("unknown", None),
            candidate("third", Some(100)),
        ]);

        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third", "unknown"]);
    }

    #[test]
    fn clear_sky_code_maps_to_fixed_pair() {
        assert_eq!(condition(0), ("晴朗", "01d"));
        assert_eq!(condition(95), ("雷雨", "11d"));
        assert_eq!(condition(48), ("霜霧", "50d"));
    }

    #[test]
    fn unmapped_code_falls_back_to_unknown() {
        assert_eq!(condition(42), ("未知", "01d"));
        assert_eq!(condition(9999), ("未知", "01d"));
    }

    #[test]
    fn current_conditions_are_rounded_into_target_units() {
        let report = build_report("Taipei".to_string(), &sample_forecast()).unwrap();
        let current = report.current;

        assert_eq!(current.location, "Taipei");
        assert_eq!(current.temperature, 20);
        assert_eq!(current.feels_like, current.temperature);
        assert_eq!(current.humidity, 64);
        assert_eq!(current.pressure, 1013);
        // 2.8 * 3.6 = 10.08 → 10
        assert_eq!(current.wind_speed, 10);
        assert_eq!(current.wind_direction, 124);
        // 9800 m → 9.8 km → 10
        assert_eq!(current.visibility, 10);
        assert_eq!(current.uv_index, 0);
        assert_eq!(current.description, "晴朗");
        assert_eq!(current.icon, "01d");
    }

    #[test]
    fn forecast_has_five_days_sampled_at_hour_zero() {
        let report = build_report("Taipei".to_string(), &sample_forecast()).unwrap();
        assert_eq!(report.api_used, API_LABEL);
        assert_eq!(report.forecast.len(), 5);

        let first = &report.forecast[0];
        assert_eq!(first.date, "2026-08-24");
        assert_eq!(first.day, "星期一");
        assert_eq!(first.temperature, TemperatureRange { min: 23, max: 30 });
        assert_eq!(first.humidity, 55);
        // 2.0 * 3.6 = 7.2 → 7
        assert_eq!(first.wind_speed, 7);
        assert_eq!(first.precipitation, 1.2);

        // Day 4 samples hourly index 96, not an average of the day.
        let last = &report.forecast[4];
        assert_eq!(last.humidity, 75);
        assert_eq!(last.day, "星期五");
    }

    #[test]
    fn missing_precipitation_normalizes_to_zero() {
        let report = build_report("Taipei".to_string(), &sample_forecast()).unwrap();
        assert_eq!(report.forecast[1].precipitation, 0.0);
        assert_eq!(report.forecast[4].precipitation, 0.0);
    }

    #[test]
    fn truncated_daily_series_is_rejected() {
        let mut raw = sample_forecast();
        raw.daily.time.truncate(3);

        let err = build_report("Taipei".to_string(), &raw).unwrap_err();
        assert!(matches!(err, WeatherError::MalformedPayload(_)));
    }

    #[test]
    fn short_hourly_series_is_rejected() {
        let mut raw = sample_forecast();
        raw.hourly.relative_humidity_2m.truncate(50);

        let err = build_report("Taipei".to_string(), &raw).unwrap_err();
        assert!(matches!(err, WeatherError::MalformedPayload(_)));
    }
}
