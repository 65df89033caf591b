use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Days covered by a successful forecast, always exactly this many entries.
pub const FORECAST_DAYS: usize = 5;

/// Current conditions, normalized to the shared units: °C, km/h, km, hPa.
///
/// Serialized field names follow the dashboard's JSON contract (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    /// City name only; the country of the matched location is dropped.
    pub location: String,
    pub temperature: i32,
    /// Equals `temperature` when the provider has no feels-like field.
    pub feels_like: i32,
    pub humidity: u8,
    pub pressure: i32,
    pub wind_speed: i32,
    /// Degrees, 0–359.
    pub wind_direction: u16,
    pub visibility: i32,
    /// 0 when the provider does not report a UV index.
    pub uv_index: u8,
    pub description: String,
    pub icon: String,
    /// Observation time, epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: i32,
    pub max: i32,
}

/// One day of the forecast window, oldest first in the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// ISO calendar date, e.g. "2026-08-27".
    pub date: String,
    /// Localized weekday label derived from `date`.
    pub day: String,
    pub temperature: TemperatureRange,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    pub wind_speed: i32,
    /// Millimetres; 0 when the provider omits the field.
    pub precipitation: f64,
}

/// The complete answer to one dashboard request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
    /// Display label of the provider that actually answered.
    pub api_used: String,
}

/// A geocoding match, held only while candidates are being tried.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoCandidate {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub population: Option<u64>,
}

/// zh-TW long-form weekday label for a calendar date.
pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "星期一",
        Weekday::Tue => "星期二",
        Weekday::Wed => "星期三",
        Weekday::Thu => "星期四",
        Weekday::Fri => "星期五",
        Weekday::Sat => "星期六",
        Weekday::Sun => "星期日",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> WeatherReport {
        WeatherReport {
            current: CurrentWeather {
                location: "Taipei".to_string(),
                temperature: 28,
                feels_like: 30,
                humidity: 70,
                pressure: 1008,
                wind_speed: 12,
                wind_direction: 90,
                visibility: 10,
                uv_index: 0,
                description: "晴朗".to_string(),
                icon: "01d".to_string(),
                timestamp: 1_756_000_000_000,
            },
            forecast: vec![],
            api_used: "Open-Meteo".to_string(),
        }
    }

    #[test]
    fn weekday_labels_cover_the_week() {
        // 2026-08-27 is a Thursday.
        let thursday = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        assert_eq!(weekday_label(thursday), "星期四");

        let sunday = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(weekday_label(sunday), "星期日");
    }

    #[test]
    fn report_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(sample_report()).expect("report must serialize");

        assert!(json.get("apiUsed").is_some());
        let current = json.get("current").expect("current must be present");
        assert!(current.get("feelsLike").is_some());
        assert!(current.get("windSpeed").is_some());
        assert!(current.get("windDirection").is_some());
        assert!(current.get("uvIndex").is_some());
    }

    #[test]
    fn forecast_day_serializes_with_camel_case_keys() {
        let day = ForecastDay {
            date: "2026-08-27".to_string(),
            day: "星期四".to_string(),
            temperature: TemperatureRange { min: 24, max: 31 },
            description: "多雲".to_string(),
            icon: "04d".to_string(),
            humidity: 65,
            wind_speed: 8,
            precipitation: 0.0,
        };

        let json = serde_json::to_value(day).expect("day must serialize");
        assert!(json.get("windSpeed").is_some());
        assert_eq!(json.get("precipitation"), Some(&serde_json::json!(0.0)));
    }
}
