//! Weather provider trait and the current-conditions payload.
//!
//! The payload mirrors the OpenWeather "current weather" document. Only the
//! fields the live-data summary needs are modelled; everything optional in
//! the feed is optional here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::WeatherError;

/// Current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Resolved location name
    pub name: String,

    #[serde(default)]
    pub weather: Vec<ConditionEntry>,

    pub main: Readings,

    #[serde(default)]
    pub wind: Wind,

    /// Visibility in metres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys: Option<SunTimes>,

    /// Offset from UTC in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Category, e.g. "Rain"
    pub main: String,
    /// Free text, e.g. "light rain"
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

/// Epoch seconds, UTC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

impl WeatherReport {
    /// Category of the primary condition.
    pub fn condition(&self) -> WeatherCondition {
        self.weather
            .first()
            .map(|w| WeatherCondition::from_category(&w.main))
            .unwrap_or(WeatherCondition::Other)
    }

    /// Free-text description of the primary condition.
    pub fn description(&self) -> &str {
        self.weather.first().map(|w| w.description.as_str()).unwrap_or("")
    }
}

/// Weather condition categories that have a dedicated marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Clear,
    Clouds,
    /// Mist, haze, dust, tornado and anything the feed adds later
    Other,
}

impl WeatherCondition {
    pub fn from_category(category: &str) -> Self {
        match category.trim().to_ascii_lowercase().as_str() {
            "thunderstorm" => Self::Thunderstorm,
            "drizzle" => Self::Drizzle,
            "rain" => Self::Rain,
            "snow" => Self::Snow,
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            _ => Self::Other,
        }
    }

    /// Decorative marker shown in front of the summary title.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Thunderstorm => "⛈️",
            Self::Drizzle => "🌦️",
            Self::Rain => "🌧️",
            Self::Snow => "❄️",
            Self::Clear => "☀️",
            Self::Clouds => "☁️",
            Self::Other => "🌍",
        }
    }
}

/// The core WeatherProvider trait.
///
/// Implementations: OpenWeather over HTTP. Tests use canned reports.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Current conditions for `city`. No automatic retry.
    async fn current(&self, city: &str) -> std::result::Result<WeatherReport, WeatherError>;
}
