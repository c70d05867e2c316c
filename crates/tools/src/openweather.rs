//! OpenWeather current-conditions client.
//!
//! `GET {base}/weather?q=<city>&appid=<key>&units=metric&lang=<lang>`.
//! No automatic retry: a 429 is reported to the caller as is.

use async_trait::async_trait;
use skycast_config::WeatherConfig;
use skycast_core::error::WeatherError;
use skycast_core::weather::{WeatherProvider, WeatherReport};
use std::time::Duration;
use tracing::{debug, warn};

/// Temperatures in °C, wind in m/s.
const UNITS: &str = "metric";

/// Longest error body kept in a diagnostic.
const MAX_ERROR_BODY: usize = 200;

pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    lang: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        lang: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            lang: lang.into(),
            client,
        })
    }

    /// Build from the `[weather]` config section.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let api_key = config.api_key.clone().ok_or(WeatherError::InvalidCredential)?;
        Self::new(
            config.base_url.clone(),
            api_key,
            config.lang.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    fn name(&self) -> &str {
        "openweather"
    }

    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        debug!(city, lang = %self.lang, "Requesting current weather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherError::Timeout
                } else {
                    WeatherError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            401 => return Err(WeatherError::InvalidCredential),
            404 => return Err(WeatherError::UnknownLocation(city.to_string())),
            429 => return Err(WeatherError::RateLimited),
            _ => {
                let body: String = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect();
                warn!(status, city, "Weather provider returned error");
                return Err(WeatherError::Http { status, body });
            }
        }

        response.json::<WeatherReport>().await.map_err(|e| {
            if e.is_timeout() {
                WeatherError::Timeout
            } else {
                WeatherError::Decode(e.to_string())
            }
        })
    }
}
