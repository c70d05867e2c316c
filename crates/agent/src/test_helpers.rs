//! Shared test doubles for the orchestration tests.

use async_trait::async_trait;
use skycast_core::error::{MemoryError, ProviderError, WeatherError};
use skycast_core::message::Message;
use skycast_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use skycast_core::retrieval::{DocumentChunk, ScoredPassage, VectorIndex};
use skycast_core::weather::{ConditionEntry, Readings, SunTimes, WeatherProvider, WeatherReport, Wind};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` pops the next reply. Panics if more calls are
/// made than replies provided. Every request is recorded for inspection.
pub struct SequentialMockProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Only successful text replies, in order.
    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The user-visible text of the `n`th request (all messages joined).
    pub fn prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn outage() -> ProviderError {
    ProviderError::Network("connection refused".into())
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => panic!("SequentialMockProvider: no more replies (call #{})", self.call_count()),
        };
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A vector index with fixed search results (or a fixed failure).
pub struct CannedIndex {
    results: Result<Vec<ScoredPassage>, String>,
    pub added: Mutex<Vec<DocumentChunk>>,
}

impl CannedIndex {
    pub fn with(results: Vec<ScoredPassage>) -> Self {
        Self {
            results: Ok(results),
            added: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with(Vec::new())
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            results: Err(reason.to_string()),
            added: Mutex::new(Vec::new()),
        }
    }
}

pub fn passage(content: &str, score: f32) -> ScoredPassage {
    ScoredPassage {
        content: content.to_string(),
        source: Some("handbook.md".into()),
        chunk_id: Some(0),
        score,
    }
}

#[async_trait]
impl VectorIndex for CannedIndex {
    fn name(&self) -> &str {
        "canned"
    }

    async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<usize, MemoryError> {
        let n = chunks.len();
        self.added.lock().unwrap().extend(chunks);
        Ok(n)
    }

    async fn search(&self, _query: &str, k: usize) -> Result<Vec<ScoredPassage>, MemoryError> {
        match &self.results {
            Ok(results) => Ok(results.iter().take(k).cloned().collect()),
            Err(reason) => Err(MemoryError::QueryFailed(reason.clone())),
        }
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.added.lock().unwrap().len())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.added.lock().unwrap().clear();
        Ok(())
    }
}

/// A weather provider with one canned outcome. Records requested cities.
pub struct CannedWeather {
    outcome: Result<WeatherReport, WeatherError>,
    pub cities: Mutex<Vec<String>>,
}

impl CannedWeather {
    pub fn ok(report: WeatherReport) -> Self {
        Self {
            outcome: Ok(report),
            cities: Mutex::new(Vec::new()),
        }
    }

    pub fn err(error: WeatherError) -> Self {
        Self {
            outcome: Err(error),
            cities: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.cities.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for CannedWeather {
    fn name(&self) -> &str {
        "canned"
    }

    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        self.cities.lock().unwrap().push(city.to_string());
        match &self.outcome {
            Ok(report) => Ok(report.clone()),
            Err(WeatherError::UnknownLocation(_)) => Err(WeatherError::UnknownLocation(city.to_string())),
            Err(e) => Err(e.clone()),
        }
    }
}

pub fn istanbul_report() -> WeatherReport {
    WeatherReport {
        name: "Istanbul".into(),
        weather: vec![ConditionEntry {
            main: "Rain".into(),
            description: "light rain".into(),
        }],
        main: Readings {
            temp: 14.2,
            feels_like: 13.1,
            humidity: 81.0,
            pressure: 1009.0,
        },
        wind: Wind { speed: 5.7 },
        visibility: Some(8000.0),
        sys: Some(SunTimes {
            sunrise: Some(1_700_000_000),
            sunset: Some(1_700_036_000),
        }),
        timezone: Some(10_800),
    }
}
