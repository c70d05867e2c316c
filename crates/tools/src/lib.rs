//! External data tools for Skycast.
//!
//! The live-data node reaches the outside world through these:
//! an OpenWeather HTTP client and the renderer that turns its reports (or
//! failures) into text the synthesizer can quote.

pub mod openweather;
pub mod weather_summary;

pub use openweather::OpenWeatherClient;
pub use weather_summary::{render_error, render_report};
