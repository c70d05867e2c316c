//! Human-readable rendering of a [`WeatherReport`].
//!
//! The layout is fixed so the synthesizer prompt always sees the same shape:
//! a titled block of `Label: value` lines, optional lines omitted entirely.

use chrono::{DateTime, FixedOffset, Utc};
use skycast_core::error::WeatherError;
use skycast_core::weather::WeatherReport;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Render a report as the multi-line summary handed to the synthesizer.
pub fn render_report(report: &WeatherReport) -> String {
    let mut lines = vec![
        format!("{} {} Weather", report.condition().marker(), report.name),
        RULE.to_string(),
        format!("Conditions: {}", capitalize(report.description())),
        format!(
            "Temperature: {:.1}°C (feels like {:.1}°C)",
            report.main.temp, report.main.feels_like
        ),
        format!("Humidity: {}%", report.main.humidity.round()),
        format!("Wind: {:.1} m/s", report.wind.speed),
        format!("Pressure: {} hPa", report.main.pressure.round()),
    ];

    if let Some(visibility) = report.visibility {
        lines.push(format!("Visibility: {:.1} km", visibility / 1000.0));
    }

    if let Some(sys) = &report.sys {
        let offset = report.timezone.unwrap_or(0);
        if let Some(time) = sys.sunrise.and_then(|t| local_clock(t, offset)) {
            lines.push(format!("Sunrise: {time}"));
        }
        if let Some(time) = sys.sunset.and_then(|t| local_clock(t, offset)) {
            lines.push(format!("Sunset: {time}"));
        }
    }

    lines.join("\n")
}

/// Render a provider failure the way the user should read it.
pub fn render_error(error: &WeatherError) -> String {
    format!("{} {error}", error.marker())
}

/// `HH:MM` at the location, given epoch seconds and a UTC offset in seconds.
fn local_clock(epoch_secs: i64, offset_secs: i32) -> Option<String> {
    let utc = DateTime::<Utc>::from_timestamp(epoch_secs, 0)?;
    let offset = FixedOffset::east_opt(offset_secs)?;
    Some(utc.with_timezone(&offset).format("%H:%M").to_string())
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
