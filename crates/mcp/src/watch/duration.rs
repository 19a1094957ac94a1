//! Compact elapsed-time strings and Go-style duration parsing.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

/// Format a span as `45s`, `5m30s` or `2h15m45s`.
///
/// Components are truncated, never rounded, and never zero padded.
pub fn format_duration(span: Duration) -> String {
    let total_seconds = span.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if total_seconds < 60 {
        format!("{seconds}s")
    } else if total_seconds < 3600 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{hours}h{minutes}m{seconds}s")
    }
}

/// Format a configured timeout the way Go prints durations.
///
/// Whole-second spans match [`format_duration`]; fractional spans keep their
/// precision (`1.5s`, `250ms`, `1m30.5s`).
pub fn format_timeout(span: Duration) -> String {
    let seconds = span.as_secs();
    let nanos = u64::from(span.subsec_nanos());
    if seconds == 0 {
        return match nanos {
            0 => "0s".to_string(),
            1..=999 => format!("{nanos}ns"),
            1_000..=999_999 => format!("{}µs", decimal(nanos, 1_000, 3)),
            _ => format!("{}ms", decimal(nanos, 1_000_000, 6)),
        };
    }

    let fractional_seconds = decimal((seconds % 60) * 1_000_000_000 + nanos, 1_000_000_000, 9);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if seconds < 60 {
        format!("{fractional_seconds}s")
    } else if seconds < 3600 {
        format!("{minutes}m{fractional_seconds}s")
    } else {
        format!("{hours}h{minutes}m{fractional_seconds}s")
    }
}

fn decimal(value: u64, scale: u64, width: usize) -> String {
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Same as [`format_duration`] for a signed span; negative spans clamp to `0s`.
pub fn format_time_delta(delta: chrono::TimeDelta) -> String {
    format_duration(delta.to_std().unwrap_or_default())
}

static DURATION_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$").expect("valid duration regex"));
static DURATION_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("valid duration regex"));

/// Longest span a timeout may request, matching Go's `time.Duration` range.
pub const MAX_TIMEOUT: Duration = Duration::new(9_223_372_036, 854_775_807);

/// Reason a duration string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("expected a duration such as \"90s\", \"5m\" or \"1h30m\"")]
    Malformed,
    #[error("duration must be greater than zero")]
    NotPositive,
    #[error("duration exceeds the maximum of 2562047h47m16.854775807s")]
    TooLarge,
}

/// Parse a Go-style duration string (`300ms`, `1.5h`, `2h45m`) into a strictly positive span.
pub fn parse_positive_duration(raw: &str) -> Result<Duration, DurationParseError> {
    let raw = raw.trim();
    if raw == "0" || raw == "+0" || raw == "-0" {
        return Err(DurationParseError::NotPositive);
    }
    if !DURATION_SHAPE.is_match(raw) {
        return Err(DurationParseError::Malformed);
    }

    let mut total_seconds = 0f64;
    for component in DURATION_COMPONENT.captures_iter(raw) {
        let value: f64 = component[1].parse().map_err(|_| DurationParseError::Malformed)?;
        let unit_seconds = match &component[2] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(DurationParseError::Malformed),
        };
        total_seconds += value * unit_seconds;
    }

    if raw.starts_with('-') || total_seconds <= 0.0 {
        return Err(DurationParseError::NotPositive);
    }
    if total_seconds > MAX_TIMEOUT.as_secs_f64() {
        return Err(DurationParseError::TooLarge);
    }
    let span = Duration::try_from_secs_f64(total_seconds).map_err(|_| DurationParseError::Malformed)?;
    Ok(span.min(MAX_TIMEOUT))
}
