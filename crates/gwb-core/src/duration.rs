//! Human-readable durations (`500ms`, `1.5s`, `10m`, `2h`) to milliseconds.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GwbError, GwbResult};

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)(ms|s|m|h)?$").expect("duration pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Millis,
    Seconds,
    Minutes,
    Hours,
}

impl DurationUnit {
    pub fn multiplier(self) -> u64 {
        match self {
            DurationUnit::Millis => 1,
            DurationUnit::Seconds => 1_000,
            DurationUnit::Minutes => 60_000,
            DurationUnit::Hours => 3_600_000,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DurationUnit::Millis => "ms",
            DurationUnit::Seconds => "s",
            DurationUnit::Minutes => "m",
            DurationUnit::Hours => "h",
        }
    }
}

impl FromStr for DurationUnit {
    type Err = GwbError;

    fn from_str(s: &str) -> GwbResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ms" => Ok(DurationUnit::Millis),
            "s" => Ok(DurationUnit::Seconds),
            "m" => Ok(DurationUnit::Minutes),
            "h" => Ok(DurationUnit::Hours),
            other => Err(GwbError::InvalidDuration(format!("unknown unit: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DurationOptions {
    /// Unit applied when the input is a bare number.
    pub default_unit: DurationUnit,
}

impl Default for DurationOptions {
    fn default() -> Self {
        Self {
            default_unit: DurationUnit::Millis,
        }
    }
}

/// Parse a duration string into whole milliseconds.
///
/// Fractional results round to the nearest millisecond.
pub fn parse_duration_ms(raw: &str, opts: DurationOptions) -> GwbResult<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GwbError::InvalidDuration("empty duration".into()));
    }

    let caps = DURATION_RE
        .captures(trimmed)
        .ok_or_else(|| GwbError::InvalidDuration(raw.to_string()))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| GwbError::InvalidDuration(raw.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(GwbError::InvalidDuration(raw.to_string()));
    }

    let unit = match caps.get(2) {
        Some(m) => m.as_str().parse()?,
        None => opts.default_unit,
    };

    let ms = (value * unit.multiplier() as f64).round();
    if !ms.is_finite() || ms >= u64::MAX as f64 {
        return Err(GwbError::InvalidDuration(raw.to_string()));
    }
    Ok(ms as u64)
}

/// Render milliseconds using the largest unit that divides them exactly.
pub fn format_duration_ms(ms: u64) -> String {
    let unit = [
        DurationUnit::Hours,
        DurationUnit::Minutes,
        DurationUnit::Seconds,
    ]
    .into_iter()
    .find(|u| ms != 0 && ms % u.multiplier() == 0)
    .unwrap_or(DurationUnit::Millis);
    format!("{}{}", ms / unit.multiplier(), unit.suffix())
}
