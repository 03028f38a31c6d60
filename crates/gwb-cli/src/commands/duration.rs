//! `gwb duration <value>`: parse a human duration.

use anyhow::{Context, Result};
use serde_json::json;

use gwb_core::{format_duration_ms, parse_duration_ms, DurationOptions, DurationUnit};

use super::print_json;

pub fn run(value: &str, default_unit: &str) -> Result<()> {
    let default_unit: DurationUnit = default_unit
        .parse()
        .with_context(|| format!("invalid --default-unit '{default_unit}'"))?;
    let ms = parse_duration_ms(value, DurationOptions { default_unit })?;
    print_json(&json!({ "ms": ms, "formatted": format_duration_ms(ms) }))
}
