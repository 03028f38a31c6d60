//! CLI subcommand implementations.

pub mod call;
pub mod command;
pub mod duration;
pub mod history;
pub mod sanitize;
pub mod whatsapp;

use anyhow::{Context, Result};
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}
