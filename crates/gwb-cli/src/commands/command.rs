//! `gwb command <input>`: parse a `/config` or `/debug` slash command.

use anyhow::Result;

use gwb_core::{parse_config_command, parse_debug_command};

use super::print_json;

/// Print the parsed command, or `null` when the input is not one.
pub fn run(input: &str) -> Result<()> {
    let parsed = parse_config_command(input).or_else(|| parse_debug_command(input));
    print_json(&parsed)
}
