//! `gwb sanitize [TEXT|-]`: strip envelope wrappers from chat text.

use std::borrow::Cow;
use std::io::Read;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use gwb_core::{sanitize_messages, sanitize_text};

use super::print_json;

/// Sanitize `text`, or stdin when it is `-` or absent.
///
/// With `messages`, the input is a JSON array of `{role, content}` chat
/// messages and only user messages are rewritten.
pub fn run(text: Option<&str>, messages: bool) -> Result<()> {
    let input = match text {
        Some(t) if t != "-" => t.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    if messages {
        let parsed: Vec<Value> =
            serde_json::from_str(&input).context("--messages input is not a JSON array")?;
        let cleaned = sanitize_messages(&parsed);
        let changed = matches!(cleaned, Cow::Owned(_));
        return print_json(&json!({ "changed": changed, "messages": cleaned }));
    }

    let cleaned = sanitize_text(&input);
    let changed = matches!(cleaned, Cow::Owned(_));
    print_json(&json!({ "changed": changed, "text": cleaned }))
}
