//! Envelope sanitizing for chat message text.
//!
//! Upstream message assembly wraps user text with routing headers, system
//! event lines and context markers. These are stripped before the text is
//! shown to a user or replayed as clean context.
//!
//! One pass applies [`RULES`] in order. A pass can uncover another wrapper
//! (a thread-starter block followed by a thread-history block, say), so
//! [`sanitize_text`] repeats passes until the text is stable. Every rule
//! either leaves its input alone or returns a strictly shorter string, which
//! bounds the loop and makes the result a fixed point.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const THREAD_STARTER_MARKER: &str = "[Thread starter - for context]";
const THREAD_HISTORY_MARKER: &str = "[Thread history - for context]";
const HISTORY_CONTEXT_MARKER: &str = "[Chat messages since your last reply - for context]";
const CURRENT_MESSAGE_MARKER: &str = "[Current message - respond to this]";

/// Channel labels that open an envelope header, e.g. `[WhatsApp +1555… ]`.
const ENVELOPE_CHANNELS: &[&str] = &[
    "WebChat",
    "WhatsApp",
    "Telegram",
    "Signal",
    "Slack",
    "Discord",
    "Google Chat",
    "iMessage",
    "Teams",
    "Matrix",
    "Zalo",
    "Zalo Personal",
    "BlueBubbles",
];

static ENVELOPE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\s*").expect("envelope pattern compiles"));

static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}Z\b").expect("timestamp pattern compiles")
});

static PLAIN_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}\b").expect("timestamp pattern compiles")
});

static MESSAGE_ID_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\[message_id:\s*[^\]]+\]\s*$").expect("message id pattern compiles")
});

static SYSTEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^System: \[[^\]]+\] .*$").expect("system line pattern compiles")
});

/// A single rewrite step. `apply` returns `None` when the rule does not fire.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<String>,
}

/// Rewrite steps of one sanitizing pass, in application order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "envelope",
        apply: strip_envelope,
    },
    Rule {
        name: "message-id-hints",
        apply: strip_message_id_hints,
    },
    Rule {
        name: "system-block",
        apply: strip_system_block,
    },
    Rule {
        name: "context-marker",
        apply: strip_context_marker,
    },
];

fn looks_like_envelope_header(header: &str) -> bool {
    if ISO_TIMESTAMP.is_match(header) || PLAIN_TIMESTAMP.is_match(header) {
        return true;
    }
    ENVELOPE_CHANNELS
        .iter()
        .any(|label| header.strip_prefix(label).is_some_and(|rest| rest.starts_with(' ')))
}

/// Strip a leading `[<channel> <from> <timestamp>] ` routing header.
pub fn strip_envelope(text: &str) -> Option<String> {
    let caps = ENVELOPE_PREFIX.captures(text)?;
    if !looks_like_envelope_header(&caps[1]) {
        return None;
    }
    let rest = &text[caps[0].len()..];
    non_empty(rest)
}

/// Drop whole `[message_id: …]` lines.
pub fn strip_message_id_hints(text: &str) -> Option<String> {
    if !text.to_ascii_lowercase().contains("[message_id:") {
        return None;
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let kept: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| !MESSAGE_ID_LINE.is_match(line.trim_end_matches('\r')))
        .collect();
    if kept.len() == lines.len() {
        return None;
    }
    non_empty(&kept.join("\n"))
}

/// Strip a leading run of `System: [tag] …` lines and the blank lines after it.
pub fn strip_system_block(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let system_lines = lines
        .iter()
        .take_while(|line| SYSTEM_LINE.is_match(line.trim_end_matches('\r')))
        .count();
    if system_lines == 0 {
        return None;
    }
    let blank_lines = lines[system_lines..]
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();
    non_empty(&lines[system_lines + blank_lines..].join("\n"))
}

/// Strip one structural context marker.
///
/// The three "for context" markers only count at the very start and must be
/// followed by a newline. The current-message marker may appear anywhere;
/// everything through its last occurrence is dropped.
pub fn strip_context_marker(text: &str) -> Option<String> {
    for marker in [
        THREAD_STARTER_MARKER,
        THREAD_HISTORY_MARKER,
        HISTORY_CONTEXT_MARKER,
    ] {
        if let Some(rest) = text.strip_prefix(marker) {
            if rest.starts_with('\n') || rest.starts_with("\r\n") {
                return non_empty(rest.trim_start());
            }
        }
    }

    let idx = text.rfind(CURRENT_MESSAGE_MARKER)?;
    non_empty(text[idx + CURRENT_MESSAGE_MARKER.len()..].trim_start())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn sanitize_pass(text: &str) -> Option<String> {
    let mut current: Cow<'_, str> = Cow::Borrowed(text);
    let mut changed = false;
    for rule in RULES {
        if let Some(next) = (rule.apply)(&current) {
            if next != current.as_ref() {
                tracing::trace!(rule = rule.name, "sanitize rule fired");
                current = Cow::Owned(next);
                changed = true;
            }
        }
    }
    changed.then(|| current.into_owned())
}

/// Remove every wrapper from `text`. Borrowed when nothing was stripped.
pub fn sanitize_text(text: &str) -> Cow<'_, str> {
    let mut current: Cow<'_, str> = Cow::Borrowed(text);
    while let Some(next) = sanitize_pass(&current) {
        current = Cow::Owned(next);
    }
    current
}

/// Sanitize a chat message in the gateway's `{role, content}` shape.
///
/// Only `user` messages are touched. String content is rewritten directly;
/// array content has its `text` blocks rewritten and every other block kept
/// as-is. Returns `None` when the message needs no change.
pub fn sanitize_message(message: &Value) -> Option<Value> {
    if message.get("role").and_then(Value::as_str) != Some("user") {
        return None;
    }

    match message.get("content")? {
        Value::String(text) => match sanitize_text(text) {
            Cow::Borrowed(_) => None,
            Cow::Owned(clean) => {
                let mut out = message.clone();
                out["content"] = Value::String(clean);
                Some(out)
            }
        },
        Value::Array(blocks) => {
            let mut changed = false;
            let rewritten: Vec<Value> = blocks
                .iter()
                .map(|block| match sanitize_text_block(block) {
                    Some(clean) => {
                        changed = true;
                        clean
                    }
                    None => block.clone(),
                })
                .collect();
            if !changed {
                return None;
            }
            let mut out = message.clone();
            out["content"] = Value::Array(rewritten);
            Some(out)
        }
        _ => None,
    }
}

fn sanitize_text_block(block: &Value) -> Option<Value> {
    if block.get("type").and_then(Value::as_str) != Some("text") {
        return None;
    }
    let text = block.get("text").and_then(Value::as_str)?;
    match sanitize_text(text) {
        Cow::Borrowed(_) => None,
        Cow::Owned(clean) => {
            let mut out = block.clone();
            out["text"] = Value::String(clean);
            Some(out)
        }
    }
}

/// Sanitize a list of messages.
///
/// Returns `Cow::Borrowed` of the very same slice when no message changed,
/// so callers can detect a no-op by pointer identity.
pub fn sanitize_messages(messages: &[Value]) -> Cow<'_, [Value]> {
    let mut rewritten: Option<Vec<Value>> = None;
    for (i, message) in messages.iter().enumerate() {
        if let Some(clean) = sanitize_message(message) {
            rewritten.get_or_insert_with(|| messages.to_vec())[i] = clean;
        }
    }
    match rewritten {
        Some(v) => Cow::Owned(v),
        None => Cow::Borrowed(messages),
    }
}
