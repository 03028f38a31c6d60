//! Slash-command parsing for `/config` and `/debug`.
//!
//! Both commands share the `set <path>=<value>` / `unset <path>` grammar and
//! differ only in their extra actions and usage text. Validation failures are
//! returned as [`ParsedCommand::Error`] so callers can echo the usage line.

use serde::Serialize;
use serde_json::Value;

/// Result of parsing a recognized slash command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParsedCommand {
    Show {
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Set {
        path: String,
        value: Value,
    },
    Unset {
        path: String,
    },
    Reset,
    Error {
        message: String,
    },
}

impl ParsedCommand {
    fn error(message: impl Into<String>) -> Self {
        ParsedCommand::Error {
            message: message.into(),
        }
    }
}

/// Static description of one slash command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Prefix including the slash, e.g. `/config`.
    pub prefix: &'static str,
    /// Handler for actions outside the shared `set`/`unset` grammar.
    /// `None` as the action means the command was given no arguments.
    pub extra: fn(action: Option<&str>, args: &str) -> Option<ParsedCommand>,
    pub usage: &'static str,
}

pub const CONFIG_COMMAND: CommandSpec = CommandSpec {
    prefix: "/config",
    extra: config_extra,
    usage: "Usage: /config show|set|unset",
};

pub const DEBUG_COMMAND: CommandSpec = CommandSpec {
    prefix: "/debug",
    extra: debug_extra,
    usage: "Usage: /debug show|set|unset|reset",
};

fn config_extra(action: Option<&str>, args: &str) -> Option<ParsedCommand> {
    match action {
        None => Some(ParsedCommand::Show { path: None }),
        Some("show") | Some("get") => {
            let path = args.trim();
            Some(ParsedCommand::Show {
                path: (!path.is_empty()).then(|| path.to_string()),
            })
        }
        _ => None,
    }
}

fn debug_extra(action: Option<&str>, _args: &str) -> Option<ParsedCommand> {
    match action {
        None | Some("show") => Some(ParsedCommand::Show { path: None }),
        Some("reset") => Some(ParsedCommand::Reset),
        _ => None,
    }
}

/// Parse `raw` against `spec`.
///
/// Returns `None` when the input is not this command at all, so the caller
/// can try the next parser.
pub fn parse_command(raw: &str, spec: &CommandSpec) -> Option<ParsedCommand> {
    let trimmed = raw.trim();
    let head_len = spec.prefix.len();
    let head = trimmed.get(..head_len)?;
    if !head.eq_ignore_ascii_case(spec.prefix) {
        return None;
    }
    let rest = &trimmed[head_len..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Some((spec.extra)(None, "").unwrap_or_else(|| ParsedCommand::error(spec.usage)));
    }

    let (action, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    let action = action.to_ascii_lowercase();

    if let Some(parsed) = parse_set_unset(spec.prefix, &action, args) {
        return Some(parsed);
    }
    Some((spec.extra)(Some(&action), args).unwrap_or_else(|| ParsedCommand::error(spec.usage)))
}

pub fn parse_config_command(raw: &str) -> Option<ParsedCommand> {
    parse_command(raw, &CONFIG_COMMAND)
}

pub fn parse_debug_command(raw: &str) -> Option<ParsedCommand> {
    parse_command(raw, &DEBUG_COMMAND)
}

/// Shared `set`/`unset` grammar. `None` for any other action.
fn parse_set_unset(prefix: &str, action: &str, args: &str) -> Option<ParsedCommand> {
    match action {
        "unset" => {
            let path = args.trim();
            if path.is_empty() {
                return Some(ParsedCommand::error(format!("Usage: {prefix} unset path")));
            }
            Some(ParsedCommand::Unset {
                path: path.to_string(),
            })
        }
        "set" => {
            let usage = format!("Usage: {prefix} set path=value");
            let eq = match args.find('=') {
                Some(idx) if idx > 0 => idx,
                _ => return Some(ParsedCommand::error(usage)),
            };
            let path = args[..eq].trim();
            if path.is_empty() {
                return Some(ParsedCommand::error(usage));
            }
            match parse_config_value(&args[eq + 1..]) {
                Ok(value) => Some(ParsedCommand::Set {
                    path: path.to_string(),
                    value,
                }),
                Err(message) => Some(ParsedCommand::error(message)),
            }
        }
        _ => None,
    }
}

/// Parse a command-line literal into a JSON value.
///
/// Objects and arrays must be valid JSON; `true`/`false`/`null` and numbers
/// map to their JSON types; `"..."` is a JSON string and `'...'` is taken
/// verbatim. Anything else is kept as a plain string.
pub fn parse_config_value(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Missing value.".to_string());
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| format!("Invalid JSON: {e}"));
    }

    match trimmed {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }

    if looks_numeric(trimmed) {
        if let Ok(n) = serde_json::from_str::<serde_json::Number>(trimmed.trim_start_matches('+')) {
            return Ok(Value::Number(n));
        }
    }

    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return serde_json::from_str::<String>(trimmed)
            .map(Value::String)
            .map_err(|e| format!("Invalid JSON string: {e}"));
    }

    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return Ok(Value::String(trimmed[1..trimmed.len() - 1].to_string()));
    }

    Ok(Value::String(trimmed.to_string()))
}

fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut parts = body.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next();
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}
