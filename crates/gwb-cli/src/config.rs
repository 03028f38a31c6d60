//! Client configuration at `~/.gwb/config.toml`.
//!
//! Holds the default gateway endpoint and an optional local override.
//! Environment variables override the file; CLI flags override both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use gwb_client::{GatewayOverride, InstanceRecord};
use gwb_client::client::DEFAULT_TIMEOUT;

pub const ENV_OVERRIDE_URL: &str = "GWB_GATEWAY_OVERRIDE_URL";
pub const ENV_OVERRIDE_TOKEN: &str = "GWB_GATEWAY_OVERRIDE_TOKEN";
pub const ENV_OVERRIDE_INSTANCE_ID: &str = "GWB_GATEWAY_OVERRIDE_INSTANCE_ID";

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Default gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Local endpoint that replaces the instance gateway.
    #[serde(default, rename = "override")]
    pub override_: GatewayOverride,
}

/// Default gateway settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Instance the gateway belongs to; scopes the override.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    /// Full gateway URL (`http`, `https`, `ws` or `wss`).
    #[serde(default)]
    pub url: Option<String>,

    /// Host to use with `port` when no URL is set.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub token: Option<String>,

    /// Overall per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            instance_id: default_instance_id(),
            url: None,
            host: None,
            port: None,
            token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_instance_id() -> String {
    "local".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Overlay the override settings from the environment.
    ///
    /// Takes a lookup function so tests do not touch the process env.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_OVERRIDE_URL) {
            self.override_.url = Some(url);
        }
        if let Some(token) = get(ENV_OVERRIDE_TOKEN) {
            self.override_.token = Some(token);
        }
        if let Some(id) = get(ENV_OVERRIDE_INSTANCE_ID) {
            self.override_.instance_id = Some(id);
        }
    }

    /// The configured gateway as an instance record.
    pub fn instance(&self) -> InstanceRecord {
        InstanceRecord {
            id: self.gateway.instance_id.clone(),
            gateway_url: self.gateway.url.clone(),
            host: self.gateway.host.clone(),
            gateway_port: self.gateway.port,
            gateway_token: self.gateway.token.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.gateway.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwb_client::resolve_target;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.gateway.instance_id, "local");
        assert_eq!(cfg.gateway.timeout_ms, 30_000);
        assert!(cfg.gateway.url.is_none());
        assert_eq!(cfg.override_, GatewayOverride::default());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[gateway]
instance_id = "inst-9"
host = "198.51.100.4"
token = "gw-secret"
timeout_ms = 5000

[override]
url = "http://127.0.0.1:18789"
instance_id = "inst-9"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.gateway.instance_id, "inst-9");
        assert_eq!(cfg.gateway.token.as_deref(), Some("gw-secret"));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.override_.url.as_deref(), Some("http://127.0.0.1:18789"));

        let target = resolve_target(&cfg.instance(), &cfg.override_).unwrap();
        assert_eq!(target.url, "http://127.0.0.1:18789");
        assert_eq!(target.token, "gw-secret");
    }

    #[test]
    fn parse_partial_toml_config() {
        let toml_str = r#"
[gateway]
host = "example.com"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.gateway.host.as_deref(), Some("example.com"));
        assert_eq!(cfg.gateway.timeout_ms, 30_000); // default
        assert_eq!(cfg.gateway.instance_id, "local"); // default
    }

    #[test]
    fn env_overrides_file() {
        let mut cfg = Config::default();
        cfg.override_.url = Some("http://file:1".into());
        cfg.apply_env(|key| match key {
            ENV_OVERRIDE_URL => Some("http://env:2".into()),
            ENV_OVERRIDE_TOKEN => Some("  ".into()),
            _ => None,
        });
        assert_eq!(cfg.override_.url.as_deref(), Some("http://env:2"));
        assert!(cfg.override_.token.is_none());
        assert!(cfg.override_.instance_id.is_none());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert!(cfg.gateway.token.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[gateway\nurl = ").unwrap();
        assert!(Config::load(path.to_str().unwrap()).is_err());
    }
}
