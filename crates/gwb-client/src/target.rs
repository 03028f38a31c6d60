//! Gateway target resolution.
//!
//! A managed instance declares its own gateway address and token. A local
//! override (typically a developer's tunnel to a gateway on their machine)
//! takes precedence when configured, optionally scoped to one instance id.
//! The resolver is pure: all inputs arrive as values.

use serde::{Deserialize, Serialize};

use gwb_core::error::{GwbError, GwbResult};

/// Port gateways listen on when the instance does not say otherwise.
pub const DEFAULT_GATEWAY_PORT: u16 = 18789;

/// Resolved connection endpoint for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTarget {
    pub url: String,
    pub token: String,
}

/// Local override of the gateway endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// When set, the override applies only to this instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl GatewayOverride {
    /// Whether the override is active for `instance_id`.
    pub fn applies_to(&self, instance_id: &str) -> bool {
        let has_url = self.url.as_deref().is_some_and(|u| !u.trim().is_empty());
        has_url
            && self
                .instance_id
                .as_deref()
                .map_or(true, |scope| scope.trim().is_empty() || scope == instance_id)
    }
}

/// The gateway-related columns of a managed instance row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    /// Full gateway URL, when the instance stores one.
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// Public host or IP, used with `gateway_port` when no URL is stored.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub gateway_port: Option<u16>,
    #[serde(default)]
    pub gateway_token: Option<String>,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Pick the endpoint and credential for `instance`.
pub fn resolve_target(instance: &InstanceRecord, over: &GatewayOverride) -> GwbResult<GatewayTarget> {
    let instance_token = non_blank(instance.gateway_token.as_deref());

    if over.applies_to(&instance.id) {
        let url = non_blank(over.url.as_deref()).unwrap_or_default();
        let token = non_blank(over.token.as_deref())
            .or(instance_token)
            .ok_or_else(|| GwbError::InvalidTarget(format!("no gateway token for instance {}", instance.id)))?;
        tracing::debug!(instance = %instance.id, url = %url, "using gateway override");
        return Ok(GatewayTarget {
            url: url.to_string(),
            token: token.to_string(),
        });
    }

    let url = match non_blank(instance.gateway_url.as_deref()) {
        Some(url) => url.to_string(),
        None => {
            let host = non_blank(instance.host.as_deref()).ok_or_else(|| {
                GwbError::InvalidTarget(format!("instance {} has no gateway address", instance.id))
            })?;
            let port = instance.gateway_port.unwrap_or(DEFAULT_GATEWAY_PORT);
            format!("http://{host}:{port}")
        }
    };
    let token = instance_token
        .ok_or_else(|| GwbError::InvalidTarget(format!("no gateway token for instance {}", instance.id)))?;

    Ok(GatewayTarget {
        url,
        token: token.to_string(),
    })
}
