//! WhatsApp owner-only access guard.
//!
//! Once a WhatsApp account is linked, only the linked phone number may DM the
//! agent. The guard probes channel status, reads the gateway config and, when
//! the account's DM policy is anything other than an allowlist holding just
//! the owner, patches it in place.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::caller::RpcCaller;

/// Delay the gateway waits before restarting after the config patch.
pub const PATCH_RESTART_DELAY_MS: u64 = 1000;

/// Account id used when neither status nor the caller names one.
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// The RPC step a guard run failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardStage {
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "config.get")]
    ConfigGet,
    #[serde(rename = "config.patch")]
    ConfigPatch,
}

impl GuardStage {
    pub fn as_str(self) -> &'static str {
        match self {
            GuardStage::Status => "status",
            GuardStage::ConfigGet => "config.get",
            GuardStage::ConfigPatch => "config.patch",
        }
    }
}

/// Outcome of [`ensure_owner_only`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardReport {
    pub ok: bool,
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_e164: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<GuardStage>,
}

impl GuardReport {
    fn unchanged() -> Self {
        Self {
            ok: true,
            applied: false,
            owner_e164: None,
            account_id: None,
            error: None,
            stage: None,
        }
    }

    fn failed(stage: GuardStage, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            stage: Some(stage),
            ..Self::unchanged()
        }
    }
}

/// Raw `channels.status` probe result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDebug {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn probe_status<C: RpcCaller>(caller: &C) -> Result<Value, String> {
    caller
        .rpc("channels.status", json!({ "probe": true }))
        .await
        .map_err(|e| e.to_string())
}

/// Run the status probe alone, for diagnostics.
pub async fn whatsapp_status_debug<C: RpcCaller>(caller: &C) -> StatusDebug {
    match probe_status(caller).await {
        Ok(payload) => StatusDebug {
            ok: true,
            payload: Some(payload),
            error: None,
        },
        Err(error) => StatusDebug {
            ok: false,
            payload: None,
            error: Some(error),
        },
    }
}

fn e164_of(entry: &Value) -> Option<&str> {
    entry
        .pointer("/self/e164")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The linked owner number and, when it came from an account entry, that
/// entry's account id.
pub fn linked_owner(status: &Value) -> Option<(String, Option<String>)> {
    let accounts = status
        .pointer("/channelAccounts/whatsapp")
        .and_then(Value::as_array);
    if let Some(accounts) = accounts {
        for entry in accounts {
            if let Some(e164) = e164_of(entry) {
                let account_id = entry
                    .get("accountId")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                return Some((e164.to_string(), account_id));
            }
        }
    }

    status
        .pointer("/channels/whatsapp")
        .and_then(e164_of)
        .map(|e164| (e164.to_string(), None))
}

/// Account id precedence: matching entry, status default, caller fallback.
pub fn effective_account_id(status: &Value, from_entry: Option<String>, fallback: &str) -> String {
    from_entry
        .or_else(|| {
            status
                .pointer("/channelDefaultAccountId/whatsapp")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

fn policy_is_owner_only(section: Option<&Value>, owner: &str) -> bool {
    let Some(section) = section else {
        return false;
    };
    let policy_ok = section.get("dmPolicy").and_then(Value::as_str) == Some("allowlist");
    let allow_ok = match section.get("allowFrom").and_then(Value::as_array) {
        Some(list) => list.len() == 1 && list[0].as_str() == Some(owner),
        None => false,
    };
    policy_ok && allow_ok
}

/// Whether `config` already restricts `account_id` to the owner.
///
/// The `default` account also inherits channel-level settings, so either
/// location counts for it.
pub fn is_owner_only(config: &Value, account_id: &str, owner: &str) -> bool {
    let Some(whatsapp) = config.pointer("/channels/whatsapp") else {
        return false;
    };
    let account = whatsapp.get("accounts").and_then(|a| a.get(account_id));
    if policy_is_owner_only(account, owner) {
        return true;
    }
    account_id == DEFAULT_ACCOUNT_ID && policy_is_owner_only(Some(whatsapp), owner)
}

/// The merge-patch document restricting `account_id` to `owner`.
pub fn owner_only_patch(account_id: &str, owner: &str) -> Value {
    json!({
        "channels": {
            "whatsapp": {
                "accounts": {
                    account_id: {
                        "dmPolicy": "allowlist",
                        "allowFrom": [owner],
                    }
                }
            }
        }
    })
}

/// Ensure only the linked owner can DM the agent over WhatsApp.
///
/// No linked account is not an error. Every failure names the RPC step
/// it happened at.
pub async fn ensure_owner_only<C: RpcCaller>(caller: &C, fallback_account_id: &str) -> GuardReport {
    let status = match probe_status(caller).await {
        Ok(status) => status,
        Err(error) => {
            warn!(error = %error, "whatsapp guard: status probe failed");
            return GuardReport::failed(GuardStage::Status, error);
        }
    };

    let Some((owner, entry_account)) = linked_owner(&status) else {
        return GuardReport::unchanged();
    };
    let account_id = effective_account_id(&status, entry_account, fallback_account_id);

    let snapshot = match caller.rpc("config.get", json!({})).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "whatsapp guard: config.get failed");
            return GuardReport::failed(GuardStage::ConfigGet, e.to_string());
        }
    };
    let Some(base_hash) = snapshot.get("hash").and_then(Value::as_str).filter(|h| !h.is_empty()) else {
        warn!("whatsapp guard: config.get returned no hash");
        return GuardReport::failed(GuardStage::ConfigGet, "config hash missing");
    };
    let config = snapshot
        .get("config")
        .or_else(|| snapshot.get("parsed"))
        .unwrap_or(&Value::Null);

    if is_owner_only(config, &account_id, &owner) {
        return GuardReport {
            owner_e164: Some(owner),
            account_id: Some(account_id),
            ..GuardReport::unchanged()
        };
    }

    let raw = owner_only_patch(&account_id, &owner).to_string();
    let params = json!({
        "baseHash": base_hash,
        "raw": raw,
        "restartDelayMs": PATCH_RESTART_DELAY_MS,
    });
    if let Err(e) = caller.rpc("config.patch", params).await {
        warn!(error = %e, account = %account_id, "whatsapp guard: config.patch failed");
        return GuardReport::failed(GuardStage::ConfigPatch, e.to_string());
    }

    info!(account = %account_id, "whatsapp DMs restricted to linked owner");
    GuardReport {
        ok: true,
        applied: true,
        owner_e164: Some(owner),
        account_id: Some(account_id),
        error: None,
        stage: None,
    }
}
