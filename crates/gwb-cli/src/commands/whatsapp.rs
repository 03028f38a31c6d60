//! `gwb whatsapp-status` / `gwb whatsapp-guard`: WhatsApp DM access.
//!
//! - `whatsapp-status`: print the raw `channels.status` probe
//! - `whatsapp-guard`: restrict DMs to the linked owner, patching config if needed

use anyhow::Result;
use tracing::info;

use gwb_client::{ensure_owner_only, whatsapp_status_debug, BoundClient};

use super::print_json;

pub async fn run_status(gateway: &BoundClient) -> Result<()> {
    let status = whatsapp_status_debug(gateway).await;
    print_json(&status)?;
    match status.error {
        Some(error) if !status.ok => anyhow::bail!("status probe failed: {error}"),
        _ => Ok(()),
    }
}

pub async fn run_guard(gateway: &BoundClient, account: &str) -> Result<()> {
    let report = ensure_owner_only(gateway, account).await;
    print_json(&report)?;

    if !report.ok {
        let stage = report.stage.map_or("unknown stage", |s| s.as_str());
        anyhow::bail!(
            "guard failed at {stage}: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    if report.applied {
        info!(account = ?report.account_id, "owner-only policy applied");
    }
    Ok(())
}
