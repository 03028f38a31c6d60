//! gwb: gateway bridge CLI.
//!
//! Calls RPC methods on an agent gateway, reads chat history, enforces the
//! WhatsApp owner-only DM policy, and exposes the offline text utilities
//! (envelope sanitizing, slash-command parsing, durations).

mod commands;
mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use gwb_client::{resolve_target, BoundClient, CallOptions, GatewayClient, GatewayTarget};
use gwb_core::{parse_duration_ms, DurationOptions};

/// gwb: gateway bridge
#[derive(Parser)]
#[command(name = "gwb", version, about = "Gateway bridge: RPC calls, chat history and access guard for agent gateways")]
struct Cli {
    /// Gateway URL (http, https, ws or wss); bypasses config and override
    #[arg(long, global = true)]
    url: Option<String>,

    /// Gateway token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Instance id used to scope the gateway override
    #[arg(long = "instance", global = true)]
    instance: Option<String>,

    /// Overall call timeout, e.g. 30s, 1500ms or 2m (bare numbers are ms)
    #[arg(long, global = true)]
    timeout: Option<String>,

    /// Config file path
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Call a gateway RPC method and print the reply
    Call {
        /// Method name, e.g. channels.status
        method: String,
        /// Params as a JSON value
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Print a user's chat history
    History {
        /// User id the session belongs to
        user: String,
        /// Agent id
        #[arg(long)]
        agent: Option<String>,
        /// Maximum number of messages (1-1000)
        #[arg(long)]
        limit: Option<u32>,
        /// Skip envelope sanitizing
        #[arg(long)]
        raw: bool,
    },

    /// Probe WhatsApp channel status
    WhatsappStatus,

    /// Restrict WhatsApp DMs to the linked owner number
    WhatsappGuard {
        /// Account id to use when status names none
        #[arg(long, default_value = gwb_client::whatsapp::DEFAULT_ACCOUNT_ID)]
        account: String,
    },

    /// Strip envelope wrappers from text (reads stdin for `-` or no argument)
    Sanitize {
        text: Option<String>,
        /// Treat input as a JSON array of chat messages
        #[arg(long)]
        messages: bool,
    },

    /// Parse a /config or /debug slash command
    Command {
        input: String,
    },

    /// Parse a human duration into milliseconds
    Duration {
        value: String,
        /// Unit for bare numbers (ms, s, m, h)
        #[arg(long, default_value = "ms")]
        default_unit: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("gwb=debug,gwb_cli=debug,gwb_client=debug,gwb_core=debug")
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("gwb=warn,gwb_cli=warn,gwb_client=warn")
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    gwb_client::install_crypto_provider();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("gwb: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Sanitize { text, messages } => commands::sanitize::run(text.as_deref(), *messages),
        Command::Command { input } => commands::command::run(input),
        Command::Duration { value, default_unit } => commands::duration::run(value, default_unit),
        Command::Call { method, params } => {
            let gateway = bound_client(&cli)?;
            commands::call::run(&gateway, method, params).await
        }
        Command::History {
            user,
            agent,
            limit,
            raw,
        } => {
            let gateway = bound_client(&cli)?;
            commands::history::run(&gateway, user, agent.as_deref(), *limit, *raw).await
        }
        Command::WhatsappStatus => {
            let gateway = bound_client(&cli)?;
            commands::whatsapp::run_status(&gateway).await
        }
        Command::WhatsappGuard { account } => {
            let gateway = bound_client(&cli)?;
            commands::whatsapp::run_guard(&gateway, account).await
        }
    }
}

/// Resolve the gateway target and timeout: flags, then env, then config file.
fn bound_client(cli: &Cli) -> Result<BoundClient> {
    let config_path = cli.config.clone().unwrap_or_else(|| {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(".gwb").join("config.toml").to_string_lossy().to_string()
    });
    let mut cfg = config::Config::load(&config_path)?;
    cfg.apply_env(|key| std::env::var(key).ok());

    if let Some(instance) = &cli.instance {
        cfg.gateway.instance_id = instance.clone();
    }
    if let Some(token) = &cli.token {
        cfg.gateway.token = Some(token.clone());
    }

    let target = match &cli.url {
        Some(url) => GatewayTarget {
            url: url.clone(),
            token: cfg
                .gateway
                .token
                .clone()
                .context("no gateway token: pass --token or set gateway.token in the config")?,
        },
        None => resolve_target(&cfg.instance(), &cfg.override_)
            .context("cannot resolve gateway: pass --url/--token or configure [gateway]")?,
    };

    let timeout = match &cli.timeout {
        Some(raw) => {
            let ms = parse_duration_ms(raw, DurationOptions::default())
                .with_context(|| format!("invalid --timeout '{raw}'"))?;
            Duration::from_millis(ms)
        }
        None => cfg.timeout(),
    };
    debug!(url = %target.url, timeout_ms = timeout.as_millis() as u64, "gateway settings");

    let client = GatewayClient::new(CallOptions::with_timeout(timeout));
    Ok(BoundClient::new(client, target))
}

