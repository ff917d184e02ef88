use anyhow::Result;
use clap::Parser;
use serde_json::json;

use failover_node::config::Config;

use crate::cmds::ConfigOpts;

#[derive(Debug, Parser)]
#[command(about = "Validate the configuration and print the resolved settings")]
pub struct Opts {
    #[command(flatten)]
    pub common: ConfigOpts,

    /// Accept a configuration without `regproducer_key`, as used by `inspect`
    #[clap(long)]
    pub read_only: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config = opts.common.load_config()?;
    let resolved = resolve(&config, !opts.read_only)?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

/// Every setting with defaults applied; the private key is shown only by
/// its public half
fn resolve(config: &Config, require_signer: bool) -> Result<serde_json::Value> {
    config.validate(require_signer)?;

    let poller = config.poller_config()?;
    let client = config.client_config()?;
    let signer = match config.regproducer_key {
        Some(_) => Some(config.signer()?.public_key().to_string()),
        None => None,
    };
    let slack = config.slack_config();

    Ok(json!({
        "name": config.name(),
        "api": client.api,
        "producer_account": poller.registration.account,
        "producer_permission": poller.registration.permission,
        "producer_website": poller.registration.website,
        "producer_location": poller.registration.location,
        "producer_signing_pubkeys": config.backup_keys()?.keys(),
        "regproducer_pubkey": signer,
        "rounds_missed_threshold": poller.rounds_missed_threshold,
        "total_producers": poller.total_producers,
        "round_timer": poller.round_timer.as_secs(),
        "request_timeout_secs": poller.request_timeout.as_secs(),
        "submit_timeout_secs": poller.submit_timeout.as_secs(),
        "blocks_behind": client.blocks_behind,
        "expire_seconds": client.expire_seconds,
        "slack_enabled": slack.url.as_deref().is_some_and(|url| !url.is_empty()),
        "logs_path": config.logs_path,
        "logs_enabled": config.logs_enabled.unwrap_or(true),
        "log_level": config.log_level.as_deref().unwrap_or("info"),
    }))
}
