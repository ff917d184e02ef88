use anyhow::{Context, Result};
use std::sync::Arc;

use failover_chain::ChainClient;
use failover_monitor::Poller;

use crate::config::Config;
use crate::slack::SlackWebhook;

/// Resolves once Ctrl-C is received
pub async fn wait_for_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Received Ctrl-C, initiating shutdown..."),
        Err(e) => {
            log::error!("Failed to listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Build the poller from `config` and run it until Ctrl-C
pub async fn run(config: &Config) -> Result<()> {
    config.validate(true)?;

    let poller_config = config.poller_config()?;
    let backups = config.backup_keys()?;
    let signer = config.signer()?;
    let client_config = config.client_config()?;

    log::info!(
        "[{}] Starting failover monitor for {}@{} against {}",
        config.name(),
        poller_config.registration.account,
        poller_config.registration.permission,
        client_config.api
    );
    log::info!("Transactions will be signed by {}", signer.public_key());
    log::info!("Backup signing keys: {}", backups);

    let client = ChainClient::new(client_config)
        .context("Failed to build chain client")?
        .with_signer(signer);

    let alerts = SlackWebhook::new(config.slack_config(), config.request_timeout())?;
    if !alerts.is_enabled() {
        log::warn!("No slack webhook configured, alerts will only be logged");
    }

    let poller = Poller::new(poller_config, backups, Arc::new(client), Arc::new(alerts));
    poller.run(wait_for_shutdown()).await;

    log::info!("Failover monitor stopped");
    Ok(())
}
