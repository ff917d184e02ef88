use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;

use failover_chain::ChainClient;
use failover_monitor::gateway::with_timeout;
use failover_monitor::{BackupKeyQueue, ChainGateway, PollerConfig, ScheduleGuard, ScheduleSlot};

use crate::config::Config;

/// What the monitor would see on its next tick
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InspectReport {
    pub producer: String,
    pub head_block_num: u64,
    pub head_block_producer: String,
    /// `None` when the producer is not in the producer table
    pub unpaid_blocks: Option<u64>,
    pub active_key: Option<String>,
    pub pending_key: Option<String>,
    pub proposed_key: Option<String>,
    /// Backup keys left after removing any key already in the schedule
    pub backup_keys: Vec<String>,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        writeln!(f, "Producer:     {}", self.producer)?;
        writeln!(f, "Head block:   {} ({})", self.head_block_num, self.head_block_producer)?;
        match self.unpaid_blocks {
            Some(unpaid) => writeln!(f, "Unpaid:       {}", unpaid)?,
            None => writeln!(f, "Unpaid:       - (not in producer table)")?,
        }
        writeln!(f, "Active key:   {}", show(&self.active_key))?;
        writeln!(f, "Pending key:  {}", show(&self.pending_key))?;
        writeln!(f, "Proposed key: {}", show(&self.proposed_key))?;
        write!(f, "Backup keys:  [{}]", self.backup_keys.join(", "))
    }
}

/// Read the chain once without submitting anything
pub async fn inspect(
    gateway: &dyn ChainGateway,
    config: &PollerConfig,
    mut backups: BackupKeyQueue,
) -> Result<InspectReport> {
    let timeout = config.request_timeout;
    let account = config.registration.account.as_str();

    let chain = with_timeout("get_info", timeout, gateway.get_chain_state())
        .await
        .context("Unable to retrieve chain state")?;
    let producers = with_timeout("get_producers", timeout, gateway.get_active_producers(config.total_producers))
        .await
        .context("Unable to retrieve active producers")?;
    let schedule = with_timeout("get_producer_schedule", timeout, gateway.get_producer_schedule())
        .await
        .context("Unable to retrieve producer schedule")?;

    let guard = ScheduleGuard::new(account);
    let slot_key = |slot: ScheduleSlot| schedule.find(slot, account).map(|e| e.block_signing_key.clone());

    let active_key = guard.current_signing_key(&schedule).map(str::to_owned);
    let pending_key = slot_key(ScheduleSlot::Pending);
    let proposed_key = slot_key(ScheduleSlot::Proposed);

    for key in [&active_key, &pending_key, &proposed_key].into_iter().flatten() {
        backups.remove(key);
    }

    Ok(InspectReport {
        producer: account.to_string(),
        head_block_num: chain.head_block_num,
        head_block_producer: chain.head_block_producer,
        unpaid_blocks: producers.iter().find(|p| p.owner == account).map(|p| p.unpaid_blocks),
        active_key,
        pending_key,
        proposed_key,
        backup_keys: backups.keys(),
    })
}

/// Load the chain client from `config` and print an [`InspectReport`]
pub async fn inspect_with_config(config: &Config, json: bool) -> Result<InspectReport> {
    config.validate(false)?;

    let poller_config = config.poller_config()?;
    let client = ChainClient::new(config.client_config()?).context("Failed to build chain client")?;
    let report = inspect(&client, &poller_config, config.backup_keys()?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(report)
}
