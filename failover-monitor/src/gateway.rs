//! Chain data consumed by the monitor and the gateway trait that supplies it.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub type TransactionId = String;

/// Head of the chain at the time of a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub head_block_num: u64,
    pub head_block_producer: String,
}

/// A row of the producer table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProducer {
    pub owner: String,
    pub unpaid_blocks: u64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub url: String,
}

impl ActiveProducer {
    pub fn new(owner: impl Into<String>, unpaid_blocks: u64) -> Self {
        Self {
            owner: owner.into(),
            unpaid_blocks,
            is_active: true,
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub producer_name: String,
    pub block_signing_key: String,
}

impl ScheduleEntry {
    pub fn new(producer_name: impl Into<String>, block_signing_key: impl Into<String>) -> Self {
        Self {
            producer_name: producer_name.into(),
            block_signing_key: block_signing_key.into(),
        }
    }
}

/// Stage of a schedule change as it propagates through consensus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleSlot {
    Active,
    Pending,
    Proposed,
}

impl ScheduleSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleSlot::Active => "active",
            ScheduleSlot::Pending => "pending",
            ScheduleSlot::Proposed => "proposed",
        }
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The producer schedule split into its three slots. A slot the chain did not
/// report is an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerSchedule {
    pub active: Vec<ScheduleEntry>,
    pub pending: Vec<ScheduleEntry>,
    pub proposed: Vec<ScheduleEntry>,
}

impl ProducerSchedule {
    pub fn slot(&self, slot: ScheduleSlot) -> &[ScheduleEntry] {
        match slot {
            ScheduleSlot::Active => &self.active,
            ScheduleSlot::Pending => &self.pending,
            ScheduleSlot::Proposed => &self.proposed,
        }
    }

    /// Find a producer's entry within one slot
    pub fn find(&self, slot: ScheduleSlot, producer_name: &str) -> Option<&ScheduleEntry> {
        self.slot(slot)
            .iter()
            .find(|entry| entry.producer_name == producer_name)
    }
}

/// Everything needed to re-register a producer under a new signing key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChangeRequest {
    pub account: String,
    pub permission: String,
    pub location: u16,
    pub website: String,
    pub new_key: String,
}

/// Read and write access to the chain.
///
/// Implementations should bound their own I/O; the monitor additionally wraps
/// every call with [`with_timeout`].
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn get_chain_state(&self) -> Result<ChainSnapshot, GatewayError>;

    async fn get_active_producers(&self, limit: u32) -> Result<Vec<ActiveProducer>, GatewayError>;

    async fn get_producer_schedule(&self) -> Result<ProducerSchedule, GatewayError>;

    async fn submit_key_change(&self, request: &KeyChangeRequest) -> Result<TransactionId, GatewayError>;

    async fn submit_deregister(&self, account: &str, permission: &str) -> Result<TransactionId, GatewayError>;
}

/// Run a gateway call, failing with [`GatewayError::Timeout`] if it does not
/// finish within `after`.
pub async fn with_timeout<T, F>(operation: &'static str, after: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout { operation, after }),
    }
}
