//! JSON bodies of the chain API endpoints used by the client.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct GetInfo {
    pub chain_id: String,
    pub head_block_num: u32,
    pub head_block_producer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetProducersRequest {
    pub json: bool,
    pub lower_bound: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetProducers {
    pub rows: Vec<ProducerRow>,
    /// Lower bound of the next page, empty on the last one
    #[serde(default)]
    pub more: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProducerRow {
    pub owner: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "integer")]
    pub unpaid_blocks: u64,
}

/// Table rows report booleans as `0`/`1`
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_u64().unwrap_or(0) != 0),
        other => Err(serde::de::Error::custom(format!("expected flag, got {}", other))),
    }
}

/// Large integers may arrive as strings
fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("expected unsigned integer, got {}", n))),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected integer, got {}", other))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetProducerSchedule {
    #[serde(default)]
    pub active: Option<ScheduleBody>,
    #[serde(default)]
    pub pending: Option<ScheduleBody>,
    #[serde(default)]
    pub proposed: Option<ScheduleBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleBody {
    #[serde(default)]
    pub producers: Vec<ScheduleProducer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleProducer {
    pub producer_name: String,
    /// Set by nodes that predate signing authorities
    #[serde(default)]
    pub block_signing_key: Option<String>,
    /// `["block_signing_authority_v0", { "threshold": 1, "keys": [...] }]`
    #[serde(default)]
    pub authority: Option<(String, SigningAuthority)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigningAuthority {
    #[serde(default)]
    pub keys: Vec<KeyWeight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyWeight {
    pub key: String,
}

impl ScheduleProducer {
    /// First signing key of the producer, whichever form the node reports
    pub fn signing_key(&self) -> Option<&str> {
        if let Some(key) = self.block_signing_key.as_deref() {
            return Some(key);
        }
        self.authority
            .as_ref()
            .and_then(|(_, authority)| authority.keys.first())
            .map(|k| k.key.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetBlockRequest {
    pub block_num_or_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetBlock {
    pub id: String,
    pub block_num: u32,
    pub timestamp: String,
    pub ref_block_prefix: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushTransactionRequest {
    pub signatures: Vec<String>,
    pub compression: u8,
    pub packed_context_free_data: String,
    pub packed_trx: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushTransactionResult {
    pub transaction_id: String,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub error: Option<RpcErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub what: String,
    #[serde(default)]
    pub details: Vec<RpcErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorMessage {
    pub message: String,
}

impl RpcErrorBody {
    /// Most specific message available, e.g. the assertion text of a failed action
    pub fn describe(&self) -> String {
        match &self.error {
            Some(detail) => match detail.details.first() {
                Some(first) => first.message.clone(),
                None if !detail.what.is_empty() => detail.what.clone(),
                None if !detail.name.is_empty() => format!("{}: {}", self.message, detail.name),
                None => self.message.clone(),
            },
            None => self.message.clone(),
        }
    }
}
