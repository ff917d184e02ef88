use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use failover_monitor::{
    ActiveProducer, ChainGateway, ChainSnapshot, GatewayError, KeyChangeRequest, ProducerSchedule,
    ScheduleEntry, TransactionId,
};

use crate::error::{ChainError, Result};
use crate::keys::{normalize_public_key, PublicKey};
use crate::serializer::{Action, PermissionLevel, Transaction};
use crate::signer::TransactionSigner;
use crate::types::{
    GetBlock, GetBlockRequest, GetInfo, GetProducerSchedule, GetProducers, GetProducersRequest,
    PushTransactionRequest, PushTransactionResult, RpcErrorBody, ScheduleBody,
};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BLOCKS_BEHIND: u32 = 3;
pub const DEFAULT_EXPIRE_SECONDS: u32 = 60;

const BLOCK_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of a node's HTTP API, e.g. `https://jungle4.api.eosnation.io`
    pub api: String,
    pub request_timeout: Duration,
    /// How far behind head the TAPoS reference block is taken
    pub blocks_behind: u32,
    /// Transaction lifetime past the reference block's timestamp
    pub expire_seconds: u32,
}

impl ClientConfig {
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            blocks_behind: DEFAULT_BLOCKS_BEHIND,
            expire_seconds: DEFAULT_EXPIRE_SECONDS,
        }
    }
}

/// HTTP client for the `/v1/chain` API
pub struct ChainClient {
    http: Client,
    config: ClientConfig,
    signer: Option<TransactionSigner>,
}

impl ChainClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config: ClientConfig {
                api: config.api.trim_end_matches('/').to_string(),
                ..config
            },
            signer: None,
        })
    }

    /// Enable transaction submission
    pub fn with_signer(mut self, signer: TransactionSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signer(&self) -> Option<&TransactionSigner> {
        self.signer.as_ref()
    }

    async fn call<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/v1/chain/{}", self.config.api, endpoint);
        log::debug!("POST {}", url);

        let res = self.http.post(&url).json(body).send().await?;
        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<RpcErrorBody>(&text) {
                Ok(body) => ChainError::Rpc {
                    code: body.code,
                    message: body.describe(),
                },
                Err(_) => ChainError::InvalidResponse {
                    endpoint: endpoint.to_string(),
                    details: format!("HTTP {}", status),
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| ChainError::InvalidResponse {
            endpoint: endpoint.to_string(),
            details: e.to_string(),
        })
    }

    pub async fn get_info(&self) -> Result<GetInfo> {
        self.call("get_info", &serde_json::json!({})).await
    }

    pub async fn get_producers(&self, limit: u32) -> Result<GetProducers> {
        let request = GetProducersRequest {
            json: true,
            lower_bound: String::new(),
            limit,
        };
        self.call("get_producers", &request).await
    }

    pub async fn get_schedule(&self) -> Result<GetProducerSchedule> {
        self.call("get_producer_schedule", &serde_json::json!({})).await
    }

    pub async fn get_block(&self, block_num: u32) -> Result<GetBlock> {
        let request = GetBlockRequest {
            block_num_or_id: block_num.to_string(),
        };
        self.call("get_block", &request).await
    }

    /// Build, sign and push a transaction carrying `actions`, returning its id
    pub async fn transact(&self, actions: Vec<Action>) -> Result<TransactionId> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| ChainError::Signing("no signing key configured".to_string()))?;

        let info = self.get_info().await?;
        let ref_num = info
            .head_block_num
            .saturating_sub(self.config.blocks_behind)
            .max(1);
        let block = self.get_block(ref_num).await?;
        log::debug!("TAPoS reference block {} ({})", block.block_num, block.id);

        let expiration = parse_block_time(&block.timestamp)?.saturating_add(self.config.expire_seconds);
        let transaction = Transaction {
            expiration,
            ref_block_num: (block.block_num & 0xffff) as u16,
            ref_block_prefix: block.ref_block_prefix,
            actions,
        };

        let packed = transaction.pack()?;
        let chain_id = hex::decode(&info.chain_id).map_err(|e| ChainError::InvalidResponse {
            endpoint: "get_info".to_string(),
            details: format!("chain_id is not hex: {}", e),
        })?;
        let signature = signer.sign(&chain_id, &packed)?;

        let request = PushTransactionRequest {
            signatures: vec![signature],
            compression: 0,
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(&packed),
        };
        let expected_id = Transaction::id(&packed);
        let result: PushTransactionResult = self.call("push_transaction", &request).await?;

        if result.transaction_id != expected_id {
            log::warn!(
                "Node reported transaction id {}, expected {}",
                result.transaction_id, expected_id
            );
        }
        log::info!("Pushed transaction {}", result.transaction_id);
        Ok(result.transaction_id)
    }
}

/// Block timestamps are UTC without a zone suffix, e.g. `2024-05-01T12:00:00.500`
pub fn parse_block_time(timestamp: &str) -> Result<u32> {
    let naive = NaiveDateTime::parse_from_str(timestamp.trim_end_matches('Z'), BLOCK_TIME_FORMAT)
        .map_err(|e| ChainError::InvalidResponse {
            endpoint: "get_block".to_string(),
            details: format!("bad timestamp '{}': {}", timestamp, e),
        })?;
    let secs = Utc.from_utc_datetime(&naive).timestamp();
    u32::try_from(secs).map_err(|_| ChainError::InvalidResponse {
        endpoint: "get_block".to_string(),
        details: format!("timestamp '{}' out of range", timestamp),
    })
}

fn schedule_entries(body: Option<ScheduleBody>) -> Vec<ScheduleEntry> {
    body.map(|b| b.producers)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| match p.signing_key() {
            Some(key) => Some(ScheduleEntry::new(p.producer_name.clone(), normalize_public_key(key))),
            None => {
                log::debug!("Schedule entry for {} has no signing key", p.producer_name);
                None
            }
        })
        .collect()
}

#[async_trait]
impl ChainGateway for ChainClient {
    async fn get_chain_state(&self) -> std::result::Result<ChainSnapshot, GatewayError> {
        let info = self.get_info().await?;
        Ok(ChainSnapshot {
            head_block_num: info.head_block_num as u64,
            head_block_producer: info.head_block_producer,
        })
    }

    async fn get_active_producers(&self, limit: u32) -> std::result::Result<Vec<ActiveProducer>, GatewayError> {
        let producers = self.get_producers(limit).await?;
        if !producers.more.is_empty() {
            log::debug!("Producer table has more rows past {}, limit {}", producers.more, limit);
        }
        Ok(producers
            .rows
            .into_iter()
            .map(|row| ActiveProducer {
                owner: row.owner,
                unpaid_blocks: row.unpaid_blocks,
                is_active: row.is_active,
                url: row.url,
            })
            .collect())
    }

    async fn get_producer_schedule(&self) -> std::result::Result<ProducerSchedule, GatewayError> {
        let schedule = self.get_schedule().await?;
        Ok(ProducerSchedule {
            active: schedule_entries(schedule.active),
            pending: schedule_entries(schedule.pending),
            proposed: schedule_entries(schedule.proposed),
        })
    }

    async fn submit_key_change(&self, request: &KeyChangeRequest) -> std::result::Result<TransactionId, GatewayError> {
        let key: PublicKey = request.new_key.parse()?;
        let action = Action::regproducer(
            PermissionLevel::new(&request.account, &request.permission),
            &key,
            &request.website,
            request.location,
        )?;
        Ok(self.transact(vec![action]).await?)
    }

    async fn submit_deregister(&self, account: &str, permission: &str) -> std::result::Result<TransactionId, GatewayError> {
        let action = Action::unregprod(PermissionLevel::new(account, permission))?;
        Ok(self.transact(vec![action]).await?)
    }
}
