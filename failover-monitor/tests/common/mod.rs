#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use failover_monitor::{
    ActiveProducer, AlertSink, ChainGateway, ChainSnapshot, GatewayError, KeyChangeRequest,
    ProducerRegistration, ProducerSchedule, ScheduleEntry, TransactionId,
};

pub const PRODUCER: &str = "producer1";
pub const CURRENT_KEY: &str = "PUB_K1_CURRENT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    KeyChange(KeyChangeRequest),
    Deregister { account: String, permission: String },
}

#[derive(Debug)]
pub struct FakeChain {
    pub unpaid_blocks: u64,
    pub listed: bool,
    pub schedule: ProducerSchedule,
    pub fail_reads: bool,
    pub read_delay: Option<Duration>,
    pub submit_delay: Option<Duration>,
    pub fail_key_change: bool,
    pub fail_deregister: bool,
    pub submissions: Vec<Submission>,
    pub reads: u32,
}

/// In-memory chain that records every submitted transaction
pub struct FakeGateway {
    chain: Mutex<FakeChain>,
}

impl FakeGateway {
    pub fn new(unpaid_blocks: u64) -> Self {
        Self {
            chain: Mutex::new(FakeChain {
                unpaid_blocks,
                listed: true,
                schedule: ProducerSchedule {
                    active: vec![
                        ScheduleEntry::new("otherprod", "PUB_K1_OTHER"),
                        ScheduleEntry::new(PRODUCER, CURRENT_KEY),
                    ],
                    pending: vec![],
                    proposed: vec![],
                },
                fail_reads: false,
                read_delay: None,
                submit_delay: None,
                fail_key_change: false,
                fail_deregister: false,
                submissions: vec![],
                reads: 0,
            }),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeChain) -> R) -> R {
        let mut chain = self.chain.lock().unwrap();
        f(&mut chain)
    }

    pub fn set_unpaid(&self, unpaid_blocks: u64) {
        self.with(|c| c.unpaid_blocks = unpaid_blocks);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.with(|c| c.fail_reads = fail);
    }

    pub fn set_pending_key(&self, key: &str) {
        self.with(|c| c.schedule.pending = vec![ScheduleEntry::new(PRODUCER, key)]);
    }

    pub fn set_proposed_key(&self, key: &str) {
        self.with(|c| c.schedule.proposed = vec![ScheduleEntry::new(PRODUCER, key)]);
    }

    pub fn set_active_key(&self, key: &str) {
        self.with(|c| {
            c.schedule.active = vec![ScheduleEntry::new(PRODUCER, key)];
            c.schedule.pending.clear();
            c.schedule.proposed.clear();
        });
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.with(|c| c.submissions.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&FakeChain) -> T) -> Result<(T, Option<Duration>), GatewayError> {
        self.with(|c| {
            c.reads += 1;
            if c.fail_reads {
                Err(GatewayError::Transport("connection refused".to_string()))
            } else {
                Ok((f(c), c.read_delay))
            }
        })
    }
}

async fn delay(d: Option<Duration>) {
    if let Some(d) = d {
        tokio::time::sleep(d).await;
    }
}

#[async_trait]
impl ChainGateway for FakeGateway {
    async fn get_chain_state(&self) -> Result<ChainSnapshot, GatewayError> {
        let (snapshot, wait) = self.read(|_| ChainSnapshot {
            head_block_num: 1000,
            head_block_producer: "otherprod".to_string(),
        })?;
        delay(wait).await;
        Ok(snapshot)
    }

    async fn get_active_producers(&self, limit: u32) -> Result<Vec<ActiveProducer>, GatewayError> {
        let (rows, wait) = self.read(|c| {
            let mut rows = vec![ActiveProducer::new("otherprod", 7)];
            if c.listed {
                rows.push(ActiveProducer::new(PRODUCER, c.unpaid_blocks));
            }
            rows.truncate(limit as usize);
            rows
        })?;
        delay(wait).await;
        Ok(rows)
    }

    async fn get_producer_schedule(&self) -> Result<ProducerSchedule, GatewayError> {
        let (schedule, wait) = self.read(|c| c.schedule.clone())?;
        delay(wait).await;
        Ok(schedule)
    }

    async fn submit_key_change(&self, request: &KeyChangeRequest) -> Result<TransactionId, GatewayError> {
        delay(self.with(|c| c.submit_delay)).await;
        self.with(|c| {
            c.submissions.push(Submission::KeyChange(request.clone()));
            if c.fail_key_change {
                return Err(GatewayError::Rpc {
                    code: 500,
                    message: "missing authority of producer1".to_string(),
                });
            }
            Ok(format!("tx-regproducer-{}", c.submissions.len()))
        })
    }

    async fn submit_deregister(&self, account: &str, permission: &str) -> Result<TransactionId, GatewayError> {
        delay(self.with(|c| c.submit_delay)).await;
        self.with(|c| {
            c.submissions.push(Submission::Deregister {
                account: account.to_string(),
                permission: permission.to_string(),
            });
            if c.fail_deregister {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            Ok(format!("tx-unregprod-{}", c.submissions.len()))
        })
    }
}

/// Alert sink that keeps every message
#[derive(Default)]
pub struct RecordingAlerts {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlerts {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(needle)).count()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    async fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub fn registration() -> ProducerRegistration {
    ProducerRegistration {
        account: PRODUCER.to_string(),
        permission: "active".to_string(),
        location: 840,
        website: "https://producer1.example".to_string(),
    }
}
