//! Failover and deregistration once the missed-round threshold is crossed.

use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::gateway::{with_timeout, ChainGateway, KeyChangeRequest, TransactionId};
use crate::state::BackupKeyQueue;

/// How the producer is registered on chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerRegistration {
    pub account: String,
    pub permission: String,
    pub location: u16,
    pub website: String,
}

impl ProducerRegistration {
    fn key_change(&self, new_key: String) -> KeyChangeRequest {
        KeyChangeRequest {
            account: self.account.clone(),
            permission: self.permission.clone(),
            location: self.location,
            website: self.website.clone(),
            new_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailoverAction {
    /// The producer was re-registered with a backup key
    KeyRotated {
        key: String,
        remaining: Vec<String>,
        transaction_id: TransactionId,
    },
    /// The producer was deregistered. `abandoned_key` is set when a rotation
    /// to that key was attempted first and failed.
    Deregistered {
        transaction_id: TransactionId,
        abandoned_key: Option<String>,
    },
    /// A previous deregistration succeeded and the producer has neither
    /// produced nor left the active schedule since, so nothing was submitted
    AlreadyDeregistered,
}

pub struct FailoverController {
    registration: ProducerRegistration,
    submit_timeout: Duration,
    deregistered: bool,
}

impl FailoverController {
    pub fn new(registration: ProducerRegistration, submit_timeout: Duration) -> Self {
        Self {
            registration,
            submit_timeout,
            deregistered: false,
        }
    }

    pub fn registration(&self) -> &ProducerRegistration {
        &self.registration
    }

    pub fn is_deregistered(&self) -> bool {
        self.deregistered
    }

    /// Allow deregistration again. The poller calls this when the producer
    /// produces, drops out of the active schedule or gets a fresh baseline.
    pub fn release_latch(&mut self, reason: &str) {
        if self.deregistered {
            log::info!("Producer {} {}, clearing deregistration latch", self.registration.account, reason);
        }
        self.deregistered = false;
    }

    /// Rotate to the next backup key, or deregister when none is left or the
    /// rotation fails. A popped key is consumed even if its rotation fails.
    pub async fn execute(&mut self, gateway: &dyn ChainGateway, backups: &mut BackupKeyQueue) -> Result<FailoverAction> {
        if self.deregistered {
            log::debug!("Deregistration already submitted for {}, skipping", self.registration.account);
            return Ok(FailoverAction::AlreadyDeregistered);
        }

        let Some(next_key) = backups.pop_next() else {
            let transaction_id = self.deregister(gateway).await?;
            log::info!("unregprod submitted, no backup keys available ({})", transaction_id);
            return Ok(FailoverAction::Deregistered {
                transaction_id,
                abandoned_key: None,
            });
        };

        match self.rotate(gateway, next_key.clone()).await {
            Ok(transaction_id) => {
                log::info!(
                    "regproducer submitted to failover to {} ({}), remaining keys {}",
                    next_key, transaction_id, backups
                );
                Ok(FailoverAction::KeyRotated {
                    key: next_key,
                    remaining: backups.keys(),
                    transaction_id,
                })
            }
            Err(e) => {
                log::warn!("{}, falling back to unregprod", e);
                let transaction_id = self.deregister(gateway).await?;
                log::info!("unregprod submitted after failed rotation to {} ({})", next_key, transaction_id);
                Ok(FailoverAction::Deregistered {
                    transaction_id,
                    abandoned_key: Some(next_key),
                })
            }
        }
    }

    async fn rotate(&self, gateway: &dyn ChainGateway, new_key: String) -> Result<TransactionId> {
        let request = self.registration.key_change(new_key);
        with_timeout("regproducer", self.submit_timeout, gateway.submit_key_change(&request))
            .await
            .map_err(MonitorError::Submission)
    }

    async fn deregister(&mut self, gateway: &dyn ChainGateway) -> Result<TransactionId> {
        let call = gateway.submit_deregister(&self.registration.account, &self.registration.permission);
        let transaction_id = with_timeout("unregprod", self.submit_timeout, call)
            .await
            .map_err(MonitorError::Deregistration)?;
        self.deregistered = true;
        Ok(transaction_id)
    }
}
