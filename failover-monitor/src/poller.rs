//! The polling loop that ties the monitor together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::alert::{should_alert, AlertSink};
use crate::error::{MonitorError, Result};
use crate::failover::{FailoverAction, FailoverController, ProducerRegistration};
use crate::gateway::{with_timeout, ActiveProducer, ChainGateway, ChainSnapshot, ProducerSchedule, ScheduleSlot};
use crate::round_monitor::{classify, RoundOutcome};
use crate::schedule_guard::ScheduleGuard;
use crate::state::{BackupKeyQueue, FailureState, MonitorState};

pub const DEFAULT_ROUNDS_MISSED_THRESHOLD: u32 = 1;
pub const DEFAULT_TOTAL_PRODUCERS: u32 = 21;
pub const DEFAULT_ROUND_TIMER_SECS: u64 = 126;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// A submission reads the head block and its reference block before pushing
pub const SUBMIT_TIMEOUT_FACTOR: u32 = 3;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub registration: ProducerRegistration,
    pub rounds_missed_threshold: u32,
    /// Row limit for the producer table query
    pub total_producers: u32,
    pub round_timer: Duration,
    /// Bound applied to every chain read
    pub request_timeout: Duration,
    /// Bound applied to a whole transaction submission
    pub submit_timeout: Duration,
}

impl PollerConfig {
    pub fn new(registration: ProducerRegistration) -> Self {
        Self {
            registration,
            rounds_missed_threshold: DEFAULT_ROUNDS_MISSED_THRESHOLD,
            total_producers: DEFAULT_TOTAL_PRODUCERS,
            round_timer: Duration::from_secs(DEFAULT_ROUND_TIMER_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            submit_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS) * SUBMIT_TIMEOUT_FACTOR,
        }
    }
}

/// What a single tick did
#[derive(Debug)]
pub enum TickReport {
    /// A chain read failed; nothing else happened this tick
    FetchFailed {
        consecutive_failures: u64,
        alerted: bool,
    },
    ProducerNotActive,
    ProducerNotScheduled,
    /// A signing-key change is in flight; the baseline was reset
    KeyChangePending { slot: ScheduleSlot },
    Round(RoundOutcome),
    ThresholdBreached {
        rounds_missed: u32,
        result: Result<FailoverAction>,
    },
}

struct ChainView {
    chain: ChainSnapshot,
    producers: Vec<ActiveProducer>,
    schedule: ProducerSchedule,
}

pub struct Poller {
    config: PollerConfig,
    gateway: Arc<dyn ChainGateway>,
    alerts: Arc<dyn AlertSink>,
    guard: ScheduleGuard,
    controller: FailoverController,
    state: MonitorState,
    failures: FailureState,
    backups: BackupKeyQueue,
}

impl Poller {
    pub fn new(
        config: PollerConfig,
        backups: BackupKeyQueue,
        gateway: Arc<dyn ChainGateway>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let guard = ScheduleGuard::new(config.registration.account.clone());
        let controller = FailoverController::new(config.registration.clone(), config.submit_timeout);
        Self {
            config,
            gateway,
            alerts,
            guard,
            controller,
            state: MonitorState::new(),
            failures: FailureState::new(),
            backups,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn failures(&self) -> &FailureState {
        &self.failures
    }

    pub fn backups(&self) -> &BackupKeyQueue {
        &self.backups
    }

    /// Tick immediately, then once per round until `shutdown` resolves.
    ///
    /// Ticks run inline, so a slow tick delays the next one instead of
    /// overlapping it; triggers missed meanwhile are skipped. Shutdown is only
    /// observed between ticks.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.config.round_timer);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        log::info!(
            "Monitoring producer {} every {}s (threshold {}, {} backup keys)",
            self.config.registration.account,
            self.config.round_timer.as_secs(),
            self.config.rounds_missed_threshold,
            self.backups.len()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Poller received shutdown, stopping");
                    break;
                }
                _ = interval.tick() => {}
            }

            let report = self.tick().await;
            log::debug!("Tick complete: {:?}", report);
        }
    }

    /// Run one poll: read the chain, classify the round and act on it.
    pub async fn tick(&mut self) -> TickReport {
        let view = match self.fetch().await {
            Ok(view) => view,
            Err(e) => return self.on_fetch_failure(e).await,
        };
        self.failures.record_success();

        let ChainView { chain, producers, schedule } = view;
        log::debug!("Head block {} produced by {}", chain.head_block_num, chain.head_block_producer);

        let account = self.config.registration.account.as_str();
        let Some(producer) = producers.iter().find(|p| p.owner == account) else {
            log::debug!("Producer {} not an active producer", account);
            self.controller.release_latch("is no longer an active producer");
            return TickReport::ProducerNotActive;
        };

        let Some(current_key) = self.guard.current_signing_key(&schedule).map(str::to_owned) else {
            log::debug!("Producer {} not in schedule", account);
            // a later breach after re-registration must deregister again
            self.controller.release_latch("left the active schedule");
            return TickReport::ProducerNotScheduled;
        };

        self.guard.prune_current_key(&current_key, &mut self.backups);

        if let Some(slot) = self.guard.key_change_in_flight(&current_key, &schedule, &mut self.backups) {
            // re-baseline once the rotation lands so a stale count is not read as a miss
            self.state.reset_baseline();
            self.alerts.notify("🕒 signing key changes pending in schedule").await;
            return TickReport::KeyChangePending { slot };
        }

        let outcome = classify(&mut self.state, producer.unpaid_blocks);
        let threshold = self.config.rounds_missed_threshold;

        match outcome {
            RoundOutcome::Progress { delta, recovered_after } => {
                self.controller.release_latch("is producing again");
                if let Some(rounds) = recovered_after {
                    self.alerts
                        .notify(&format!(
                            "producer recovered after {} rounds, witnessed {} new unpaid blocks",
                            rounds, delta
                        ))
                        .await;
                }
            }
            RoundOutcome::Missed { rounds_missed } => {
                self.alerts
                    .notify(&format!("⚠️ producer missed a round {}/{}", rounds_missed, threshold))
                    .await;
                if rounds_missed >= threshold {
                    return self.on_threshold_breached(rounds_missed).await;
                }
            }
            RoundOutcome::Initializing => self.controller.release_latch("has a new baseline"),
            RoundOutcome::Reset { .. } => {}
        }

        TickReport::Round(outcome)
    }

    async fn fetch(&self) -> Result<ChainView> {
        let timeout = self.config.request_timeout;

        let chain = with_timeout("get_info", timeout, self.gateway.get_chain_state())
            .await
            .map_err(|source| MonitorError::Fetch { operation: "retrieve chain state", source })?;

        let producers = with_timeout(
            "get_producers",
            timeout,
            self.gateway.get_active_producers(self.config.total_producers),
        )
        .await
        .map_err(|source| MonitorError::Fetch { operation: "retrieve active producers", source })?;

        let schedule = with_timeout("get_producer_schedule", timeout, self.gateway.get_producer_schedule())
            .await
            .map_err(|source| MonitorError::Fetch { operation: "retrieve producer schedule", source })?;

        Ok(ChainView { chain, producers, schedule })
    }

    async fn on_fetch_failure(&mut self, error: MonitorError) -> TickReport {
        let consecutive_failures = self.failures.record_failure();
        let alerted = should_alert(consecutive_failures);

        if alerted {
            let outage_secs = self.config.round_timer.as_secs().saturating_mul(consecutive_failures);
            log::warn!("{} ({} consecutive failures)", error, consecutive_failures);
            self.alerts
                .notify(&format!(
                    "⚠️ {} - {} consecutive failures over ~{}s",
                    error, consecutive_failures, outage_secs
                ))
                .await;
        } else {
            log::debug!("{} ({} consecutive failures, alert throttled)", error, consecutive_failures);
        }

        TickReport::FetchFailed { consecutive_failures, alerted }
    }

    async fn on_threshold_breached(&mut self, rounds_missed: u32) -> TickReport {
        let threshold = self.config.rounds_missed_threshold;

        if !self.controller.is_deregistered() {
            log::debug!(
                "Producer has exceeded missed round threshold {}/{}, executing failover",
                rounds_missed, threshold
            );
            self.alerts
                .notify(&format!(
                    "⚠️ producer exceeded missed round threshold {}/{}",
                    rounds_missed, threshold
                ))
                .await;
        }

        let result = self.controller.execute(self.gateway.as_ref(), &mut self.backups).await;

        match &result {
            Ok(FailoverAction::KeyRotated { key, remaining, transaction_id }) => {
                self.alerts
                    .notify(&format!(
                        "⚠️ regproducer submitted with new signing key of {}, {} keys remaining in rotation [{}] ({})",
                        key,
                        remaining.len(),
                        remaining.join(", "),
                        transaction_id
                    ))
                    .await;
            }
            Ok(FailoverAction::Deregistered { transaction_id, abandoned_key: None }) => {
                self.alerts
                    .notify(&format!(
                        "⚠️ producer has no backup nodes available, unregprod submitted ({})",
                        transaction_id
                    ))
                    .await;
            }
            Ok(FailoverAction::Deregistered { transaction_id, abandoned_key: Some(key) }) => {
                self.alerts
                    .notify(&format!(
                        "⚠️ failure to rotate to {}, unregprod submitted ({})",
                        key, transaction_id
                    ))
                    .await;
            }
            Ok(FailoverAction::AlreadyDeregistered) => {}
            Err(e) => {
                log::error!("{}", e);
                self.alerts
                    .notify(&format!("🚨 {}, producer may still be registered", e))
                    .await;
            }
        }

        TickReport::ThresholdBreached { rounds_missed, result }
    }
}
