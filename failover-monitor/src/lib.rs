//! Producer failover monitoring
//!
//! This package provides the decision engine that watches a block producer's
//! unpaid-block counter and reacts when production stalls:
//! - Detects missed rounds from unpaid-block deltas between polls
//! - Holds back while a signing-key rotation is moving through the schedule
//! - Rotates to the next backup signing key once the miss threshold is crossed
//! - Deregisters the producer when no usable backup key remains
//!
//! Chain access and notification delivery are supplied by the caller through
//! the [`ChainGateway`] and [`AlertSink`] traits.

pub mod alert;
pub mod error;
pub mod failover;
pub mod gateway;
pub mod poller;
pub mod round_monitor;
pub mod schedule_guard;
pub mod state;

pub use alert::{should_alert, AlertSink};
pub use error::{GatewayError, MonitorError, Result};
pub use failover::{FailoverAction, FailoverController, ProducerRegistration};
pub use gateway::{
    ActiveProducer, ChainGateway, ChainSnapshot, KeyChangeRequest, ProducerSchedule,
    ScheduleEntry, ScheduleSlot, TransactionId,
};
pub use poller::{Poller, PollerConfig, TickReport};
pub use round_monitor::{classify, RoundOutcome};
pub use schedule_guard::ScheduleGuard;
pub use state::{BackupKeyQueue, FailureState, MonitorState};
