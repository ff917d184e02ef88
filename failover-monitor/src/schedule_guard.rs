//! Signing-key rotation detection.
//!
//! A key change moves through the schedule as proposed -> pending -> active.
//! While a change for the monitored producer is in flight, missed rounds are
//! not acted upon, and any key already headed for the schedule is taken out of
//! the backup queue.

use crate::gateway::{ProducerSchedule, ScheduleSlot};
use crate::state::BackupKeyQueue;

/// Slots inspected for in-flight changes, in evaluation order
const WATCHED_SLOTS: [ScheduleSlot; 2] = [ScheduleSlot::Proposed, ScheduleSlot::Pending];

#[derive(Debug, Clone)]
pub struct ScheduleGuard {
    producer_account: String,
}

impl ScheduleGuard {
    pub fn new(producer_account: impl Into<String>) -> Self {
        Self {
            producer_account: producer_account.into(),
        }
    }

    pub fn producer_account(&self) -> &str {
        &self.producer_account
    }

    /// The producer's key in the active schedule, if it is scheduled at all
    pub fn current_signing_key<'a>(&self, schedule: &'a ProducerSchedule) -> Option<&'a str> {
        schedule
            .find(ScheduleSlot::Active, &self.producer_account)
            .map(|entry| entry.block_signing_key.as_str())
    }

    /// Never fail over to the key that is already signing
    pub fn prune_current_key(&self, current_key: &str, backups: &mut BackupKeyQueue) -> bool {
        let removed = backups.remove(current_key);
        if removed {
            log::debug!(
                "Removing current signing key {} from potential failover keys, remaining {}",
                current_key, backups
            );
        }
        removed
    }

    /// Check one schedule slot for a signing-key change of the monitored producer.
    ///
    /// A key found in the slot is removed from `backups` whether or not it
    /// differs from the current key.
    pub fn has_incoming_key_change(
        &self,
        current_key: &str,
        schedule: &ProducerSchedule,
        slot: ScheduleSlot,
        backups: &mut BackupKeyQueue,
    ) -> bool {
        let Some(entry) = schedule.find(slot, &self.producer_account) else {
            return false;
        };
        let scheduled_key = entry.block_signing_key.as_str();

        if backups.remove(scheduled_key) {
            log::debug!(
                "Removing {} producer key {} from potential failover keys, remaining {}",
                slot, scheduled_key, backups
            );
        }

        if scheduled_key != current_key {
            log::debug!(
                "{} schedule change found ({} -> {}), awaiting...",
                slot, current_key, scheduled_key
            );
            return true;
        }

        false
    }

    /// Check the proposed and then the pending slot, stopping at the first
    /// slot with a change in flight.
    pub fn key_change_in_flight(
        &self,
        current_key: &str,
        schedule: &ProducerSchedule,
        backups: &mut BackupKeyQueue,
    ) -> Option<ScheduleSlot> {
        WATCHED_SLOTS
            .into_iter()
            .find(|slot| self.has_incoming_key_change(current_key, schedule, *slot, backups))
    }
}
