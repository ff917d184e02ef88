//! State carried between polls.

use std::collections::VecDeque;
use std::fmt;

/// Unpaid-block baseline and missed-round counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    /// `None` until the first observation, and again after a baseline reset
    pub last_unpaid_blocks: Option<u64>,
    pub rounds_missed: u32,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the baseline so the next observation re-initializes it
    pub fn reset_baseline(&mut self) {
        self.last_unpaid_blocks = None;
    }
}

/// Consecutive fetch failures, used to throttle outage alerts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureState {
    consecutive_failures: u64,
}

impl FailureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    /// Count a failure and return the new streak length
    pub fn record_failure(&mut self) -> u64 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            log::info!("Chain reads recovered after {} consecutive failures", self.consecutive_failures);
        }
        self.consecutive_failures = 0;
    }
}

/// Backup signing keys in failover order. Keys are only ever removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupKeyQueue {
    keys: VecDeque<String>,
}

impl BackupKeyQueue {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }

    /// Drop every occurrence of `key`. Returns true if anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    /// Take the next key to fail over to
    pub fn pop_next(&mut self) -> Option<String> {
        self.keys.pop_front()
    }
}

impl fmt::Display for BackupKeyQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "]")
    }
}
