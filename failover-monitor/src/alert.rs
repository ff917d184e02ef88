use async_trait::async_trait;

/// Best-effort notification delivery.
///
/// `notify` never fails from the caller's point of view; implementations log
/// and drop their own delivery errors.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Whether the n-th consecutive failure should raise an alert.
///
/// Alerts fire on perfect squares (1, 4, 9, 16, ...) so a long outage keeps
/// reporting, ever more sparsely.
pub fn should_alert(consecutive_failures: u64) -> bool {
    if consecutive_failures == 0 {
        return false;
    }
    let root = (consecutive_failures as f64).sqrt() as u64;
    // the float root can be off by one for large counts
    (root.saturating_sub(1)..=root + 1).any(|r| r.checked_mul(r) == Some(consecutive_failures))
}
