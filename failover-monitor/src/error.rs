use std::time::Duration;

use thiserror::Error;

/// Errors reported by a [`crate::ChainGateway`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A key or account name could not be encoded into a transaction
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Unable to {operation}: {source}")]
    Fetch {
        operation: &'static str,
        source: GatewayError,
    },

    #[error("Failover submission failed: {0}")]
    Submission(#[source] GatewayError),

    #[error("Deregistration failed: {0}")]
    Deregistration(#[source] GatewayError),

    #[error("Startup error: {0}")]
    Startup(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
