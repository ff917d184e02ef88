use failover_monitor::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response from {endpoint}: {details}")]
    InvalidResponse { endpoint: String, details: String },

    #[error("Invalid account name '{0}'")]
    InvalidName(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;

impl From<ChainError> for GatewayError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Http(e) => GatewayError::Transport(e.to_string()),
            ChainError::Rpc { code, message } => GatewayError::Rpc { code, message },
            other @ ChainError::InvalidResponse { .. } => GatewayError::InvalidResponse(other.to_string()),
            other @ (ChainError::InvalidName(_) | ChainError::InvalidKey(_)) => {
                GatewayError::InvalidRequest(other.to_string())
            }
            ChainError::Signing(message) => GatewayError::Signing(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_is_not_a_signing_failure() {
        let err = GatewayError::from(ChainError::InvalidKey("unrecognised public key format 'x'".to_string()));
        assert_eq!(
            err,
            GatewayError::InvalidRequest("Invalid key: unrecognised public key format 'x'".to_string())
        );

        let err = GatewayError::from(ChainError::InvalidName("Producer1".to_string()));
        assert!(matches!(err, GatewayError::InvalidRequest(_)));

        let err = GatewayError::from(ChainError::Signing("no signing key configured".to_string()));
        assert_eq!(err, GatewayError::Signing("no signing key configured".to_string()));
    }
}
