//! Antelope chain access for the failover monitor.
//!
//! Implements [`failover_monitor::ChainGateway`] over the `/v1/chain` HTTP API,
//! including packing and signing of `regproducer` and `unregprod` transactions.

pub mod client;
pub mod error;
pub mod keys;
pub mod name;
pub mod serializer;
pub mod signer;
pub mod types;

pub use client::{ChainClient, ClientConfig};
pub use error::{ChainError, Result};
pub use keys::{normalize_public_key, PrivateKey, PublicKey};
pub use signer::TransactionSigner;
