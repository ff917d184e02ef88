//! Top-level actions exposed through the `failover` CLI.
//!
//! - `run` starts the polling daemon and blocks until Ctrl-C
//! - `inspect` performs one read of the chain and reports what the daemon would see

pub mod inspect;
pub mod run;

pub use inspect::{inspect, inspect_with_config, InspectReport};
pub use run::{run, wait_for_shutdown};
