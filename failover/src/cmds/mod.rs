//! CLI command modules for the failover daemon.
//!
//! - `run`: start the monitor
//! - `inspect`: one-shot read of the chain
//! - `config`: configuration checks

pub mod config;
pub mod inspect;
pub mod run;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use failover_node::config::Config;
use failover_node::config_resolution::load_config;

/// Where to find the configuration, shared by every command
#[derive(Debug, Clone, Args)]
pub struct ConfigOpts {
    /// Path to configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory containing config.json (defaults to current directory)
    #[clap(long)]
    pub dir: Option<PathBuf>,
}

impl ConfigOpts {
    /// With neither flag given, the current directory is used
    pub fn resolve_dir(&self) -> Result<Option<PathBuf>> {
        if self.config.is_none() && self.dir.is_none() {
            Ok(Some(std::env::current_dir()?))
        } else {
            Ok(self.dir.clone())
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        let dir = self.resolve_dir()?;
        load_config(self.config.clone(), dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dir_defaults_to_current_dir() {
        let opts = ConfigOpts { config: None, dir: None };
        assert_eq!(opts.resolve_dir().unwrap(), Some(std::env::current_dir().unwrap()));
    }

    #[test]
    fn test_explicit_config_has_no_dir() {
        let opts = ConfigOpts {
            config: Some(PathBuf::from("/etc/failover/config.json")),
            dir: None,
        };
        assert_eq!(opts.resolve_dir().unwrap(), None);
    }

    #[test]
    fn test_demo_config_is_valid() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos/jungle4/config.json");
        let opts = ConfigOpts {
            config: Some(path),
            dir: None,
        };
        let config = opts.load_config().unwrap();
        assert!(config.validate(true).is_ok());
        assert_eq!(config.backup_keys().unwrap().len(), 1);
    }

    #[test]
    fn test_load_from_dir_sets_logs_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "api": "https://jungle4.example", "producer_account": "producer1" }"#,
        )
        .unwrap();

        let opts = ConfigOpts {
            config: None,
            dir: Some(dir.path().to_path_buf()),
        };
        let config = opts.load_config().unwrap();
        assert_eq!(config.logs_path, Some(dir.path().join("logs")));
    }
}
