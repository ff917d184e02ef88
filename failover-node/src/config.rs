use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use failover_chain::client::{DEFAULT_BLOCKS_BEHIND, DEFAULT_EXPIRE_SECONDS};
use failover_chain::name::string_to_name;
use failover_chain::{ClientConfig, PrivateKey, PublicKey, TransactionSigner};
use failover_monitor::poller::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_ROUNDS_MISSED_THRESHOLD, DEFAULT_ROUND_TIMER_SECS,
    DEFAULT_TOTAL_PRODUCERS, SUBMIT_TIMEOUT_FACTOR,
};
use failover_monitor::{BackupKeyQueue, MonitorError, PollerConfig, ProducerRegistration};

use crate::slack::SlackConfig;

pub const DEFAULT_NAME: &str = "failover";
pub const DEFAULT_PERMISSION: &str = "active";

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    pub name: Option<String>,
    pub api: Option<String>,
    pub regproducer_key: Option<String>,
    pub producer_account: Option<String>,
    pub producer_permission: Option<String>,
    pub producer_website: Option<String>,
    pub producer_location: Option<u16>,
    pub producer_signing_pubkeys: Option<Vec<String>>,
    pub rounds_missed_threshold: Option<u32>,
    pub total_producers: Option<u32>,
    pub round_timer: Option<u64>, // seconds between polls
    pub request_timeout_secs: Option<u64>,
    pub submit_timeout_secs: Option<u64>, // whole regproducer/unregprod submission
    pub blocks_behind: Option<u32>,
    pub expire_seconds: Option<u32>,
    pub slack: Option<SlackConfig>,
    pub logs_path: Option<PathBuf>,
    pub logs_enabled: Option<bool>,
    pub log_level: Option<String>,
}

fn startup(message: impl Into<String>) -> MonitorError {
    MonitorError::Startup(message.into())
}

impl Config {
    pub fn from_filepath(path: &Path) -> Result<Config> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let mut config: Config = serde_json::from_reader(file)
            .context("Failed to parse config file")?;

        let config_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        if let Some(logs_path_buf) = config.logs_path {
            let abs_logs_path = to_absolute_path(config_dir, logs_path_buf.as_path())?;
            config.logs_path = Some(abs_logs_path);
        }

        Ok(config)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Defaults to three request timeouts, one per call a submission makes
    pub fn submit_timeout(&self) -> Duration {
        match self.submit_timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.request_timeout() * SUBMIT_TIMEOUT_FACTOR,
        }
    }

    pub fn slack_config(&self) -> SlackConfig {
        self.slack.clone().unwrap_or_default()
    }

    pub fn registration(&self) -> std::result::Result<ProducerRegistration, MonitorError> {
        let account = self
            .producer_account
            .clone()
            .ok_or_else(|| startup("producer_account is required"))?;
        string_to_name(&account)
            .map_err(|e| startup(format!("producer_account: {}", e)))?;

        let permission = self
            .producer_permission
            .clone()
            .unwrap_or_else(|| DEFAULT_PERMISSION.to_string());
        string_to_name(&permission)
            .map_err(|e| startup(format!("producer_permission: {}", e)))?;

        Ok(ProducerRegistration {
            account,
            permission,
            location: self.producer_location.unwrap_or(0),
            website: self.producer_website.clone().unwrap_or_default(),
        })
    }

    pub fn poller_config(&self) -> std::result::Result<PollerConfig, MonitorError> {
        let rounds_missed_threshold = self
            .rounds_missed_threshold
            .unwrap_or(DEFAULT_ROUNDS_MISSED_THRESHOLD);
        if rounds_missed_threshold < 1 {
            return Err(startup("rounds_missed_threshold must be at least 1"));
        }

        let total_producers = self.total_producers.unwrap_or(DEFAULT_TOTAL_PRODUCERS);
        if total_producers < 1 {
            return Err(startup("total_producers must be at least 1"));
        }

        let round_timer = self.round_timer.unwrap_or(DEFAULT_ROUND_TIMER_SECS);
        if round_timer < 1 {
            return Err(startup("round_timer must be at least 1 second"));
        }

        let request_timeout = self.request_timeout();
        if request_timeout.is_zero() {
            return Err(startup("request_timeout_secs must be at least 1 second"));
        }

        let submit_timeout = self.submit_timeout();
        if submit_timeout < request_timeout {
            return Err(startup("submit_timeout_secs must not be shorter than request_timeout_secs"));
        }

        Ok(PollerConfig {
            registration: self.registration()?,
            rounds_missed_threshold,
            total_producers,
            round_timer: Duration::from_secs(round_timer),
            request_timeout,
            submit_timeout,
        })
    }

    pub fn client_config(&self) -> std::result::Result<ClientConfig, MonitorError> {
        let api = self
            .api
            .clone()
            .filter(|api| !api.trim().is_empty())
            .ok_or_else(|| startup("api is required"))?;
        if !api.starts_with("http://") && !api.starts_with("https://") {
            return Err(startup(format!("api must be an http(s) URL, got '{}'", api)));
        }

        Ok(ClientConfig {
            api,
            request_timeout: self.request_timeout(),
            blocks_behind: self.blocks_behind.unwrap_or(DEFAULT_BLOCKS_BEHIND),
            expire_seconds: self.expire_seconds.unwrap_or(DEFAULT_EXPIRE_SECONDS),
        })
    }

    /// Backup signing keys in configured order, normalised to `PUB_K1_` form
    pub fn backup_keys(&self) -> std::result::Result<BackupKeyQueue, MonitorError> {
        let mut keys = Vec::new();
        for key in self.producer_signing_pubkeys.iter().flatten() {
            let parsed: PublicKey = key
                .parse()
                .map_err(|e| startup(format!("producer_signing_pubkeys: {}", e)))?;
            let normalized = parsed.to_string();
            if keys.contains(&normalized) {
                log::warn!("Ignoring duplicate backup key {}", key);
                continue;
            }
            keys.push(normalized);
        }
        Ok(BackupKeyQueue::new(keys))
    }

    pub fn signer(&self) -> std::result::Result<TransactionSigner, MonitorError> {
        let key: PrivateKey = self
            .regproducer_key
            .as_deref()
            .ok_or_else(|| startup("regproducer_key is required"))?
            .parse()
            .map_err(|e| startup(format!("regproducer_key: {}", e)))?;
        Ok(TransactionSigner::new(key))
    }

    /// Check everything `run` needs, or everything `inspect` needs when
    /// `require_signer` is false
    pub fn validate(&self, require_signer: bool) -> std::result::Result<(), MonitorError> {
        self.client_config()?;
        self.poller_config()?;
        self.backup_keys()?;
        if require_signer {
            self.signer()?;
        }
        Ok(())
    }
}

pub fn to_absolute_path<P: AsRef<Path>>(base_dir: P, relative_path: P) -> Result<PathBuf> {
    let path = relative_path.as_ref();

    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let base_dir = base_dir
            .as_ref()
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", base_dir.as_ref().display()))?;
        Ok(base_dir.join(path))
    }
}
