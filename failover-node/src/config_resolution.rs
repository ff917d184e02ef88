use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOGS_DIR_NAME: &str = "logs";

/// Resolve the config file from either `--config` or `--dir`; a directory
/// must contain `config.json`
pub fn resolve_config_path(config: Option<PathBuf>, dir: Option<PathBuf>) -> Result<PathBuf> {
    match (config, dir) {
        (Some(config_path), None) => Ok(config_path),
        (None, Some(dir_path)) => {
            let config_path = dir_path.join(CONFIG_FILE_NAME);
            if !config_path.exists() {
                anyhow::bail!(
                    "Config file not found at {:?}. Expected {} in directory {:?}",
                    config_path,
                    CONFIG_FILE_NAME,
                    dir_path
                );
            }
            Ok(config_path)
        }
        (Some(_), Some(_)) => anyhow::bail!("Cannot specify both --config and --dir. Use one or the other."),
        (None, None) => anyhow::bail!("Must specify either --config or --dir"),
    }
}

/// Load the config, placing logs under `<dir>/logs` when a directory was given
pub fn load_config(config: Option<PathBuf>, dir: Option<PathBuf>) -> Result<Config> {
    let config_path = resolve_config_path(config, dir.clone())?;
    let mut config = Config::from_filepath(&config_path)?;

    if let Some(dir_path) = dir {
        config.logs_path = Some(dir_path.join(LOGS_DIR_NAME));
    }

    Ok(config)
}
