use anyhow::Result;
use clap::Parser;

use failover_node::actions;
use failover_node::logging;

use super::ConfigOpts;

#[derive(Debug, Parser)]
#[command(about = "Run the failover monitor until Ctrl-C")]
pub struct Opts {
    #[command(flatten)]
    pub common: ConfigOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config = opts.common.load_config()?;
    logging::init_logging(config.logs_path.clone(), config.logs_enabled, config.log_level.clone())?;
    log::info!("failover {}", env!("CARGO_PKG_VERSION"));

    actions::run(&config).await
}
