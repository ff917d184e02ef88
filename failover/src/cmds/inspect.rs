use anyhow::Result;
use clap::Parser;

use failover_node::actions;

use super::ConfigOpts;

#[derive(Debug, Parser)]
#[command(about = "Read the chain once and show the producer's state; submits nothing")]
pub struct Opts {
    #[command(flatten)]
    pub common: ConfigOpts,

    /// Print the report as JSON
    #[clap(long)]
    pub json: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let config = opts.common.load_config()?;
    actions::inspect_with_config(&config, opts.json).await?;
    Ok(())
}
