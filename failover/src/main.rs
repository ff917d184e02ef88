mod cmds;

use anyhow::Result;
use clap::{Parser, Subcommand};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_BRANCH"),
    "@",
    env!("GIT_COMMIT"),
    ")"
);

#[derive(Parser)]
#[command(name = "failover")]
#[command(version = VERSION)]
#[command(disable_version_flag = true)]
#[command(about = "Watches a block producer and rotates its signing key when it stops producing", long_about = None)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the failover monitor until interrupted")]
    Run(cmds::run::Opts),

    #[command(about = "Read the chain once and show what the monitor would see")]
    Inspect(cmds::inspect::Opts),

    #[command(about = "Configuration related commands")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    #[command(about = "Validate a configuration file and print the resolved settings")]
    Check(cmds::config::check::Opts),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Run(opts) => cmds::run::run(opts).await?,
        Commands::Inspect(opts) => cmds::inspect::run(opts).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Check(opts) => cmds::config::check::run(opts).await?,
        },
    }

    Ok(())
}
