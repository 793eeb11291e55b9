use anyhow::Result;
use clap::Parser;
use trawl_common::observability::{init_logging, LogConfig};

mod commands;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LogConfig::default())?;

    let cli = Cli::parse();
    match cli.command {
        Command::Harvest(args) => commands::harvest(args).await?,
        Command::Fetch(args) => commands::fetch(args).await?,
        Command::Run(args) => commands::run(args).await?,
        Command::Archive(args) => commands::archive(args)?,
    }
    Ok(())
}
