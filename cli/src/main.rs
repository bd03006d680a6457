mod cli;
mod commands;
mod context;
mod fixtures;
mod output;
mod timing;

use anyhow::Result;
use clap::Parser as _;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::commands::{run_browse, run_list, run_show};
use crate::context::build_store;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    timing::init_tracing(cli.verbose, cli.timing);
    debug!(base_url = %cli.base_url, "starting");

    let store = build_store(&cli.base_url);
    match cli.command.unwrap_or(Commands::Browse) {
        Commands::List { query } => run_list(store, query).await,
        Commands::Show { id } => run_show(store, id).await,
        Commands::Browse => run_browse(store).await,
    }
}
