mod cli;
mod commands;
mod context;
mod output;
mod timing;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use origin_business::BusinessConfig;

use crate::cli::{Cli, Commands};
use crate::commands::{run_details, run_list, run_request};
use crate::context::build_session_ctx;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    timing::init_tracing(cli.verbose, cli.timing);

    let config = BusinessConfig::from_env().context("Invalid ORIGIN_* configuration")?;

    match cli.command {
        Commands::List {
            session,
            page,
            page_size,
            mine,
            filter,
        } => {
            let config = match page_size {
                Some(0) => anyhow::bail!("--page-size must be at least 1"),
                Some(size) => BusinessConfig::new(config.base_url, size),
                None => config,
            };
            let ctx = build_session_ctx(&session, &config)?;
            run_list(ctx, page, mine, filter).await
        }
        Commands::Details { session, id } => {
            let ctx = build_session_ctx(&session, &config)?;
            run_details(ctx, id)
        }
        Commands::Request { session, id, yes } => {
            let ctx = build_session_ctx(&session, &config)?;
            run_request(ctx, id, yes).await
        }
    }
}
