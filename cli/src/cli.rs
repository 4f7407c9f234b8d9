use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use origin_business::PageFilter;
use origin_business::producing_assets::FilterProperty;

#[derive(Parser)]
#[command(name = "origin")]
#[command(about = "Browse producing assets and request I-RECs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Where the data comes from and who is looking at it.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Ledger fixture (JSON)
    #[arg(long, short = 'l', env = "ORIGIN_LEDGER")]
    pub ledger: PathBuf,

    /// Address of the acting user
    #[arg(long, short = 'u', env = "ORIGIN_USER")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one page of the producing asset table
    List {
        #[command(flatten)]
        session: SessionArgs,

        /// Page to show, starting at 1
        #[arg(long, short = 'p', default_value = "1")]
        page: u32,

        /// Rows per page (overrides ORIGIN_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,

        /// Only show assets owned by the acting user
        #[arg(long)]
        mine: bool,

        /// Column filter, e.g. `country=DE`. Repeatable.
        #[arg(long, short = 'f', value_parser = parse_filter)]
        filter: Vec<PageFilter>,
    },
    /// Print the detail view path of an asset
    Details {
        #[command(flatten)]
        session: SessionArgs,

        /// Asset ID
        id: u64,
    },
    /// Request I-RECs for the unrequested smart meter reads of an asset
    Request {
        #[command(flatten)]
        session: SessionArgs,

        /// Asset ID
        id: u64,

        /// Confirm without prompting
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Parse `property=value`; the property must be one the table can filter on.
pub fn parse_filter(raw: &str) -> Result<PageFilter, String> {
    let (property, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `property=value`, got `{raw}`"))?;

    let property = property.trim();
    if FilterProperty::from_key(property).is_none() {
        let known: Vec<&str> = FilterProperty::ALL.iter().map(|p| p.key()).collect();
        return Err(format!(
            "unknown filter property `{property}` (expected one of: {})",
            known.join(", ")
        ));
    }

    Ok(PageFilter::new(property, value.trim()))
}
