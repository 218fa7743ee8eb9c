//! Command line front-end of the review catalog.
//!
//! Loads the configuration, opens one catalog session against the configured store and runs a
//! single command: creating the tables, bulk loading files, or one of the lookups.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::load_loader_config;
use crate::core::run;
use crate::error::LoaderResult;

mod config;
mod core;
mod error;

#[derive(Debug, Parser)]
#[command(name = "loader", version, about, arg_required_else_help = true)]
struct AppArgs {
    /// Directory holding `base.yaml` and the environment files (default: ./configuration)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the catalog tables if they do not exist
    CreateTables,
    /// Bulk load newline-delimited item and review files
    Load(LoadArgs),
    /// Print one item
    Item { asin: String },
    /// Print the reviews written by a reviewer, newest first
    UserReviews { reviewer_id: String },
    /// Print the reviews of an item, newest first
    ItemReviews { asin: String },
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Items file, one JSON object per line
    #[arg(long)]
    items: Option<PathBuf>,
    /// Reviews file, one JSON object per line
    #[arg(long)]
    reviews: Option<PathBuf>,
    /// Items to print once loading has finished
    #[arg(long = "show-item")]
    show_items: Vec<String>,
    /// Reviewers whose reviews are printed once loading has finished
    #[arg(long = "show-user-reviews")]
    show_user_reviews: Vec<String>,
    /// Items whose reviews are printed once loading has finished
    #[arg(long = "show-item-reviews")]
    show_item_reviews: Vec<String>,
}

fn main() {
    if let Err(err) = try_main() {
        eprint!("{}", err.render_report());
        std::process::exit(1);
    }
}

fn try_main() -> LoaderResult<()> {
    let args = AppArgs::parse();

    telemetry::tracing::init_tracing(env!("CARGO_BIN_NAME"))
        .map_err(crate::error::LoaderError::config)?;

    let loader_config = load_loader_config(args.config_dir.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(loader_config, args.command))
}
