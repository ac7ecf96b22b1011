use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(
    name = "assignview",
    version = VERSION,
    about = "Browse and diff data assignment feeds"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long = "store-dir", global = true)]
    pub store_dir: Option<PathBuf>,
    /// Context grouping policy: split (default) or merge.
    #[arg(long, global = true)]
    pub policy: Option<String>,
    /// Reject records missing an identifying field.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub strict: bool,
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    /// Print JSON instead of tables.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a feed, cache it and print the plan overview.
    Load { input: PathBuf },
    Plans {
        /// Read this feed instead of the cached one. The cache is not touched.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    Show {
        plan: String,
        #[arg(long)]
        trns: Option<String>,
        #[arg(long, default_value_t = 0)]
        context: usize,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    Compare {
        plan: String,
        #[arg(long)]
        trns: String,
        #[arg(long, default_value_t = 0)]
        context: usize,
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[arg(long = "newest-first", action = ArgAction::SetTrue)]
        newest_first: bool,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print the paths that differ between two JSON records.
    Diff {
        left: PathBuf,
        right: PathBuf,
        #[arg(long, action = ArgAction::SetTrue)]
        leaves: bool,
    },
    /// Remove the cached feed.
    Clear,
}
