mod cli;
mod commands;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use assignview_core::{GroupOptions, GroupingPolicy, KeySchema, ViewerConfig, DEFAULT_CONFIG};

use crate::cli::{Cli, Command};

/// Settings resolved from the config file, environment and flags, in
/// increasing order of precedence.
pub struct Runtime {
    pub options: GroupOptions,
    pub schema: KeySchema,
    pub store_dir: PathBuf,
    pub json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let runtime = resolve_runtime(&cli)?;
    match cli.command {
        Command::Load { input } => commands::load(&runtime, &input),
        Command::Plans { input } => commands::plans(&runtime, input.as_deref()),
        Command::Show {
            plan,
            trns,
            context,
            input,
        } => commands::show(&runtime, &plan, trns.as_deref(), context, input.as_deref()),
        Command::Compare {
            plan,
            trns,
            context,
            index,
            newest_first,
            input,
        } => commands::compare(
            &runtime,
            commands::Selection {
                plan: &plan,
                trns: &trns,
                context,
            },
            index,
            newest_first,
            input.as_deref(),
        ),
        Command::Diff {
            left,
            right,
            leaves,
        } => commands::diff(&runtime, &left, &right, leaves),
        Command::Clear => commands::clear(&runtime),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_runtime(cli: &Cli) -> Result<Runtime> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = ViewerConfig::load(&config_path)?;
    config.apply_env()?;
    resolve_with(config, cli)
}

fn resolve_with(config: ViewerConfig, cli: &Cli) -> Result<Runtime> {
    let mut options = config.group_options();
    if let Some(raw) = &cli.policy {
        options.policy = GroupingPolicy::parse(raw)
            .ok_or_else(|| anyhow!("unknown grouping policy '{raw}'. choose split|merge"))?;
    }
    if cli.strict {
        options.strict = true;
    }
    Ok(Runtime {
        options,
        schema: config.key_schema(),
        store_dir: cli.store_dir.clone().unwrap_or_else(|| config.store_dir()),
        json: cli.json,
    })
}
