// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! plumb - replaces `context.TODO()` with real contexts.

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PLUMB_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "plumb", version, about = "Plumb context.Context through call chains")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report context requests and the fixes that plumb them
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Package patterns: ./..., dir/... or an import path
    #[arg(default_value = "./...")]
    pub patterns: Vec<String>,

    /// Source root the import paths are relative to
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Read-only module cache [env: PLUMB_MODCACHE]
    #[arg(long)]
    pub modcache: Option<PathBuf>,

    /// Write the suggested fixes to disk
    #[arg(long)]
    pub fix: bool,

    /// Load and save cross-package facts in this file
    #[arg(long)]
    pub facts: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Human)]
    pub format: Format,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    output::init();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check(args) => commands::check::cmd_check(&args),
    }
}
