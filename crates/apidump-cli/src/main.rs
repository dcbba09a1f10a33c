mod cmd_compare;
mod cmd_dump;
mod cmd_show;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apidump")]
#[command(about = "Dump, show, and compare the public API of module trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump the public API of modules and their public submodules
    Dump(cmd_dump::DumpArgs),
    /// Print a saved snapshot as text
    Show {
        /// Snapshot file
        input: PathBuf,
    },
    /// Compare two saved snapshots; exits with 1 if their APIs differ
    Compare {
        /// Older snapshot file
        old: PathBuf,

        /// Newer snapshot file
        new: PathBuf,

        /// Show a unified diff of the text renderings instead of entry lists
        #[arg(long)]
        unified: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Dump(args) => cmd_dump::run(args, cli.pretty).map(|()| ExitCode::SUCCESS),
        Commands::Show { input } => cmd_show::run(input).map(|()| ExitCode::SUCCESS),
        Commands::Compare { old, new, unified } => cmd_compare::run(old, new, unified),
    }
}
