mod cmd_merge;
mod cmd_show;
mod cmd_validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linkmerge")]
#[command(about = "Validate, inspect, and merge robot link hierarchies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log every accepted edit to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a tree snapshot for well-formedness
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print a tree snapshot as an indented outline
    Show {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Replay edits against an existing and a loaded tree, then finalize
    Merge {
        /// Snapshot derived from the assembly
        #[arg(long)]
        existing: PathBuf,

        /// Snapshot loaded from a saved configuration
        #[arg(long)]
        loaded: PathBuf,

        /// Plan of edits to apply (use - for stdin)
        #[arg(long)]
        plan: Option<String>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { input } => cmd_validate::run(input),
        Commands::Show { input } => cmd_show::run(input),
        Commands::Merge {
            existing,
            loaded,
            plan,
            output,
        } => cmd_merge::run(existing, loaded, plan, output, cli.pretty),
    }
}
