//! cgarchive: archive contributions and their comment threads.
//!
//! # Usage
//!
//! ```text
//! cgarchive sync [--dry-run] [--json]   (needs CG_COOKIE and CG_USER_ID)
//! cgarchive index
//! cgarchive list [--json]
//! ```
//!
//! Global: `--config <file.yaml>`, `--data-dir <path>`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use commands::{index::IndexArgs, list::ListArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cgarchive",
    version,
    about = "Snapshot contributions and their comment threads into a local archive",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// YAML config file (default: ~/.cgarchive/config.yaml when present).
    #[arg(long, global = true, env = "CGARCHIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Archive root directory.
    #[arg(long, global = true, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch contributions and archive whatever changed since the last run.
    Sync(SyncArgs),

    /// Rebuild index.json from the archived snapshots.
    Index(IndexArgs),

    /// Show archived handles and their snapshot counts.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Index(args) => args.run(&cli.global),
        Commands::List(args) => args.run(&cli.global),
    }
}
