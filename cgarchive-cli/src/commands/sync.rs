//! `cgarchive sync`: fetch contributions and archive what changed.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use cgarchive_api::HttpGateway;
use cgarchive_core::{config, Config, ConfigOverrides};
use cgarchive_store::ArchiveStore;
use cgarchive_sync::{pipeline, HandleReport, RunOptions, RunReport, StepOutcome};

use crate::GlobalArgs;

/// Arguments for `cgarchive sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Session cookie sent with every request.
    #[arg(long, env = "CG_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Numeric user id of the contributor.
    #[arg(long, env = "CG_USER_ID")]
    pub user_id: Option<String>,

    /// Service root, e.g. https://www.codingame.com/services
    #[arg(long, env = "CG_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Comma-separated handles to archive in addition to the listed ones.
    #[arg(long, env = "EXTRA_HANDLES")]
    pub extra_handles: Option<String>,

    /// Comma-separated allow-list; only these handles are processed.
    #[arg(long, env = "TEST_HANDLES")]
    pub test_handles: Option<String>,

    /// Show what would be archived without fetching details or writing files.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let dry_run = self.dry_run;
        let json = self.json;

        let file = config::load_optional(global.config.as_deref())
            .context("failed to load config file")?;
        let overrides = ConfigOverrides {
            session_token: self.cookie,
            user_id: self.user_id,
            data_dir: global.data_dir.clone(),
            base_url: self.base_url,
            timeout_secs: self.timeout_secs,
            extra_handles: self.extra_handles,
            test_handles: self.test_handles,
        };
        let config = Config::resolve(file, overrides).context("invalid configuration")?;

        let store = ArchiveStore::open(&config.data_dir).with_context(|| {
            format!("failed to open archive at {}", config.data_dir.display())
        })?;
        let api = HttpGateway::from_config(&config);
        let options = RunOptions::from_config(&config, dry_run);
        tracing::debug!(
            data_dir = %config.data_dir.display(),
            base_url = %config.base_url,
            dry_run,
            "starting sync"
        );

        let report = pipeline::run(&api, &store, &options).context("sync failed")?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report, dry_run);
        }
        Ok(())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if report.handles.is_empty() {
        println!("{prefix}✓ nothing to archive");
        return;
    }

    let status = if report.failures() == 0 {
        "✓".green().bold()
    } else {
        "!".yellow().bold()
    };
    println!(
        "{prefix}{status} {} contribution(s) checked ({} written, {} failed)",
        report.handles.len(),
        report.snapshots_written(),
        report.failures()
    );

    for handle in &report.handles {
        print_handle(handle);
    }
}

fn print_handle(report: &HandleReport) {
    println!(
        "  {}  contribution {}  comments {}",
        report.handle.to_string().bold(),
        step_label(&report.contribution),
        step_label(&report.comments)
    );
    for step in [&report.contribution, &report.comments] {
        match step {
            StepOutcome::Written { path } => println!("      ✎  {}", path.display()),
            StepOutcome::Failed { reason } => println!("      ✗  {}", reason.red()),
            StepOutcome::WouldWrite { reason } => println!("      ~  {reason}"),
            StepOutcome::Unchanged => {}
        }
    }
}

fn step_label(step: &StepOutcome) -> String {
    match step {
        StepOutcome::Unchanged => "·".bright_black().to_string(),
        StepOutcome::Written { .. } => "✎".green().to_string(),
        StepOutcome::WouldWrite { .. } => "~".cyan().to_string(),
        StepOutcome::Failed { .. } => "✗".red().to_string(),
    }
}
