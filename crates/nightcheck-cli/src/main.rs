//! NightCheck - nightly health checks for scheduled scripts
//!
//! The `nightcheck` command syntax-checks deployed scripts, finds their logs
//! through the crontab and reports runtime errors found in those logs.
//!
//! ## Commands
//!
//! - `run`: Check every script, store the results and print the report
//! - `report`: Print today's stored results
//! - `scan-log`: Run the runtime error extractor on log files
//! - `locate`: Show the log files the crontab sends a script's output to
//! - `prune`: Clear stored results older than the retention window

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use nightcheck_core::{
    extract_from_log, locate_logs, render_run_report, render_table, Family, NightCheckConfig,
    ReportRow, RunSpan,
};
use nightcheck_runner::{
    CrontabSource, NightCheckPipeline, ScheduleSource, StaticSchedule, TokioCommandRunner,
};
use nightcheck_state::{ErrorStore, SurrealErrorStore, DEFAULT_RETENTION_DAYS};

#[derive(Parser)]
#[command(name = "nightcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Nightly syntax and runtime error checks for scheduled scripts", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "NIGHTCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check all scripts, store the results and print the report
    Run {
        /// Read the scheduler table from this file instead of `crontab -l`
        #[arg(long)]
        crontab_file: Option<PathBuf>,

        /// Do not prune or write to the result store
        #[arg(long)]
        no_store: bool,

        /// Crontab owner (overrides the configured user)
        #[arg(short, long)]
        user: Option<String>,

        /// Directory to scan (repeatable; overrides the configured list)
        #[arg(short, long = "dir")]
        dirs: Vec<PathBuf>,
    },

    /// Print today's stored results
    Report {
        /// Only rows with a syntax or runtime error
        #[arg(long)]
        errors_only: bool,
    },

    /// Extract runtime errors from log files
    ScanLog {
        /// Family whose extraction rules apply (python, python3, perl, php)
        #[arg(short, long)]
        family: Family,

        /// Log files to scan
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },

    /// Show the log files a script's scheduled output is sent to
    Locate {
        /// Script path as it appears in the crontab
        script: String,

        /// Read the scheduler table from this file instead of `crontab -l`
        #[arg(long)]
        crontab_file: Option<PathBuf>,

        /// Crontab owner (overrides the configured user)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Clear stored results when the oldest row exceeds the retention window
    Prune {
        /// Retention window in days
        #[arg(long, default_value_t = DEFAULT_RETENTION_DAYS)]
        max_age_days: i64,
    },
}

fn load_config(path: Option<&Path>) -> Result<NightCheckConfig> {
    match path {
        Some(path) => NightCheckConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(NightCheckConfig::default()),
    }
}

fn schedule_source(
    config: &NightCheckConfig,
    crontab_file: Option<&Path>,
    user: Option<String>,
) -> Result<Arc<dyn ScheduleSource>> {
    match crontab_file {
        Some(path) => {
            let schedule = StaticSchedule::from_file(path)
                .with_context(|| format!("Failed to read crontab file {}", path.display()))?;
            Ok(Arc::new(schedule))
        }
        None => Ok(Arc::new(CrontabSource::new(
            Arc::new(TokioCommandRunner),
            user.unwrap_or_else(|| config.scheduler_user.clone()),
            config.command_timeout(),
        ))),
    }
}

async fn open_store() -> Result<Arc<dyn ErrorStore>> {
    let store = SurrealErrorStore::from_env()
        .await
        .context("Failed to connect to the NightCheck database")?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    nightcheck_core::init_tracing(cli.json, level);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            crontab_file,
            no_store,
            user,
            dirs,
        } => {
            if !dirs.is_empty() {
                config.directories = dirs;
            }
            cmd_run(config, crontab_file.as_deref(), no_store, user).await
        }
        Commands::Report { errors_only } => cmd_report(errors_only).await,
        Commands::ScanLog { family, logs } => cmd_scan_log(&config, family, &logs),
        Commands::Locate {
            script,
            crontab_file,
            user,
        } => cmd_locate(&config, &script, crontab_file.as_deref(), user).await,
        Commands::Prune { max_age_days } => cmd_prune(max_age_days).await,
    }
}

/// Full run: prune, discover, check, store, report.
async fn cmd_run(
    config: NightCheckConfig,
    crontab_file: Option<&Path>,
    no_store: bool,
    user: Option<String>,
) -> Result<()> {
    if config.directories.is_empty() {
        anyhow::bail!("No directories to scan; set `directories` in the config or pass --dir");
    }

    let schedule = schedule_source(&config, crontab_file, user)?;
    let mut pipeline = NightCheckPipeline::new(config, Arc::new(TokioCommandRunner), schedule)?;
    if !no_store {
        pipeline = pipeline.with_store(open_store().await?);
    }

    let report = pipeline.run().await?;

    let mut out = io::stdout().lock();
    render_run_report(&mut out, &report).context("Failed to write report")?;
    out.flush()?;
    Ok(())
}

/// Print today's stored rows.
async fn cmd_report(errors_only: bool) -> Result<()> {
    let store = open_store().await?;
    let today = Utc::now().date_naive();

    let rows = if errors_only {
        store.errors_on(today).await?
    } else {
        store.rows_on(today).await?
    };

    if rows.is_empty() {
        println!("No results recorded for {}", today);
        return Ok(());
    }

    let rows: Vec<ReportRow> = rows
        .into_iter()
        .map(|r| ReportRow::new(r.caller, r.syntax_err, r.runtime_err))
        .collect();

    let mut out = io::stdout().lock();
    render_table(&mut out, &rows).context("Failed to write report")?;
    out.flush()?;
    Ok(())
}

/// Run the extractor on logs directly.
fn cmd_scan_log(config: &NightCheckConfig, family: Family, logs: &[PathBuf]) -> Result<()> {
    let family_config = config
        .family(family)
        .with_context(|| format!("Family {} is not configured", family))?;

    let _span = RunSpan::enter(&uuid::Uuid::new_v4().to_string());
    let rows: Vec<ReportRow> = logs
        .iter()
        .map(|log| {
            let verdict = extract_from_log(family_config, log);
            info!(log = %log.display(), clean = verdict.is_clean(), "log scanned");
            ReportRow::new(log.display().to_string(), "-", verdict.as_text())
        })
        .collect();

    let mut out = io::stdout().lock();
    render_table(&mut out, &rows).context("Failed to write report")?;
    out.flush()?;
    Ok(())
}

/// Print the log paths the scheduler table routes `script` to.
async fn cmd_locate(
    config: &NightCheckConfig,
    script: &str,
    crontab_file: Option<&Path>,
    user: Option<String>,
) -> Result<()> {
    let schedule = schedule_source(config, crontab_file, user)?;
    let text = schedule
        .fetch()
        .await
        .context("Failed to read the scheduler table")?;

    let logs = locate_logs(script, &text);
    if logs.is_empty() {
        println!("No log files found for '{}'", script);
        return Ok(());
    }
    for log in logs {
        println!("{}", log.display());
    }
    Ok(())
}

/// Apply the retention rule.
async fn cmd_prune(max_age_days: i64) -> Result<()> {
    let store = open_store().await?;
    let today = Utc::now().date_naive();

    if store.truncate_if_older_than(today, max_age_days).await? {
        nightcheck_core::emit_pruned(max_age_days);
        println!("Cleared results older than {} days", max_age_days);
    } else {
        println!("Nothing to prune");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_options() {
        let cli = Cli::try_parse_from([
            "nightcheck",
            "run",
            "--crontab-file",
            "/tmp/cron.txt",
            "--no-store",
            "--dir",
            "/opt/scripts",
            "--dir",
            "/opt/jobs",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                crontab_file,
                no_store,
                dirs,
                user,
            } => {
                assert_eq!(crontab_file, Some(PathBuf::from("/tmp/cron.txt")));
                assert!(no_store);
                assert_eq!(dirs.len(), 2);
                assert!(user.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_scan_log_family() {
        let cli = Cli::try_parse_from([
            "nightcheck",
            "scan-log",
            "--family",
            "python3",
            "/var/log/a.log",
        ])
        .unwrap();
        match cli.command {
            Commands::ScanLog { family, logs } => {
                assert_eq!(family, Family::Python3);
                assert_eq!(logs, vec![PathBuf::from("/var/log/a.log")]);
            }
            _ => panic!("expected scan-log"),
        }
    }

    #[test]
    fn test_unknown_family_is_rejected() {
        let result = Cli::try_parse_from([
            "nightcheck",
            "scan-log",
            "--family",
            "ruby",
            "/var/log/a.log",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_prune_default_window() {
        let cli = Cli::try_parse_from(["nightcheck", "prune"]).unwrap();
        match cli.command {
            Commands::Prune { max_age_days } => assert_eq!(max_age_days, 7),
            _ => panic!("expected prune"),
        }
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config, NightCheckConfig::default());
    }

    #[test]
    fn test_scan_log_reads_files() {
        let mut log = tempfile::NamedTempFile::new().unwrap();
        writeln!(log, "Permission denied to open file").unwrap();
        let config = NightCheckConfig::default();
        cmd_scan_log(&config, Family::Python, &[log.path().to_path_buf()]).unwrap();
    }

    #[tokio::test]
    async fn test_locate_from_crontab_file() {
        let mut cron = tempfile::NamedTempFile::new().unwrap();
        writeln!(cron, "30 2 * * * /scripts/foo.py >> /var/log/foo.log 2>&1").unwrap();
        let config = NightCheckConfig::default();
        cmd_locate(&config, "foo.py", Some(cron.path()), None)
            .await
            .unwrap();
    }
}
