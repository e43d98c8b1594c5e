//! Command-line interface.
//!
//! Three resource subcommands (`alerts`, `audit-log`, `file-events`),
//! each with the same action set: `search`, `clear-checkpoint` and
//! `list-checkpoints`. Checkpoint maintenance is purely local and never
//! needs the API secret.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::checkpoint::{CursorStore, ResourceKind};
use crate::client::http::ApiHttpClient;
use crate::config::{LocalProfile, Profile};
use crate::{AlertState, Severity};

pub mod alerts;
pub mod audit_log;
pub mod error;
pub mod file_events;
pub mod render;

pub use error::CliError;
pub use render::OutputFormat;

/// Incremental search client for the Aegis security API.
#[derive(Debug, Parser)]
#[command(name = "aegis", version, about)]
pub struct Cli {
    /// API client identifier (falls back to AEGIS_API_CLIENT_ID)
    #[arg(long, global = true)]
    pub api_client_id: Option<String>,

    /// API base URL (falls back to AEGIS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory for persisted state (falls back to AEGIS_CONFIG_DIR)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log filter directive (falls back to RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Resource subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level resource subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search alerts raised by detection rules
    Alerts {
        /// Alert action to run
        #[command(subcommand)]
        action: AlertsAction,
    },
    /// Search the administrative audit log
    AuditLog {
        /// Audit log action to run
        #[command(subcommand)]
        action: AuditLogAction,
    },
    /// Search file activity events
    FileEvents {
        /// File event action to run
        #[command(subcommand)]
        action: FileEventsAction,
    },
}

/// Upper bound for `--overlap`: one year in seconds. Keeps the value
/// comfortably inside `chrono::Duration` range; anything larger is an
/// operator mistake, not a window.
pub const MAX_OVERLAP_SECS: u64 = 31_536_000;

/// Flags shared by every checkpointed search.
#[derive(Debug, clap::Args)]
pub struct SearchCommon {
    /// Named checkpoint to resume from and update while streaming
    #[arg(long)]
    pub checkpoint: Option<String>,

    /// Seconds to widen a resumed window backwards, for upstream events
    /// that arrive slightly out of order (at most one year)
    #[arg(
        long,
        default_value_t = 0,
        requires = "checkpoint",
        value_parser = clap::value_parser!(u64).range(..=MAX_OVERLAP_SECS)
    )]
    pub overlap: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Alert actions.
#[derive(Debug, Subcommand)]
pub enum AlertsAction {
    /// Search alerts, ascending by creation time
    Search(AlertSearchArgs),
    /// Delete a named alert checkpoint
    ClearCheckpoint {
        /// Checkpoint name
        name: String,
    },
    /// List stored alert checkpoints for this credential
    ListCheckpoints,
}

/// Filters for the alert search.
#[derive(Debug, clap::Args)]
pub struct AlertSearchArgs {
    /// Earliest creation time (RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')
    #[arg(long, value_parser = parse_time_flexible)]
    pub start: Option<DateTime<Utc>>,

    /// Latest creation time
    #[arg(long, value_parser = parse_time_flexible)]
    pub end: Option<DateTime<Utc>>,

    /// Filter to one workflow state (OPEN, PENDING, IN_PROGRESS, RESOLVED)
    #[arg(long, value_parser = AlertState::from_str)]
    pub state: Option<AlertState>,

    /// Filter to one severity (LOW, MODERATE, HIGH, CRITICAL)
    #[arg(long, value_parser = Severity::from_str)]
    pub severity: Option<Severity>,

    /// Filter to alerts produced by one rule
    #[arg(long)]
    pub rule_id: Option<String>,

    /// Checkpoint and output flags
    #[command(flatten)]
    pub common: SearchCommon,
}

/// Audit log actions.
#[derive(Debug, Subcommand)]
pub enum AuditLogAction {
    /// Search audit events, ascending by timestamp
    Search(AuditLogSearchArgs),
    /// Delete a named audit log checkpoint
    ClearCheckpoint {
        /// Checkpoint name
        name: String,
    },
    /// List stored audit log checkpoints for this credential
    ListCheckpoints,
}

/// Filters for the audit log search.
#[derive(Debug, clap::Args)]
pub struct AuditLogSearchArgs {
    /// Earliest event time (RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')
    #[arg(long, value_parser = parse_time_flexible)]
    pub start: Option<DateTime<Utc>>,

    /// Latest event time
    #[arg(long, value_parser = parse_time_flexible)]
    pub end: Option<DateTime<Utc>>,

    /// Filter to these event types (repeatable)
    #[arg(long = "event-type")]
    pub event_types: Vec<String>,

    /// Filter to these actor identifiers (repeatable)
    #[arg(long = "actor-id")]
    pub actor_ids: Vec<String>,

    /// Checkpoint and output flags
    #[command(flatten)]
    pub common: SearchCommon,
}

/// File event actions.
#[derive(Debug, Subcommand)]
pub enum FileEventsAction {
    /// Search file events, ascending by event timestamp
    Search(FileEventSearchArgs),
    /// Delete a named file event checkpoint
    ClearCheckpoint {
        /// Checkpoint name
        name: String,
    },
    /// List stored file event checkpoints for this credential
    ListCheckpoints,
}

/// Filters for the file event search.
#[derive(Debug, clap::Args)]
pub struct FileEventSearchArgs {
    /// Earliest event time (RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')
    #[arg(long, value_parser = parse_time_flexible)]
    pub start: Option<DateTime<Utc>>,

    /// Latest event time
    #[arg(long, value_parser = parse_time_flexible)]
    pub end: Option<DateTime<Utc>>,

    /// Filter to one observed action (e.g. "file-shared")
    #[arg(long)]
    pub event_action: Option<String>,

    /// Filter to events touching one file name
    #[arg(long)]
    pub file_name: Option<String>,

    /// Filter to one user's activity
    #[arg(long)]
    pub user: Option<String>,

    /// Checkpoint and output flags
    #[command(flatten)]
    pub common: SearchCommon,
}

/// Global flags every command can reach.
#[derive(Debug)]
pub struct Globals {
    /// `--api-client-id`
    pub api_client_id: Option<String>,
    /// `--api-url`
    pub api_url: Option<String>,
    /// `--config-dir`
    pub config_dir: Option<PathBuf>,
}

impl Globals {
    /// Resolve the local (credential-free) profile subset.
    pub fn local(&self) -> Result<LocalProfile, CliError> {
        Ok(LocalProfile::resolve(
            self.api_client_id.as_deref(),
            self.config_dir.as_ref(),
        )?)
    }

    /// Resolve the full profile and authenticate against the API.
    pub async fn connect(&self) -> Result<(Profile, ApiHttpClient), CliError> {
        let profile = Profile::resolve(
            self.api_client_id.as_deref(),
            self.api_url.as_deref(),
            self.config_dir.as_ref(),
        )?;
        let http = ApiHttpClient::connect(&profile).await?;
        Ok((profile, http))
    }
}

/// Dispatch a parsed invocation.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let globals = Globals {
        api_client_id: cli.api_client_id,
        api_url: cli.api_url,
        config_dir: cli.config_dir,
    };

    match cli.command {
        Commands::Alerts { action } => alerts::run(action, &globals).await,
        Commands::AuditLog { action } => audit_log::run(action, &globals).await,
        Commands::FileEvents { action } => file_events::run(action, &globals).await,
    }
}

/// Open the checkpoint store for one resource kind.
pub(crate) fn open_store(globals: &Globals, kind: ResourceKind) -> Result<CursorStore, CliError> {
    let local = globals.local()?;
    Ok(CursorStore::new(
        &local.config_root,
        &local.api_client_id,
        kind,
    ))
}

/// Delete a named checkpoint; shared by all three resources.
pub(crate) fn clear_checkpoint(
    globals: &Globals,
    kind: ResourceKind,
    name: &str,
) -> Result<(), CliError> {
    open_store(globals, kind)?.delete(name)?;
    info!(checkpoint = name, resource = kind.as_str(), "Checkpoint cleared");
    println!("Checkpoint '{name}' cleared.");
    Ok(())
}

/// Print the stored checkpoints for one resource kind.
pub(crate) fn list_checkpoints(globals: &Globals, kind: ResourceKind) -> Result<(), CliError> {
    let checkpoints = open_store(globals, kind)?.list_all()?;
    if checkpoints.is_empty() {
        println!("No checkpoints found.");
        return Ok(());
    }
    for checkpoint in checkpoints {
        println!("{:<24}  {}", checkpoint.name, checkpoint.value);
    }
    Ok(())
}

/// Parse a time flag: RFC 3339, 'YYYY-MM-DD HH:MM:SS', or a bare date
/// taken as midnight UTC.
pub fn parse_time_flexible(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(format!(
        "invalid time '{s}'; expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'"
    ))
}
