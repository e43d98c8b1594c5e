//! # Aegis CLI Library
//!
//! A client library and command-line tool for the Aegis security API.
//! Supports incremental, checkpointed searches over alerts, audit log
//! events, and file events.
//!
//! ## Features
//!
//! - **Checkpointed Search**: named, persisted resume points so repeated
//!   searches deliver each event at most once
//! - **Gap-Free Incremental Polling**: timestamp high-water mark plus a
//!   bounded seen-set deduplicates events that share a timestamp
//! - **Crash Tolerance**: checkpoint state is persisted after every
//!   delivered event with atomic file replacement
//! - **Lazy Pagination**: result pages are fetched from the API only as
//!   the consumer pulls events
//! - **Graceful Interrupt**: a first Ctrl+C finishes the in-flight event,
//!   a second forces immediate exit
//!
//! ## Architecture
//!
//! - [`client`] - HTTP transport and per-resource paginated search streams
//! - [`query`] - per-resource query builders with checkpoint seeding
//! - [`checkpoint`] - the cursor store and the checkpoint update algorithm
//! - [`cli`] - command implementations and output rendering
//! - [`config`] - profile resolution and logging configuration
//! - [`interrupt`] - two-stage interrupt guard for checkpointed runs

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Checkpoint store and update algorithm
pub mod checkpoint;

/// CLI command implementations
pub mod cli;

/// HTTP client and paginated search streams
pub mod client;

/// Profile and logging configuration
pub mod config;

/// Two-stage interrupt guard
pub mod interrupt;

/// Per-resource query builders
pub mod query;

/// An alert raised by a detection rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// Provider-assigned alert identifier
    pub id: String,
    /// Creation time of the alert
    pub created_at: DateTime<Utc>,
    /// Human-readable alert name
    pub name: String,
    /// Alert severity
    pub severity: Severity,
    /// Current workflow state
    pub state: AlertState,
    /// Username of the actor that triggered the alert, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Identifier of the rule that produced the alert
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

/// Alert severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational finding
    #[serde(rename = "LOW")]
    Low,
    /// Needs review
    #[serde(rename = "MODERATE")]
    Moderate,
    /// Likely exfiltration
    #[serde(rename = "HIGH")]
    High,
    /// Confirmed or imminent exfiltration
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "LOW",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MODERATE" => Ok(Severity::Moderate),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("Invalid severity: {s}")),
        }
    }
}

/// Alert workflow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertState {
    /// Newly created, not yet triaged
    #[serde(rename = "OPEN")]
    Open,
    /// Under review
    #[serde(rename = "PENDING")]
    Pending,
    /// Being actively worked
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    /// Closed
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertState::Open => "OPEN",
            AlertState::Pending => "PENDING",
            AlertState::InProgress => "IN_PROGRESS",
            AlertState::Resolved => "RESOLVED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(AlertState::Open),
            "PENDING" => Ok(AlertState::Pending),
            "IN_PROGRESS" => Ok(AlertState::InProgress),
            "RESOLVED" => Ok(AlertState::Resolved),
            _ => Err(format!("Invalid alert state: {s}")),
        }
    }
}

/// An audit log event.
///
/// Audit events carry no stable identifier; the checkpoint subsystem
/// derives one from a content hash over the canonical serialization
/// (see [`checkpoint::identity`]). The `detail` map captures whatever
/// additional fields the API returns for the event type so the hash
/// covers the full payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Time the audited action occurred
    pub timestamp: DateTime<Utc>,
    /// Event type discriminator (e.g. "audit_log::logged_in")
    #[serde(rename = "type")]
    pub event_type: String,
    /// Identifier of the acting user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Display name of the acting user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    /// Remaining event-type-specific fields
    #[serde(flatten)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

/// A file activity event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEvent {
    /// Provider-assigned event identifier
    pub event_id: String,
    /// Time the file activity was observed
    pub timestamp: DateTime<Utc>,
    /// Action observed (e.g. "file-created", "file-shared")
    pub event_action: String,
    /// File name, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Full file path, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// SHA-256 of the file contents, when computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Username associated with the activity, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}
