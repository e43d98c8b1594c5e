//! Streaming output rendering.
//!
//! Events are written as they arrive from the (lazy) search stream, one
//! at a time, so checkpoint persistence and rendering stay in lockstep:
//! an event is on screen only after its checkpoint state is durable.
//! JSON output is emitted as JSON lines for the same reason.

use std::io::Write;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::checkpoint::SearchError;
use crate::cli::CliError;
use crate::interrupt::SharedInterrupt;
use crate::{AlertEvent, AuditEvent, FileEvent};

/// Output formats for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Fixed-width columns for terminals
    Table,
    /// RFC 4180 CSV with a header row
    Csv,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        };
        write!(f, "{s}")
    }
}

/// Tabular projection of an event type.
pub trait Render: Serialize {
    /// Column labels paired with their table widths.
    fn columns() -> &'static [(&'static str, usize)];

    /// One table/CSV cell per column, in column order.
    fn row(&self) -> Vec<String>;
}

impl Render for AlertEvent {
    fn columns() -> &'static [(&'static str, usize)] {
        &[
            ("CREATED AT", 25),
            ("ID", 14),
            ("SEVERITY", 9),
            ("STATE", 12),
            ("NAME", 32),
            ("ACTOR", 24),
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.created_at.to_rfc3339(),
            self.id.clone(),
            self.severity.to_string(),
            self.state.to_string(),
            self.name.clone(),
            self.actor.clone().unwrap_or_default(),
        ]
    }
}

impl Render for AuditEvent {
    fn columns() -> &'static [(&'static str, usize)] {
        &[
            ("TIMESTAMP", 25),
            ("TYPE", 28),
            ("ACTOR ID", 14),
            ("ACTOR", 24),
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.event_type.clone(),
            self.actor_id.clone().unwrap_or_default(),
            self.actor_name.clone().unwrap_or_default(),
        ]
    }
}

impl Render for FileEvent {
    fn columns() -> &'static [(&'static str, usize)] {
        &[
            ("TIMESTAMP", 25),
            ("EVENT ID", 14),
            ("ACTION", 18),
            ("FILE", 32),
            ("USER", 24),
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.event_id.clone(),
            self.event_action.clone(),
            self.file_name.clone().unwrap_or_default(),
            self.user.clone().unwrap_or_default(),
        ]
    }
}

/// A search stream with checkpoint-aware errors, ready for rendering.
pub type RenderStream<E> = Pin<Box<dyn Stream<Item = Result<E, SearchError>> + Send>>;

enum Sink {
    Table,
    Csv(csv::Writer<std::io::Stdout>),
    Json,
}

/// Consume `events`, rendering each to stdout as it arrives.
///
/// When an interrupt guard is supplied, cancellation is checked between
/// events: the in-flight event is always fully delivered and persisted
/// before the stream is abandoned. Returns the number of events written.
pub async fn emit<E: Render>(
    mut events: RenderStream<E>,
    format: OutputFormat,
    guard: Option<&SharedInterrupt>,
) -> Result<u64, CliError> {
    let mut sink = match format {
        OutputFormat::Table => Sink::Table,
        OutputFormat::Csv => Sink::Csv(csv::Writer::from_writer(std::io::stdout())),
        OutputFormat::Json => Sink::Json,
    };

    let mut count: u64 = 0;
    let stdout = std::io::stdout();

    loop {
        if let Some(guard) = guard {
            if guard.is_cancelled() {
                warn!(delivered = count, "stopping after interrupt");
                break;
            }
        }

        let event = match events.next().await {
            Some(result) => result?,
            None => break,
        };

        if count == 0 {
            write_header::<E>(&mut sink)?;
        }
        write_event(&mut sink, &event)?;
        count += 1;
    }

    match &mut sink {
        Sink::Csv(writer) => writer.flush()?,
        _ => stdout.lock().flush()?,
    }

    if count == 0 {
        println!("No results found.");
    } else {
        info!(events = count, "search complete");
    }
    Ok(count)
}

fn write_header<E: Render>(sink: &mut Sink) -> Result<(), CliError> {
    match sink {
        Sink::Table => {
            let mut line = String::new();
            for &(label, width) in E::columns() {
                line.push_str(&format!("{label:<width$}  "));
            }
            println!("{}", line.trim_end());
            println!("{}", "-".repeat(line.trim_end().len()));
        }
        Sink::Csv(writer) => {
            writer.write_record(E::columns().iter().map(|(label, _)| *label))?;
        }
        Sink::Json => {}
    }
    Ok(())
}

fn write_event<E: Render>(sink: &mut Sink, event: &E) -> Result<(), CliError> {
    match sink {
        Sink::Table => {
            let mut line = String::new();
            for (&(_, width), cell) in E::columns().iter().zip(event.row()) {
                line.push_str(&format!("{cell:<width$}  "));
            }
            println!("{}", line.trim_end());
        }
        Sink::Csv(writer) => {
            writer.write_record(event.row())?;
        }
        Sink::Json => {
            // Serialization of our own models cannot fail structurally;
            // surface it as an output error rather than panicking.
            let json = serde_json::to_string(event)
                .map_err(|e| CliError::Output(std::io::Error::other(e)))?;
            println!("{json}");
        }
    }
    Ok(())
}
