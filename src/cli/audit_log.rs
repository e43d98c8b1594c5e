//! `aegis audit-log` command implementations.

use chrono::Duration;
use futures_util::TryStreamExt;
use tracing::info;

use crate::checkpoint::{
    identity, CheckpointError, CheckpointedStream, PersistMode, ResourceKind, SearchError,
};
use crate::cli::{self, AuditLogAction, AuditLogSearchArgs, CliError, Globals};
use crate::client::AuditLogClient;
use crate::query::AuditLogQuery;

/// Dispatch an audit log action.
pub async fn run(action: AuditLogAction, globals: &Globals) -> Result<(), CliError> {
    match action {
        AuditLogAction::Search(args) => search(args, globals).await,
        AuditLogAction::ClearCheckpoint { name } => {
            cli::clear_checkpoint(globals, ResourceKind::AuditLog, &name)
        }
        AuditLogAction::ListCheckpoints => cli::list_checkpoints(globals, ResourceKind::AuditLog),
    }
}

async fn search(args: AuditLogSearchArgs, globals: &Globals) -> Result<(), CliError> {
    let mut query = AuditLogQuery::new();
    query.start_time = args.start;
    query.end_time = args.end;
    query.event_types = args.event_types;
    query.actor_ids = args.actor_ids;

    match &args.common.checkpoint {
        Some(name) => {
            let store = cli::open_store(globals, ResourceKind::AuditLog)?;
            let seeded = query.seed_from_checkpoint(
                &store,
                name,
                Duration::seconds(args.common.overlap as i64),
            )?;
            if seeded {
                info!(checkpoint = %name, start = ?query.start_time, "Resuming from checkpoint");
            }

            let guard = crate::interrupt::install();
            let (_, http) = globals.connect().await?;
            let stream = AuditLogClient::new(http).search(query);
            // Audit events carry no server identifier; hash the content.
            let checkpointed = CheckpointedStream::new(
                stream,
                store,
                name.clone(),
                Box::new(|event: &crate::AuditEvent| {
                    identity::content_hash(event).map_err(CheckpointError::Serialize)
                }),
                |event| event.timestamp,
                PersistMode::HighWaterMark,
            );
            cli::render::emit(Box::pin(checkpointed), args.common.format, Some(&guard)).await?;
        }
        None => {
            let (_, http) = globals.connect().await?;
            let stream = AuditLogClient::new(http)
                .search(query)
                .map_err(SearchError::from);
            cli::render::emit(Box::pin(stream), args.common.format, None).await?;
        }
    }
    Ok(())
}
