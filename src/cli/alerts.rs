//! `aegis alerts` command implementations.

use chrono::Duration;
use futures_util::TryStreamExt;
use tracing::info;

use crate::checkpoint::{CheckpointedStream, PersistMode, ResourceKind, SearchError};
use crate::cli::{self, AlertSearchArgs, AlertsAction, CliError, Globals};
use crate::client::AlertsClient;
use crate::query::AlertQuery;

/// Dispatch an alert action.
pub async fn run(action: AlertsAction, globals: &Globals) -> Result<(), CliError> {
    match action {
        AlertsAction::Search(args) => search(args, globals).await,
        AlertsAction::ClearCheckpoint { name } => {
            cli::clear_checkpoint(globals, ResourceKind::Alert, &name)
        }
        AlertsAction::ListCheckpoints => cli::list_checkpoints(globals, ResourceKind::Alert),
    }
}

async fn search(args: AlertSearchArgs, globals: &Globals) -> Result<(), CliError> {
    let mut query = AlertQuery::new();
    query.on_or_after = args.start;
    query.on_or_before = args.end;
    query.state = args.state;
    query.severity = args.severity;
    query.rule_id = args.rule_id;

    match &args.common.checkpoint {
        Some(name) => {
            let store = cli::open_store(globals, ResourceKind::Alert)?;
            let seeded = query.seed_from_checkpoint(
                &store,
                name,
                Duration::seconds(args.common.overlap as i64),
            )?;
            if seeded {
                info!(checkpoint = %name, start = ?query.on_or_after, "Resuming from checkpoint");
            }

            let guard = crate::interrupt::install();
            let (_, http) = globals.connect().await?;
            let stream = AlertsClient::new(http).search(query);
            let checkpointed = CheckpointedStream::new(
                stream,
                store,
                name.clone(),
                Box::new(|event: &crate::AlertEvent| Ok(event.id.clone())),
                |event| event.created_at,
                PersistMode::HighWaterMark,
            );
            cli::render::emit(Box::pin(checkpointed), args.common.format, Some(&guard)).await?;
        }
        None => {
            let (_, http) = globals.connect().await?;
            let stream = AlertsClient::new(http)
                .search(query)
                .map_err(SearchError::from);
            cli::render::emit(Box::pin(stream), args.common.format, None).await?;
        }
    }
    Ok(())
}
