//! `aegis file-events` command implementations.

use std::sync::{Arc, Mutex};

use futures_util::TryStreamExt;
use tracing::info;

use crate::checkpoint::{CheckpointedStream, PersistMode, ResourceKind, SearchError};
use crate::cli::{self, CliError, FileEventSearchArgs, FileEventsAction, Globals};
use crate::client::file_events::{lock_query, SharedFileEventQuery};
use crate::client::FileEventsClient;
use crate::query::FileEventQuery;

/// Dispatch a file event action.
pub async fn run(action: FileEventsAction, globals: &Globals) -> Result<(), CliError> {
    match action {
        FileEventsAction::Search(args) => search(args, globals).await,
        FileEventsAction::ClearCheckpoint { name } => {
            cli::clear_checkpoint(globals, ResourceKind::FileEvent, &name)
        }
        FileEventsAction::ListCheckpoints => {
            cli::list_checkpoints(globals, ResourceKind::FileEvent)
        }
    }
}

async fn search(args: FileEventSearchArgs, globals: &Globals) -> Result<(), CliError> {
    let mut fresh = FileEventQuery::new();
    fresh.start_time = args.start;
    fresh.end_time = args.end;
    fresh.event_action = args.event_action;
    fresh.file_name = args.file_name;
    fresh.user = args.user;

    match &args.common.checkpoint {
        Some(name) => {
            let store = cli::open_store(globals, ResourceKind::FileEvent)?;
            // A stored query-state checkpoint supersedes the fresh query
            // wholesale, including its filters and page token.
            let (query, resumed) = FileEventQuery::resume_or_new(&store, name, fresh)?;
            if resumed {
                info!(checkpoint = %name, "Resuming stored file event query");
            }

            let shared: SharedFileEventQuery = Arc::new(Mutex::new(query));
            let guard = crate::interrupt::install();
            let (_, http) = globals.connect().await?;
            let stream = FileEventsClient::new(http).search(shared.clone());

            let snapshot_source = shared.clone();
            let checkpointed = CheckpointedStream::new(
                stream,
                store,
                name.clone(),
                Box::new(|event: &crate::FileEvent| Ok(event.event_id.clone())),
                |event| event.timestamp,
                PersistMode::QueryState(Box::new(move || {
                    serde_json::to_string(&*lock_query(&snapshot_source))
                })),
            );
            cli::render::emit(Box::pin(checkpointed), args.common.format, Some(&guard)).await?;
        }
        None => {
            let shared: SharedFileEventQuery = Arc::new(Mutex::new(fresh));
            let (_, http) = globals.connect().await?;
            let stream = FileEventsClient::new(http)
                .search(shared)
                .map_err(SearchError::from);
            cli::render::emit(Box::pin(stream), args.common.format, None).await?;
        }
    }
    Ok(())
}
