//! The checkpoint update algorithm.
//!
//! [`CheckpointedStream`] wraps a lazy, timestamp-ascending event stream
//! with deduplication against the previous run and incremental
//! persistence of the new high-water mark. One generic implementation
//! serves every resource; only the identifier and timestamp extraction
//! functions and the persist mode vary.
//!
//! The dedup window is deliberately bounded: `new_seen` tracks only the
//! identifiers of events at the *latest* timestamp, because the next
//! run's lower-bound filter already excludes strictly earlier events.
//! Tracking less re-delivers duplicates; tracking more grows without
//! bound.
//!
//! State is persisted after every accepted event, before it is handed to
//! the consumer, so a consumer that stops early (interrupt, error, or
//! only wanting N events) always leaves the store reflecting exactly the
//! events actually delivered.

use chrono::{DateTime, Utc};
use futures_util::Stream;
use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

use super::{CheckpointError, CheckpointValue, CursorStore};
use crate::client::{ApiError, EventStream};

/// Errors surfaced by a checkpointed search stream.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Transport or API failure from the underlying paginated fetch
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Checkpoint persistence failure
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// What to persist as the checkpoint value after each accepted event.
pub enum PersistMode {
    /// The float-seconds high-water-mark timestamp (alerts, audit log)
    HighWaterMark,
    /// A caller-supplied snapshot of the serialized query, whose page
    /// token the paginating stream advances (file events)
    QueryState(Box<dyn Fn() -> Result<String, serde_json::Error> + Send>),
}

/// Extracts an event's dedup identifier; fallible because audit events
/// derive theirs from a content hash over a serialization.
pub type IdFn<E> = Box<dyn Fn(&E) -> Result<String, CheckpointError> + Send>;

/// Extracts an event's ordering timestamp.
pub type TimeFn<E> = fn(&E) -> DateTime<Utc>;

/// A lazy event stream that deduplicates against and updates a named
/// checkpoint as it is consumed.
pub struct CheckpointedStream<E> {
    inner: EventStream<E>,
    store: CursorStore,
    name: String,
    id_of: IdFn<E>,
    time_of: TimeFn<E>,
    mode: PersistMode,
    /// Seen-set from the previous run, loaded on first poll
    prior_seen: Option<HashSet<String>>,
    /// Highest timestamp accepted during this run
    current_max: Option<DateTime<Utc>>,
    /// Identifiers of accepted events at `current_max` exactly
    new_seen: Vec<String>,
}

impl<E> CheckpointedStream<E> {
    /// Wrap `inner` with checkpointing against `name` in `store`.
    ///
    /// Precondition (not re-verified): `inner` yields events in
    /// non-decreasing timestamp order. A regressing timestamp is
    /// silently absorbed into the current window and can cause the next
    /// run's lower-bound filter to skip events; callers mitigate with a
    /// backward overlap on the seeded query.
    pub fn new(
        inner: EventStream<E>,
        store: CursorStore,
        name: impl Into<String>,
        id_of: IdFn<E>,
        time_of: TimeFn<E>,
        mode: PersistMode,
    ) -> Self {
        Self {
            inner,
            store,
            name: name.into(),
            id_of,
            time_of,
            mode,
            prior_seen: None,
            current_max: None,
            new_seen: Vec::new(),
        }
    }

    /// Apply the update algorithm to one incoming event.
    ///
    /// Returns `Ok(true)` if the event is new and its state has been
    /// persisted, `Ok(false)` if it was already delivered by a prior run.
    fn accept(&mut self, event: &E) -> Result<bool, SearchError> {
        let id = (self.id_of)(event)?;

        if self.prior_seen.is_none() {
            let loaded: HashSet<String> =
                self.store.get_items(&self.name)?.into_iter().collect();
            debug!(
                checkpoint = %self.name,
                prior_seen = loaded.len(),
                "Loaded seen-set"
            );
            self.prior_seen = Some(loaded);
        }

        if self.prior_seen.as_ref().is_some_and(|prior| prior.contains(&id)) {
            debug!(checkpoint = %self.name, id = %id, "Skipping already-delivered event");
            return Ok(false);
        }

        let ts = (self.time_of)(event);
        let max = match self.current_max {
            // Still inside the same-timestamp window
            Some(max) if ts <= max => max,
            // Strictly later timestamp: the old window is superseded
            _ => {
                self.new_seen.clear();
                self.current_max = Some(ts);
                ts
            }
        };

        self.new_seen.push(id);

        let value = match &self.mode {
            PersistMode::HighWaterMark => CheckpointValue::format_timestamp(max),
            PersistMode::QueryState(snapshot) => {
                snapshot().map_err(CheckpointError::Serialize)?
            }
        };

        // Value first, then the seen-set, before the event reaches the
        // consumer: an interruption at any point leaves a store that is
        // consistent for the events already delivered.
        self.store.replace(&self.name, &value)?;
        self.store.replace_items(&self.name, &self.new_seen)?;

        Ok(true)
    }
}

impl<E> Stream for CheckpointedStream<E> {
    type Item = Result<E, SearchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e.into()))),
                Poll::Ready(Some(Ok(event))) => match this.accept(&event) {
                    Ok(true) => return Poll::Ready(Some(Ok(event))),
                    Ok(false) => continue,
                    Err(e) => return Poll::Ready(Some(Err(e))),
                },
            }
        }
    }
}
