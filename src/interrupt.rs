//! Two-stage interrupt handling for checkpointed runs.
//!
//! Checkpoint state is persisted after every delivered event, so tearing
//! the process down mid-write is the only way to corrupt it. The guard
//! turns the first Ctrl+C into a cooperative stop (the search loop
//! finishes the in-flight event, whose state is already durable, then
//! exits cleanly) and a second Ctrl+C into an immediate hard exit.
//!
//! Only checkpointed searches install the guard; non-checkpointed
//! searches have nothing to protect and keep default signal behavior.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Shared handle to an interrupt guard.
pub type SharedInterrupt = Arc<InterruptGuard>;

static GLOBAL_INTERRUPT: OnceCell<SharedInterrupt> = OnceCell::new();

/// Exit status used for a forced interrupt (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

/// Tracks whether the operator has asked the current run to stop.
#[derive(Debug, Default)]
pub struct InterruptGuard {
    cancelling: AtomicBool,
}

impl InterruptGuard {
    /// Record an interrupt request. Returns `true` if this was the first.
    pub fn request_cancel(&self) -> bool {
        !self.cancelling.swap(true, Ordering::SeqCst)
    }

    /// Whether a cooperative stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelling.load(Ordering::SeqCst)
    }
}

/// Install the global interrupt guard and its Ctrl+C listener.
///
/// Idempotent: repeated calls return the already-installed guard without
/// spawning a second listener. Must be called from within the tokio
/// runtime.
pub fn install() -> SharedInterrupt {
    let mut spawned = false;
    let guard = GLOBAL_INTERRUPT
        .get_or_init(|| {
            spawned = true;
            Arc::new(InterruptGuard::default())
        })
        .clone();

    if spawned {
        tokio::spawn({
            let guard = guard.clone();
            async move {
                loop {
                    if tokio::signal::ctrl_c().await.is_err() {
                        return;
                    }
                    if guard.request_cancel() {
                        warn!(
                            "interrupt received; finishing the in-flight event \
                             (press Ctrl+C again to force quit)"
                        );
                    } else {
                        eprintln!("force quit");
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                }
            }
        });
    }

    guard
}
