//! Sync state observer: `Hidden | Loading | Error` for the UI.
//!
//! DESIGN
//! ======
//! Every reconciliation calls [`SyncStateObserver::begin`] at the moment it
//! issues a store update, which moves the state to `Loading` and hands back a
//! ticket stamped with a fresh generation. The store's completion is settled
//! against that ticket. A completion whose generation is no longer current is
//! stale and dropped, so an old "synchronized" can never hide a newer load.
//!
//! `Error` is sticky: only the next `begin` leaves it.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ErrorCode;

#[cfg(test)]
#[path = "observer_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    #[default]
    Hidden,
    Loading,
    Error,
}

/// What put the observer into `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl SyncFailure {
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

/// Proof that a caller entered `Loading`; settles exactly that load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket {
    generation: u64,
}

impl SyncTicket {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Clone)]
pub struct SyncStateObserver {
    inner: Arc<ObserverInner>,
}

struct ObserverInner {
    state: watch::Sender<LoadingState>,
    ledger: Mutex<Ledger>,
}

struct Ledger {
    generation: u64,
    last_failure: Option<SyncFailure>,
}

impl Default for SyncStateObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStateObserver {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(LoadingState::Hidden);
        Self {
            inner: Arc::new(ObserverInner {
                state,
                ledger: Mutex::new(Ledger { generation: 0, last_failure: None }),
            }),
        }
    }

    #[must_use]
    pub fn current(&self) -> LoadingState {
        *self.inner.state.borrow()
    }

    /// A receiver that sees every later transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.inner.state.subscribe()
    }

    /// Failure behind the current `Error`, if any.
    #[must_use]
    pub fn last_failure(&self) -> Option<SyncFailure> {
        self.ledger().last_failure.clone()
    }

    /// Enter `Loading` for a newly issued update.
    pub fn begin(&self) -> SyncTicket {
        let mut ledger = self.ledger();
        ledger.generation += 1;
        ledger.last_failure = None;
        self.inner.state.send_replace(LoadingState::Loading);
        SyncTicket { generation: ledger.generation }
    }

    /// Apply the outcome of the load identified by `ticket`.
    ///
    /// Returns false when the ticket is stale and nothing changed.
    pub fn settle<E>(&self, ticket: SyncTicket, outcome: Result<(), E>) -> bool
    where
        E: ErrorCode,
    {
        let mut ledger = self.ledger();
        if ticket.generation != ledger.generation {
            debug!(
                ticket = ticket.generation,
                current = ledger.generation,
                "ignoring stale sync completion"
            );
            return false;
        }

        match outcome {
            Ok(()) => {
                self.inner.state.send_replace(LoadingState::Hidden);
            }
            Err(err) => {
                warn!(error = %err, code = err.error_code(), "subscription sync failed");
                ledger.last_failure = Some(SyncFailure::from_error(&err));
                self.inner.state.send_replace(LoadingState::Error);
            }
        }
        true
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.inner.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
