//! Subscription-set reconciler.
//!
//! DESIGN
//! ======
//! Each call turns one window into a single atomic store update made of
//! three passes:
//!
//! 1. Evict: if the target name is new and the set is full, drop the
//!    `created_at`-oldest entries until one slot is free. The target is never
//!    a candidate, so an entry is never evicted by the pass that upserts it.
//! 2. Upsert: add-or-update under the target name. Identical windows are a
//!    no-op.
//! 3. Derive: decode every committed name back into a window and publish the
//!    list as the loaded-areas view. Names that do not decode are skipped.
//!
//! Settled windows are named by their coordinates. While a pan gesture is in
//! progress the window instead lives in the fixed-name gesture subscription,
//! replaced in place, so continuous panning costs one slot. Committing the
//! gesture swaps it for the settled area in the same update, so the visible
//! region is covered at every committed state.
//!
//! Callers are serialized through a FIFO async mutex: passes never
//! interleave and apply in arrival order.
//!
//! ERROR HANDLING
//! ==============
//! A failed update commits nothing, puts the observer into `Error` and is
//! returned to the caller. Nothing is retried here; the next window retries
//! naturally.
//!
//! A caller that drops the future before the store update finishes (a
//! timeout, a losing `select!` branch) leaves no sync in flight, so the load
//! it began is settled as `Error` with [`ReconcileError::Cancelled`] instead
//! of staying `Loading`.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::geometry::BoundingBox;
use crate::observer::{SyncStateObserver, SyncTicket};
use crate::predicate::AreaPredicate;
use crate::store::{StoreError, SubscriptionStore};
use crate::subscription::{
    GESTURE_SUBSCRIPTION, MAX_SUBSCRIPTIONS, MutableSubscriptionSet, Subscription, Upsert, area_name,
    parse_area_name,
};

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("subscription update failed: {0}")]
    Store(#[from] StoreError),
    #[error("subscription update cancelled before it completed")]
    Cancelled,
}

impl ErrorCode for ReconcileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            Self::Cancelled => "E_RECONCILE_CANCELLED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::Cancelled => true,
        }
    }
}

/// Which subscription a window is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowIntent {
    /// Settled window under its coordinate name.
    Settled,
    /// In-progress pan, under the gesture name.
    Gesture,
    /// End of pan: drop the gesture subscription, add the settled window.
    CommitGesture,
}

/// What one pass did to the set.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    pub name: String,
    pub upsert: Upsert,
    pub evicted: Vec<Subscription>,
    pub released_gesture: bool,
}

/// Result of a committed reconciliation.
#[derive(Debug)]
pub struct Reconciled {
    pub plan: WindowPlan,
    /// Loaded-areas view derived from the committed set.
    pub areas: Vec<BoundingBox>,
    /// Resolves once this update's sync settles; `true` if it was still the
    /// current load when it did.
    pub sync: JoinHandle<bool>,
}

// =============================================================================
// PURE PASSES
// =============================================================================

/// Evict + upsert `predicate` under `name`, keeping at most `cap` entries.
pub fn apply_window(
    set: &mut MutableSubscriptionSet,
    name: &str,
    predicate: AreaPredicate,
    cap: usize,
) -> (Upsert, Vec<Subscription>) {
    let room = if set.contains(name) { cap } else { cap.saturating_sub(1) };
    let evicted = if set.len() > room { set.evict_oldest(room, name) } else { Vec::new() };
    let upsert = set.add_or_update(name, predicate);
    (upsert, evicted)
}

/// Run one intent's passes against `set`.
pub fn plan_window(
    set: &mut MutableSubscriptionSet,
    intent: WindowIntent,
    window: &BoundingBox,
    cap: usize,
) -> WindowPlan {
    let predicate = AreaPredicate::new(*window);
    let (name, released_gesture) = match intent {
        WindowIntent::Settled => (area_name(window), false),
        WindowIntent::Gesture => (GESTURE_SUBSCRIPTION.to_string(), false),
        WindowIntent::CommitGesture => (area_name(window), set.remove(GESTURE_SUBSCRIPTION).is_some()),
    };
    let (upsert, evicted) = apply_window(set, &name, predicate, cap);
    WindowPlan { name, upsert, evicted, released_gesture }
}

/// Decode the loaded-areas view from subscription names.
#[must_use]
pub fn derive_areas(subscriptions: &[Subscription]) -> Vec<BoundingBox> {
    subscriptions
        .iter()
        .filter_map(|s| match parse_area_name(&s.name) {
            Ok(area) => Some(area),
            Err(e) => {
                debug!(name = %s.name, error = %e, "skipping non-area subscription");
                None
            }
        })
        .collect()
}

// =============================================================================
// RECONCILER
// =============================================================================

pub struct Reconciler {
    store: Arc<dyn SubscriptionStore>,
    observer: SyncStateObserver,
    max_subscriptions: usize,
    gate: Mutex<()>,
    areas: watch::Sender<Vec<BoundingBox>>,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>, observer: SyncStateObserver) -> Self {
        Self::with_capacity(store, observer, MAX_SUBSCRIPTIONS)
    }

    /// A cap of zero is raised to one so a window always fits.
    #[must_use]
    pub fn with_capacity(store: Arc<dyn SubscriptionStore>, observer: SyncStateObserver, max_subscriptions: usize) -> Self {
        let (areas, _) = watch::channel(Vec::new());
        Self { store, observer, max_subscriptions: max_subscriptions.max(1), gate: Mutex::new(()), areas }
    }

    #[must_use]
    pub fn max_subscriptions(&self) -> usize {
        self.max_subscriptions
    }

    #[must_use]
    pub fn observer(&self) -> &SyncStateObserver {
        &self.observer
    }

    /// Current loaded-areas view.
    #[must_use]
    pub fn loaded_areas(&self) -> Vec<BoundingBox> {
        self.areas.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_areas(&self) -> watch::Receiver<Vec<BoundingBox>> {
        self.areas.subscribe()
    }

    /// Subscribe to a settled window.
    ///
    /// # Errors
    ///
    /// Returns the store error if the atomic update fails.
    pub async fn reconcile(&self, window: BoundingBox) -> Result<Reconciled, ReconcileError> {
        self.apply(WindowIntent::Settled, window).await
    }

    /// Move the gesture subscription to `window`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the atomic update fails.
    pub async fn track_gesture(&self, window: BoundingBox) -> Result<Reconciled, ReconcileError> {
        self.apply(WindowIntent::Gesture, window).await
    }

    /// Replace the gesture subscription with the settled `window`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the atomic update fails.
    pub async fn commit_gesture(&self, window: BoundingBox) -> Result<Reconciled, ReconcileError> {
        self.apply(WindowIntent::CommitGesture, window).await
    }

    async fn apply(&self, intent: WindowIntent, window: BoundingBox) -> Result<Reconciled, ReconcileError> {
        let _pass = self.gate.lock().await;

        let load = PendingLoad::begin(&self.observer);
        let cap = self.max_subscriptions;
        let mut plan = None;
        let committed = self
            .store
            .atomic_update(&mut |set: &mut MutableSubscriptionSet| {
                plan = Some(plan_window(set, intent, &window, cap));
            })
            .await;

        let committed = match committed {
            Ok(committed) => committed,
            Err(e) => {
                warn!(error = %e, ?intent, "subscription update failed");
                self.observer.settle(load.disarm(), Err(e.clone()));
                return Err(e.into());
            }
        };
        let ticket = load.disarm();

        let plan = plan.unwrap_or_else(|| WindowPlan {
            name: String::new(),
            upsert: Upsert::Unchanged,
            evicted: Vec::new(),
            released_gesture: false,
        });
        log_plan(&plan, intent, committed.len());

        let areas = derive_areas(&committed);
        self.areas.send_replace(areas.clone());

        let wait = self.store.wait_for_sync();
        let observer = self.observer.clone();
        let sync = tokio::spawn(async move { observer.settle(ticket, wait.await) });

        Ok(Reconciled { plan, areas, sync })
    }
}

/// An entered `Loading` that has not been handed to a sync task yet.
///
/// Dropped while armed, it settles its ticket as cancelled.
struct PendingLoad<'a> {
    observer: &'a SyncStateObserver,
    ticket: SyncTicket,
    armed: bool,
}

impl<'a> PendingLoad<'a> {
    fn begin(observer: &'a SyncStateObserver) -> Self {
        Self { observer, ticket: observer.begin(), armed: true }
    }

    fn disarm(mut self) -> SyncTicket {
        self.armed = false;
        self.ticket
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.armed && self.observer.settle(self.ticket, Err(ReconcileError::Cancelled)) {
            debug!(ticket = self.ticket.generation(), "reconciliation dropped before commit");
        }
    }
}

fn log_plan(plan: &WindowPlan, intent: WindowIntent, live: usize) {
    if !plan.evicted.is_empty() {
        let evicted: Vec<&str> = plan.evicted.iter().map(|s| s.name.as_str()).collect();
        info!(?evicted, window = %plan.name, live, "evicted oldest subscriptions");
    }
    match (intent, plan.upsert) {
        (WindowIntent::CommitGesture, _) => {
            info!(window = %plan.name, released = plan.released_gesture, live, "gesture committed");
        }
        (_, Upsert::Unchanged) => debug!(window = %plan.name, "window unchanged"),
        (_, upsert) => debug!(window = %plan.name, ?upsert, live, "window subscribed"),
    }
}
