//! In-process [`SubscriptionStore`].
//!
//! DESIGN
//! ======
//! Holds every shape record, but only exposes the ones covered by a live
//! subscription, which is what a partially-synced local store would have
//! downloaded. Subscription updates commit under one lock, so a failed
//! update leaves the list untouched.
//!
//! Sync completion is either immediate or gated: in [`SyncMode::Manual`]
//! each `wait_for_sync` parks a oneshot that the caller releases explicitly,
//! in any order. Tests use this to deliver stale completions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::predicate::AreaPredicate;
use crate::shape::Component;
use crate::store::{StoreError, SubscriptionStore, SyncFuture};
use crate::subscription::{MutableSubscriptionSet, Subscription};

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// `wait_for_sync` resolves as soon as it is polled.
    #[default]
    Immediate,
    /// `wait_for_sync` parks until released.
    Manual,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    shapes: HashMap<Uuid, Component>,
    subscriptions: Vec<Subscription>,
    last_created_at: i64,
    sync_mode: SyncMode,
    pending: VecDeque<oneshot::Sender<Result<(), StoreError>>>,
    fail_next_update: Option<StoreError>,
    fail_next_sync: Option<StoreError>,
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sync_mode(mode: SyncMode) -> Self {
        let store = Self::new();
        store.lock().sync_mode = mode;
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Records ---

    pub fn insert_shape(&self, component: Component) {
        self.lock().shapes.insert(component.id, component);
    }

    pub fn remove_shape(&self, id: &Uuid) -> Option<Component> {
        self.lock().shapes.remove(id)
    }

    /// All records, synced or not.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.lock().shapes.len()
    }

    // --- Fault injection ---

    /// Fail the next `atomic_update` with `err` without committing.
    pub fn fail_next_update(&self, err: StoreError) {
        self.lock().fail_next_update = Some(err);
    }

    /// Resolve the next `wait_for_sync` with `err`, regardless of mode.
    pub fn fail_next_sync(&self, err: StoreError) {
        self.lock().fail_next_sync = Some(err);
    }

    // --- Manual sync gate ---

    pub fn set_sync_mode(&self, mode: SyncMode) {
        self.lock().sync_mode = mode;
    }

    /// Number of parked `wait_for_sync` futures.
    #[must_use]
    pub fn pending_syncs(&self) -> usize {
        self.lock().pending.len()
    }

    /// Release the oldest parked sync. Returns false when none was waiting
    /// or its future had already been dropped.
    pub fn release_next(&self, result: Result<(), StoreError>) -> bool {
        let Some(tx) = self.lock().pending.pop_front() else {
            return false;
        };
        tx.send(result).is_ok()
    }

    /// Release the newest parked sync.
    pub fn release_latest(&self, result: Result<(), StoreError>) -> bool {
        let Some(tx) = self.lock().pending.pop_back() else {
            return false;
        };
        tx.send(result).is_ok()
    }

    /// Release every parked sync with `Ok`. Returns how many were delivered.
    pub fn release_all(&self) -> usize {
        let drained: Vec<_> = self.lock().pending.drain(..).collect();
        let mut delivered = 0;
        for tx in drained {
            if tx.send(Ok(())).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn query(&self, predicate: &AreaPredicate) -> Result<Vec<Component>, StoreError> {
        let inner = self.lock();
        let mut out: Vec<Component> = inner
            .shapes
            .values()
            .filter(|c| predicate.matches(c))
            .filter(|c| inner.subscriptions.iter().any(|s| s.predicate.matches(c)))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.z.total_cmp(&b.z).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn list(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.lock().subscriptions.clone())
    }

    async fn atomic_update(
        &self,
        mutator: &mut (dyn for<'s> FnMut(&'s mut MutableSubscriptionSet) + Send),
    ) -> Result<Vec<Subscription>, StoreError> {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_next_update.take() {
            return Err(err);
        }

        let mut working = MutableSubscriptionSet::new(inner.subscriptions.clone(), now_ms())
            .with_created_floor(inner.last_created_at);
        mutator(&mut working);

        inner.last_created_at = working.last_created_at();
        inner.subscriptions = working.into_entries();
        Ok(inner.subscriptions.clone())
    }

    fn wait_for_sync(&self) -> SyncFuture {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_next_sync.take() {
            return futures::future::ready(Err(err)).boxed();
        }
        match inner.sync_mode {
            SyncMode::Immediate => futures::future::ready(Ok(())).boxed(),
            SyncMode::Manual => {
                let (tx, rx) = oneshot::channel();
                inner.pending.push_back(tx);
                async move { rx.await.unwrap_or(Err(StoreError::Closed)) }.boxed()
            }
        }
    }
}
