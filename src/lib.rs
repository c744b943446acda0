//! Viewport-driven partial subscription management for a shared canvas.
//!
//! A client of a partially-synced object store only holds the records its
//! subscriptions cover. This crate keeps that subscription set following the
//! user's viewport: the visible window is turned into a spatial predicate,
//! registered under a deterministic name, and older windows are evicted so
//! the set stays within the store's cap. Sync progress is folded into a
//! single `Hidden | Loading | Error` state for the UI.
//!
//! The UI shell owns the scroll view; it feeds layout and gesture events into
//! a [`session::ViewportSession`] and reads back
//! [`reconciler::Reconciler::subscribe_areas`] and
//! [`observer::SyncStateObserver::subscribe`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`window`] | Viewport + scroll to world-space bounding box |
//! | [`reconciler`] | Evict / upsert / derive passes over the subscription set |
//! | [`observer`] | Sync state machine with stale-completion guard |
//! | [`session`] | Event-driven driver: debounce, gesture throttle, commit |
//! | [`subscription`] | Subscription names and the mutable set |
//! | [`predicate`] | Rectangle-intersection predicate |
//! | [`store`] | Store boundary trait and its errors |
//! | [`memory`] | In-process store |
//! | [`shape`] | `Component` records |
//! | [`geometry`] | Viewport, scroll and box types |
//! | [`config`] | Environment configuration |
//! | [`error`] | Error-code contract |

pub mod config;
pub mod error;
pub mod geometry;
pub mod memory;
pub mod observer;
pub mod predicate;
pub mod reconciler;
pub mod session;
pub mod shape;
pub mod store;
pub mod subscription;
pub mod window;

pub use config::{ConfigError, SessionTiming, ViewSyncConfig};
pub use error::ErrorCode;
pub use geometry::{BoundingBox, CanvasExtent, ScrollPosition, Viewport};
pub use memory::{MemoryStore, SyncMode};
pub use observer::{LoadingState, SyncFailure, SyncStateObserver};
pub use predicate::AreaPredicate;
pub use reconciler::{ReconcileError, Reconciled, Reconciler};
pub use session::{SessionError, ViewportEvent, ViewportSession, spawn_viewport_session};
pub use store::{StoreError, SubscriptionStore};
pub use subscription::{MAX_SUBSCRIPTIONS, Subscription};
pub use window::WindowTracker;
