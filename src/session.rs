//! Viewport session: turns UI viewport events into reconciler calls.
//!
//! DESIGN
//! ======
//! A background task owns the [`WindowTracker`] and reads a bounded queue of
//! [`ViewportEvent`]s. Gesture callbacks only enqueue, so input handling
//! never waits on the store.
//!
//! - Outside a gesture, window changes are trailing-debounced: each one pushes
//!   the deadline out by `settle`, and only the last window is reconciled.
//! - Inside a gesture, the gesture subscription follows the pan, at most once
//!   per `gesture_throttle`; the newest window wins when the throttle opens.
//! - `GestureEnd` commits the final window immediately.
//!
//! Closing the queue flushes whatever is pending (an open gesture is
//! committed) and ends the task, which hands the tracker back.
//!
//! Only the final settled viewport is guaranteed to be subscribed;
//! intermediate windows may be skipped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::config::SessionTiming;
use crate::error::ErrorCode;
use crate::geometry::BoundingBox;
use crate::reconciler::{ReconcileError, Reconciled, Reconciler};
use crate::window::WindowTracker;

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewportEvent {
    /// Layout pass: viewport size and scroll offsets together.
    Layout { width: f64, height: f64, vertical: f64, horizontal: f64 },
    /// Absolute scroll position.
    Scroll { vertical: f64, horizontal: f64 },
    /// Pan delta.
    ScrollBy { vertical: f64, horizontal: f64 },
    GestureStart,
    GestureEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("viewport session closed")]
    Closed,
    #[error("viewport event queue full")]
    Full,
    #[error("viewport session task failed: {0}")]
    Task(String),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "E_SESSION_CLOSED",
            Self::Full => "E_SESSION_FULL",
            Self::Task(_) => "E_SESSION_TASK",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Handle to a running session.
pub struct ViewportSession {
    sender: mpsc::Sender<ViewportEvent>,
    handle: JoinHandle<WindowTracker>,
}

impl ViewportSession {
    /// Enqueue an event, waiting for queue space.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session task has ended.
    pub async fn send(&self, event: ViewportEvent) -> Result<(), SessionError> {
        self.sender.send(event).await.map_err(|_| SessionError::Closed)
    }

    /// Enqueue without waiting, for synchronous UI callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Full`] when the queue is full, or
    /// [`SessionError::Closed`] if the session task has ended.
    pub fn try_send(&self, event: ViewportEvent) -> Result<(), SessionError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::Full,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }

    /// A sender that can be handed to UI callbacks.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<ViewportEvent> {
        self.sender.clone()
    }

    /// Close the queue, let the task flush, and return its tracker.
    ///
    /// Other clones of [`Self::sender`] keep the session alive until dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Task`] if the task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<WindowTracker, SessionError> {
        drop(self.sender);
        self.handle.await.map_err(|e| SessionError::Task(e.to_string()))
    }
}

// =============================================================================
// SPAWN
// =============================================================================

/// Spawn the session task. Requires a tokio runtime.
#[must_use]
pub fn spawn_viewport_session(
    reconciler: Arc<Reconciler>,
    tracker: WindowTracker,
    timing: SessionTiming,
) -> ViewportSession {
    let (sender, mut rx) = mpsc::channel::<ViewportEvent>(timing.event_queue.max(1));

    info!(
        settle_ms = timing.settle.as_millis(),
        gesture_throttle_ms = timing.gesture_throttle.as_millis(),
        event_queue = timing.event_queue,
        "viewport session started"
    );

    let handle = tokio::spawn(async move {
        let mut session = SessionLoop::new(reconciler, tracker, timing);
        loop {
            let deadline = session.deadline;
            tokio::select! {
                maybe_event = rx.recv() => {
                    if let Some(event) = maybe_event {
                        session.on_event(event).await;
                    } else {
                        session.flush().await;
                        break;
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    session.on_deadline().await;
                }
            }
        }
        info!("viewport session stopped");
        session.tracker
    });

    ViewportSession { sender, handle }
}

// =============================================================================
// LOOP STATE
// =============================================================================

struct SessionLoop {
    reconciler: Arc<Reconciler>,
    tracker: WindowTracker,
    timing: SessionTiming,
    in_gesture: bool,
    /// Window not yet handed to the reconciler.
    pending: Option<BoundingBox>,
    deadline: Option<Instant>,
    last_gesture_update: Option<Instant>,
}

impl SessionLoop {
    fn new(reconciler: Arc<Reconciler>, tracker: WindowTracker, timing: SessionTiming) -> Self {
        Self {
            reconciler,
            tracker,
            timing,
            in_gesture: false,
            pending: None,
            deadline: None,
            last_gesture_update: None,
        }
    }

    async fn on_event(&mut self, event: ViewportEvent) {
        let window = match event {
            ViewportEvent::Layout { width, height, vertical, horizontal } => {
                self.tracker.set_viewport_size(width, height, vertical, horizontal)
            }
            ViewportEvent::Scroll { vertical, horizontal } => self.tracker.scroll_to(vertical, horizontal),
            ViewportEvent::ScrollBy { vertical, horizontal } => self.tracker.scroll_by(vertical, horizontal),
            ViewportEvent::GestureStart => {
                debug!("gesture started");
                self.in_gesture = true;
                self.last_gesture_update = None;
                return;
            }
            ViewportEvent::GestureEnd => {
                self.in_gesture = false;
                self.pending = None;
                self.deadline = None;
                let window = self.tracker.bounding_box();
                report(self.reconciler.commit_gesture(window).await);
                return;
            }
        };

        self.pending = Some(window);
        let now = Instant::now();
        if !self.in_gesture {
            self.deadline = Some(now + self.timing.settle);
            return;
        }

        match self.last_gesture_update {
            Some(last) if now < last + self.timing.gesture_throttle => {
                self.deadline = Some(last + self.timing.gesture_throttle);
            }
            _ => self.send_pending().await,
        }
    }

    async fn on_deadline(&mut self) {
        self.send_pending().await;
    }

    async fn send_pending(&mut self) {
        self.deadline = None;
        let Some(window) = self.pending.take() else {
            return;
        };
        if self.in_gesture {
            self.last_gesture_update = Some(Instant::now());
            report(self.reconciler.track_gesture(window).await);
        } else {
            report(self.reconciler.reconcile(window).await);
        }
    }

    async fn flush(&mut self) {
        self.deadline = None;
        if self.in_gesture {
            self.in_gesture = false;
            self.pending = None;
            let window = self.tracker.bounding_box();
            report(self.reconciler.commit_gesture(window).await);
        } else if let Some(window) = self.pending.take() {
            report(self.reconciler.reconcile(window).await);
        }
    }
}

/// Failures already put the observer into `Error`; the session keeps going.
fn report(result: Result<Reconciled, ReconcileError>) {
    match result {
        Ok(done) => debug!(window = %done.plan.name, areas = done.areas.len(), "window applied"),
        Err(e) => debug!(error = %e, code = e.error_code(), "window not applied"),
    }
}
