use std::time::Duration;

use super::*;
use crate::geometry::CanvasExtent;
use crate::memory::MemoryStore;
use crate::observer::{LoadingState, SyncStateObserver};
use crate::predicate::AreaPredicate;
use crate::store::{StoreError, SubscriptionStore};
use crate::subscription::{GESTURE_SUBSCRIPTION, Subscription, area_name};

const EXTENT: CanvasExtent = CanvasExtent { width: 10_000.0, height: 10_000.0 };

fn timing() -> SessionTiming {
    SessionTiming {
        settle: Duration::from_millis(150),
        gesture_throttle: Duration::from_millis(50),
        event_queue: 64,
    }
}

fn start(timing: SessionTiming) -> (Arc<MemoryStore>, Arc<Reconciler>, ViewportSession) {
    let store = Arc::new(MemoryStore::new());
    let reconciler = Arc::new(Reconciler::new(store.clone(), SyncStateObserver::new()));
    let session = spawn_viewport_session(reconciler.clone(), WindowTracker::new(EXTENT, 0.0), timing);
    (store, reconciler, session)
}

/// Layout at scroll (5000, 5000): the window's top-left is the world origin.
fn layout() -> ViewportEvent {
    ViewportEvent::Layout { width: 800.0, height: 600.0, vertical: 5_000.0, horizontal: 5_000.0 }
}

/// Window after panning the origin layout by (`dv`, `dh`).
fn panned(dv: f64, dh: f64) -> BoundingBox {
    BoundingBox::new(dh, dv, dh + 800.0, dv + 600.0)
}

fn names(subs: &[Subscription]) -> Vec<&str> {
    subs.iter().map(|s| s.name.as_str()).collect()
}

async fn idle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// =============================================================================
// settle debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn settled_window_is_reconciled_after_quiet_period() {
    let (store, rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    idle(100).await;
    assert!(store.list().await.unwrap().is_empty());

    idle(100).await;
    assert_eq!(names(&store.list().await.unwrap()), vec![area_name(&panned(0.0, 0.0)).as_str()]);
    assert_eq!(rec.loaded_areas(), vec![panned(0.0, 0.0)]);
}

#[tokio::test(start_paused = true)]
async fn burst_of_scrolls_reconciles_only_the_last() {
    let (store, rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    for step in 1..=5 {
        let offset = f64::from(step) * 10.0;
        session
            .send(ViewportEvent::Scroll { vertical: 5_000.0 + offset, horizontal: 5_000.0 })
            .await
            .unwrap();
    }
    idle(200).await;

    assert_eq!(names(&store.list().await.unwrap()), vec![area_name(&panned(50.0, 0.0)).as_str()]);
    assert_eq!(rec.observer().current(), LoadingState::Hidden);
}

#[tokio::test(start_paused = true)]
async fn each_update_pushes_deadline_out() {
    let (store, _rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    idle(100).await;
    session.send(ViewportEvent::ScrollBy { vertical: 0.0, horizontal: 25.0 }).await.unwrap();
    idle(100).await;
    assert!(store.list().await.unwrap().is_empty());

    idle(100).await;
    assert_eq!(names(&store.list().await.unwrap()), vec![area_name(&panned(0.0, 25.0)).as_str()]);
}

// =============================================================================
// gestures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn gesture_updates_are_throttled_and_committed() {
    let (store, rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    idle(200).await;

    session.send(ViewportEvent::GestureStart).await.unwrap();
    session.send(ViewportEvent::ScrollBy { vertical: 0.0, horizontal: 10.0 }).await.unwrap();
    idle(1).await;

    let subs = store.list().await.unwrap();
    let gesture = subs.iter().find(|s| s.name == GESTURE_SUBSCRIPTION).unwrap();
    assert_eq!(gesture.predicate, AreaPredicate::new(panned(0.0, 10.0)));

    for _ in 0..4 {
        session.send(ViewportEvent::ScrollBy { vertical: 0.0, horizontal: 10.0 }).await.unwrap();
    }
    idle(10).await;
    let subs = store.list().await.unwrap();
    let gesture = subs.iter().find(|s| s.name == GESTURE_SUBSCRIPTION).unwrap();
    assert_eq!(gesture.predicate, AreaPredicate::new(panned(0.0, 10.0)));

    idle(50).await;
    let subs = store.list().await.unwrap();
    assert_eq!(subs.len(), 2);
    let gesture = subs.iter().find(|s| s.name == GESTURE_SUBSCRIPTION).unwrap();
    assert_eq!(gesture.predicate, AreaPredicate::new(panned(0.0, 50.0)));

    session.send(ViewportEvent::GestureEnd).await.unwrap();
    idle(1).await;
    let subs = store.list().await.unwrap();
    assert_eq!(
        names(&subs),
        vec![area_name(&panned(0.0, 0.0)).as_str(), area_name(&panned(0.0, 50.0)).as_str()]
    );
    assert_eq!(rec.loaded_areas(), vec![panned(0.0, 0.0), panned(0.0, 50.0)]);
}

#[tokio::test(start_paused = true)]
async fn long_pan_holds_one_gesture_slot() {
    let (store, _rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    session.send(ViewportEvent::GestureStart).await.unwrap();
    for _ in 0..40 {
        session.send(ViewportEvent::ScrollBy { vertical: 5.0, horizontal: 5.0 }).await.unwrap();
        idle(20).await;
        assert!(store.list().await.unwrap().len() <= 1);
    }
    session.send(ViewportEvent::GestureEnd).await.unwrap();
    idle(1).await;

    assert_eq!(names(&store.list().await.unwrap()), vec![area_name(&panned(200.0, 200.0)).as_str()]);
}

// =============================================================================
// shutdown + errors
// =============================================================================

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_pending_window() {
    let (store, _rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    let tracker = session.shutdown().await.unwrap();

    assert_eq!(tracker.bounding_box(), panned(0.0, 0.0));
    assert_eq!(names(&store.list().await.unwrap()), vec![area_name(&panned(0.0, 0.0)).as_str()]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_gesture_commits_it() {
    let (store, _rec, session) = start(timing());

    session.send(layout()).await.unwrap();
    session.send(ViewportEvent::GestureStart).await.unwrap();
    session.send(ViewportEvent::ScrollBy { vertical: 0.0, horizontal: 30.0 }).await.unwrap();
    session.shutdown().await.unwrap();

    assert_eq!(names(&store.list().await.unwrap()), vec![area_name(&panned(0.0, 30.0)).as_str()]);
}

#[tokio::test(start_paused = true)]
async fn store_failure_does_not_stop_session() {
    let (store, rec, session) = start(timing());
    store.fail_next_update(StoreError::Network("offline".into()));

    session.send(layout()).await.unwrap();
    idle(200).await;
    assert_eq!(rec.observer().current(), LoadingState::Error);
    assert!(store.list().await.unwrap().is_empty());

    session.send(ViewportEvent::ScrollBy { vertical: 0.0, horizontal: 1.0 }).await.unwrap();
    idle(200).await;
    assert_eq!(rec.observer().current(), LoadingState::Hidden);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn try_send_reports_full_queue() {
    let timing = SessionTiming { event_queue: 1, ..timing() };
    let (_store, _rec, session) = start(timing);

    // the session task has not run yet on this thread
    session.try_send(ViewportEvent::GestureStart).unwrap();
    let err = session.try_send(ViewportEvent::GestureEnd).unwrap_err();

    assert_eq!(err, SessionError::Full);
    assert_eq!(err.error_code(), "E_SESSION_FULL");
    assert!(err.retryable());
}

#[test]
fn events_use_tagged_json() {
    let json = serde_json::to_value(ViewportEvent::ScrollBy { vertical: 1.0, horizontal: -2.0 }).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "scroll_by", "vertical": 1.0, "horizontal": -2.0 }));

    let event: ViewportEvent = serde_json::from_str(r#"{"type":"gesture_end"}"#).unwrap();
    assert_eq!(event, ViewportEvent::GestureEnd);
}
