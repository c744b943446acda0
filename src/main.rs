//! Demo driver: seeds an in-memory store with random shapes, replays a pan
//! gesture through a viewport session, and logs what ends up subscribed.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{error, info};
use viewsync::shape::{ColorValue, Component};
use viewsync::{
    AreaPredicate, ErrorCode, MemoryStore, Reconciler, SessionError, SubscriptionStore, SyncStateObserver,
    ViewSyncConfig, ViewportEvent, WindowTracker, spawn_viewport_session,
};

const SEED_SHAPES: usize = 2_000;
const PAN_STEPS: usize = 24;
const PAN_STEP_PX: f64 = 40.0;
const JUMP_PX: f64 = 1_500.0;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            error!(error = %e, "failed to load .env");
        }
    }

    let config = match ViewSyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, code = e.error_code(), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        max_subscriptions = config.max_subscriptions,
        canvas_width = config.canvas_extent.width,
        canvas_height = config.canvas_extent.height,
        padding = config.window_padding,
        "viewsync demo configured"
    );

    let store = Arc::new(MemoryStore::new());
    seed_shapes(&store, &config);

    let observer = SyncStateObserver::new();
    let reconciler = Arc::new(Reconciler::with_capacity(store.clone(), observer.clone(), config.max_subscriptions));
    let tracker = WindowTracker::new(config.canvas_extent, config.window_padding);
    let session = spawn_viewport_session(reconciler.clone(), tracker, config.timing);

    if let Err(e) = replay_pan(&session.sender(), &config).await {
        error!(error = %e, code = e.error_code(), "viewport session ended early");
        return ExitCode::FAILURE;
    }

    let tracker = match session.shutdown().await {
        Ok(tracker) => tracker,
        Err(e) => {
            error!(error = %e, code = e.error_code(), "viewport session failed");
            return ExitCode::FAILURE;
        }
    };

    // let the last sync settle
    tokio::time::sleep(Duration::from_millis(10)).await;

    let areas = reconciler.loaded_areas();
    info!(count = areas.len(), state = ?observer.current(), "loaded areas");
    for area in &areas {
        info!(left = area.left, top = area.top, right = area.right, bottom = area.bottom, "area");
    }

    let visible = tracker.visible_box();
    match store.query(&AreaPredicate::new(visible)).await {
        Ok(shapes) => info!(visible = shapes.len(), total = store.shape_count(), "shapes in final viewport"),
        Err(e) => {
            error!(error = %e, code = e.error_code(), "query failed");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// Layout at the canvas center, pan diagonally, release.
async fn replay_pan(tx: &mpsc::Sender<ViewportEvent>, config: &ViewSyncConfig) -> Result<(), SessionError> {
    let center_v = config.canvas_extent.height / 2.0;
    let center_h = config.canvas_extent.width / 2.0;

    send(tx, ViewportEvent::Layout { width: 1_280.0, height: 720.0, vertical: center_v, horizontal: center_h })
        .await?;
    tokio::time::sleep(config.timing.settle * 2).await;

    send(tx, ViewportEvent::GestureStart).await?;
    for _ in 0..PAN_STEPS {
        send(tx, ViewportEvent::ScrollBy { vertical: PAN_STEP_PX, horizontal: PAN_STEP_PX }).await?;
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    send(tx, ViewportEvent::GestureEnd).await?;

    // a few settled jumps to show eviction
    let mut jump = 0.0;
    for _ in 0..config.max_subscriptions {
        jump += JUMP_PX;
        send(tx, ViewportEvent::Scroll { vertical: center_v, horizontal: center_h + jump }).await?;
        tokio::time::sleep(config.timing.settle * 2).await;
    }
    Ok(())
}

async fn send(tx: &mpsc::Sender<ViewportEvent>, event: ViewportEvent) -> Result<(), SessionError> {
    tx.send(event).await.map_err(|_| SessionError::Closed)
}

/// Random rectangles scattered over the whole canvas.
fn seed_shapes(store: &MemoryStore, config: &ViewSyncConfig) {
    let mut rng = rand::rng();
    let half_w = config.canvas_extent.width / 2.0;
    let half_h = config.canvas_extent.height / 2.0;

    for _ in 0..SEED_SHAPES {
        let left = rng.random_range(-half_w..half_w);
        let top = rng.random_range(-half_h..half_h);
        let mut shape =
            Component::rectangle(left, top, left + rng.random_range(10.0..200.0), top + rng.random_range(10.0..200.0));
        shape.z = rng.random_range(0.0..100.0);
        shape.fill_color = ColorValue::Int(rng.random_range(0..0x00FF_FFFF));
        store.insert_shape(shape);
    }
    info!(count = SEED_SHAPES, "seeded shapes");
}
