#![allow(clippy::float_cmp)]

use super::*;

fn extent() -> CanvasExtent {
    CanvasExtent { width: 10_000.0, height: 8_000.0 }
}

#[test]
fn before_layout_box_is_empty() {
    let tracker = WindowTracker::new(extent(), 0.0);
    let b = tracker.bounding_box();
    assert!(b.is_empty());
    assert_eq!(b, BoundingBox::new(-5_000.0, -4_000.0, -5_000.0, -4_000.0));
}

#[test]
fn set_viewport_size_centers_world_origin() {
    let mut tracker = WindowTracker::new(extent(), 0.0);
    let b = tracker.set_viewport_size(800.0, 600.0, 4_000.0, 5_000.0);
    assert_eq!(b, BoundingBox::new(0.0, 0.0, 800.0, 600.0));
}

#[test]
fn set_viewport_size_replaces_all_fields() {
    let mut tracker = WindowTracker::new(extent(), 0.0);
    tracker.set_viewport_size(800.0, 600.0, 10.0, 20.0);
    tracker.set_viewport_size(400.0, 300.0, 1.0, 2.0);
    assert_eq!(tracker.viewport(), Viewport { width: 400.0, height: 300.0 });
    assert_eq!(tracker.scroll(), ScrollPosition { vertical: 1.0, horizontal: 2.0 });
}

#[test]
fn scroll_to_keeps_viewport() {
    let mut tracker = WindowTracker::new(extent(), 0.0);
    tracker.set_viewport_size(800.0, 600.0, 0.0, 0.0);
    let b = tracker.scroll_to(4_100.0, 5_200.0);
    assert_eq!(b, BoundingBox::new(200.0, 100.0, 1_000.0, 700.0));
}

#[test]
fn scroll_by_accumulates_deltas() {
    let mut tracker = WindowTracker::new(extent(), 0.0);
    tracker.set_viewport_size(100.0, 100.0, 4_000.0, 5_000.0);
    tracker.scroll_by(10.0, -20.0);
    let b = tracker.scroll_by(10.0, -20.0);
    assert_eq!(tracker.scroll(), ScrollPosition { vertical: 4_020.0, horizontal: 4_960.0 });
    assert_eq!(b, BoundingBox::new(-40.0, 20.0, 60.0, 120.0));
}

#[test]
fn padding_grows_box_by_viewport_fraction() {
    let mut tracker = WindowTracker::new(extent(), 0.5);
    let b = tracker.set_viewport_size(800.0, 600.0, 4_000.0, 5_000.0);
    assert_eq!(b, BoundingBox::new(-400.0, -300.0, 1_200.0, 900.0));
    assert_eq!(tracker.visible_box(), BoundingBox::new(0.0, 0.0, 800.0, 600.0));
}

#[test]
fn padding_on_empty_viewport_stays_empty() {
    let tracker = WindowTracker::new(extent(), 0.25);
    assert!(tracker.bounding_box().is_empty());
}

#[test]
fn invalid_padding_is_ignored() {
    assert_eq!(WindowTracker::new(extent(), -1.0).padding(), 0.0);
    assert_eq!(WindowTracker::new(extent(), f64::NAN).padding(), 0.0);
    assert_eq!(WindowTracker::new(extent(), f64::INFINITY).padding(), 0.0);
}
