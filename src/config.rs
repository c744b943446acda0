//! Configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ErrorCode;
use crate::geometry::CanvasExtent;
use crate::subscription::MAX_SUBSCRIPTIONS;

pub const DEFAULT_CANVAS_WIDTH: f64 = 10_000.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 10_000.0;
pub const DEFAULT_WINDOW_PADDING: f64 = 0.0;
pub const DEFAULT_SETTLE_MS: u64 = 150;
pub const DEFAULT_GESTURE_THROTTLE_MS: u64 = 50;
pub const DEFAULT_EVENT_QUEUE: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value}")]
    OutOfRange { key: &'static str, expected: &'static str, value: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "E_CONFIG_RANGE",
        }
    }
}

/// Session timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Quiet period after the last non-gesture update before reconciling.
    pub settle: Duration,
    /// Minimum spacing between in-gesture window updates.
    pub gesture_throttle: Duration,
    /// Bounded event channel capacity.
    pub event_queue: usize,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            gesture_throttle: Duration::from_millis(DEFAULT_GESTURE_THROTTLE_MS),
            event_queue: DEFAULT_EVENT_QUEUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSyncConfig {
    pub max_subscriptions: usize,
    pub canvas_extent: CanvasExtent,
    /// Prefetch padding as a fraction of the viewport, per side.
    pub window_padding: f64,
    pub timing: SessionTiming,
}

impl Default for ViewSyncConfig {
    fn default() -> Self {
        Self {
            max_subscriptions: MAX_SUBSCRIPTIONS,
            canvas_extent: CanvasExtent { width: DEFAULT_CANVAS_WIDTH, height: DEFAULT_CANVAS_HEIGHT },
            window_padding: DEFAULT_WINDOW_PADDING,
            timing: SessionTiming::default(),
        }
    }
}

impl ViewSyncConfig {
    /// Build config from environment variables.
    ///
    /// Optional (unparseable values fall back to the default):
    /// - `VIEWSYNC_MAX_SUBSCRIPTIONS`: default 10
    /// - `VIEWSYNC_CANVAS_WIDTH` / `VIEWSYNC_CANVAS_HEIGHT`: default 10000
    /// - `VIEWSYNC_WINDOW_PADDING`: default 0.0
    /// - `VIEWSYNC_SETTLE_MS`: default 150
    /// - `VIEWSYNC_GESTURE_THROTTLE_MS`: default 50
    /// - `VIEWSYNC_EVENT_QUEUE`: default 64
    ///
    /// # Errors
    ///
    /// Returns an error if a parsed value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            max_subscriptions: env_parse("VIEWSYNC_MAX_SUBSCRIPTIONS", MAX_SUBSCRIPTIONS),
            canvas_extent: CanvasExtent {
                width: env_parse("VIEWSYNC_CANVAS_WIDTH", DEFAULT_CANVAS_WIDTH),
                height: env_parse("VIEWSYNC_CANVAS_HEIGHT", DEFAULT_CANVAS_HEIGHT),
            },
            window_padding: env_parse("VIEWSYNC_WINDOW_PADDING", DEFAULT_WINDOW_PADDING),
            timing: SessionTiming {
                settle: Duration::from_millis(env_parse("VIEWSYNC_SETTLE_MS", DEFAULT_SETTLE_MS)),
                gesture_throttle: Duration::from_millis(env_parse(
                    "VIEWSYNC_GESTURE_THROTTLE_MS",
                    DEFAULT_GESTURE_THROTTLE_MS,
                )),
                event_queue: env_parse("VIEWSYNC_EVENT_QUEUE", DEFAULT_EVENT_QUEUE),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_subscriptions == 0 {
            return Err(out_of_range("VIEWSYNC_MAX_SUBSCRIPTIONS", "at least 1", self.max_subscriptions));
        }
        if !(self.canvas_extent.width.is_finite() && self.canvas_extent.width > 0.0) {
            return Err(out_of_range("VIEWSYNC_CANVAS_WIDTH", "positive", self.canvas_extent.width));
        }
        if !(self.canvas_extent.height.is_finite() && self.canvas_extent.height > 0.0) {
            return Err(out_of_range("VIEWSYNC_CANVAS_HEIGHT", "positive", self.canvas_extent.height));
        }
        if !(self.window_padding.is_finite() && self.window_padding >= 0.0) {
            return Err(out_of_range("VIEWSYNC_WINDOW_PADDING", "non-negative", self.window_padding));
        }
        if self.timing.event_queue == 0 {
            return Err(out_of_range("VIEWSYNC_EVENT_QUEUE", "at least 1", self.timing.event_queue));
        }
        Ok(())
    }
}

fn out_of_range(key: &'static str, expected: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange { key, expected, value: value.to_string() }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
