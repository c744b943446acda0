//! Named spatial subscriptions and the mutable view handed to store updates.
//!
//! DESIGN
//! ======
//! A settled window is registered under a name that encodes its four
//! coordinates (`Area[left,top,right,bottom]`), so identical windows collapse
//! onto the same subscription and the loaded-areas view can be rebuilt from
//! names alone. Coordinates use `f64`'s shortest round-tripping rendering,
//! which makes encode → decode exact.
//!
//! The in-progress pan gesture owns one fixed-name subscription
//! ([`GESTURE_SUBSCRIPTION`]) whose predicate is replaced in place. It never
//! parses as an area.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::geometry::BoundingBox;
use crate::predicate::AreaPredicate;

#[cfg(test)]
#[path = "subscription_test.rs"]
mod tests;

/// Hard cap on concurrently active subscriptions.
pub const MAX_SUBSCRIPTIONS: usize = 10;

/// Name of the subscription that follows an in-progress pan gesture.
pub const GESTURE_SUBSCRIPTION: &str = "offset";

const AREA_PREFIX: &str = "Area[";
const AREA_SUFFIX: char = ']';

// =============================================================================
// TYPES
// =============================================================================

/// A named, server-registered spatial filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub predicate: AreaPredicate,
    /// Milliseconds since Unix epoch, assigned by the store.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("not an area subscription: {0}")]
    NotArea(String),
    #[error("expected 4 coordinates, found {found}")]
    Arity { found: usize },
    #[error("invalid coordinate '{raw}'")]
    Coordinate { raw: String },
}

impl ErrorCode for NameError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotArea(_) => "E_NAME_NOT_AREA",
            Self::Arity { .. } => "E_NAME_ARITY",
            Self::Coordinate { .. } => "E_NAME_COORDINATE",
        }
    }
}

/// Outcome of [`MutableSubscriptionSet::add_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// Same name, predicate replaced; `created_at` kept.
    Updated,
    /// Same name and predicate; nothing written.
    Unchanged,
}

// =============================================================================
// NAMING
// =============================================================================

/// Deterministic subscription name for a window.
///
/// Equal windows always share a name: `-0.0` is written as `0`.
#[must_use]
pub fn area_name(window: &BoundingBox) -> String {
    format!(
        "{AREA_PREFIX}{},{},{},{}{AREA_SUFFIX}",
        unsigned_zero(window.left),
        unsigned_zero(window.top),
        unsigned_zero(window.right),
        unsigned_zero(window.bottom)
    )
}

fn unsigned_zero(coord: f64) -> f64 {
    coord + 0.0
}

/// Decode a name produced by [`area_name`].
pub fn parse_area_name(name: &str) -> Result<BoundingBox, NameError> {
    let inner = name
        .strip_prefix(AREA_PREFIX)
        .and_then(|rest| rest.strip_suffix(AREA_SUFFIX))
        .ok_or_else(|| NameError::NotArea(name.to_string()))?;

    let parts: Vec<&str> = inner.split(',').collect();
    let [left, top, right, bottom] = parts.as_slice() else {
        return Err(NameError::Arity { found: parts.len() });
    };

    Ok(BoundingBox::new(coord(left)?, coord(top)?, coord(right)?, coord(bottom)?))
}

fn coord(raw: &str) -> Result<f64, NameError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| NameError::Coordinate { raw: raw.to_string() })
}

// =============================================================================
// MUTABLE SET
// =============================================================================

/// Working copy of the subscription list inside one atomic store update.
///
/// Entries stay ordered by `created_at` ascending: inserts always take a
/// timestamp greater than every earlier one, and updates keep theirs.
#[derive(Debug, Clone)]
pub struct MutableSubscriptionSet {
    entries: Vec<Subscription>,
    now_ms: i64,
    last_created_at: i64,
}

impl MutableSubscriptionSet {
    /// Wrap `entries`, stamping new inserts with `now_ms` (bumped to stay
    /// strictly increasing).
    #[must_use]
    pub fn new(mut entries: Vec<Subscription>, now_ms: i64) -> Self {
        entries.sort_by_key(|s| s.created_at);
        let last_created_at = entries.last().map_or(i64::MIN, |s| s.created_at);
        Self { entries, now_ms, last_created_at }
    }

    /// Never hand out a `created_at` at or below `floor`.
    #[must_use]
    pub fn with_created_floor(mut self, floor: i64) -> Self {
        self.last_created_at = self.last_created_at.max(floor);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Subscription> {
        self.entries.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Highest `created_at` handed out so far.
    #[must_use]
    pub fn last_created_at(&self) -> i64 {
        self.last_created_at
    }

    /// Register `predicate` under `name`, or replace the predicate of the
    /// existing entry with that name.
    pub fn add_or_update(&mut self, name: &str, predicate: AreaPredicate) -> Upsert {
        if let Some(existing) = self.entries.iter_mut().find(|s| s.name == name) {
            if existing.predicate == predicate {
                return Upsert::Unchanged;
            }
            existing.predicate = predicate;
            return Upsert::Updated;
        }

        let created_at = self.now_ms.max(self.last_created_at.saturating_add(1));
        self.last_created_at = created_at;
        self.entries.push(Subscription { name: name.to_string(), predicate, created_at });
        Upsert::Inserted
    }

    pub fn remove(&mut self, name: &str) -> Option<Subscription> {
        let idx = self.entries.iter().position(|s| s.name == name)?;
        Some(self.entries.remove(idx))
    }

    /// Remove oldest entries (never `protected`) until at most `keep` remain.
    pub fn evict_oldest(&mut self, keep: usize, protected: &str) -> Vec<Subscription> {
        let mut evicted = Vec::new();
        while self.entries.len() > keep {
            let Some(idx) = self.entries.iter().position(|s| s.name != protected) else {
                break;
            };
            evicted.push(self.entries.remove(idx));
        }
        evicted
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<Subscription> {
        self.entries
    }
}
