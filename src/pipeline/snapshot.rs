//! Result snapshot and the caller-owned slot that publishes it.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crm::types::Card;
use crate::pipeline::aggregate::Analytics;

/// The immutable result of one successful orchestration run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSnapshot {
    /// All reconciled cards, New bucket first.
    pub cards: Vec<Card>,
    /// Per-manager, per-category counts.
    pub analytics: Analytics,
    /// Total number of reconciled cards.
    pub count: usize,
    /// Processing date the run was keyed on (`YYYY-MM-DD`).
    pub processing_date: String,
    /// When the run completed.
    pub processed_at: DateTime<Utc>,
}

/// Caller-owned handle to the latest snapshot.
///
/// A run publishes its snapshot wholesale on success only; a failed run
/// leaves the previous snapshot untouched. Concurrent readers always see
/// either the previous complete snapshot or the new one.
#[derive(Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<RwLock<Option<Arc<ResultSnapshot>>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: ResultSnapshot) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(snapshot));
    }

    /// The latest published snapshot, if any run has succeeded yet.
    pub fn latest(&self) -> Option<Arc<ResultSnapshot>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(count: usize) -> ResultSnapshot {
        ResultSnapshot {
            cards: Vec::new(),
            analytics: Analytics::default(),
            count,
            processing_date: "2025-03-14".into(),
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn slot_starts_empty() {
        assert!(SnapshotSlot::new().latest().is_none());
    }

    #[test]
    fn publish_replaces_wholesale() {
        let slot = SnapshotSlot::new();
        slot.publish(snapshot(1));
        slot.publish(snapshot(2));
        assert_eq!(slot.latest().unwrap().count, 2);
    }

    #[test]
    fn readers_share_the_same_snapshot() {
        let slot = SnapshotSlot::new();
        slot.publish(snapshot(3));
        let a = slot.latest().unwrap();
        let b = slot.latest().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
