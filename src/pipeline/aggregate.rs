//! Aggregation of reconciled buckets into per-manager, per-category counts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::crm::types::Card;
use crate::pipeline::classify::{CardFlags, Category};
use crate::pipeline::reconcile::Buckets;

/// Counters for one (manager, category) cell.
///
/// All counters are non-negative and only ever incremented during a run.
/// The warm/cold pairs are mutually exclusive per card; `not_qualified` and
/// the closing-outcome counters are independent of them and of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricCell {
    pub new_warm: u32,
    pub new_cold: u32,
    pub prior_warm: u32,
    pub prior_cold: u32,
    pub not_qualified: u32,
    pub closed_meeting_kyiv: u32,
    pub closed_training_recorded: u32,
    pub closed_meeting_online: u32,
}

impl MetricCell {
    /// Add another cell into this one, metric by metric.
    pub fn add(&mut self, other: &MetricCell) {
        self.new_warm += other.new_warm;
        self.new_cold += other.new_cold;
        self.prior_warm += other.prior_warm;
        self.prior_cold += other.prior_cold;
        self.not_qualified += other.not_qualified;
        self.closed_meeting_kyiv += other.closed_meeting_kyiv;
        self.closed_training_recorded += other.closed_training_recorded;
        self.closed_meeting_online += other.closed_meeting_online;
    }
}

/// Nested counts: manager → category → metrics.
///
/// Categories a manager has no cards in stay absent; presentation re-derives
/// zero rows. BTreeMap keys keep iteration (and rendering) deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analytics {
    pub by_manager: BTreeMap<String, BTreeMap<Category, MetricCell>>,
}

impl Analytics {
    /// The cell for a (manager, category) pair, zeroed when absent.
    pub fn cell(&self, manager: &str, category: Category) -> MetricCell {
        self.by_manager
            .get(manager)
            .and_then(|cats| cats.get(&category))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of all metrics for one manager across categories.
    pub fn manager_total(&self, manager: &str) -> MetricCell {
        let mut total = MetricCell::default();
        if let Some(cats) = self.by_manager.get(manager) {
            for cell in cats.values() {
                total.add(cell);
            }
        }
        total
    }

    /// Sum of every metric across all managers and categories.
    ///
    /// Pure on-demand reduction; never stored as state.
    pub fn grand_total(&self) -> MetricCell {
        let mut total = MetricCell::default();
        for cats in self.by_manager.values() {
            for cell in cats.values() {
                total.add(cell);
            }
        }
        total
    }
}

/// Which bucket a card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    New,
    Prior,
}

/// Derive the manager identity key for a card.
///
/// `"{first_name} {last_name}"` with `N/A` standing in for a missing half.
/// When both names are absent, fall back to the numeric manager id so that
/// distinct anonymous managers do not collapse into one bucket.
pub fn manager_key(card: &Card) -> String {
    let manager = card.manager.as_ref();
    let first = manager.and_then(|m| m.first_name.as_deref());
    let last = manager.and_then(|m| m.last_name.as_deref());

    match (first, last) {
        (None, None) => {
            let id = manager.and_then(|m| m.id).or(card.manager_id);
            match id {
                Some(id) => format!("manager #{id}"),
                None => "N/A N/A".to_string(),
            }
        }
        (first, last) => format!("{} {}", first.unwrap_or("N/A"), last.unwrap_or("N/A")),
    }
}

/// Fold the reconciled buckets into the nested analytics structure.
///
/// Cards whose pipeline id maps to no category are skipped. A pure fold over
/// its input: aggregating the same buckets twice yields identical output.
pub fn aggregate(buckets: &Buckets) -> Analytics {
    let mut analytics = Analytics::default();

    let labelled = [(Bucket::New, &buckets.new), (Bucket::Prior, &buckets.prior)];
    for (bucket, cards) in labelled {
        for card in cards.iter() {
            let Some(category) = card.pipeline_id.and_then(Category::of) else {
                tracing::debug!(card_id = card.id, "Card outside category table, skipped");
                continue;
            };

            let key = manager_key(card);
            let flags = CardFlags::derive(card);
            let cell = analytics
                .by_manager
                .entry(key)
                .or_default()
                .entry(category)
                .or_default();

            match (bucket, flags.warm) {
                (Bucket::New, true) => cell.new_warm += 1,
                (Bucket::New, false) => cell.new_cold += 1,
                (Bucket::Prior, true) => cell.prior_warm += 1,
                (Bucket::Prior, false) => cell.prior_cold += 1,
            }

            if flags.not_qualified(card.status_id) {
                cell.not_qualified += 1;
            }
            if flags.closed_meeting_kyiv {
                cell.closed_meeting_kyiv += 1;
            }
            if flags.closed_training_recorded {
                cell.closed_training_recorded += 1;
            }
            if flags.closed_meeting_online {
                cell.closed_meeting_online += 1;
            }
        }
    }

    analytics
}
