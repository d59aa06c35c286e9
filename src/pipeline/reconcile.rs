//! Reconciliation of webhook-sourced and call-derived cards into the
//! New/Prior buckets.

use std::collections::HashSet;

use crate::crm::types::Card;

/// The two disjoint buckets one run partitions cards into.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    /// First-contact-today leads: webhook cards plus cards created on the
    /// processing date that had a call today.
    pub new: Vec<Card>,
    /// Previously known leads with call activity today.
    pub prior: Vec<Card>,
}

impl Buckets {
    /// All cards across both buckets, New first.
    pub fn all_cards(&self) -> Vec<Card> {
        let mut cards = self.new.clone();
        cards.extend(self.prior.iter().cloned());
        cards
    }
}

/// Merge webhook cards and call-derived cards into disjoint buckets.
///
/// Invariants on the output:
/// - `new` and `prior` are disjoint by card id — a card already counted as
///   New is never also counted as Prior.
/// - A card without an assigned manager appears in neither bucket.
/// - Order is preserved: webhook cards first, then today's call cards.
pub fn reconcile(webhook_cards: Vec<Card>, call_cards: Vec<Card>, processing_date: &str) -> Buckets {
    let (calls_today, calls_prior): (Vec<Card>, Vec<Card>) = call_cards
        .into_iter()
        .filter(Card::has_manager)
        .partition(|card| card.created_date() == Some(processing_date));

    let mut new_ids: HashSet<i64> = HashSet::new();
    let mut new = Vec::new();
    for card in webhook_cards
        .into_iter()
        .filter(|c| c.has_manager())
        .chain(calls_today)
    {
        // Same id in both sources: keep the first occurrence's data.
        if new_ids.insert(card.id) {
            new.push(card);
        }
    }

    let prior: Vec<Card> = calls_prior
        .into_iter()
        .filter(|card| !new_ids.contains(&card.id))
        .collect();

    tracing::debug!(
        new = new.len(),
        prior = prior.len(),
        date = processing_date,
        "Reconciled card buckets"
    );

    Buckets { new, prior }
}
