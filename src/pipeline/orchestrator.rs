//! Pipeline orchestrator — sequences fetches, reconciliation, and
//! aggregation into one immutable result snapshot.
//!
//! One run either fully succeeds and yields a snapshot, or fails and yields
//! nothing — there is no partial snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::crm::client::CrmClient;
use crate::crm::types::{Call, Card, NewLead, new_lead_card_ids};
use crate::crm::webhook::WebhookClient;
use crate::error::{CrmError, PipelineError};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::reconcile::reconcile;
use crate::pipeline::snapshot::ResultSnapshot;

/// Related objects embedded in card lookups.
const CARD_INCLUDE: &str = "custom_fields,manager";

// ── Collaborator seams ──────────────────────────────────────────────

/// CRM lookups the orchestrator needs — pure I/O, no business logic.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Fetch one card per id; any individual failure fails the whole batch.
    async fn fetch_cards_by_ids(
        &self,
        ids: &[i64],
        include: &str,
    ) -> Result<Vec<Card>, CrmError>;

    /// Fetch all calls placed on a date, following pagination up to a cap.
    async fn fetch_calls_for_date(
        &self,
        date: &str,
        max_calls: usize,
    ) -> Result<Vec<Call>, CrmError>;
}

/// The push-style new-leads feed.
#[async_trait]
pub trait LeadFeed: Send + Sync {
    async fn fetch_new_leads(&self) -> Result<Vec<NewLead>, CrmError>;
}

#[async_trait]
impl CardSource for CrmClient {
    async fn fetch_cards_by_ids(
        &self,
        ids: &[i64],
        include: &str,
    ) -> Result<Vec<Card>, CrmError> {
        CrmClient::fetch_cards_by_ids(self, ids, include).await
    }

    async fn fetch_calls_for_date(
        &self,
        date: &str,
        max_calls: usize,
    ) -> Result<Vec<Call>, CrmError> {
        self.fetch_all_calls(Some(date), &BTreeMap::new(), max_calls, "")
            .await
    }
}

#[async_trait]
impl LeadFeed for WebhookClient {
    async fn fetch_new_leads(&self) -> Result<Vec<NewLead>, CrmError> {
        WebhookClient::fetch_new_leads(self).await
    }
}

// ── Run phases ──────────────────────────────────────────────────────

/// Phases of one orchestration run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    FetchingWebhook,
    FetchingCalls,
    FetchingCards,
    Reconciling,
    Aggregating,
}

impl RunPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchingWebhook => "webhook fetch",
            Self::FetchingCalls => "calls fetch",
            Self::FetchingCards => "card lookups",
            Self::Reconciling => "reconcile",
            Self::Aggregating => "aggregate",
        }
    }
}

// ── Orchestrator ────────────────────────────────────────────────────

/// Runs the fetch → reconcile → aggregate pipeline.
pub struct Orchestrator {
    crm: Arc<dyn CardSource>,
    feed: Arc<dyn LeadFeed>,
    max_calls: usize,
}

impl Orchestrator {
    pub fn new(crm: Arc<dyn CardSource>, feed: Arc<dyn LeadFeed>, max_calls: usize) -> Self {
        Self {
            crm,
            feed,
            max_calls,
        }
    }

    /// Run the pipeline for today's date (local time).
    pub async fn run_today(&self) -> Result<ResultSnapshot, PipelineError> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        self.run(&today).await
    }

    /// Run the pipeline for a processing date, bounded by a deadline.
    pub async fn run_with_timeout(
        &self,
        processing_date: &str,
        deadline: Duration,
    ) -> Result<ResultSnapshot, PipelineError> {
        tokio::time::timeout(deadline, self.run(processing_date))
            .await
            .map_err(|_| PipelineError::DeadlineExceeded {
                seconds: deadline.as_secs(),
            })?
    }

    /// Run the full pipeline for one processing date.
    ///
    /// A failure during the webhook fetch or calls pagination aborts the
    /// run. A failure during a per-id card lookup degrades that batch to
    /// empty and the run continues.
    pub async fn run(&self, processing_date: &str) -> Result<ResultSnapshot, PipelineError> {
        debug!(phase = RunPhase::FetchingWebhook.label(), "Run started");
        let leads = self
            .feed
            .fetch_new_leads()
            .await
            .map_err(|source| PipelineError::Fetch {
                phase: RunPhase::FetchingWebhook.label(),
                source,
            })?;
        let webhook_ids = new_lead_card_ids(&leads);
        debug!(leads = leads.len(), ids = webhook_ids.len(), "Webhook feed fetched");

        debug!(phase = RunPhase::FetchingCalls.label(), "Fetching today's calls");
        let calls = self
            .crm
            .fetch_calls_for_date(processing_date, self.max_calls)
            .await
            .map_err(|source| PipelineError::Fetch {
                phase: RunPhase::FetchingCalls.label(),
                source,
            })?;
        let lead_ids = extract_lead_ids(&calls);
        debug!(calls = calls.len(), lead_ids = lead_ids.len(), "Calls fetched");

        // The two lookup batches are independent; join both before
        // reconciling.
        debug!(phase = RunPhase::FetchingCards.label(), "Fetching card details");
        let (webhook_cards, call_cards) = tokio::join!(
            self.fetch_card_batch(&webhook_ids, "webhook leads"),
            self.fetch_card_batch(&lead_ids, "call leads"),
        );

        debug!(phase = RunPhase::Reconciling.label(), "Reconciling buckets");
        let buckets = reconcile(webhook_cards, call_cards, processing_date);

        debug!(phase = RunPhase::Aggregating.label(), "Aggregating analytics");
        let analytics = aggregate(&buckets);

        let cards = buckets.all_cards();
        let snapshot = ResultSnapshot {
            count: cards.len(),
            cards,
            analytics,
            processing_date: processing_date.to_string(),
            processed_at: Utc::now(),
        };
        info!(
            count = snapshot.count,
            managers = snapshot.analytics.by_manager.len(),
            date = processing_date,
            "Run complete"
        );
        Ok(snapshot)
    }

    /// Fetch one card-lookup batch, degrading to empty on failure.
    ///
    /// The webhook-leads and call-leads branches are fetched and checked
    /// independently; losing one batch must not abort the whole run.
    async fn fetch_card_batch(&self, ids: &[i64], label: &str) -> Vec<Card> {
        if ids.is_empty() {
            return Vec::new();
        }
        match self.crm.fetch_cards_by_ids(ids, CARD_INCLUDE).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!(batch = label, error = %e, "Card lookup batch failed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Distinct integer lead ids from the day's calls.
///
/// Values that cannot be interpreted as integers are silently dropped — the
/// upstream calls API emits lead identifiers under an informally typed
/// field.
fn extract_lead_ids(calls: &[Call]) -> Vec<i64> {
    let mut dropped = 0usize;
    let ids: BTreeSet<i64> = calls
        .iter()
        .filter(|c| !c.lead_id.is_null())
        .filter_map(|c| {
            let id = c.lead_id_int();
            if id.is_none() {
                dropped += 1;
            }
            id
        })
        .collect();
    if dropped > 0 {
        debug!(dropped, "Dropped unparseable lead ids");
    }
    ids.into_iter().collect()
}
