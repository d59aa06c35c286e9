//! End-to-end pipeline runs over mock collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lead_pulse::crm::types::{Call, Card, NewLead};
use lead_pulse::error::CrmError;
use lead_pulse::pipeline::classify::{FIELD_QUALIFIED, FIELD_WARM};
use lead_pulse::pipeline::{CardSource, Category, LeadFeed, Orchestrator, SnapshotSlot};

const TODAY: &str = "2025-03-14";

// ── Mock collaborators ──────────────────────────────────────────────

struct MockCrm {
    cards: HashMap<i64, Card>,
    calls: Vec<Call>,
}

#[async_trait]
impl CardSource for MockCrm {
    async fn fetch_cards_by_ids(&self, ids: &[i64], _include: &str) -> Result<Vec<Card>, CrmError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.cards.get(id).cloned())
            .collect())
    }

    async fn fetch_calls_for_date(
        &self,
        _date: &str,
        max_calls: usize,
    ) -> Result<Vec<Call>, CrmError> {
        Ok(self.calls.iter().take(max_calls).cloned().collect())
    }
}

struct MockFeed {
    leads: Vec<NewLead>,
    fail: bool,
}

#[async_trait]
impl LeadFeed for MockFeed {
    async fn fetch_new_leads(&self) -> Result<Vec<NewLead>, CrmError> {
        if self.fail {
            return Err(CrmError::Network {
                endpoint: "webhook".into(),
                reason: "connection reset".into(),
            });
        }
        Ok(self.leads.clone())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn lead(card_id: i64) -> NewLead {
    serde_json::from_value(json!({"card_id": card_id})).unwrap()
}

fn call(lead_id: serde_json::Value) -> Call {
    serde_json::from_value(json!({
        "id": 1,
        "lead_id": lead_id,
        "created_at": format!("{TODAY} 11:30:00"),
    }))
    .unwrap()
}

fn card(
    id: i64,
    created: &str,
    pipeline_id: i64,
    status_id: Option<i64>,
    manager: (i64, &str, &str),
    fields: Vec<(&str, serde_json::Value)>,
) -> Card {
    serde_json::from_value(json!({
        "id": id,
        "created_at": format!("{created} 09:00:00"),
        "pipeline_id": pipeline_id,
        "status_id": status_id,
        "manager_id": manager.0,
        "manager": {"id": manager.0, "first_name": manager.1, "last_name": manager.2},
        "custom_fields": fields
            .into_iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect::<Vec<_>>(),
    }))
    .unwrap()
}

/// The reference scenario: two webhook leads, one call-only lead created
/// today, and one call duplicating a webhook lead.
fn scenario() -> (MockCrm, MockFeed) {
    let cards = vec![
        card(
            1,
            "2025-03-01",
            1,
            Some(100),
            (5, "A", "B"),
            vec![(FIELD_WARM, json!(true)), (FIELD_QUALIFIED, json!(true))],
        ),
        card(
            2,
            "2025-03-01",
            2,
            Some(341),
            (5, "A", "B"),
            vec![(FIELD_QUALIFIED, json!(true))],
        ),
        card(
            3,
            TODAY,
            0,
            Some(100),
            (6, "C", "D"),
            vec![(FIELD_QUALIFIED, json!(true))],
        ),
    ];
    let crm = MockCrm {
        cards: cards.into_iter().map(|c| (c.id, c)).collect(),
        calls: vec![call(json!(3)), call(json!(1))],
    };
    let feed = MockFeed {
        leads: vec![lead(1), lead(2)],
        fail: false,
    };
    (crm, feed)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn reference_scenario_reconciles_and_aggregates() {
    let (crm, feed) = scenario();
    let orchestrator = Orchestrator::new(Arc::new(crm), Arc::new(feed), 400);

    let snapshot = orchestrator.run(TODAY).await.unwrap();

    // New = [1, 2, 3] without duplicates, Prior = [].
    let ids: Vec<i64> = snapshot.cards.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(snapshot.count, 3);

    // A B / SuperDiamond: the warm webhook card.
    let cell = snapshot.analytics.cell("A B", Category::SuperDiamond);
    assert_eq!(cell.new_warm, 1);
    assert_eq!(cell.new_cold, 0);
    assert_eq!(cell.not_qualified, 0);

    // A B / Diamond: cold and disqualified by status.
    let cell = snapshot.analytics.cell("A B", Category::Diamond);
    assert_eq!(cell.new_cold, 1);
    assert_eq!(cell.not_qualified, 1);

    // C D / NonDiamond: the call-only card created today, no warm signal.
    let cell = snapshot.analytics.cell("C D", Category::NonDiamond);
    assert_eq!(cell.new_cold, 1);
    assert_eq!(cell.prior_warm + cell.prior_cold, 0);
}

#[tokio::test]
async fn report_renders_reference_scenario() {
    let (crm, feed) = scenario();
    let orchestrator = Orchestrator::new(Arc::new(crm), Arc::new(feed), 400);
    let snapshot = orchestrator.run(TODAY).await.unwrap();

    let report = lead_pulse::report::render(&snapshot);
    assert!(report.contains("A B"));
    assert!(report.contains("C D"));
    assert!(report.contains("Всього (всі менеджери)"));
}

#[tokio::test]
async fn failed_run_leaves_previous_snapshot_untouched() {
    let slot = SnapshotSlot::new();

    let (crm, feed) = scenario();
    let orchestrator = Orchestrator::new(Arc::new(crm), Arc::new(feed), 400);
    slot.publish(orchestrator.run(TODAY).await.unwrap());
    let first = slot.latest().unwrap();

    let (crm, _) = scenario();
    let failing = Orchestrator::new(
        Arc::new(crm),
        Arc::new(MockFeed {
            leads: vec![],
            fail: true,
        }),
        400,
    );
    assert!(failing.run(TODAY).await.is_err());

    // No publish happened; readers still see the first snapshot.
    let current = slot.latest().unwrap();
    assert!(Arc::ptr_eq(&first, &current));
    assert_eq!(current.count, 3);
}

#[tokio::test]
async fn empty_webhook_body_is_not_an_error() {
    let (crm, _) = scenario();
    let orchestrator = Orchestrator::new(
        Arc::new(crm),
        Arc::new(MockFeed {
            leads: vec![],
            fail: false,
        }),
        400,
    );

    // New derives solely from calls created today.
    let snapshot = orchestrator.run(TODAY).await.unwrap();
    let ids: Vec<i64> = snapshot.cards.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![3, 1]);
}
