//! Wire types for the KeyCRM API and the new-leads webhook.
//!
//! Upstream payloads are loosely structured — most fields are optional and a
//! few (`lead_id`, custom-field `value`) are informally typed. Everything is
//! normalized here, in one decoding step, so the pipeline never touches raw
//! JSON.

use serde::{Deserialize, Serialize};

// ── Cards ───────────────────────────────────────────────────────────

/// A pipeline card — an immutable snapshot of a lead/deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    /// Creation timestamp as emitted by the CRM: `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pipeline_id: Option<i64>,
    #[serde(default)]
    pub status_id: Option<i64>,
    /// Present iff the card has an assigned manager.
    #[serde(default)]
    pub manager_id: Option<i64>,
    #[serde(default)]
    pub manager: Option<Manager>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Card {
    /// The `YYYY-MM-DD` date prefix of the creation timestamp, if any.
    ///
    /// Date comparisons throughout the pipeline are prefix-based, matching
    /// the string format the CRM emits.
    pub fn created_date(&self) -> Option<&str> {
        let ts = self.created_at.as_deref()?;
        ts.get(..10)
    }

    /// Whether the card carries an assigned manager.
    pub fn has_manager(&self) -> bool {
        self.manager_id.is_some()
    }
}

/// Owning manager of a card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manager {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Contact attached to a card (raw listing only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// An arbitrary named attribute attached to a card.
///
/// Only boolean-interpretable values are consulted; see
/// [`crate::pipeline::classify::truthy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

// ── Calls ───────────────────────────────────────────────────────────

/// A call record from the `/calls` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    #[serde(default)]
    pub id: Option<i64>,
    /// The upstream calls API emits lead identifiers under an informally
    /// typed field — sometimes an integer, sometimes a string.
    #[serde(default)]
    pub lead_id: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Call {
    /// Interpret `lead_id` as an integer identifier, if possible.
    pub fn lead_id_int(&self) -> Option<i64> {
        match &self.lead_id {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The `YYYY-MM-DD` date prefix of the call timestamp, if any.
    pub fn created_date(&self) -> Option<&str> {
        self.created_at.as_deref()?.get(..10)
    }
}

/// One page of the paginated `/calls` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallsPage {
    #[serde(default)]
    pub data: Vec<Call>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

// ── Pipeline statuses ───────────────────────────────────────────────

/// A status within a pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineStatus {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Webhook feed ────────────────────────────────────────────────────

/// One item of the new-leads webhook feed.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub card_id: Option<i64>,
}

/// Distinct card ids from a webhook payload, first-seen order preserved.
pub fn new_lead_card_ids(leads: &[NewLead]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    leads
        .iter()
        .filter_map(|l| l.card_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_decodes_with_missing_fields() {
        let card: Card = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(card.id, 7);
        assert!(card.created_at.is_none());
        assert!(card.custom_fields.is_empty());
        assert!(!card.has_manager());
    }

    #[test]
    fn card_created_date_is_ten_char_prefix() {
        let card: Card =
            serde_json::from_str(r#"{"id": 1, "created_at": "2025-03-14 09:30:00"}"#).unwrap();
        assert_eq!(card.created_date(), Some("2025-03-14"));
    }

    #[test]
    fn card_created_date_short_timestamp_is_none() {
        let card: Card = serde_json::from_str(r#"{"id": 1, "created_at": "2025"}"#).unwrap();
        assert_eq!(card.created_date(), None);
    }

    #[test]
    fn call_lead_id_from_number() {
        let call: Call = serde_json::from_str(r#"{"id": 1, "lead_id": 42}"#).unwrap();
        assert_eq!(call.lead_id_int(), Some(42));
    }

    #[test]
    fn call_lead_id_from_string() {
        let call: Call = serde_json::from_str(r#"{"id": 1, "lead_id": " 42 "}"#).unwrap();
        assert_eq!(call.lead_id_int(), Some(42));
    }

    #[test]
    fn call_lead_id_garbage_is_none() {
        let call: Call = serde_json::from_str(r#"{"id": 1, "lead_id": "n/a"}"#).unwrap();
        assert_eq!(call.lead_id_int(), None);

        let call: Call = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(call.lead_id_int(), None);
    }

    #[test]
    fn calls_page_decodes_pagination_fields() {
        let page: CallsPage = serde_json::from_str(
            r#"{"data": [{"id": 1, "lead_id": 5}], "current_page": 2, "total": 120, "per_page": 50}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.current_page, Some(2));
        assert_eq!(page.total, Some(120));
        assert_eq!(page.per_page, Some(50));
    }

    #[test]
    fn new_lead_ids_deduplicated_in_order() {
        let leads: Vec<NewLead> =
            serde_json::from_str(r#"[{"card_id": 2}, {"card_id": 1}, {"card_id": 2}, {}]"#)
                .unwrap();
        assert_eq!(new_lead_card_ids(&leads), vec![2, 1]);
    }
}
