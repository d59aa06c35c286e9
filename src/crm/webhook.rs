//! New-leads webhook — a single unauthenticated GET.

use std::time::Duration;

use crate::crm::types::NewLead;
use crate::error::CrmError;

/// Client for the push-style new-leads feed.
pub struct WebhookClient {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch today's new leads.
    ///
    /// An empty (or whitespace-only) body means "no new leads" and is not an
    /// error.
    pub async fn fetch_new_leads(&self) -> Result<Vec<NewLead>, CrmError> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CrmError::network("webhook", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CrmError::Network {
                endpoint: "webhook".into(),
                reason: format!("HTTP {status}"),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| CrmError::network("webhook", e))?;

        if body.trim().is_empty() {
            tracing::warn!("Webhook returned an empty body — no new leads");
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| CrmError::MalformedResponse {
            endpoint: "webhook".into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_decodes() {
        let leads: Vec<NewLead> =
            serde_json::from_str(r#"[{"card_id": 1, "source": "site"}, {"card_id": 2}]"#).unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].card_id, Some(1));
    }

    #[test]
    fn webhook_item_without_card_id_tolerated() {
        let leads: Vec<NewLead> = serde_json::from_str(r#"[{"note": "no id"}]"#).unwrap();
        assert_eq!(leads[0].card_id, None);
    }
}
