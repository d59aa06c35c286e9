//! KeyCRM API client — cards, calls, and pipeline statuses over HTTP.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::Settings;
use crate::crm::types::{Call, Card, CallsPage, PipelineStatus};
use crate::error::CrmError;

/// Page size for the paginated `/calls` endpoint (API maximum).
const CALLS_PAGE_LIMIT: u32 = 50;

/// HTTP client for the KeyCRM API.
pub struct CrmClient {
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
    client: reqwest::Client,
}

impl CrmClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a CRM endpoint and decode the JSON body.
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, CrmError> {
        let url = self.endpoint(path);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CrmError::network(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CrmError::Network {
                endpoint: path.to_string(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        resp.json().await.map_err(|e| CrmError::network(path, e))
    }

    /// Fetch a single card by id.
    ///
    /// `include` names related objects to embed (e.g. `custom_fields,manager`).
    pub async fn fetch_card(&self, card_id: i64, include: &str) -> Result<Card, CrmError> {
        let path = format!("/pipelines/cards/{card_id}");
        let mut query = Vec::new();
        if !include.is_empty() {
            query.push(("include".to_string(), include.to_string()));
        }

        let payload = self.get_json(&path, &query).await?;
        let card = unwrap_data(payload);
        serde_json::from_value(card).map_err(|e| CrmError::MalformedResponse {
            endpoint: path,
            reason: e.to_string(),
        })
    }

    /// Fetch one card per id — the API offers no true batch endpoint.
    ///
    /// A failure on any individual fetch aborts the whole call.
    pub async fn fetch_cards_by_ids(
        &self,
        card_ids: &[i64],
        include: &str,
    ) -> Result<Vec<Card>, CrmError> {
        let mut cards = Vec::with_capacity(card_ids.len());
        for &id in card_ids {
            cards.push(self.fetch_card(id, include).await?);
        }
        tracing::debug!(count = cards.len(), "Fetched cards by ids");
        Ok(cards)
    }

    /// Fetch one page of calls.
    ///
    /// Filters are rendered as `filter[{key}]={value}` query parameters.
    pub async fn fetch_calls_page(
        &self,
        limit: u32,
        page: u32,
        include: &str,
        filters: &BTreeMap<String, String>,
    ) -> Result<CallsPage, CrmError> {
        let mut query = vec![
            ("limit".to_string(), limit.to_string()),
            ("page".to_string(), page.to_string()),
        ];
        if !include.is_empty() {
            query.push(("include".to_string(), include.to_string()));
        }
        for (key, value) in filters {
            query.push((format!("filter[{key}]"), value.clone()));
        }

        let payload = self.get_json("/calls", &query).await?;
        Ok(decode_calls_page(payload))
    }

    /// Fetch all calls for a date, following pagination up to `max_calls`.
    ///
    /// When `date` is set, a `created_between` range filter covering that day
    /// is synthesized, and results are additionally filtered client-side by
    /// exact date prefix as a safety net against server-side imprecision.
    pub async fn fetch_all_calls(
        &self,
        date: Option<&str>,
        filters: &BTreeMap<String, String>,
        max_calls: usize,
        include: &str,
    ) -> Result<Vec<Call>, CrmError> {
        let mut filters = filters.clone();
        if let Some(date) = date {
            filters.insert(
                "created_between".to_string(),
                format!("{date} 00:00:00, {date} 23:59:59"),
            );
        }

        let source = CallsEndpoint {
            client: self,
            include,
            filters: &filters,
        };
        collect_calls(&source, date, max_calls).await
    }

    /// Fetch the statuses of a pipeline.
    pub async fn fetch_pipeline_statuses(
        &self,
        pipeline_id: i64,
    ) -> Result<Vec<PipelineStatus>, CrmError> {
        let path = format!("/pipelines/{pipeline_id}/statuses");
        let payload = self.get_json(&path, &[]).await?;
        serde_json::from_value(unwrap_data(payload)).map_err(|e| CrmError::MalformedResponse {
            endpoint: path,
            reason: e.to_string(),
        })
    }
}

/// One page of calls by page number — the seam `collect_calls` paginates
/// over.
#[async_trait]
trait CallsPageSource: Sync {
    async fn page(&self, page: u32) -> Result<CallsPage, CrmError>;
}

/// The live `/calls` endpoint as a page source.
struct CallsEndpoint<'a> {
    client: &'a CrmClient,
    include: &'a str,
    filters: &'a BTreeMap<String, String>,
}

#[async_trait]
impl CallsPageSource for CallsEndpoint<'_> {
    async fn page(&self, page: u32) -> Result<CallsPage, CrmError> {
        self.client
            .fetch_calls_page(CALLS_PAGE_LIMIT, page, self.include, self.filters)
            .await
    }
}

/// Accumulate calls across pages up to `max_calls`.
///
/// An empty page always stops pagination, whatever the computed last page
/// says. When `date` is set, only calls whose `created_at` prefix matches
/// it exactly are kept.
async fn collect_calls(
    source: &dyn CallsPageSource,
    date: Option<&str>,
    max_calls: usize,
) -> Result<Vec<Call>, CrmError> {
    let mut all_calls: Vec<Call> = Vec::new();
    let mut page: u32 = 1;

    while all_calls.len() < max_calls {
        let resp = source.page(page).await?;

        if resp.data.is_empty() {
            break;
        }

        match date {
            Some(date) => {
                all_calls.extend(
                    resp.data
                        .iter()
                        .filter(|call| call.created_date() == Some(date))
                        .cloned(),
                );
            }
            None => all_calls.extend(resp.data.iter().cloned()),
        }

        match next_page(&resp, page, all_calls.len(), max_calls) {
            Some(next) => page = next,
            None => break,
        }
    }

    all_calls.truncate(max_calls);
    tracing::debug!(count = all_calls.len(), pages = page, "Fetched calls");
    Ok(all_calls)
}

/// Decide whether pagination continues after one page.
///
/// Stops once the reported last page (`ceil(total / per_page)`) is reached
/// or the accumulated count hits the cap; otherwise yields the next page
/// number.
fn next_page(
    resp: &CallsPage,
    requested_page: u32,
    accumulated: usize,
    max_calls: usize,
) -> Option<u32> {
    let current_page = resp.current_page.unwrap_or(requested_page);
    let total = resp.total.unwrap_or(0);
    let per_page = resp.per_page.unwrap_or(CALLS_PAGE_LIMIT).max(1);
    let last_page = total.div_ceil(per_page);

    if current_page >= last_page || accumulated >= max_calls {
        return None;
    }
    Some(requested_page + 1)
}

/// Unwrap the conventional `{"data": ...}` envelope.
///
/// A payload without a `data` field is treated as the data itself — the
/// degenerate case the upstream API exhibits on some endpoints.
fn unwrap_data(payload: serde_json::Value) -> serde_json::Value {
    match payload {
        serde_json::Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

/// Decode a `/calls` page, tolerating a missing envelope.
fn decode_calls_page(payload: serde_json::Value) -> CallsPage {
    // Bare array: the whole payload is the data, no pagination metadata.
    if payload.is_array() {
        return CallsPage {
            data: serde_json::from_value(payload).unwrap_or_default(),
            ..CallsPage::default()
        };
    }
    serde_json::from_value(payload).unwrap_or_default()
}
