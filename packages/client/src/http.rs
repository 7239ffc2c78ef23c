use async_trait::async_trait;
use dealflow_core::{
    ActivityEntry, ActivityInput, AnalyticsSnapshot, Deal, DealCreateInput, DealNote, DealStage,
    DealUpdateInput, NoteInput,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::api::{DealApi, DealPage, ListDealsQuery};
use crate::envelope;
use crate::error::{ApiError, ApiResult};

/// Request timeout applied to every call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest`-backed implementation of [`DealApi`].
///
/// Owns a pooled client with a 30-second timeout. Auth is a bearer token the
/// embedding application supplies; token refresh is its problem, not ours.
#[derive(Clone)]
pub struct HttpDealApi {
    http_client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpDealApi {
    /// Create a client against `base_url` (scheme + host + optional prefix,
    /// no trailing slash required).
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        })
    }

    /// Set the bearer token sent with every request
    pub fn set_auth_token(&mut self, token: String) {
        self.auth_token = Some(token);
    }

    /// Builder-style variant of [`set_auth_token`](Self::set_auth_token)
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http_client.request(method, url);
        if let Some(token) = &self.auth_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Send a request and hand back the raw JSON body, with non-2xx statuses
    /// mapped through the error taxonomy. 204 yields `Value::Null`.
    async fn send(&self, builder: reqwest::RequestBuilder) -> ApiResult<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            response
                .json::<Value>()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            Err(envelope::error_from_status(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl DealApi for HttpDealApi {
    async fn list_deals(&self, query: &ListDealsQuery) -> ApiResult<DealPage> {
        let pairs = query.to_query_pairs();
        debug!("listing deals with {} query parameter(s)", pairs.len());
        let body = self
            .send(self.request(Method::GET, "/api/deals").query(&pairs))
            .await?;
        envelope::parse_deal_list(body)
    }

    async fn get_deal(&self, id: &str) -> ApiResult<Deal> {
        let body = self
            .send(self.request(Method::GET, &format!("/api/deals/{}", id)))
            .await?;
        envelope::parse_payload(body, "deal")
    }

    async fn create_deal(&self, input: &DealCreateInput) -> ApiResult<Deal> {
        let body = self
            .send(self.request(Method::POST, "/api/deals").json(input))
            .await?;
        envelope::parse_payload(body, "deal")
    }

    async fn update_deal(&self, id: &str, patch: &DealUpdateInput) -> ApiResult<Deal> {
        let body = self
            .send(
                self.request(Method::PUT, &format!("/api/deals/{}", id))
                    .json(patch),
            )
            .await?;
        envelope::parse_payload(body, "deal")
    }

    async fn update_stage(&self, id: &str, stage: DealStage) -> ApiResult<Deal> {
        let body = self
            .send(
                self.request(Method::PUT, &format!("/api/deals/{}/stage", id))
                    .json(&json!({ "stage": stage })),
            )
            .await?;
        envelope::parse_payload(body, "deal")
    }

    async fn delete_deal(&self, id: &str) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, &format!("/api/deals/{}", id)))
            .await?;
        Ok(())
    }

    async fn bulk_update(&self, ids: &[String], patch: &DealUpdateInput) -> ApiResult<()> {
        self.send(
            self.request(Method::POST, "/api/deals/bulk-update")
                .json(&json!({ "ids": ids, "changes": patch })),
        )
        .await?;
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[String]) -> ApiResult<()> {
        self.send(
            self.request(Method::POST, "/api/deals/bulk-delete")
                .json(&json!({ "ids": ids })),
        )
        .await?;
        Ok(())
    }

    async fn add_note(&self, id: &str, input: &NoteInput) -> ApiResult<DealNote> {
        let body = self
            .send(
                self.request(Method::POST, &format!("/api/deals/{}/notes", id))
                    .json(input),
            )
            .await?;
        envelope::parse_payload(body, "note")
    }

    async fn add_activity(&self, id: &str, input: &ActivityInput) -> ApiResult<ActivityEntry> {
        let body = self
            .send(
                self.request(Method::POST, &format!("/api/deals/{}/activity", id))
                    .json(input),
            )
            .await?;
        envelope::parse_payload(body, "activity")
    }

    async fn fetch_analytics(&self) -> ApiResult<AnalyticsSnapshot> {
        let body = self
            .send(self.request(Method::GET, "/api/deals/analytics"))
            .await?;
        envelope::parse_payload(body, "analytics")
    }
}
