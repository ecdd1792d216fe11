//! # kh-remote-rest
//!
//! `RemoteStore` over a PostgREST-style HTTP API (`<base>/rest/v1/<collection>`).
//!
//! Every call is one request carrying the static key twice, as `apikey` and
//! as a bearer token. There is no retry and no timeout beyond the HTTP
//! client's own.

use async_trait::async_trait;
use kh_core::error::{AppError, Result};
use kh_core::query::{Filter, SelectQuery};
use kh_core::traits::RemoteStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};

/// Path prefix of the REST resources under the base URL.
pub const REST_PREFIX: &str = "/rest/v1";

/// Fragments of the sample configuration that must be replaced before use.
const PLACEHOLDER_MARKERS: &[&str] = &["votre-projet", "your-project", "your_project", "YOUR_"];

#[derive(Debug)]
pub struct RestRemoteStore {
    client: Client,
    base_url: String,
    api_key: SecretString,
    configured: bool,
}

impl RestRemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let configured = is_usable(&base_url, api_key.expose_secret());
        Self {
            client: Client::new(),
            base_url,
            api_key,
            configured,
        }
    }

    /// A store that refuses every call; for running fully offline.
    pub fn unconfigured() -> Self {
        Self::new("", SecretString::from(String::new()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}{}/{}", self.base_url, REST_PREFIX, collection)
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(AppError::NotConfigured)
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let key = self.api_key.expose_secret();
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            AppError::Internal(format!("invalid api key header: {e}"))
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("apikey"),
            HeaderValue::from_str(key).map_err(invalid)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("return=representation"),
        );
        Ok(headers)
    }

    /// Sends one request; an empty success body reads as JSON `null`.
    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| AppError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AppError::remote(status.as_u16(), body));
        }
        debug!(status = status.as_u16(), bytes = body.len(), "remote store answered");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| AppError::Remote {
            status: Some(status.as_u16()),
            body: format!("response is not JSON: {e}"),
        })
    }
}

/// Endpoint and key are both present, parse, and are not sample placeholders.
fn is_usable(base_url: &str, api_key: &str) -> bool {
    if base_url.is_empty() || api_key.trim().is_empty() {
        return false;
    }
    if PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| base_url.contains(marker) || api_key.contains(marker))
    {
        return false;
    }
    Url::parse(base_url).is_ok()
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    #[instrument(skip(self, query))]
    async fn select(&self, collection: &str, query: &SelectQuery) -> Result<Value> {
        self.ensure_configured()?;
        let request = self
            .client
            .get(self.collection_url(collection))
            .query(&query.to_pairs());
        self.send(request).await
    }

    #[instrument(skip(self, records))]
    async fn insert(&self, collection: &str, records: Value) -> Result<Value> {
        self.ensure_configured()?;
        let body = match records {
            Value::Array(_) => records,
            single => Value::Array(vec![single]),
        };
        let request = self.client.post(self.collection_url(collection)).json(&body);
        self.send(request).await
    }

    #[instrument(skip(self, patch), fields(filter = %filter))]
    async fn update(&self, collection: &str, patch: Value, filter: &Filter) -> Result<Value> {
        self.ensure_configured()?;
        let request = self
            .client
            .patch(self.collection_url(collection))
            .query(&[filter.to_pair()])
            .json(&patch);
        self.send(request).await
    }

    #[instrument(skip(self), fields(filter = %filter))]
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Value> {
        self.ensure_configured()?;
        let request = self
            .client
            .delete(self.collection_url(collection))
            .query(&[filter.to_pair()]);
        self.send(request).await
    }
}
