// Listing API client
// Thin HTTP+JSON client for the tours catalog backend. Payloads are narrowed into typed records
// here; the core never sees raw JSON.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::payload::{Envelope, ReferenceItem, ReferencePage, TourPage};
use crate::query::TourQuery;
use crate::reference::ReferenceKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Client error: {0}")]
    ClientError(String),

    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/".to_string(),
            api_key: None,
            timeout_ms: 30_000,
            user_agent: concat!("tour_catalog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

impl ClientStats {
    fn record(&mut self, elapsed: Duration, ok: bool) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let completed = (self.requests_succeeded + self.requests_failed) as f64;
        self.average_response_time_ms =
            (self.average_response_time_ms * completed + ms) / (completed + 1.0);
        self.max_response_time_ms = self.max_response_time_ms.max(ms);
        if ok {
            self.requests_succeeded += 1;
        } else {
            self.requests_failed += 1;
        }
    }
}

// Listing API collaborator
#[async_trait]
pub trait ListingApi: Send + Sync + 'static {
    // One page of tours matching the query
    async fn tours(&self, query: &TourQuery, page: u32) -> Result<TourPage, ApiError>;

    async fn destinations(&self) -> Result<Vec<ReferenceItem>, ApiError>;

    async fn categories(&self) -> Result<Vec<ReferenceItem>, ApiError>;

    async fn durations(&self) -> Result<Vec<ReferenceItem>, ApiError>;

    fn stats(&self) -> ClientStats;

    async fn reference(&self, kind: ReferenceKind) -> Result<Vec<ReferenceItem>, ApiError> {
        match kind {
            ReferenceKind::Categories => self.categories().await,
            ReferenceKind::Destinations => self.destinations().await,
            ReferenceKind::Durations => self.durations().await,
        }
    }
}

pub struct HttpListingApi {
    config: ClientConfig,
    base_url: Url,
    http: reqwest::Client,
    stats: Arc<Mutex<ClientStats>>,
}

impl HttpListingApi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        // A trailing slash keeps relative joins under the API prefix
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::ConfigError(format!("invalid base_url '{}': {}", base, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            base_url,
            http,
            stats: Arc::new(Mutex::new(ClientStats::default())),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::ClientError(format!("invalid endpoint '{}': {}", path, e)))
    }

    // tours?page=N&category_slug=..&destination_slug=..&duration_slug=..&min_price=..&max_price=..
    pub fn tours_url(&self, query: &TourQuery, page: u32) -> Result<Url, ApiError> {
        let mut url = self.endpoint("tours")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else if err.is_decode() {
            ApiError::DecodeError(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let started = Instant::now();
        self.stats.lock().requests_sent += 1;

        let result = self.send(url.clone()).await;
        self.stats.lock().record(started.elapsed(), result.is_ok());

        match &result {
            Ok(_) => debug!(url = %url, elapsed_ms = started.elapsed().as_millis() as u64, "request ok"),
            Err(e) => warn!(url = %url, error = %e, "request failed"),
        }
        result
    }

    async fn send<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut request = self.http.get(url).header("Accept", "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ApiError::ApiResponseError {
                status_code: status.as_u16(),
                message: String::from_utf8_lossy(&body).chars().take(200).collect(),
            });
        }
        decode_body(&body)
    }
}

pub fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::DecodeError(e.to_string()))
}

#[async_trait]
impl ListingApi for HttpListingApi {
    async fn tours(&self, query: &TourQuery, page: u32) -> Result<TourPage, ApiError> {
        let url = self.tours_url(query, page)?;
        let envelope: Envelope<TourPage> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn destinations(&self) -> Result<Vec<ReferenceItem>, ApiError> {
        let envelope: Envelope<ReferencePage> = self.get_json(self.endpoint("destinations")?).await?;
        Ok(envelope.data.data)
    }

    async fn categories(&self) -> Result<Vec<ReferenceItem>, ApiError> {
        let envelope: Envelope<ReferencePage> = self.get_json(self.endpoint("categories")?).await?;
        Ok(envelope.data.data)
    }

    async fn durations(&self) -> Result<Vec<ReferenceItem>, ApiError> {
        let envelope: Envelope<Vec<ReferenceItem>> =
            self.get_json(self.endpoint("tours/durations")?).await?;
        Ok(envelope.data)
    }

    fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }
}
