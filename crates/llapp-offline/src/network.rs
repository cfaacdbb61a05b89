//! Requests, responses and the network the controller falls back to.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use http::Method;
use llapp_core::OfflineConfig;
use reqwest::Client;
use tracing::{debug, info, trace};
use url::Url;

use crate::cache::CacheEntry;
use crate::{OfflineError, Result};

/// A request seen by the fetch hook.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request URL.
    pub url: Url,

    /// Request method.
    pub method: Method,

    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    /// Create a request with an arbitrary method.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HashMap::new(),
        }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Add a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from a cache generation.
    Cache,
    /// Fetched live.
    Network,
    /// The cached root document, served because the network failed.
    OfflineFallback,
}

/// A response handed back to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Final response URL.
    pub url: Url,

    /// Status code.
    pub status: u16,

    /// Status text.
    pub status_text: String,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Vec<u8>,

    /// Where the response came from.
    pub source: ResponseSource,
}

impl FetchResponse {
    /// Create a response from cache entry.
    pub fn from_cache(entry: &CacheEntry) -> Result<Self> {
        Ok(Self {
            url: Url::parse(&entry.url)?,
            status: entry.status,
            status_text: entry.status_text.clone(),
            headers: entry.headers.clone(),
            body: entry.body.clone(),
            source: ResponseSource::Cache,
        })
    }

    /// Create the offline fallback response from the cached root document.
    pub fn offline_fallback(entry: &CacheEntry) -> Result<Self> {
        Ok(Self {
            source: ResponseSource::OfflineFallback,
            ..Self::from_cache(entry)?
        })
    }

    /// Check if the status is 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The live network.
///
/// A returned `Err` means the request never produced a response (offline,
/// DNS failure, refused connection, timeout). HTTP error statuses are
/// responses and come back as `Ok`.
pub trait Network: Send + Sync {
    /// Perform a live fetch.
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send;
}

impl<T: Network> Network for Arc<T> {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send {
        (**self).fetch(request)
    }
}

/// Network backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
}

impl HttpNetwork {
    /// Create a network client from the offline settings.
    pub fn new(config: &OfflineConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OfflineError::Network(e.to_string()))?;

        info!(user_agent = %config.user_agent, "HttpNetwork initialized");

        Ok(Self { client })
    }
}

impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!(url = %request.url, method = %request.method, "Fetching from network");

        let mut req_builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in request.headers.iter() {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| OfflineError::Network(e.to_string()))?;

        let status = response.status();
        let url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| OfflineError::Network(e.to_string()))?;

        trace!(url = %url, status = %status, body_len = body.len(), "Response received");

        Ok(FetchResponse {
            url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
            source: ResponseSource::Network,
        })
    }
}
