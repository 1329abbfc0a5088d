//! Custom Search JSON API client.
//!
//! # Responsibilities
//! - Pick the general or site-restricted endpoint
//! - Send exactly one GET per uncached fetch
//! - Surface non-success statuses as `SearchError::Upstream`
//! - Reshape the payload (`items` → `entries`, snippet line breaks removed)
//!
//! # Design Decisions
//! - The API key is never logged; only the query length is
//! - Only successful responses are cached

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::{CacheConfig, UpstreamConfig};
use crate::error::SearchError;
use crate::observability::metrics;
use crate::search::cache::ResponseCache;
use crate::search::types::{SearchRequest, SearchResults};

/// Path segment of the site-restricted endpoint variant.
pub const SITE_RESTRICTED_SEGMENT: &str = "siterestrict";

/// Source of search results for the view layer.
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    /// Run one search and return the reshaped results.
    async fn fetch(&self, request: &SearchRequest) -> Result<SearchResults, SearchError>;
}

/// reqwest-backed client for the Custom Search JSON API.
#[derive(Clone)]
pub struct CustomSearchClient {
    http: Client,
    api_base: Url,
    cache: Option<ResponseCache>,
}

impl CustomSearchClient {
    /// Build a client from upstream settings, without a response cache.
    pub fn new(config: &UpstreamConfig) -> Result<Self, SearchError> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| SearchError::InvalidEndpoint(format!("{}: {e}", config.api_base)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base,
            cache: None,
        })
    }

    /// Build a client and attach a response cache when enabled.
    pub fn from_config(upstream: &UpstreamConfig, cache: &CacheConfig) -> Result<Self, SearchError> {
        let client = Self::new(upstream)?;
        if cache.enabled {
            Ok(client.with_cache(ResponseCache::new(
                Duration::from_secs(cache.ttl_secs),
                cache.max_entries,
            )))
        } else {
            Ok(client)
        }
    }

    /// Serve repeated requests from `cache`.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The attached cache, if any.
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Endpoint URL for the general or site-restricted variant.
    pub fn endpoint(&self, site_restricted: bool) -> Result<Url, SearchError> {
        let mut url = self.api_base.clone();
        if site_restricted {
            url.path_segments_mut()
                .map_err(|_| {
                    SearchError::InvalidEndpoint(format!("{} cannot be a base", self.api_base))
                })?
                .pop_if_empty()
                .push(SITE_RESTRICTED_SEGMENT);
        }
        Ok(url)
    }

    async fn fetch_uncached(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        let url = self.endpoint(request.site_restricted)?;
        let started = Instant::now();

        tracing::debug!(
            endpoint = %url,
            query_len = request.query.len(),
            start = ?request.start,
            num = ?request.num,
            site_search = ?request.site_search,
            "Querying search API"
        );

        let response = self
            .http
            .get(url)
            .query(&request.api_params())
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the API key
                let e = e.without_url();
                tracing::error!(error = %e, "Search API unreachable");
                SearchError::from(e)
            })?;

        let status = response.status();
        metrics::record_upstream_request(status.as_u16(), started);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body_len = body.len(), "Search API returned an error");
            return Err(SearchError::Upstream { status, body });
        }

        let mut results: SearchResults = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.without_url().to_string()))?;
        results.strip_snippet_line_breaks();

        tracing::debug!(
            entries = results.entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search API answered"
        );
        Ok(results)
    }
}

#[async_trait]
impl ResultFetcher for CustomSearchClient {
    async fn fetch(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        let Some(cache) = &self.cache else {
            return self.fetch_uncached(request).await;
        };

        let key = request.cache_key();
        if let Some(results) = cache.get(&key) {
            metrics::record_cache_lookup(true);
            return Ok(results);
        }
        metrics::record_cache_lookup(false);

        let results = self.fetch_uncached(request).await?;
        cache.insert(key, results.clone());
        Ok(results)
    }
}
