//! Search view: query extraction, fetch, render.
//!
//! # Responsibilities
//! - Require an API key before doing anything else
//! - Parse `q`, `start`, `num`, `siteSearch` / `domain`
//! - Call the fetcher only when a non-empty query is present
//! - Render the view's template with the query echo, pagination and results
//!
//! # Design Decisions
//! - A fixed site on the view beats `siteSearch`, which beats `domain`
//! - Pagination is derived locally: start defaults to 1, num to 10

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ViewConfig;
use crate::error::SearchError;
use crate::observability::metrics;
use crate::render::{RenderError, TemplateRenderer};
use crate::search::{ResultFetcher, SearchRequest, SearchResults};

/// Offset used when `start` is absent.
pub const DEFAULT_START: u32 = 1;

/// Page size used when `num` is absent.
pub const DEFAULT_NUM: u32 = 10;

/// Inbound query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub start: Option<String>,
    pub num: Option<String>,
    #[serde(rename = "siteSearch")]
    pub site_search: Option<String>,
    pub domain: Option<String>,
}

/// Next / previous offsets for the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub start: u32,
    pub num: u32,
    pub next: u32,
    pub previous: Option<u32>,
}

impl Pagination {
    pub fn new(start: Option<u32>, num: Option<u32>) -> Self {
        let start = start.unwrap_or(DEFAULT_START);
        let num = num.unwrap_or(DEFAULT_NUM);

        Self {
            start,
            num,
            next: start.saturating_add(num),
            previous: (start > 1).then(|| start.saturating_sub(num).max(1)),
        }
    }
}

/// Everything a search template gets to see.
#[derive(Debug, Serialize)]
pub struct SearchContext<'a> {
    pub query: Option<&'a str>,
    pub start: Option<u32>,
    pub num: Option<u32>,
    pub site_search: Option<&'a str>,
    pub pagination: Pagination,
    pub results: Option<&'a SearchResults>,
}

/// One mounted search endpoint.
pub struct SearchView {
    path: String,
    template: String,
    search_engine_id: String,
    site: Option<String>,
    site_restricted: bool,
    api_key: Option<String>,
    fetcher: Arc<dyn ResultFetcher>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl SearchView {
    pub fn new(
        config: &ViewConfig,
        api_key: Option<String>,
        fetcher: Arc<dyn ResultFetcher>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            path: config.path.clone(),
            template: config.template.clone(),
            search_engine_id: config.search_engine_id.clone(),
            site: non_empty(config.site.as_deref()).map(str::to_string),
            site_restricted: config.site_restricted,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            fetcher,
            renderer,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Serve one request, returning the rendered page.
    pub async fn handle(&self, params: &SearchParams) -> Result<String, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;

        let query = non_empty(params.q.as_deref());
        let start = parse_count("start", params.start.as_deref())?;
        let num = parse_count("num", params.num.as_deref())?;
        let site_search = non_empty(self.site.as_deref())
            .or_else(|| non_empty(params.site_search.as_deref()))
            .or_else(|| non_empty(params.domain.as_deref()));

        let results = match query {
            Some(q) => {
                let request = SearchRequest {
                    api_key: api_key.to_string(),
                    search_engine_id: self.search_engine_id.clone(),
                    query: q.to_string(),
                    start,
                    num,
                    site_search: site_search.map(str::to_string),
                    site_restricted: self.site_restricted,
                };
                Some(self.fetcher.fetch(&request).await?)
            }
            None => None,
        };

        let context = SearchContext {
            query,
            start,
            num,
            site_search,
            pagination: Pagination::new(start, num),
            results: results.as_ref(),
        };
        let context = serde_json::to_value(&context).map_err(RenderError::from)?;

        Ok(self.renderer.render(&self.template, &context)?)
    }
}

/// axum handler for a mounted `SearchView`.
pub async fn search_handler(
    State(view): State<Arc<SearchView>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let started = Instant::now();
    let response = match view.handle(&params).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request(view.path(), response.status().as_u16(), started);
    response
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_count(name: &'static str, value: Option<&str>) -> Result<Option<u32>, SearchError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| SearchError::InvalidParameter {
                name,
                value: raw.to_string(),
            }),
    }
}
