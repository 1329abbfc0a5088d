//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one GET route per search view
//! - Wire up middleware (tracing, timeout, request ID)
//! - Wire up the optional rate limiter and request guard
//! - Bind server to listener and shut down gracefully

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::validate_config;
use crate::config::{ConfigError, SearchConfig};
use crate::error::SearchError;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::view::{search_handler, SearchView};
use crate::render::{JinjaRenderer, RenderError, TemplateRenderer};
use crate::search::{CustomSearchClient, ResultFetcher};
use crate::security::{
    guard_middleware, rate_limit_middleware, AddressReputation, RateLimiter, RequestGuard,
};

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build search client: {0}")]
    Client(#[source] SearchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// HTTP server exposing the configured search views.
pub struct SearchServer {
    router: Router,
    config: SearchConfig,
}

impl SearchServer {
    /// Create a server with collaborators built from `config`.
    pub fn new(config: SearchConfig) -> Result<Self, ServerError> {
        Self::builder(config).build()
    }

    /// Start a builder to inject collaborators.
    pub fn builder(config: SearchConfig) -> SearchServerBuilder {
        SearchServerBuilder {
            config,
            fetcher: None,
            renderer: None,
            rate_limiter: None,
            guard: None,
            reputation: None,
        }
    }

    /// The assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or its sender is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            views = self.config.views.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Builder for `SearchServer`. Anything not injected is built from config.
pub struct SearchServerBuilder {
    config: SearchConfig,
    fetcher: Option<Arc<dyn ResultFetcher>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    rate_limiter: Option<Arc<RateLimiter>>,
    guard: Option<Arc<RequestGuard>>,
    reputation: Option<Arc<dyn AddressReputation>>,
}

impl SearchServerBuilder {
    pub fn fetcher(mut self, fetcher: Arc<dyn ResultFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Use this limiter regardless of `rate_limit.enabled`.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Use this guard regardless of `guard.enabled`.
    pub fn guard(mut self, guard: Arc<RequestGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Address reputation source for the config-built guard.
    pub fn reputation(mut self, reputation: Arc<dyn AddressReputation>) -> Self {
        self.reputation = Some(reputation);
        self
    }

    pub fn build(self) -> Result<SearchServer, ServerError> {
        let config = self.config;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let fetcher: Arc<dyn ResultFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                CustomSearchClient::from_config(&config.upstream, &config.cache)
                    .map_err(ServerError::Client)?,
            ),
        };

        let renderer: Arc<dyn TemplateRenderer> = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(JinjaRenderer::new(&config.templates.directory)),
        };
        for view in &config.views {
            renderer.ensure_template(&view.template)?;
        }

        let trust_forwarded_for = config.listener.trust_forwarded_for;
        let rate_limiter = self.rate_limiter.or_else(|| {
            config
                .rate_limit
                .enabled
                .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit, trust_forwarded_for)))
        });
        let reputation = self.reputation;
        let guard = self.guard.or_else(|| {
            config.guard.enabled.then(|| {
                Arc::new(RequestGuard::from_config(&config.guard, reputation, trust_forwarded_for))
            })
        });

        if config.upstream.api_key.is_none() {
            tracing::warn!("No search API key configured; search requests will fail");
        }

        let router = build_router(&config, fetcher, renderer, rate_limiter, guard);
        Ok(SearchServer { router, config })
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
fn build_router(
    config: &SearchConfig,
    fetcher: Arc<dyn ResultFetcher>,
    renderer: Arc<dyn TemplateRenderer>,
    rate_limiter: Option<Arc<RateLimiter>>,
    guard: Option<Arc<RequestGuard>>,
) -> Router {
    let mut views = Router::new();
    for view_config in &config.views {
        let view = Arc::new(SearchView::new(
            view_config,
            config.upstream.api_key.clone(),
            fetcher.clone(),
            renderer.clone(),
        ));
        tracing::info!(
            path = %view_config.path,
            template = %view_config.template,
            site = ?view_config.site,
            site_restricted = view_config.site_restricted,
            "Mounting search view"
        );
        views = views.route(&view_config.path, get(search_handler).with_state(view));
    }

    if let Some(guard) = guard {
        tracing::info!(checks = ?guard.check_names(), "Request guard enabled");
        views = views.layer(middleware::from_fn_with_state(guard, guard_middleware));
    }

    // Added last so it runs before the guard
    if let Some(limiter) = rate_limiter {
        tracing::info!("Rate limiting enabled");
        views = views.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    views
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id(request),
            )
        }))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchRequest, SearchResults};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::util::ServiceExt;

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResultFetcher for CountingFetcher {
        async fn fetch(&self, _request: &SearchRequest) -> Result<SearchResults, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResults::default())
        }
    }

    struct StaticRenderer;

    impl TemplateRenderer for StaticRenderer {
        fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
            Ok(format!("{template} next={}", context["pagination"]["next"]))
        }
    }

    fn config() -> SearchConfig {
        let mut config = SearchConfig::default();
        config.upstream.api_key = Some("key".to_string());
        config
    }

    fn server(config: SearchConfig, fetcher: Arc<CountingFetcher>) -> SearchServer {
        SearchServer::builder(config)
            .fetcher(fetcher)
            .renderer(Arc::new(StaticRenderer))
            .build()
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_view_is_mounted() {
        let fetcher = Arc::new(CountingFetcher::default());
        let router = server(config(), fetcher.clone()).router();

        let res = router.oneshot(get("/search?q=juju&start=5")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(X_REQUEST_ID));

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"search.html next=15");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let router = server(config(), Arc::default()).router();

        let req = Request::builder()
            .uri("/search")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.headers()[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_guard_runs_before_view() {
        let mut config = config();
        config.guard.enabled = true;
        let fetcher = Arc::new(CountingFetcher::default());
        let router = server(config, fetcher.clone()).router();

        let res = router.oneshot(get("/search?q=%7Bx%7D")).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.views.clear();
        let result = SearchServer::builder(config)
            .renderer(Arc::new(StaticRenderer))
            .build();
        assert!(matches!(result, Err(ServerError::Config(ConfigError::Validation(_)))));
    }

    #[test]
    fn test_missing_template_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.templates.directory = dir.path().to_string_lossy().into_owned();
        let result = SearchServer::builder(config).fetcher(Arc::new(CountingFetcher::default())).build();
        assert!(matches!(result, Err(ServerError::Render(RenderError::NotFound { .. }))));
    }
}
