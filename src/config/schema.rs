//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the search
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Default Custom Search JSON API endpoint.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/customsearch/v1";

/// Default scope identifier (`cx`). Public, not a secret.
pub const DEFAULT_SEARCH_ENGINE_ID: &str = "009048213575199080868:i3zoqdwqk8o";

/// Root configuration for the search service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Listener configuration (bind address, client address trust).
    pub listener: ListenerConfig,

    /// Search provider settings.
    pub upstream: UpstreamConfig,

    /// Template location.
    pub templates: TemplateConfig,

    /// Search views to mount.
    pub views: Vec<ViewConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Request guard (bot / denylist filtering).
    pub guard: GuardConfig,

    /// Provider response cache.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            templates: TemplateConfig::default(),
            views: vec![ViewConfig::default()],
            timeouts: TimeoutConfig::default(),
            rate_limit: RateLimitConfig::default(),
            guard: GuardConfig::default(),
            cache: CacheConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Take the client address from the first `X-Forwarded-For` entry.
    /// Only enable behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Search provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the general endpoint. The site-restricted variant is
    /// `<api_base>/siterestrict`.
    pub api_base: String,

    /// API key. Normally supplied through `SEARCH_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Provider request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Template configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory templates are loaded from.
    pub directory: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: "templates".to_string(),
        }
    }
}

/// One mounted search view.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Route path (e.g., "/search").
    pub path: String,

    /// Template name, relative to the template directory.
    pub template: String,

    /// Scope identifier (`cx`).
    pub search_engine_id: String,

    /// Fixed site restriction. Takes precedence over `siteSearch`/`domain`.
    pub site: Option<String>,

    /// Query the site-restricted endpoint.
    pub site_restricted: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            path: "/search".to_string(),
            template: "search.html".to_string(),
            search_engine_id: DEFAULT_SEARCH_ENGINE_ID.to_string(),
            site: None,
            site_restricted: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum sustained requests per second per client address.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: 5,
            burst_size: 20,
        }
    }
}

/// Request guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Enable the guard chain.
    pub enabled: bool,

    /// Characters that may not appear in `q`. Empty disables the check.
    pub illegal_characters: String,

    /// User-agent fragments (case-insensitive) of automated clients.
    /// Empty disables the check.
    pub bot_user_agents: Vec<String>,

    /// Addresses refused outright. Empty disables the check.
    pub denied_addresses: Vec<IpAddr>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            illegal_characters: "<>{}[]\\^`|".to_string(),
            bot_user_agents: [
                "bot", "crawler", "spider", "slurp", "scrapy", "python-requests",
                "go-http-client", "headlesschrome",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            denied_addresses: Vec::new(),
        }
    }
}

/// Provider response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the cache.
    pub enabled: bool,

    /// Time-to-live of cached responses in seconds.
    pub ttl_secs: u64,

    /// Maximum number of cached responses.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 600,
            max_entries: 1_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_mount_one_view() {
        let config = SearchConfig::default();
        assert_eq!(config.views.len(), 1);
        assert_eq!(config.views[0].path, "/search");
        assert_eq!(config.views[0].template, "search.html");
        assert_eq!(config.cache.ttl_secs, 600);
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: SearchConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [[views]]
            path = "/docs/search"
            template = "docs/search.html"
            site = "maas.io/docs"

            [guard]
            enabled = true
            denied_addresses = ["10.0.0.1"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.views.len(), 1);
        assert_eq!(config.views[0].site.as_deref(), Some("maas.io/docs"));
        assert_eq!(config.views[0].search_engine_id, DEFAULT_SEARCH_ENGINE_ID);
        assert!(config.guard.enabled);
        assert!(!config.guard.bot_user_agents.is_empty());
        assert_eq!(config.guard.denied_addresses[0].to_string(), "10.0.0.1");
        assert_eq!(config.upstream.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = SearchConfig::default();
        config.upstream.api_key = Some("secret".into());
        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("secret"));
    }
}
