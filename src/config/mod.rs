//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, SEARCH_API_KEY override)
//!     → validation.rs (semantic checks)
//!     → SearchConfig (validated, immutable)
//!     → consumed once by SearchServer::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - The API key never comes from a serialized config dump

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError, API_KEY_ENV};
pub use schema::{
    CacheConfig, GuardConfig, ListenerConfig, ObservabilityConfig, RateLimitConfig, SearchConfig,
    TemplateConfig, TimeoutConfig, UpstreamConfig, ViewConfig,
};
