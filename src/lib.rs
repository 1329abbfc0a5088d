//! Site search service library.
//!
//! Mounts `/search`-style views that forward a query to the Custom Search
//! JSON API and render the reshaped results through a template.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod search;
pub mod security;

pub use config::SearchConfig;
pub use error::SearchError;
pub use http::SearchServer;
pub use lifecycle::Shutdown;
