//! Search provider integration.
//!
//! # Data Flow
//! ```text
//! SearchView
//!     → client.rs (pick endpoint, one GET, status check)
//!     → cache.rs (optional TTL cache keyed by request parameters)
//!     → types.rs (items → entries, snippet clean-up)
//!     → SearchResults handed to the template layer
//! ```

pub mod cache;
pub mod client;
pub mod types;

pub use cache::ResponseCache;
pub use client::{CustomSearchClient, ResultFetcher};
pub use types::{CacheKey, Entry, SearchRequest, SearchResults};
