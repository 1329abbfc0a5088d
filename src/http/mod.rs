//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → [rate limiter, request guard] (optional)
//!     → view.rs (params → fetch → render)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod view;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{SearchServer, SearchServerBuilder, ServerError};
pub use view::{search_handler, Pagination, SearchParams, SearchView};
