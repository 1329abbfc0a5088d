//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! startup.rs:
//!     validated SearchConfig → metrics exporter → SearchServer → bind
//!
//! signals.rs:
//!     Ctrl-C / SIGTERM → Shutdown::trigger
//!
//! shutdown.rs:
//!     broadcast → axum graceful shutdown → in-flight searches finish
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
