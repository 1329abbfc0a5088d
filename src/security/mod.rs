//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-address token bucket, 429)
//!     → guard.rs (ordered predicate chain, 403)
//!         → illegal characters in `q`
//!         → automated user agents
//!         → denylist.rs (address reputation)
//!     → SearchView
//! ```
//!
//! # Design Decisions
//! - Both layers are optional and injected; nothing here is global state
//! - Every rejection happens before the provider is contacted
//! - `X-Forwarded-For` is only honoured when explicitly trusted

pub mod denylist;
pub mod guard;
pub mod rate_limit;

pub use denylist::{AddressReputation, StaticDenylist};
pub use guard::{
    guard_middleware, BotUserAgentCheck, CheckCost, DenylistCheck, GuardRequest,
    IllegalCharactersCheck, Rejection, RequestCheck, RequestGuard,
};
pub use rate_limit::{rate_limit_middleware, RateLimiter};

use axum::{body::Body, extract::ConnectInfo, http::Request};
use std::net::{IpAddr, SocketAddr};

/// Resolve the client address of `request`.
///
/// Uses the first `X-Forwarded-For` entry when `trust_forwarded_for` is set
/// and the header parses, otherwise the socket peer.
pub fn client_address(request: &Request<Body>, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}
