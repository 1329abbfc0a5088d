//! Request guard: an ordered chain of named checks run before a search.
//!
//! # Responsibilities
//! - Reject queries containing disallowed characters
//! - Reject known automated user agents
//! - Reject addresses reported by an `AddressReputation` collaborator
//!
//! # Design Decisions
//! - Checks are independent and short-circuit on the first rejection
//! - The chain is kept sorted by cost so local string checks run before
//!   anything that touches the network
//! - New checks plug in through `RequestGuard::with_check`; the view layer
//!   never changes

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::GuardConfig;
use crate::observability::metrics;
use crate::security::client_address;
use crate::security::denylist::{AddressReputation, StaticDenylist};

/// How expensive a check is to run. Cheaper checks run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckCost {
    /// Pure in-memory inspection of the request.
    Local,
    /// Needs network I/O.
    Remote,
}

/// The parts of an inbound request the checks look at.
#[derive(Debug, Clone, Default)]
pub struct GuardRequest<'a> {
    pub query: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub client_ip: Option<IpAddr>,
}

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Name of the check that fired.
    pub check: &'static str,
    pub status: StatusCode,
    /// Human-readable reason, returned to the client.
    pub reason: String,
}

impl Rejection {
    pub fn forbidden(check: &'static str, reason: impl Into<String>) -> Self {
        Self {
            check,
            status: StatusCode::FORBIDDEN,
            reason: reason.into(),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, self.reason).into_response()
    }
}

/// A single named predicate over the inbound request.
#[async_trait]
pub trait RequestCheck: Send + Sync {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn cost(&self) -> CheckCost {
        CheckCost::Local
    }

    /// `Err` rejects the request.
    async fn check(&self, request: &GuardRequest<'_>) -> Result<(), Rejection>;
}

/// Rejects queries containing any of a set of characters.
pub struct IllegalCharactersCheck {
    characters: Vec<char>,
}

impl IllegalCharactersCheck {
    pub fn new(characters: &str) -> Self {
        Self {
            characters: characters.chars().collect(),
        }
    }
}

#[async_trait]
impl RequestCheck for IllegalCharactersCheck {
    fn name(&self) -> &'static str {
        "illegal_characters"
    }

    async fn check(&self, request: &GuardRequest<'_>) -> Result<(), Rejection> {
        match request.query {
            Some(q) if q.chars().any(|c| self.characters.contains(&c)) => Err(
                Rejection::forbidden(self.name(), "Search query contains illegal characters"),
            ),
            _ => Ok(()),
        }
    }
}

/// Rejects user agents matching known automated-client signatures.
pub struct BotUserAgentCheck {
    signatures: Vec<String>,
}

impl BotUserAgentCheck {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            signatures: signatures
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl RequestCheck for BotUserAgentCheck {
    fn name(&self) -> &'static str {
        "bot_user_agent"
    }

    async fn check(&self, request: &GuardRequest<'_>) -> Result<(), Rejection> {
        let Some(agent) = request.user_agent else {
            return Ok(());
        };
        let agent = agent.to_lowercase();

        if self.signatures.iter().any(|s| agent.contains(s.as_str())) {
            Err(Rejection::forbidden(
                self.name(),
                "Automated clients are not allowed to search",
            ))
        } else {
            Ok(())
        }
    }
}

/// Rejects addresses an `AddressReputation` reports as listed.
///
/// Lookup failures let the request through.
pub struct DenylistCheck {
    reputation: Arc<dyn AddressReputation>,
}

impl DenylistCheck {
    pub fn new(reputation: Arc<dyn AddressReputation>) -> Self {
        Self { reputation }
    }
}

#[async_trait]
impl RequestCheck for DenylistCheck {
    fn name(&self) -> &'static str {
        "denylisted_address"
    }

    fn cost(&self) -> CheckCost {
        if self.reputation.is_remote() {
            CheckCost::Remote
        } else {
            CheckCost::Local
        }
    }

    async fn check(&self, request: &GuardRequest<'_>) -> Result<(), Rejection> {
        let Some(ip) = request.client_ip else {
            return Ok(());
        };

        match self.reputation.is_listed(ip).await {
            Ok(true) => Err(Rejection::forbidden(
                self.name(),
                "Your address has been blocked from searching",
            )),
            Ok(false) => Ok(()),
            Err(e) => {
                tracing::warn!(client = %ip, error = %e, "Address reputation lookup failed");
                Ok(())
            }
        }
    }
}

/// Ordered chain of request checks.
#[derive(Default)]
pub struct RequestGuard {
    checks: Vec<Box<dyn RequestCheck>>,
    trust_forwarded_for: bool,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in chain from config. Checks with nothing to match
    /// against are left out.
    pub fn from_config(
        config: &GuardConfig,
        reputation: Option<Arc<dyn AddressReputation>>,
        trust_forwarded_for: bool,
    ) -> Self {
        let mut guard = Self::new().trust_forwarded_for(trust_forwarded_for);

        if !config.illegal_characters.is_empty() {
            guard = guard.with_check(IllegalCharactersCheck::new(&config.illegal_characters));
        }
        if !config.bot_user_agents.is_empty() {
            guard = guard.with_check(BotUserAgentCheck::new(&config.bot_user_agents));
        }

        let reputation = reputation.or_else(|| {
            (!config.denied_addresses.is_empty()).then(|| {
                Arc::new(StaticDenylist::new(config.denied_addresses.iter().copied()))
                    as Arc<dyn AddressReputation>
            })
        });
        if let Some(reputation) = reputation {
            guard = guard.with_check(DenylistCheck::new(reputation));
        }

        guard
    }

    /// Resolve client addresses from `X-Forwarded-For`.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Append a check, keeping the chain ordered by cost.
    pub fn with_check(mut self, check: impl RequestCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        // Stable: equal-cost checks keep insertion order
        self.checks.sort_by_key(|c| c.cost());
        self
    }

    /// Names of the checks, in execution order.
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every check until one rejects.
    pub async fn evaluate(&self, request: &GuardRequest<'_>) -> Result<(), Rejection> {
        for check in &self.checks {
            check.check(request).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct GuardParams {
    q: Option<String>,
}

/// Middleware running the guard chain ahead of the search views.
pub async fn guard_middleware(
    State(guard): State<Arc<RequestGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let params = Query::<GuardParams>::try_from_uri(request.uri())
        .map(|Query(p)| p)
        .unwrap_or_default();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    let client_ip = client_address(&request, guard.trust_forwarded_for);

    let guard_request = GuardRequest {
        query: params.q.as_deref(),
        user_agent,
        client_ip,
    };

    if let Err(rejection) = guard.evaluate(&guard_request).await {
        tracing::warn!(
            check = rejection.check,
            client = ?client_ip,
            reason = %rejection.reason,
            "Request rejected by guard"
        );
        metrics::record_rejection(rejection.check);
        return rejection.into_response();
    }

    next.run(request).await
}
