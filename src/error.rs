//! Error types shared by the fetcher and the view layer.
//!
//! # Design Decisions
//! - A missing API key is its own variant so callers can tell a
//!   misconfigured process apart from a failing upstream
//! - Upstream status codes are kept verbatim; mapping to a client-visible
//!   status happens in `IntoResponse`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::observability::metrics;
use crate::render::RenderError;

/// Errors produced while serving a search request.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No API key was configured for this process.
    #[error("NoAPIKeyError: Unable to search: No API key provided")]
    MissingApiKey,

    /// A pagination parameter could not be parsed.
    #[error("Invalid value for `{name}`: {value:?}")]
    InvalidParameter { name: &'static str, value: String },

    /// The search provider answered with a non-success status. The body
    /// is kept for callers but left out of `Display`.
    #[error("Search API returned {status}")]
    Upstream { status: StatusCode, body: String },

    /// The search provider did not answer in time.
    #[error("Search API request timed out")]
    Timeout,

    /// `upstream.api_base` is not a usable endpoint URL.
    #[error("Invalid search API endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request never produced a response.
    #[error("Search API request failed: {0}")]
    Transport(String),

    /// The provider response was not the JSON we expected.
    #[error("Failed to decode search API response: {0}")]
    Decode(String),

    /// The template could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl SearchError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::MissingApiKey => "missing_api_key",
            SearchError::InvalidParameter { .. } => "invalid_parameter",
            SearchError::Upstream { .. } => "upstream_status",
            SearchError::Timeout => "upstream_timeout",
            SearchError::InvalidEndpoint(_) => "invalid_endpoint",
            SearchError::Transport(_) => "upstream_transport",
            SearchError::Decode(_) => "upstream_decode",
            SearchError::Render(_) => "render",
        }
    }

    /// Status code returned to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::MissingApiKey
            | SearchError::InvalidEndpoint(_)
            | SearchError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SearchError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            SearchError::Upstream { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SearchError::Upstream { .. } | SearchError::Transport(_) | SearchError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            SearchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout
        } else if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        metrics::record_search_error(self.kind());

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Search request failed");
        } else {
            tracing::warn!(error = %self, kind = self.kind(), "Search request rejected");
        }

        let message = match &self {
            SearchError::MissingApiKey | SearchError::InvalidEndpoint(_) => {
                "Search is not configured".to_string()
            }
            other => other.to_string(),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_distinct_from_upstream() {
        let missing = SearchError::MissingApiKey;
        let upstream = SearchError::Upstream {
            status: StatusCode::FORBIDDEN,
            body: "denied".into(),
        };

        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_ne!(missing.kind(), upstream.kind());
        assert!(missing.to_string().contains("NoAPIKeyError"));
    }

    #[test]
    fn test_upstream_body_not_displayed() {
        // Provider bodies can echo request parameters, including the key
        let upstream = SearchError::Upstream {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"error":{"message":"key=secret-key is invalid"}}"#.into(),
        };
        let message = upstream.to_string();
        assert!(message.contains("400"));
        assert!(!message.contains("secret-key"));
    }

    #[test]
    fn test_invalid_endpoint_is_server_error() {
        let err = SearchError::InvalidEndpoint("relative URL without a base".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "invalid_endpoint");
    }

    #[test]
    fn test_status_mapping() {
        let throttled = SearchError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        assert_eq!(throttled.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(SearchError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            SearchError::InvalidParameter { name: "start", value: "x".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
