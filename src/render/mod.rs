//! Template rendering.
//!
//! Views hand a JSON context to a `TemplateRenderer`; the engine behind it
//! is a collaborator and can be swapped without touching the view layer.

pub mod jinja;

pub use jinja::JinjaRenderer;

use serde_json::Value;
use thiserror::Error;

/// Errors raised while rendering a template.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template `{template}` not found")]
    NotFound { template: String },

    #[error("Failed to render template `{template}`: {message}")]
    Template { template: String, message: String },

    #[error("Failed to build template context: {0}")]
    Context(#[from] serde_json::Error),
}

/// Renders a named template with a JSON context.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` with `context`.
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;

    /// Check that `template` can be loaded. Called once at startup.
    fn ensure_template(&self, _template: &str) -> Result<(), RenderError> {
        Ok(())
    }
}
