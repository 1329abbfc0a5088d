//! minijinja-backed renderer loading templates from a directory.

use minijinja::{path_loader, Environment, ErrorKind, Value as JinjaValue};
use serde_json::Value;
use std::path::Path;

use crate::render::{RenderError, TemplateRenderer};

/// Renders Jinja templates found under a directory.
///
/// Files ending in `.html` are auto-escaped; provider fields that carry
/// markup must be marked `|safe` in the template.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    /// Create a renderer rooted at `directory`.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(directory.as_ref().to_path_buf()));
        Self { env }
    }

    fn map_error(template: &str, err: minijinja::Error) -> RenderError {
        if err.kind() == ErrorKind::TemplateNotFound {
            RenderError::NotFound {
                template: template.to_string(),
            }
        } else {
            RenderError::Template {
                template: template.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        let tmpl = self
            .env
            .get_template(template)
            .map_err(|e| Self::map_error(template, e))?;

        tmpl.render(JinjaValue::from_serialize(context))
            .map_err(|e| Self::map_error(template, e))
    }

    fn ensure_template(&self, template: &str) -> Result<(), RenderError> {
        self.env
            .get_template(template)
            .map(|_| ())
            .map_err(|e| Self::map_error(template, e))
    }
}
