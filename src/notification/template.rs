//! This module provides a service for rendering service log texts using the
//! minijinja templating engine.

use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::models::Alert;

/// A service for rendering templates using the minijinja templating engine.
pub struct TemplateService {
    env: Environment<'static>,
}

/// Error type for the TemplateService.
#[derive(Debug, Error)]
pub enum TemplateServiceError {
    /// The template could not be parsed or referenced an unknown value.
    #[error("Failed to render template: {0}")]
    RenderError(#[from] minijinja::Error),
}

/// The values a service log text can refer to.
#[derive(Debug, Serialize)]
pub struct AlertContext<'a> {
    /// Labels of the alert.
    pub labels: &'a std::collections::HashMap<String, String>,
    /// Annotations of the alert.
    pub annotations: &'a std::collections::HashMap<String, String>,
}

impl<'a> From<&'a Alert> for AlertContext<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self { labels: &alert.labels, annotations: &alert.annotations }
    }
}

impl TemplateService {
    /// Creates a new instance of `TemplateService` with a default environment.
    /// Unknown variables are an error rather than silently rendering as empty.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

        Self { env }
    }

    /// Renders a template with the given context.
    pub fn render<S: Serialize>(
        &self,
        template_str: &str,
        context: S,
    ) -> Result<String, TemplateServiceError> {
        // Most texts carry no template syntax at all.
        if !template_str.contains("{{") && !template_str.contains("{%") {
            return Ok(template_str.to_string());
        }

        tracing::debug!(template = template_str, "Rendering template with context.");

        match self.env.render_str(template_str, context) {
            Ok(rendered_string) => Ok(rendered_string),
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {}", template_str, e);
                Err(TemplateServiceError::RenderError(e))
            }
        }
    }

    /// Renders a template against the labels and annotations of an alert.
    pub fn render_for_alert(
        &self,
        template_str: &str,
        alert: &Alert,
    ) -> Result<String, TemplateServiceError> {
        self.render(template_str, AlertContext::from(alert))
    }
}

impl Default for TemplateService {
    fn default() -> Self {
        Self::new()
    }
}
