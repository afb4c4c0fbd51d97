//! Presentation port.

/// Turns a named template and its JSON context into an HTML document.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Context serialization failed: {0}")]
    Serialization(String),

    #[error("Template failed: {0}")]
    Template(String),
}
