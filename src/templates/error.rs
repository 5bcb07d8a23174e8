//! Template engine error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// Override directory configured but missing
    #[error("Template directory not found: {0}")]
    DirectoryNotFound(String),

    /// Template failed to parse or render
    #[error("Template error: {0}")]
    Render(String),

    /// Embedded or override template is not UTF-8
    #[error("Template {0} is not valid UTF-8")]
    InvalidEncoding(String),
}
