//! Blog service

use crate::db::repositories::BlogRepository;
use crate::models::{Blog, BLOG_NAME_MAX_LENGTH};
use anyhow::Context;
use std::sync::Arc;

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Create a blog; the name is trimmed and must be 1 to 50 characters
    pub async fn create(&self, name: &str) -> Result<Blog, BlogServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BlogServiceError::ValidationError(
                "Blog name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > BLOG_NAME_MAX_LENGTH {
            return Err(BlogServiceError::ValidationError(format!(
                "Blog name cannot exceed {} characters",
                BLOG_NAME_MAX_LENGTH
            )));
        }

        let blog = self
            .repo
            .create(&Blog::new(name.to_string()))
            .await
            .context("Failed to create blog")?;

        tracing::info!(blog_id = blog.id, name = %blog.name, "Blog created");
        Ok(blog)
    }

    /// All blogs ordered by name
    pub async fn list(&self) -> Result<Vec<Blog>, BlogServiceError> {
        Ok(self.repo.list().await.context("Failed to list blogs")?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Blog>, BlogServiceError> {
        Ok(self.repo.get_by_id(id).await.context("Failed to get blog")?)
    }
}
