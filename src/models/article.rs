//! Article model
//!
//! This module provides:
//! - `Article` entity as stored in the `articles` table
//! - `ArticleWithMeta`, an article joined with its owner's names and blogs
//! - Input types for creating and updating articles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Blog;

/// Maximum length of an article title
pub const TITLE_MAX_LENGTH: usize = 50;

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    /// Plain text body
    pub text: String,
    /// Image path relative to the media root
    pub image: String,
    /// Owner user ID
    pub owner_id: i64,
    /// Set once at creation
    pub published_date: DateTime<Utc>,
}

impl Article {
    /// Public detail page
    pub fn url(&self) -> String {
        format!("/news/{}", self.id)
    }

    /// Edit form page
    pub fn edit_url(&self) -> String {
        format!("/edit_article/{}", self.id)
    }
}

/// Owner names shown next to an article
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArticleOwner {
    pub first_name: String,
    pub last_name: String,
}

/// Article with its owner's names and the blogs it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleWithMeta {
    #[serde(flatten)]
    pub article: Article,
    pub owner: ArticleOwner,
    /// Blogs ordered by name
    pub blogs: Vec<Blog>,
}

impl ArticleWithMeta {
    pub fn new(article: Article, owner: ArticleOwner) -> Self {
        Self {
            article,
            owner,
            blogs: Vec::new(),
        }
    }
}

/// Input for creating an article
#[derive(Debug, Clone)]
pub struct CreateArticleInput {
    pub title: String,
    pub text: String,
    /// Image path relative to the media root, already stored
    pub image: String,
    pub owner_id: i64,
    /// At least one existing blog
    pub blog_ids: Vec<i64>,
}

/// Input for updating an article
///
/// Owner, blogs and `published_date` are not editable.
#[derive(Debug, Clone)]
pub struct UpdateArticleInput {
    pub title: String,
    pub text: String,
    /// New image path, `None` keeps the current image
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_urls() {
        let article = Article {
            id: 12,
            title: "t".to_string(),
            text: "x".to_string(),
            image: "articles/user_1/1.000_a.png".to_string(),
            owner_id: 1,
            published_date: Utc::now(),
        };
        assert_eq!(article.url(), "/news/12");
        assert_eq!(article.edit_url(), "/edit_article/12");
    }
}
