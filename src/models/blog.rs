//! Blog model
//!
//! A blog is a named group of articles. Articles may belong to several blogs.

use serde::{Deserialize, Serialize};

/// Maximum length of a blog name
pub const BLOG_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blog {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
}

impl Blog {
    pub fn new(name: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
        }
    }

    /// Public page of this blog
    pub fn url(&self) -> String {
        format!("/blogs/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_url() {
        let blog = Blog {
            id: 3,
            name: "Спорт".to_string(),
        };
        assert_eq!(blog.url(), "/blogs/3");
    }
}
