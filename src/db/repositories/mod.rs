//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the operations for a specific entity.

pub mod article;
pub mod blog;
pub mod session;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use blog::{BlogRepository, SqlxBlogRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// `?, ?, ?` with `count` placeholders, for `IN (...)` clauses
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
