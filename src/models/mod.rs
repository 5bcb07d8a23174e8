//! Data models
//!
//! Plain data structures shared by the repositories, services and views:
//! - Database entities (User, Session, Blog, Article)
//! - Input types for create/update operations
//! - Joined read models used by the pages

mod article;
mod blog;
mod session;
mod user;

pub use article::{
    Article, ArticleOwner, ArticleWithMeta, CreateArticleInput, UpdateArticleInput,
    TITLE_MAX_LENGTH,
};
pub use blog::{Blog, BLOG_NAME_MAX_LENGTH};
pub use session::Session;
pub use user::{CreateUserInput, User, EMAIL_MAX_LENGTH, NAME_MAX_LENGTH};
