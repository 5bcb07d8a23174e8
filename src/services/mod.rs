//! Services layer - Business logic
//!
//! Services sit between the web handlers and the repositories:
//! - Implementing business rules
//! - Coordinating repositories and media storage
//! - Turning storage failures into typed errors

pub mod article;
pub mod blog;
pub mod media;
pub mod password;
pub mod user;

pub use article::{ArticleChanges, ArticleService, ArticleServiceError, NewArticle, HOME_PAGE_ARTICLES};
pub use blog::{BlogService, BlogServiceError};
pub use media::{ImageUpload, MediaStorage};
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError};
