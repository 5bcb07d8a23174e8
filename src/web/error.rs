//! Page-level errors
//!
//! Lookup and permission failures are answered with a short plain-text body.
//! Anything else is logged and reported as a generic server error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::forms::FormDataRejection;
use crate::services::{ArticleServiceError, BlogServiceError, UserServiceError};

pub const PAGE_NOT_FOUND: &str = "Страница не найдена";
pub const BAD_REQUEST: &str = "Некорректный запрос";
pub const INTERNAL_ERROR: &str = "Внутренняя ошибка сервера";

pub const ARTICLE_NOT_FOUND: &str = "Такой новости не найдено";
pub const ARTICLE_DOES_NOT_EXIST: &str = "Такой новости не существует";
pub const BLOG_DOES_NOT_EXIST: &str = "Такого блога не существует";

pub const ALREADY_LOGGED_IN: &str = "Вы уже вошли";
pub const NOT_LOGGED_IN: &str = "Вы не вошли";
pub const NOT_LOGGED_IN_TO_EDIT: &str = "Вы не вошли, чтобы редактировать новость";
pub const NOT_YOUR_ARTICLE: &str = "Это не ваша новость, чтобы ее редактировать";
pub const NOT_LOGGED_IN_TO_CREATE: &str = "Вы не вошли, чтобы создавать новость";
pub const NOT_ADMIN: &str = "Вы не админ, чтобы создавать новость";

#[derive(Debug)]
pub enum PageError {
    /// Form body that could not be parsed
    BadRequest,
    NotFound(&'static str),
    Forbidden(&'static str),
    Internal(anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::BadRequest => (StatusCode::BAD_REQUEST, BAD_REQUEST).into_response(),
            PageError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            PageError::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
            PageError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
            }
        }
    }
}

impl From<anyhow::Error> for PageError {
    fn from(e: anyhow::Error) -> Self {
        PageError::Internal(e)
    }
}

impl From<FormDataRejection> for PageError {
    fn from(rejection: FormDataRejection) -> Self {
        tracing::debug!("Rejected form body: {}", rejection.0);
        PageError::BadRequest
    }
}

impl From<UserServiceError> for PageError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::InternalError(e) => PageError::Internal(e),
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<BlogServiceError> for PageError {
    fn from(e: BlogServiceError) -> Self {
        match e {
            BlogServiceError::InternalError(e) => PageError::Internal(e),
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<ArticleServiceError> for PageError {
    fn from(e: ArticleServiceError) -> Self {
        match e {
            ArticleServiceError::NotFound(_) => PageError::NotFound(ARTICLE_DOES_NOT_EXIST),
            ArticleServiceError::InternalError(e) => PageError::Internal(e),
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Parse a numeric path segment; anything else is an unknown page
pub fn parse_id(raw: &str) -> Result<i64, PageError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PageError::NotFound(PAGE_NOT_FOUND));
    }
    raw.parse().map_err(|_| PageError::NotFound(PAGE_NOT_FOUND))
}

pub async fn not_found() -> PageError {
    PageError::NotFound(PAGE_NOT_FOUND)
}
