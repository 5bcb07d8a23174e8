//! Session handling
//!
//! [`load_session`] resolves the session cookie once per request and stores a
//! [`CurrentUser`] in the request extensions, where handlers extract it.

use anyhow::Context;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::config::SessionConfig;
use crate::models::User;
use crate::web::{AppState, PageError};

/// The visitor of the current request
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub user: Option<User>,
    /// Token of the session that authenticated `user`
    pub session_id: Option<String>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Value of the session cookie, if the request carries a non-empty one
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve the session cookie into a [`CurrentUser`]
pub async fn load_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut current = CurrentUser::anonymous();

    if let Some(token) = extract_session_token(request.headers(), &state.config.session.cookie_name) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                current.user = Some(user);
                current.session_id = Some(token);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }

    request.extensions_mut().insert(current);
    next.run(request).await
}

/// `Set-Cookie` value starting a session
pub fn session_cookie(config: &SessionConfig, token: &str) -> Result<HeaderValue, PageError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        token,
        config.expiration_days * 24 * 60 * 60
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie).context("Invalid session cookie")?)
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie(config: &SessionConfig) -> Result<HeaderValue, PageError> {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie).context("Invalid session cookie")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_token() {
        let headers = headers("theme=dark; session=abc-123; other=x");
        assert_eq!(
            extract_session_token(&headers, "session"),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_custom_name() {
        let headers = headers("session=wrong; sid=right");
        assert_eq!(extract_session_token(&headers, "sid"), Some("right".to_string()));
    }

    #[test]
    fn test_extract_session_token_missing_or_empty() {
        assert!(extract_session_token(&HeaderMap::new(), "session").is_none());
        assert!(extract_session_token(&headers("session="), "session").is_none());
        assert!(extract_session_token(&headers("my_session=abc"), "session").is_none());
    }

    #[test]
    fn test_session_cookie() {
        let config = SessionConfig::default();
        let cookie = session_cookie(&config, "tok").unwrap();
        assert_eq!(
            cookie,
            "session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=1209600"
        );

        let secure = SessionConfig {
            secure_cookie: true,
            ..SessionConfig::default()
        };
        assert!(session_cookie(&secure, "tok")
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("; Secure"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookie = clear_session_cookie(&SessionConfig::default()).unwrap();
        assert_eq!(cookie, "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    }

    #[tokio::test]
    async fn test_current_user_defaults_to_anonymous() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();

        let current = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();

        assert!(!current.is_authenticated());
        assert!(current.session_id.is_none());
    }
}
