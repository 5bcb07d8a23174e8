//! User service
//!
//! Implements business logic for user management:
//! - Registration and superuser creation
//! - Authentication with username and password
//! - Login/logout backed by database sessions
//! - Session validation and periodic cleanup

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown user, wrong password or inactive account
    #[error("Authentication failed")]
    AuthenticationError,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the default session lifetime
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user
    ///
    /// Field-level validation (charset, lengths, password confirmation)
    /// happens in the registration form; this only guards the invariants
    /// the database relies on.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if username or password is empty
    /// - `UserExists` if the username is already taken
    /// - `InternalError` for database errors
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(input.username));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let mut user = User::new(
            input.username,
            input.first_name,
            input.last_name,
            input.email,
            password_hash,
        );
        user.is_superuser = input.is_superuser;

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(
            user_id = created.id,
            username = %created.username,
            superuser = created.is_superuser,
            "User registered"
        );

        Ok(created)
    }

    /// Register a user allowed to create articles
    pub async fn create_superuser(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.register(CreateUserInput {
            is_superuser: true,
            ..input
        })
        .await
    }

    /// Check credentials
    ///
    /// Unknown user, wrong password and inactive account all yield the same
    /// `AuthenticationError`.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .ok_or(UserServiceError::AuthenticationError)?;

        let password_valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid || !user.is_active {
            tracing::debug!(username = %username, "Authentication failed");
            return Err(UserServiceError::AuthenticationError);
        }

        Ok(user)
    }

    /// Start a session for an authenticated user
    pub async fn login(&self, user: &User) -> Result<Session, UserServiceError> {
        let session = Session::new(user.id, Duration::days(self.session_expiration_days));

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::debug!(user_id = user.id, "Session created");
        Ok(created)
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate session token and return the associated user
    ///
    /// Expired sessions are deleted and treated as absent. Sessions of
    /// inactive users are treated as absent too.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user.filter(|u| u.is_active))
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    /// All users ordered by username
    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        let users = self.user_repo.list().await.context("Failed to list users")?;
        Ok(users)
    }
}
