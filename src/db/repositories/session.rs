//! Session repository
//!
//! Database operations for login sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_session_sqlite(sqlite(&self.pool)?, session).await,
            DatabaseDriver::Mysql => create_session_mysql(mysql(&self.pool)?, session).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_session_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_session_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_session_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_session_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_sessions_by_user_sqlite(sqlite(&self.pool)?, user_id).await
            }
            DatabaseDriver::Mysql => {
                delete_sessions_by_user_mysql(mysql(&self.pool)?, user_id).await
            }
        }
    }

    async fn delete_expired(&self) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_expired_sessions_sqlite(sqlite(&self.pool)?).await,
            DatabaseDriver::Mysql => delete_expired_sessions_mysql(mysql(&self.pool)?).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, expires_at, created_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_session_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_sessions_by_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by user")?;

    Ok(())
}

async fn delete_expired_sessions_sqlite(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, expires_at, created_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_session_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_sessions_by_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by user")?;

    Ok(())
}

async fn delete_expired_sessions_mysql(pool: &MySqlPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxSessionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxSessionRepository::new(pool.clone());
        (pool, repo)
    }

    // Sessions reference users through a foreign key
    async fn create_test_user(pool: &DynDatabasePool, id: i64) {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, date_joined) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(format!("user{}", id))
        .bind("hash")
        .bind(Utc::now())
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to create test user");
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let session = Session::new(1, Duration::days(14));
        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, 1);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_get_session_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo
            .get_by_id("nonexistent-session-id")
            .await
            .expect("Failed to get session");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let (_pool, repo) = setup_test_repo().await;

        let result = repo.create(&Session::new(42, Duration::days(1))).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let session = Session::new(1, Duration::days(14));
        repo.create(&session).await.unwrap();
        repo.delete(&session.id)
            .await
            .expect("Failed to delete session");

        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_sessions_by_user() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;

        let session1 = Session::new(1, Duration::days(14));
        let session2 = Session::new(1, Duration::days(14));
        let session3 = Session::new(2, Duration::days(14));
        for session in [&session1, &session2, &session3] {
            repo.create(session).await.unwrap();
        }

        repo.delete_by_user(1)
            .await
            .expect("Failed to delete sessions by user");

        assert!(repo.get_by_id(&session1.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&session2.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&session3.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sessions_cascade_with_user() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        let session = Session::new(1, Duration::days(14));
        repo.create(&session).await.unwrap();

        pool.execute("DELETE FROM users WHERE id = 1").await.unwrap();

        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let expired = Session::new(1, Duration::days(-1));
        let valid = Session::new(1, Duration::days(14));
        repo.create(&expired).await.unwrap();
        repo.create(&valid).await.unwrap();

        let deleted = repo
            .delete_expired()
            .await
            .expect("Failed to delete expired sessions");

        assert_eq!(deleted, 1);
        assert!(repo.get_by_id(&expired.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&valid.id).await.unwrap().is_some());
    }
}
