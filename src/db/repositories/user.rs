//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username (exact match)
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Update names, email, password hash and flags
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user together with their sessions and articles
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// List all users ordered by username
    async fn list(&self) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql(&self.pool)?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(sqlite(&self.pool)?, username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_username_mysql(mysql(&self.pool)?, username).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(sqlite(&self.pool)?, user).await,
            DatabaseDriver::Mysql => update_user_mysql(mysql(&self.pool)?, user).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_user_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(sqlite(&self.pool)?).await,
            DatabaseDriver::Mysql => count_users_mysql(mysql(&self.pool)?).await,
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_users_sqlite(sqlite(&self.pool)?).await,
            DatabaseDriver::Mysql => list_users_mysql(mysql(&self.pool)?).await,
        }
    }
}

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, password_hash, \
                            is_superuser, is_active, date_joined";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, first_name, last_name, email, password_hash, is_superuser, is_active, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(user.date_joined)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        UPDATE users
        SET first_name = ?, last_name = ?, email = ?, password_hash = ?, is_superuser = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(user.clone())
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(count)
}

async fn list_users_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_sqlite).collect()
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, first_name, last_name, email, password_hash, is_superuser, is_active, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(user.date_joined)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        UPDATE users
        SET first_name = ?, last_name = ?, email = ?, password_hash = ?, is_superuser = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(user.clone())
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(count)
}

async fn list_users_mysql(pool: &MySqlPool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_mysql).collect()
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(username: &str) -> User {
        User::new(
            username.to_string(),
            "Иван".to_string(),
            "Петров".to_string(),
            format!("{}@example.com", username),
            hash_password("test_password").expect("Failed to hash password"),
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_user("testuser"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "testuser");
        assert_eq!(created.first_name, "Иван");
        assert!(!created.is_superuser);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&create_test_user("testuser"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "testuser");
        assert_eq!(found.last_name, "Петров");
        assert_eq!(found.email, "testuser@example.com");
        assert!(found.is_active);
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("findme"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_username("findme")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.username, "findme");

        let missing = repo
            .get_by_username("nonexistent")
            .await
            .expect("Failed to get user");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;
        let mut user = repo
            .create(&create_test_user("editor"))
            .await
            .expect("Failed to create user");

        user.first_name = "Пётр".to_string();
        user.is_superuser = true;
        user.is_active = false;
        repo.update(&user).await.expect("Failed to update user");

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.first_name, "Пётр");
        assert!(found.is_superuser);
        assert!(!found.is_active);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = repo.create(&create_test_user("gone")).await.unwrap();

        repo.delete(user.id).await.expect("Failed to delete user");

        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_and_list_users() {
        let (_pool, repo) = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create(&create_test_user("zoe")).await.unwrap();
        repo.create(&create_test_user("adam")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("twin")).await.unwrap();

        let result = repo.create(&create_test_user("twin")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_email_is_not_unique() {
        let (_pool, repo) = setup_test_repo().await;
        let mut first = create_test_user("first");
        let mut second = create_test_user("second");
        first.email = "shared@example.com".to_string();
        second.email = "shared@example.com".to_string();

        repo.create(&first).await.unwrap();
        repo.create(&second).await.expect("Email should not be unique");
    }

    #[tokio::test]
    async fn test_password_hash_stored_correctly() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("secure");
        let original_hash = user.password_hash.clone();

        let created = repo.create(&user).await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(found.password_hash, original_hash);
        assert!(found.password_hash.starts_with("$argon2"));
        assert_ne!(found.password_hash, "test_password");
    }
}
