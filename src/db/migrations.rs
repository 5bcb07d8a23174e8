//! Database migrations
//!
//! Migrations are embedded as SQL strings with one variant per driver and
//! recorded in the `_migrations` table. Running them twice is a no-op.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::pool::{mysql, sqlite};
use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                is_superuser INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                date_joined TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                is_superuser TINYINT(1) NOT NULL DEFAULT 0,
                is_active TINYINT(1) NOT NULL DEFAULT 1,
                date_joined DATETIME(6) NOT NULL
            ) DEFAULT CHARSET=utf8mb4;
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at DATETIME(6) NOT NULL,
                created_at DATETIME(6) NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            ) DEFAULT CHARSET=utf8mb4;
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_blogs",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blogs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(50) NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blogs_name ON blogs(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS blogs (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(50) NOT NULL
            ) DEFAULT CHARSET=utf8mb4;
            CREATE INDEX idx_blogs_name ON blogs(name);
        "#,
    },
    Migration {
        version: 4,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(50) NOT NULL,
                text TEXT NOT NULL,
                image VARCHAR(255) NOT NULL,
                owner_id INTEGER NOT NULL,
                published_date TIMESTAMP NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_articles_owner_id ON articles(owner_id);
            CREATE INDEX IF NOT EXISTS idx_articles_published_date ON articles(published_date);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(50) NOT NULL,
                text LONGTEXT NOT NULL,
                image VARCHAR(255) NOT NULL,
                owner_id BIGINT NOT NULL,
                published_date DATETIME(6) NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
            ) DEFAULT CHARSET=utf8mb4;
            CREATE INDEX idx_articles_owner_id ON articles(owner_id);
            CREATE INDEX idx_articles_published_date ON articles(published_date);
        "#,
    },
    Migration {
        version: 5,
        name: "create_article_blogs",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS article_blogs (
                article_id INTEGER NOT NULL,
                blog_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, blog_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (blog_id) REFERENCES blogs(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_blogs_blog_id ON article_blogs(blog_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS article_blogs (
                article_id BIGINT NOT NULL,
                blog_id BIGINT NOT NULL,
                PRIMARY KEY (article_id, blog_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (blog_id) REFERENCES blogs(id) ON DELETE CASCADE
            ) DEFAULT CHARSET=utf8mb4;
            CREATE INDEX idx_article_blogs_blog_id ON article_blogs(blog_id);
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at DATETIME(6) NOT NULL
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(sqlite(pool)?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(mysql(pool)?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| MigrationRecord {
            version: row.get::<i32, _>("version") as i64,
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(sqlite(pool)?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(mysql(pool)?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

// MySQL commits DDL implicitly, so statements run outside a transaction.
async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_user(pool: &SqlitePool, username: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind("hash")
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to create user")
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date_and_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_username_is_unique() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();

        insert_user(sqlite_pool, "reader").await;
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?)",
        )
        .bind("reader")
        .bind("hash")
        .bind(Utc::now())
        .execute(sqlite_pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_articles_cascade_with_owner() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let user_id = insert_user(sqlite_pool, "writer").await;

        let blog_id = sqlx::query("INSERT INTO blogs (name) VALUES ('Спорт')")
            .execute(sqlite_pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let article_id = sqlx::query(
            "INSERT INTO articles (title, text, image, owner_id, published_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("Title")
        .bind("Text")
        .bind("articles/user_1/1.000_a.png")
        .bind(user_id)
        .bind(Utc::now())
        .execute(sqlite_pool)
        .await
        .unwrap()
        .last_insert_rowid();
        sqlx::query("INSERT INTO article_blogs (article_id, blog_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(blog_id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        let articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(sqlite_pool)
            .await
            .unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_blogs")
            .fetch_one(sqlite_pool)
            .await
            .unwrap();
        assert_eq!(articles, 0);
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn test_article_requires_existing_owner() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();

        let result = sqlx::query(
            "INSERT INTO articles (title, text, image, owner_id, published_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("Orphan")
        .bind("Text")
        .bind("x.png")
        .bind(999i64)
        .bind(Utc::now())
        .execute(sqlite_pool)
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_get_migration() {
        assert_eq!(get_migration(1).unwrap().name, "create_users");
        assert_eq!(get_migration(5).unwrap().name, "create_article_blogs");
        assert!(get_migration(999).is_none());
        assert_eq!(total_migrations(), 5);
    }

    #[test]
    fn test_split_sql_statements() {
        let statements = split_sql_statements("CREATE TABLE a (id INT); CREATE TABLE b (id INT);");
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]);

        let statements = split_sql_statements("-- Comment\nCREATE TABLE a (id INT);\n-- trailing");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
    }
}
