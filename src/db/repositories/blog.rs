//! Blog repository
//!
//! Database operations for blogs and the article → blog relation.
//!
//! This module provides:
//! - `BlogRepository` trait defining the interface for blog data access
//! - `SqlxBlogRepository` implementing the trait for SQLite and MySQL

use super::placeholders;
use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Blog;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Create a new blog
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    /// Get blog by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// List all blogs ordered by name
    async fn list(&self) -> Result<Vec<Blog>>;

    /// Get the blogs with the given IDs, ordered by name; unknown IDs are skipped
    async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Blog>>;

    /// Blogs of each given article, keyed by article ID, each list ordered by name
    async fn get_by_article_ids(&self, article_ids: &[i64]) -> Result<HashMap<i64, Vec<Blog>>>;
}

/// SQLx-based blog repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    /// Create a new SQLx blog repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_blog_sqlite(sqlite(&self.pool)?, blog).await,
            DatabaseDriver::Mysql => create_blog_mysql(mysql(&self.pool)?, blog).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_blog_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_blog_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Blog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_blogs_sqlite(sqlite(&self.pool)?).await,
            DatabaseDriver::Mysql => list_blogs_mysql(mysql(&self.pool)?).await,
        }
    }

    async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Blog>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_blogs_by_ids_sqlite(sqlite(&self.pool)?, ids).await,
            DatabaseDriver::Mysql => list_blogs_by_ids_mysql(mysql(&self.pool)?, ids).await,
        }
    }

    async fn get_by_article_ids(&self, article_ids: &[i64]) -> Result<HashMap<i64, Vec<Blog>>> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_blogs_by_article_ids_sqlite(sqlite(&self.pool)?, article_ids).await
            }
            DatabaseDriver::Mysql => {
                get_blogs_by_article_ids_mysql(mysql(&self.pool)?, article_ids).await
            }
        }
    }
}

fn article_blogs_query(count: usize) -> String {
    format!(
        r#"
        SELECT ab.article_id, b.id, b.name
        FROM article_blogs ab
        INNER JOIN blogs b ON b.id = ab.blog_id
        WHERE ab.article_id IN ({})
        ORDER BY b.name, b.id
        "#,
        placeholders(count)
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_blog_sqlite(pool: &SqlitePool, blog: &Blog) -> Result<Blog> {
    let result = sqlx::query("INSERT INTO blogs (name) VALUES (?)")
        .bind(&blog.name)
        .execute(pool)
        .await
        .context("Failed to create blog")?;

    Ok(Blog {
        id: result.last_insert_rowid(),
        name: blog.name.clone(),
    })
}

async fn get_blog_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query("SELECT id, name FROM blogs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;

    Ok(row.map(|row| Blog {
        id: row.get("id"),
        name: row.get("name"),
    }))
}

async fn list_blogs_sqlite(pool: &SqlitePool) -> Result<Vec<Blog>> {
    let rows = sqlx::query("SELECT id, name FROM blogs ORDER BY name, id")
        .fetch_all(pool)
        .await
        .context("Failed to list blogs")?;

    Ok(rows
        .into_iter()
        .map(|row| Blog {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

async fn list_blogs_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Blog>> {
    let sql = format!(
        "SELECT id, name FROM blogs WHERE id IN ({}) ORDER BY name, id",
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list blogs by IDs")?;

    Ok(rows
        .into_iter()
        .map(|row| Blog {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

async fn get_blogs_by_article_ids_sqlite(
    pool: &SqlitePool,
    article_ids: &[i64],
) -> Result<HashMap<i64, Vec<Blog>>> {
    let sql = article_blogs_query(article_ids.len());
    let mut query = sqlx::query(&sql);
    for id in article_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get blogs for articles")?;

    let mut blogs: HashMap<i64, Vec<Blog>> = HashMap::new();
    for row in rows {
        blogs.entry(row.get("article_id")).or_default().push(Blog {
            id: row.get("id"),
            name: row.get("name"),
        });
    }
    Ok(blogs)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_blog_mysql(pool: &MySqlPool, blog: &Blog) -> Result<Blog> {
    let result = sqlx::query("INSERT INTO blogs (name) VALUES (?)")
        .bind(&blog.name)
        .execute(pool)
        .await
        .context("Failed to create blog")?;

    Ok(Blog {
        id: result.last_insert_id() as i64,
        name: blog.name.clone(),
    })
}

async fn get_blog_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query("SELECT id, name FROM blogs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;

    Ok(row.map(|row| Blog {
        id: row.get("id"),
        name: row.get("name"),
    }))
}

async fn list_blogs_mysql(pool: &MySqlPool) -> Result<Vec<Blog>> {
    let rows = sqlx::query("SELECT id, name FROM blogs ORDER BY name, id")
        .fetch_all(pool)
        .await
        .context("Failed to list blogs")?;

    Ok(rows
        .into_iter()
        .map(|row| Blog {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

async fn list_blogs_by_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<Blog>> {
    let sql = format!(
        "SELECT id, name FROM blogs WHERE id IN ({}) ORDER BY name, id",
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list blogs by IDs")?;

    Ok(rows
        .into_iter()
        .map(|row| Blog {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

async fn get_blogs_by_article_ids_mysql(
    pool: &MySqlPool,
    article_ids: &[i64],
) -> Result<HashMap<i64, Vec<Blog>>> {
    let sql = article_blogs_query(article_ids.len());
    let mut query = sqlx::query(&sql);
    for id in article_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get blogs for articles")?;

    let mut blogs: HashMap<i64, Vec<Blog>> = HashMap::new();
    for row in rows {
        blogs.entry(row.get("article_id")).or_default().push(Blog {
            id: row.get("id"),
            name: row.get("name"),
        });
    }
    Ok(blogs)
}
