//! Article repository
//!
//! Database operations for articles and their blog links.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL
//!
//! Reads return [`ArticleWithMeta`] joined with the owner's names. The `blogs`
//! list is left empty here; callers prefetch it through
//! [`BlogRepository::get_by_article_ids`](super::BlogRepository::get_by_article_ids).

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleOwner, ArticleWithMeta, CreateArticleInput, UpdateArticleInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create an article published now and link it to its blogs
    async fn create(&self, input: &CreateArticleInput) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ArticleWithMeta>>;

    /// Most recently published articles
    async fn list_latest(&self, limit: i64) -> Result<Vec<ArticleWithMeta>>;

    /// Articles linked to a blog, most recent first
    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<ArticleWithMeta>>;

    /// Update title, text and (when given) image
    ///
    /// Returns `false` when no article has this ID.
    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<bool>;

    /// Replace the set of blogs an article belongs to
    async fn set_blogs(&self, id: i64, blog_ids: &[i64]) -> Result<()>;

    /// Delete an article and its blog links
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, input: &CreateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_article_sqlite(sqlite(&self.pool)?, input).await,
            DatabaseDriver::Mysql => create_article_mysql(mysql(&self.pool)?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ArticleWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_article_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_article_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<ArticleWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_latest_sqlite(sqlite(&self.pool)?, limit).await,
            DatabaseDriver::Mysql => list_latest_mysql(mysql(&self.pool)?, limit).await,
        }
    }

    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<ArticleWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_blog_sqlite(sqlite(&self.pool)?, blog_id).await,
            DatabaseDriver::Mysql => list_by_blog_mysql(mysql(&self.pool)?, blog_id).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_article_sqlite(sqlite(&self.pool)?, id, input).await,
            DatabaseDriver::Mysql => update_article_mysql(mysql(&self.pool)?, id, input).await,
        }
    }

    async fn set_blogs(&self, id: i64, blog_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_blogs_sqlite(sqlite(&self.pool)?, id, blog_ids).await,
            DatabaseDriver::Mysql => set_blogs_mysql(mysql(&self.pool)?, id, blog_ids).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_article_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_article_mysql(mysql(&self.pool)?, id).await,
        }
    }
}

const SELECT_WITH_OWNER: &str = r#"
    SELECT a.id, a.title, a.text, a.image, a.owner_id, a.published_date,
           u.first_name AS owner_first_name, u.last_name AS owner_last_name
    FROM articles a
    INNER JOIN users u ON u.id = a.owner_id
"#;

const NEWEST_FIRST: &str = "ORDER BY a.published_date DESC, a.id DESC";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, input: &CreateArticleInput) -> Result<Article> {
    let published_date = Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, text, image, owner_id, published_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.text)
    .bind(&input.image)
    .bind(input.owner_id)
    .bind(published_date)
    .execute(&mut *tx)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_rowid();

    for blog_id in &input.blog_ids {
        sqlx::query("INSERT INTO article_blogs (article_id, blog_id) VALUES (?, ?)")
            .bind(id)
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link article to blog")?;
    }

    tx.commit().await?;

    Ok(Article {
        id,
        title: input.title.clone(),
        text: input.text.clone(),
        image: input.image.clone(),
        owner_id: input.owner_id,
        published_date,
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ArticleWithMeta>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_WITH_OWNER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    Ok(row.as_ref().map(row_to_article_sqlite))
}

async fn list_latest_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<ArticleWithMeta>> {
    let rows = sqlx::query(&format!("{} {} LIMIT ?", SELECT_WITH_OWNER, NEWEST_FIRST))
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list latest articles")?;

    Ok(rows.iter().map(row_to_article_sqlite).collect())
}

async fn list_by_blog_sqlite(pool: &SqlitePool, blog_id: i64) -> Result<Vec<ArticleWithMeta>> {
    let sql = format!(
        "{} INNER JOIN article_blogs ab ON ab.article_id = a.id WHERE ab.blog_id = ? {}",
        SELECT_WITH_OWNER, NEWEST_FIRST
    );
    let rows = sqlx::query(&sql)
        .bind(blog_id)
        .fetch_all(pool)
        .await
        .context("Failed to list articles by blog")?;

    Ok(rows.iter().map(row_to_article_sqlite).collect())
}

async fn update_article_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, text = ?, image = COALESCE(?, image)
        WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.text)
    .bind(&input.image)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    Ok(result.rows_affected() > 0)
}

async fn set_blogs_sqlite(pool: &SqlitePool, id: i64, blog_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM article_blogs WHERE article_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear article blogs")?;

    for blog_id in blog_ids {
        sqlx::query("INSERT INTO article_blogs (article_id, blog_id) VALUES (?, ?)")
            .bind(id)
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link article to blog")?;
    }

    tx.commit().await?;
    Ok(())
}

async fn delete_article_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> ArticleWithMeta {
    ArticleWithMeta::new(
        Article {
            id: row.get("id"),
            title: row.get("title"),
            text: row.get("text"),
            image: row.get("image"),
            owner_id: row.get("owner_id"),
            published_date: row.get("published_date"),
        },
        ArticleOwner {
            first_name: row.get("owner_first_name"),
            last_name: row.get("owner_last_name"),
        },
    )
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, input: &CreateArticleInput) -> Result<Article> {
    let published_date = Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, text, image, owner_id, published_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.text)
    .bind(&input.image)
    .bind(input.owner_id)
    .bind(published_date)
    .execute(&mut *tx)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_id() as i64;

    for blog_id in &input.blog_ids {
        sqlx::query("INSERT INTO article_blogs (article_id, blog_id) VALUES (?, ?)")
            .bind(id)
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link article to blog")?;
    }

    tx.commit().await?;

    Ok(Article {
        id,
        title: input.title.clone(),
        text: input.text.clone(),
        image: input.image.clone(),
        owner_id: input.owner_id,
        published_date,
    })
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ArticleWithMeta>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_WITH_OWNER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    Ok(row.as_ref().map(row_to_article_mysql))
}

async fn list_latest_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<ArticleWithMeta>> {
    let rows = sqlx::query(&format!("{} {} LIMIT ?", SELECT_WITH_OWNER, NEWEST_FIRST))
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list latest articles")?;

    Ok(rows.iter().map(row_to_article_mysql).collect())
}

async fn list_by_blog_mysql(pool: &MySqlPool, blog_id: i64) -> Result<Vec<ArticleWithMeta>> {
    let sql = format!(
        "{} INNER JOIN article_blogs ab ON ab.article_id = a.id WHERE ab.blog_id = ? {}",
        SELECT_WITH_OWNER, NEWEST_FIRST
    );
    let rows = sqlx::query(&sql)
        .bind(blog_id)
        .fetch_all(pool)
        .await
        .context("Failed to list articles by blog")?;

    Ok(rows.iter().map(row_to_article_mysql).collect())
}

async fn update_article_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<bool> {
    // MySQL reports 0 affected rows when nothing changed, so check existence first.
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to check article")?;
    if exists.is_none() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, text = ?, image = COALESCE(?, image)
        WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.text)
    .bind(&input.image)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    Ok(true)
}

async fn set_blogs_mysql(pool: &MySqlPool, id: i64, blog_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM article_blogs WHERE article_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear article blogs")?;

    for blog_id in blog_ids {
        sqlx::query("INSERT INTO article_blogs (article_id, blog_id) VALUES (?, ?)")
            .bind(id)
            .bind(blog_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link article to blog")?;
    }

    tx.commit().await?;
    Ok(())
}

async fn delete_article_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> ArticleWithMeta {
    ArticleWithMeta::new(
        Article {
            id: row.get("id"),
            title: row.get("title"),
            text: row.get("text"),
            image: row.get("image"),
            owner_id: row.get("owner_id"),
            published_date: row.get("published_date"),
        },
        ArticleOwner {
            first_name: row.get("owner_first_name"),
            last_name: row.get("owner_last_name"),
        },
    )
}
