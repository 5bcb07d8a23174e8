//! Article service
//!
//! Implements business logic for articles:
//! - Home page, detail and per-blog listings with blogs prefetched
//! - Creation with image storage and blog links
//! - Editing of title, text and image

use crate::db::repositories::{ArticleRepository, BlogRepository};
use crate::models::{
    Article, ArticleWithMeta, CreateArticleInput, UpdateArticleInput, TITLE_MAX_LENGTH,
};
use crate::services::media::{ImageUpload, MediaStorage};
use anyhow::Context;
use std::sync::Arc;

/// Number of articles on the home page
pub const HOME_PAGE_ARTICLES: i64 = 5;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A new article as submitted by a superuser
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub text: String,
    pub blog_ids: Vec<i64>,
    pub owner_id: i64,
    pub image: ImageUpload,
}

/// Changes submitted through the edit form
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: String,
    pub text: String,
    /// `None` keeps the current image
    pub image: Option<ImageUpload>,
}

pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    blog_repo: Arc<dyn BlogRepository>,
    media: Arc<MediaStorage>,
}

impl ArticleService {
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        blog_repo: Arc<dyn BlogRepository>,
        media: Arc<MediaStorage>,
    ) -> Self {
        Self {
            repo,
            blog_repo,
            media,
        }
    }

    /// Most recently published articles, newest first
    pub async fn latest(&self, limit: i64) -> Result<Vec<ArticleWithMeta>, ArticleServiceError> {
        let articles = self
            .repo
            .list_latest(limit)
            .await
            .context("Failed to list latest articles")?;
        self.with_blogs(articles).await
    }

    /// Get a single article with its owner and blogs
    pub async fn get(&self, id: i64) -> Result<Option<ArticleWithMeta>, ArticleServiceError> {
        let article = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?;

        match article {
            Some(article) => Ok(self.with_blogs(vec![article]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Articles of one blog, newest first
    pub async fn list_by_blog(
        &self,
        blog_id: i64,
    ) -> Result<Vec<ArticleWithMeta>, ArticleServiceError> {
        let articles = self
            .repo
            .list_by_blog(blog_id)
            .await
            .context("Failed to list articles by blog")?;
        self.with_blogs(articles).await
    }

    /// Store the image, then insert the article published now.
    ///
    /// The stored image is removed again if the insert fails.
    pub async fn create(&self, input: NewArticle) -> Result<Article, ArticleServiceError> {
        validate_content(&input.title, &input.text)?;
        if input.blog_ids.is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "An article needs at least one blog".to_string(),
            ));
        }

        let image = self
            .media
            .save_article_image(input.owner_id, &input.image)
            .await
            .context("Failed to store article image")?;

        let created = self
            .repo
            .create(&CreateArticleInput {
                title: input.title,
                text: input.text,
                image: image.clone(),
                owner_id: input.owner_id,
                blog_ids: input.blog_ids,
            })
            .await;

        match created {
            Ok(article) => {
                tracing::info!(article_id = article.id, owner_id = article.owner_id, "Article created");
                Ok(article)
            }
            Err(e) => {
                if let Err(cleanup) = self.media.remove(&image).await {
                    tracing::warn!("Failed to remove orphaned image {}: {:#}", image, cleanup);
                }
                Err(ArticleServiceError::InternalError(
                    e.context("Failed to create article"),
                ))
            }
        }
    }

    /// Apply edits; `published_date`, owner and blogs stay as they are.
    ///
    /// A newly stored image is removed again if the article is not updated.
    pub async fn update(
        &self,
        article: &Article,
        changes: ArticleChanges,
    ) -> Result<(), ArticleServiceError> {
        validate_content(&changes.title, &changes.text)?;

        let image = match &changes.image {
            Some(upload) => Some(
                self.media
                    .save_article_image(article.owner_id, upload)
                    .await
                    .context("Failed to store article image")?,
            ),
            None => None,
        };

        let updated = self
            .repo
            .update(
                article.id,
                &UpdateArticleInput {
                    title: changes.title,
                    text: changes.text,
                    image: image.clone(),
                },
            )
            .await;

        let result = match updated {
            Ok(true) => {
                tracing::info!(article_id = article.id, "Article updated");
                return Ok(());
            }
            Ok(false) => Err(ArticleServiceError::NotFound(article.id)),
            Err(e) => Err(ArticleServiceError::InternalError(
                e.context("Failed to update article"),
            )),
        };

        if let Some(image) = image {
            if let Err(cleanup) = self.media.remove(&image).await {
                tracing::warn!("Failed to remove orphaned image {}: {:#}", image, cleanup);
            }
        }
        result
    }

    async fn with_blogs(
        &self,
        mut articles: Vec<ArticleWithMeta>,
    ) -> Result<Vec<ArticleWithMeta>, ArticleServiceError> {
        let ids: Vec<i64> = articles.iter().map(|a| a.article.id).collect();
        let mut blogs = self
            .blog_repo
            .get_by_article_ids(&ids)
            .await
            .context("Failed to load article blogs")?;

        for article in &mut articles {
            article.blogs = blogs.remove(&article.article.id).unwrap_or_default();
        }
        Ok(articles)
    }
}

fn validate_content(title: &str, text: &str) -> Result<(), ArticleServiceError> {
    if title.trim().is_empty() {
        return Err(ArticleServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ArticleServiceError::ValidationError(format!(
            "Title cannot exceed {} characters",
            TITLE_MAX_LENGTH
        )));
    }
    if text.trim().is_empty() {
        return Err(ArticleServiceError::ValidationError(
            "Text cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use crate::db::repositories::{SqlxArticleRepository, SqlxBlogRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::Blog;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    struct Fixture {
        pool: DynDatabasePool,
        service: ArticleService,
        media_dir: TempDir,
        owner_id: i64,
        sport: Blog,
        science: Blog,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let owner_id = sqlx::query(
            "INSERT INTO users (username, first_name, last_name, password_hash, is_superuser, date_joined) VALUES ('admin', 'Ольга', 'Кузнецова', 'h', 1, ?)",
        )
        .bind(Utc::now())
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap()
        .last_insert_rowid();

        let blog_repo = SqlxBlogRepository::boxed(pool.clone());
        let sport = blog_repo.create(&Blog::new("Спорт".to_string())).await.unwrap();
        let science = blog_repo.create(&Blog::new("Наука".to_string())).await.unwrap();

        let media_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let media = Arc::new(MediaStorage::new(&UploadConfig {
            path: media_dir.path().to_path_buf(),
            ..Default::default()
        }));

        Fixture {
            service: ArticleService::new(SqlxArticleRepository::boxed(pool.clone()), blog_repo, media),
            pool,
            media_dir,
            owner_id,
            sport,
            science,
        }
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: b"png-bytes".to_vec(),
        }
    }

    fn new_article(fx: &Fixture, title: &str, blog_ids: Vec<i64>) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            text: "Текст".to_string(),
            blog_ids,
            owner_id: fx.owner_id,
            image: image("photo.png"),
        }
    }

    #[tokio::test]
    async fn test_create_stores_image_and_links_blogs() {
        let fx = setup().await;

        let article = fx
            .service
            .create(new_article(&fx, "Матч", vec![fx.sport.id, fx.science.id]))
            .await
            .expect("Failed to create article");

        assert!(article
            .image
            .starts_with(&format!("articles/user_{}/", fx.owner_id)));
        assert!(fx.media_dir.path().join(&article.image).exists());

        let loaded = fx.service.get(article.id).await.unwrap().unwrap();
        let blog_names: Vec<&str> = loaded.blogs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(blog_names, vec!["Наука", "Спорт"]);
        assert_eq!(loaded.owner.first_name, "Ольга");
    }

    #[tokio::test]
    async fn test_create_requires_blog_and_content() {
        let fx = setup().await;

        let no_blog = fx.service.create(new_article(&fx, "t", vec![])).await;
        assert!(matches!(no_blog, Err(ArticleServiceError::ValidationError(_))));

        let mut blank = new_article(&fx, "t", vec![fx.sport.id]);
        blank.text = "   ".to_string();
        assert!(matches!(
            fx.service.create(blank).await,
            Err(ArticleServiceError::ValidationError(_))
        ));

        let long_title = "з".repeat(TITLE_MAX_LENGTH + 1);
        assert!(matches!(
            fx.service.create(new_article(&fx, &long_title, vec![fx.sport.id])).await,
            Err(ArticleServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_image() {
        let fx = setup().await;

        let result = fx.service.create(new_article(&fx, "t", vec![999])).await;
        assert!(matches!(result, Err(ArticleServiceError::InternalError(_))));

        let user_dir = fx.media_dir.path().join(format!("articles/user_{}", fx.owner_id));
        let leftovers = std::fs::read_dir(&user_dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_latest_prefetches_blogs() {
        let fx = setup().await;
        for i in 0..6 {
            fx.service
                .create(new_article(&fx, &format!("n{}", i), vec![fx.sport.id]))
                .await
                .unwrap();
        }

        let latest = fx.service.latest(HOME_PAGE_ARTICLES).await.unwrap();

        assert_eq!(latest.len(), 5);
        assert!(latest.iter().all(|a| a.blogs == vec![fx.sport.clone()]));
    }

    #[tokio::test]
    async fn test_list_by_blog() {
        let fx = setup().await;
        fx.service
            .create(new_article(&fx, "sport", vec![fx.sport.id]))
            .await
            .unwrap();
        fx.service
            .create(new_article(&fx, "science", vec![fx.science.id]))
            .await
            .unwrap();

        let in_sport = fx.service.list_by_blog(fx.sport.id).await.unwrap();

        assert_eq!(in_sport.len(), 1);
        assert_eq!(in_sport[0].article.title, "sport");
    }

    #[tokio::test]
    async fn test_update_keeps_published_date() {
        let fx = setup().await;
        let article = fx
            .service
            .create(new_article(&fx, "old", vec![fx.sport.id]))
            .await
            .unwrap();
        sqlx::query("UPDATE articles SET published_date = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(3))
            .bind(article.id)
            .execute(fx.pool.as_sqlite().unwrap())
            .await
            .unwrap();
        let before = fx.service.get(article.id).await.unwrap().unwrap();

        fx.service
            .update(
                &before.article,
                ArticleChanges {
                    title: "new".to_string(),
                    text: "Обновлено".to_string(),
                    image: Some(image("second.png")),
                },
            )
            .await
            .expect("Failed to update article");

        let after = fx.service.get(article.id).await.unwrap().unwrap();
        assert_eq!(after.article.title, "new");
        assert_eq!(after.article.published_date, before.article.published_date);
        assert_eq!(after.article.owner_id, before.article.owner_id);
        assert_ne!(after.article.image, before.article.image);
        assert!(after.article.image.ends_with("_second.png"));
        assert_eq!(after.blogs, before.blogs);
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_it() {
        let fx = setup().await;
        let article = fx
            .service
            .create(new_article(&fx, "old", vec![fx.sport.id]))
            .await
            .unwrap();

        fx.service
            .update(
                &article,
                ArticleChanges {
                    title: "new".to_string(),
                    text: "x".to_string(),
                    image: None,
                },
            )
            .await
            .unwrap();

        let after = fx.service.get(article.id).await.unwrap().unwrap();
        assert_eq!(after.article.image, article.image);
    }

    #[tokio::test]
    async fn test_update_missing_article() {
        let fx = setup().await;
        let mut ghost = fx
            .service
            .create(new_article(&fx, "ghost", vec![fx.sport.id]))
            .await
            .unwrap();
        ghost.id += 100;

        let result = fx
            .service
            .update(
                &ghost,
                ArticleChanges {
                    title: "t".to_string(),
                    text: "x".to_string(),
                    image: None,
                },
            )
            .await;

        assert!(matches!(result, Err(ArticleServiceError::NotFound(id)) if id == ghost.id));
    }

    fn stored_images(fx: &Fixture) -> usize {
        let user_dir = fx.media_dir.path().join(format!("articles/user_{}", fx.owner_id));
        std::fs::read_dir(&user_dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_failed_update_removes_new_image() {
        let fx = setup().await;
        let article = fx
            .service
            .create(new_article(&fx, "old", vec![fx.sport.id]))
            .await
            .unwrap();
        assert_eq!(stored_images(&fx), 1);

        let mut ghost = article.clone();
        ghost.id += 100;
        let result = fx
            .service
            .update(
                &ghost,
                ArticleChanges {
                    title: "t".to_string(),
                    text: "x".to_string(),
                    image: Some(image("new.png")),
                },
            )
            .await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
        assert_eq!(stored_images(&fx), 1);

        sqlx::query("DROP TABLE article_blogs")
            .execute(fx.pool.as_sqlite().unwrap())
            .await
            .unwrap();
        sqlx::query("DROP TABLE articles")
            .execute(fx.pool.as_sqlite().unwrap())
            .await
            .unwrap();

        let result = fx
            .service
            .update(
                &article,
                ArticleChanges {
                    title: "t".to_string(),
                    text: "x".to_string(),
                    image: Some(image("new.png")),
                },
            )
            .await;
        assert!(matches!(result, Err(ArticleServiceError::InternalError(_))));
        assert_eq!(stored_images(&fx), 1);
        assert!(fx.media_dir.path().join(&article.image).exists());
    }
}
