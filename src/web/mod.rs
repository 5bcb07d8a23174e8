//! Web layer - HTML handlers and routing
//!
//! Every page is rendered on the server. Handlers share an [`AppState`] and
//! see the visitor as a [`CurrentUser`] resolved by the session middleware.

pub mod articles;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod responses;


use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::db::repositories::{
    SqlxArticleRepository, SqlxBlogRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{ArticleService, BlogService, MediaStorage, UserService};
use crate::templates::TemplateEngine;

pub use error::PageError;
pub use middleware::CurrentUser;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub blog_service: Arc<BlogService>,
    pub article_service: Arc<ArticleService>,
    pub media: Arc<MediaStorage>,
    pub templates: Arc<TemplateEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn new(pool: DynDatabasePool, config: Config) -> Result<Self> {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let blog_repo = SqlxBlogRepository::boxed(pool.clone());
        let article_repo = SqlxArticleRepository::boxed(pool.clone());

        let media = Arc::new(MediaStorage::new(&config.upload));
        let templates = Arc::new(TemplateEngine::new(config.templates.path.as_deref())?);

        Ok(Self {
            pool,
            user_service: Arc::new(UserService::with_session_expiration(
                user_repo,
                session_repo,
                config.session.expiration_days,
            )),
            blog_service: Arc::new(BlogService::new(blog_repo.clone())),
            article_service: Arc::new(ArticleService::new(article_repo, blog_repo, media.clone())),
            media,
            templates,
            config: Arc::new(config),
        })
    }
}

/// Build the site router
pub fn build_router(state: AppState) -> Router {
    let upload = &state.config.upload;
    let media_prefix = upload.url_prefix.trim_end_matches('/').to_string();
    let media_files = ServeDir::new(&upload.path);
    let body_limit = upload.max_request_size;

    Router::new()
        .route("/", get(pages::main_page))
        .route("/news/{id}", get(pages::article_page))
        .route("/blogs", get(pages::blogs_page))
        .route("/blogs/{id}", get(pages::blog_page))
        .route("/register/", get(auth::register_page).post(auth::register_submit))
        .route("/login/", get(auth::login_page).post(auth::login_submit))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route(
            "/edit_article/{id}",
            get(articles::edit_article_page).post(articles::edit_article_submit),
        )
        .route(
            "/create_article/",
            get(articles::create_article_page).post(articles::create_article_submit),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_session,
        ))
        .nest_service(&media_prefix, media_files)
        .fallback(error::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
