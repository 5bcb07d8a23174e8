//! Public reading pages
//!
//! - GET / - latest articles
//! - GET /news/{id} - article detail
//! - GET /blogs - all blogs
//! - GET /blogs/{id} - one blog with its articles

use axum::{
    extract::{Path, State},
    response::Response,
};
use tera::Context as TeraContext;

use crate::services::HOME_PAGE_ARTICLES;
use crate::web::error::{parse_id, ARTICLE_NOT_FOUND, BLOG_DOES_NOT_EXIST};
use crate::web::responses::{blog_link, render, ArticleView, BlogLink};
use crate::web::{AppState, CurrentUser, PageError};

pub async fn main_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, PageError> {
    let articles = state.article_service.latest(HOME_PAGE_ARTICLES).await?;

    let mut context = TeraContext::new();
    context.insert("articles", &ArticleView::list(&articles, &state.media));
    render(&state, &current, "news/main_page.html", &context)
}

pub async fn article_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let article = state
        .article_service
        .get(id)
        .await?
        .ok_or(PageError::NotFound(ARTICLE_NOT_FOUND))?;

    let mut context = TeraContext::new();
    context.insert("article", &ArticleView::new(&article, &state.media));
    render(&state, &current, "news/article_page.html", &context)
}

pub async fn blogs_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, PageError> {
    let blogs: Vec<BlogLink> = state.blog_service.list().await?.iter().map(blog_link).collect();

    let mut context = TeraContext::new();
    context.insert("blogs", &blogs);
    render(&state, &current, "news/blogs.html", &context)
}

pub async fn blog_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let blog = state
        .blog_service
        .get(id)
        .await?
        .ok_or(PageError::NotFound(BLOG_DOES_NOT_EXIST))?;
    let articles = state.article_service.list_by_blog(blog.id).await?;

    let mut context = TeraContext::new();
    context.insert("blog", &blog_link(&blog));
    context.insert("articles", &ArticleView::list(&articles, &state.media));
    context.insert("in_blog_articles_list", &true);
    render(&state, &current, "news/blog.html", &context)
}
