//! Template-facing serialization and response helpers

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tera::Context as TeraContext;

use crate::models::{ArticleWithMeta, Blog};
use crate::services::MediaStorage;
use crate::templates::StandardTemplateVars;
use crate::web::{AppState, CurrentUser, PageError};

/// Format of `published_date` on every page
pub const DATE_FORMAT: &str = "%d.%m.%y %H:%M";

/// `[name, url]`
pub type BlogLink = (String, String);

pub fn blog_link(blog: &Blog) -> BlogLink {
    (blog.name.clone(), blog.url())
}

/// An article as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub url: String,
    pub edit_url: String,
    pub title: String,
    pub blog: Vec<BlogLink>,
    /// `[first_name, last_name]`
    pub owner: (String, String),
    pub owner_id: i64,
    pub image: String,
    pub text: String,
    pub published_date: String,
}

impl ArticleView {
    pub fn new(item: &ArticleWithMeta, media: &MediaStorage) -> Self {
        let article = &item.article;
        Self {
            url: article.url(),
            edit_url: article.edit_url(),
            title: article.title.clone(),
            blog: item.blogs.iter().map(blog_link).collect(),
            owner: (item.owner.first_name.clone(), item.owner.last_name.clone()),
            owner_id: article.owner_id,
            image: media.url(&article.image),
            text: article.text.clone(),
            published_date: article.published_date.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn list(items: &[ArticleWithMeta], media: &MediaStorage) -> Vec<Self> {
        items.iter().map(|item| Self::new(item, media)).collect()
    }
}

/// Render a page with the site name and visitor added to `context`
pub fn render(
    state: &AppState,
    current: &CurrentUser,
    template: &str,
    context: &TeraContext,
) -> Result<Response, PageError> {
    let vars = StandardTemplateVars::new(&state.config.site.name, current.user());
    let html = state.templates.render_page(template, context, &vars)?;
    Ok(Html(html).into_response())
}

/// 302 to `location`
pub fn redirect(location: &str) -> Result<Response, PageError> {
    redirect_with_cookie(location, None)
}

/// 302 to `location`, optionally setting a cookie on the way
pub fn redirect_with_cookie(
    location: &str,
    cookie: Option<HeaderValue>,
) -> Result<Response, PageError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| PageError::Internal(anyhow::anyhow!("Invalid redirect target: {}", e)))?;

    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    if let Some(cookie) = cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}
