//! Article editing and creation
//!
//! - GET|POST /edit_article/{id} - owner only
//! - GET|POST /create_article/ - superusers only
//!
//! Submit handlers check permissions before the body is read.

use axum::{
    extract::{FromRequest, Path, Request, State},
    response::Response,
};
use tera::Context as TeraContext;

use crate::forms::{ArticleCreationForm, ArticleEditForm, FormData};
use crate::models::{Article, User};
use crate::web::error::{
    parse_id, ARTICLE_DOES_NOT_EXIST, NOT_ADMIN, NOT_LOGGED_IN_TO_CREATE, NOT_LOGGED_IN_TO_EDIT,
    NOT_YOUR_ARTICLE,
};
use crate::web::responses::{redirect, render};
use crate::web::{AppState, CurrentUser, PageError};

/// The article behind `raw_id`, if the visitor may edit it.
///
/// Existence is checked before permissions, so a missing article is a 404
/// even for anonymous visitors.
async fn editable_article(
    state: &AppState,
    current: &CurrentUser,
    raw_id: &str,
) -> Result<Article, PageError> {
    let id = parse_id(raw_id)?;
    let article = state
        .article_service
        .get(id)
        .await?
        .ok_or(PageError::NotFound(ARTICLE_DOES_NOT_EXIST))?
        .article;

    let user = current
        .user()
        .ok_or(PageError::Forbidden(NOT_LOGGED_IN_TO_EDIT))?;
    if !user.owns(article.owner_id) {
        return Err(PageError::Forbidden(NOT_YOUR_ARTICLE));
    }

    Ok(article)
}

fn render_edit_form(
    state: &AppState,
    current: &CurrentUser,
    article: &Article,
    form: &ArticleEditForm,
) -> Result<Response, PageError> {
    let mut context = TeraContext::new();
    context.insert("edit_form", &form.view());
    context.insert("cancel_url", &article.url());
    render(state, current, "news/article_edit_form.html", &context)
}

pub async fn edit_article_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let article = editable_article(&state, &current, &id).await?;

    let form = ArticleEditForm::for_article(&article, state.media.url(&article.image));
    render_edit_form(&state, &current, &article, &form)
}

pub async fn edit_article_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, PageError> {
    let article = editable_article(&state, &current, &id).await?;
    let data = FormData::from_request(request, &state).await?;

    let mut form = ArticleEditForm::from_data(data, state.media.url(&article.image));
    if let Some(changes) = form.clean(&state.config.upload) {
        state.article_service.update(&article, changes).await?;
        return redirect(&article.url());
    }

    render_edit_form(&state, &current, &article, &form)
}

fn require_superuser(current: &CurrentUser) -> Result<&User, PageError> {
    let user = current
        .user()
        .ok_or(PageError::Forbidden(NOT_LOGGED_IN_TO_CREATE))?;
    if !user.is_superuser {
        return Err(PageError::Forbidden(NOT_ADMIN));
    }
    Ok(user)
}

fn render_creation_form(
    state: &AppState,
    current: &CurrentUser,
    form: &ArticleCreationForm,
) -> Result<Response, PageError> {
    let mut context = TeraContext::new();
    context.insert("creation_form", &form.view());
    context.insert("is_creating_article", &true);
    render(state, current, "news/article_creation_form.html", &context)
}

pub async fn create_article_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, PageError> {
    let user = require_superuser(&current)?;

    let blogs = state.blog_service.list().await?;
    let users = state.user_service.list_users().await?;
    let form = ArticleCreationForm::new(blogs, users, user.id);
    render_creation_form(&state, &current, &form)
}

pub async fn create_article_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    request: Request,
) -> Result<Response, PageError> {
    require_superuser(&current)?;
    let data = FormData::from_request(request, &state).await?;

    let blogs = state.blog_service.list().await?;
    let users = state.user_service.list_users().await?;
    let mut form = ArticleCreationForm::from_data(data, blogs, users);
    if let Some(new_article) = form.clean(&state.config.upload) {
        let article = state.article_service.create(new_article).await?;
        return redirect(&article.url());
    }

    render_creation_form(&state, &current, &form)
}
