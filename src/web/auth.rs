//! Registration, login and logout
//!
//! - GET|POST /register/
//! - GET|POST /login/
//! - GET|POST /logout/

use axum::{
    extract::{FromRequest, Request, State},
    response::Response,
};
use tera::Context as TeraContext;

use crate::forms::{FormData, FormView, UserLoginForm, UserRegistrationForm};
use crate::models::User;
use crate::services::UserServiceError;
use crate::web::error::{ALREADY_LOGGED_IN, NOT_LOGGED_IN};
use crate::web::middleware::{clear_session_cookie, session_cookie};
use crate::web::responses::{redirect_with_cookie, render};
use crate::web::{AppState, CurrentUser, PageError};

fn require_anonymous(current: &CurrentUser) -> Result<(), PageError> {
    if current.is_authenticated() {
        return Err(PageError::Forbidden(ALREADY_LOGGED_IN));
    }
    Ok(())
}

fn render_user_form(
    state: &AppState,
    current: &CurrentUser,
    template: &str,
    form: FormView,
) -> Result<Response, PageError> {
    let mut context = TeraContext::new();
    context.insert("user_form", &form);
    render(state, current, template, &context)
}

/// Start a session for `user` and send them home with the cookie set
async fn login_and_redirect(state: &AppState, user: &User) -> Result<Response, PageError> {
    let session = state.user_service.login(user).await?;
    let cookie = session_cookie(&state.config.session, &session.id)?;
    redirect_with_cookie("/", Some(cookie))
}

pub async fn register_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, PageError> {
    require_anonymous(&current)?;
    render_user_form(&state, &current, "register.html", UserRegistrationForm::new().view())
}

pub async fn register_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    request: Request,
) -> Result<Response, PageError> {
    require_anonymous(&current)?;
    let data = FormData::from_request(request, &state).await?;

    let mut form = UserRegistrationForm::from_data(&data);
    if let Some(input) = form.clean() {
        match state.user_service.register(input).await {
            Ok(user) => return login_and_redirect(&state, &user).await,
            Err(UserServiceError::UserExists(_)) => form.username_taken(),
            Err(e) => return Err(e.into()),
        }
    }

    render_user_form(&state, &current, "register.html", form.view())
}

pub async fn login_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, PageError> {
    require_anonymous(&current)?;
    render_user_form(&state, &current, "login.html", UserLoginForm::new().view())
}

pub async fn login_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    request: Request,
) -> Result<Response, PageError> {
    require_anonymous(&current)?;
    let data = FormData::from_request(request, &state).await?;

    let mut form = UserLoginForm::from_data(&data);
    if let Some((username, password)) = form.clean() {
        match state.user_service.authenticate(&username, &password).await {
            Ok(user) => return login_and_redirect(&state, &user).await,
            Err(UserServiceError::AuthenticationError) => form.invalid_credentials(),
            Err(e) => return Err(e.into()),
        }
    }

    render_user_form(&state, &current, "login.html", form.view())
}

pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, PageError> {
    if !current.is_authenticated() {
        return Err(PageError::Forbidden(NOT_LOGGED_IN));
    }

    if let Some(token) = &current.session_id {
        state.user_service.logout(token).await?;
    }

    let cookie = clear_session_cookie(&state.config.session)?;
    redirect_with_cookie("/", Some(cookie))
}
