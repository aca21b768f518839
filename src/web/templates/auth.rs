use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    api::{middleware::auth::console_account, state::AppState},
    auth::{self, AuthService, LOGIN_CSRF_COOKIE, SESSION_COOKIE},
    error::AppError,
    web::{
        flash::{self, Flash},
        templates::HtmlTemplate,
    },
};

pub const INVALID_LOGIN: &str = "Invalid credentials or not admin!";

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<super::UserInfo>,
    pub flash: Option<Flash>,
    pub error: Option<String>,
    pub identifier: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username or email.
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

// GET /
pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Response {
    if console_account(&state, &jar).await.is_some() {
        return Redirect::to("/dashboard/").into_response();
    }

    let (jar, flash) = flash::take(jar);

    // one token per browser, shared by open tabs
    let csrf_token = match jar.get(LOGIN_CSRF_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => auth::generate_token(),
    };
    let jar = jar.add(state.service_context.auth_service.create_login_csrf_cookie(&csrf_token));

    (jar, HtmlTemplate(LoginTemplate {
        current_user: None,
        flash,
        error: None,
        identifier: String::new(),
        csrf_token,
    })).into_response()
}

// POST /
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let cookie_token = jar.get(LOGIN_CSRF_COOKIE).map(|c| c.value().to_string());
    if !auth::login_csrf_matches(cookie_token.as_deref(), &form.csrf_token) {
        tracing::warn!("Console login rejected: CSRF token missing or mismatched");
        return crate::web::console::csrf_failure(None);
    }

    let minimum_role = state.settings.console.minimum_role;

    let account = match state.service_context.session_issuer
        .authenticate(&form.identifier, &form.password)
        .await
    {
        Ok(account) if account.role >= minimum_role => account,
        Ok(account) => {
            tracing::warn!("Console login refused for {} ({:?})", account.username, account.role);
            return invalid_login(form.identifier, form.csrf_token);
        }
        Err(AppError::InvalidCredentials) => return invalid_login(form.identifier, form.csrf_token),
        Err(e) => {
            tracing::error!("Console login failed: {}", e);
            return invalid_login(form.identifier, form.csrf_token);
        }
    };

    let auth_service = &state.service_context.auth_service;

    let token = match auth_service.create_session(account.id).await {
        Ok((_session, token)) => token,
        Err(e) => {
            tracing::error!("Failed to create console session: {}", e);
            return invalid_login(form.identifier, form.csrf_token);
        }
    };

    if let Err(e) = state.service_context.account_repo.record_login(account.id).await {
        tracing::warn!("Failed to record login for {}: {}", account.username, e);
    }

    tracing::info!("Console login for {}", account.username);

    let jar = jar
        .add(auth_service.create_session_cookie(&token))
        .add(AuthService::clear_login_csrf_cookie());

    (jar, Redirect::to("/dashboard/")).into_response()
}

fn invalid_login(identifier: String, csrf_token: String) -> Response {
    HtmlTemplate(LoginTemplate {
        current_user: None,
        flash: None,
        error: Some(INVALID_LOGIN.to_string()),
        identifier,
        csrf_token,
    }).into_response()
}

// GET|POST /logout/
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let auth_service = &state.service_context.auth_service;

        match auth_service.validate_session(session_cookie.value()).await {
            Ok(Some(session)) => {
                if let Err(e) = state.service_context.csrf_service.revoke(&session.id).await {
                    tracing::warn!("Failed to revoke CSRF token at logout: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to look up session at logout: {}", e),
        }

        if let Err(e) = auth_service.invalidate_session(session_cookie.value()).await {
            tracing::warn!("Failed to invalidate console session: {}", e);
        }
    }

    let jar = jar.add(AuthService::create_logout_cookie());

    (jar, Redirect::to("/"))
}
