use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::{TokenType, SESSION_COOKIE},
    domain::Account,
    error::{AppError, Result},
};

#[derive(Clone)]
pub struct CurrentUser {
    pub account: Account,
}

/// Console session the request was authenticated with.
#[derive(Clone)]
pub struct SessionInfo {
    pub session_id: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn account_from_bearer(state: &AppState, headers: &HeaderMap) -> Result<Account> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;

    let claims = state.service_context.token_issuer
        .verify(token, TokenType::Access)?;

    state.service_context.account_repo
        .find_by_id(claims.account_id()?)
        .await?
        .filter(|account| account.is_active)
        .ok_or(AppError::Unauthorized)
}

/// API guard: valid access token for an existing, active account.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let account = account_from_bearer(&state, request.headers()).await?;

    request.extensions_mut().insert(CurrentUser { account });

    Ok(next.run(request).await)
}

/// API guard: authenticated and staff (admin or super admin).
pub async fn require_staff(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let account = account_from_bearer(&state, request.headers()).await?;

    if !account.is_staff() {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(CurrentUser { account });

    Ok(next.run(request).await)
}

/// Resolves the console session cookie to an account holding at least the
/// configured console role.
pub async fn console_account(state: &AppState, jar: &CookieJar) -> Option<(Account, String)> {
    let cookie = jar.get(SESSION_COOKIE)?;

    let session = state.service_context.auth_service
        .validate_session(cookie.value())
        .await
        .ok()
        .flatten()?;

    let account = state.service_context.account_repo
        .find_by_id(session.account_id)
        .await
        .ok()
        .flatten()?;

    if !account.is_active || account.role < state.settings.console.minimum_role {
        return None;
    }

    Some((account, session.id))
}

/// Console guard. Anything short of a valid session with enough privilege is
/// sent back to the login page.
pub async fn require_console_access(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some((account, session_id)) = console_account(&state, &jar).await else {
        return Redirect::to("/").into_response();
    };

    request.extensions_mut().insert(CurrentUser { account });
    request.extensions_mut().insert(SessionInfo { session_id });

    next.run(request).await
}
