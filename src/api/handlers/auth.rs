use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub refresh: String,
    pub must_change_password: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

// POST /api/login/
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<LoginResponse>> {
    let outcome = state.service_context.session_issuer
        .login(&req.identifier, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.tokens.access,
        refresh: outcome.tokens.refresh,
        must_change_password: outcome.must_change_password,
    }))
}

// POST /api/token/refresh/
pub async fn refresh(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RefreshRequest>, AppError>,
) -> Result<Json<RefreshResponse>> {
    let access = state.service_context.session_issuer
        .refresh(&req.refresh)
        .await?;

    Ok(Json(RefreshResponse { access }))
}
