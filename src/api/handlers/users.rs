use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Account, CreateAccountRequest, PasswordInput, Role},
    error::{AppError, Result},
};

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub role: Role,
}

impl From<Account> for UserDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            is_staff: account.is_staff(),
            role: account.role,
            username: account.username,
            email: account.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordDto {
    pub current_password: String,
    pub new_password: String,
}

// GET /api/users/me/
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<UserDto> {
    Json(user.account.into())
}

// GET /api/users/list/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserDto>>> {
    let accounts = state.service_context.account_repo.list_all().await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

// POST /api/users/create/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(dto), _): WithRejection<Json<CreateUserDto>, AppError>,
) -> Result<(StatusCode, Json<UserDto>)> {
    dto.validate()?;

    let role = if dto.is_staff { Role::Admin } else { Role::Regular };

    let account = state.service_context.account_service
        .create_account(CreateAccountRequest {
            username: dto.username,
            email: dto.email,
            password: PasswordInput::Plain(dto.password),
            role,
        })
        .await?;

    tracing::info!("{} created account {} via API", user.account.username, account.username);

    Ok((StatusCode::CREATED, Json(account.into())))
}

// POST /api/users/change-password/
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(dto), _): WithRejection<Json<ChangePasswordDto>, AppError>,
) -> Result<Json<serde_json::Value>> {
    state.service_context.account_service
        .change_password(&user.account, &dto.current_password, &dto.new_password)
        .await?;

    Ok(Json(json!({
        "detail": "Password updated successfully."
    })))
}
