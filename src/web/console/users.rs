use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{CurrentUser, SessionInfo},
        state::AppState,
    },
    domain::{CreateAccountRequest, PasswordInput, Role},
    error::AppError,
    web::{
        flash::{self, Flash},
        templates::{AccountRow, HtmlTemplate, UserInfo},
    },
};

use super::{csrf_failure, csrf_valid, issue_csrf, not_found, server_error};

#[derive(Template)]
#[template(path = "console/users.html")]
pub struct UsersTemplate {
    pub current_user: Option<UserInfo>,
    pub flash: Option<Flash>,
    pub users: Vec<AccountRow>,
    pub total_users: i64,
    pub admin_users: i64,
    pub regular_users: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Template)]
#[template(path = "console/account_form.html")]
pub struct AccountFormTemplate {
    pub current_user: Option<UserInfo>,
    pub csrf_token: String,
    pub heading: String,
    pub action: String,
    /// The add-admin form has no role checkbox.
    pub admin_form: bool,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Template)]
#[template(path = "console/delete_user.html")]
pub struct DeleteUserTemplate {
    pub current_user: Option<UserInfo>,
    pub csrf_token: String,
    pub user: AccountRow,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Checkbox value, `Some("on")` when ticked.
    pub is_admin: Option<String>,
    pub csrf_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    pub csrf_token: String,
}

// GET /users/
pub async fn users_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<UsersQuery>,
    jar: CookieJar,
) -> Response {
    let user_info = UserInfo::from(&current_user.account);

    // Non-numeric page numbers fall back to the first page
    let requested = query.page
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1);

    let page = match state.service_context.account_service
        .page(requested, state.settings.console.page_size)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to list accounts: {}", e);
            return server_error(Some(user_info));
        }
    };

    let (jar, flash) = flash::take(jar);
    let viewer = current_user.account.role;

    (jar, HtmlTemplate(UsersTemplate {
        current_user: Some(user_info),
        flash,
        users: page.accounts.iter().map(|a| AccountRow::new(a, viewer)).collect(),
        total_users: page.counts.total,
        admin_users: page.counts.staff,
        regular_users: page.counts.regular,
        current_page: page.current_page,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
    })).into_response()
}

// GET /users/add/
pub async fn add_user_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
) -> Response {
    render_form(&state, &current_user, &session_info, false, None, &AccountForm::default()).await
}

// POST /users/add/
pub async fn add_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    jar: CookieJar,
    Form(form): Form<AccountForm>,
) -> Response {
    let role = if form.is_admin.as_deref().is_some_and(checkbox_ticked) {
        Role::Admin
    } else {
        Role::Regular
    };

    create_from_form(state, current_user, session_info, jar, form, role, false).await
}

// GET /add-admin/
pub async fn add_admin_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
) -> Response {
    render_form(&state, &current_user, &session_info, true, None, &AccountForm::default()).await
}

// POST /add-admin/
pub async fn add_admin(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    jar: CookieJar,
    Form(form): Form<AccountForm>,
) -> Response {
    create_from_form(state, current_user, session_info, jar, form, Role::Admin, true).await
}

async fn create_from_form(
    state: AppState,
    current_user: CurrentUser,
    session_info: SessionInfo,
    jar: CookieJar,
    form: AccountForm,
    role: Role,
    admin_form: bool,
) -> Response {
    if !csrf_valid(&state, &session_info, &form.csrf_token).await {
        return csrf_failure(Some(UserInfo::from(&current_user.account)));
    }

    let request = CreateAccountRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        password: PasswordInput::Plain(form.password.clone()),
        role,
    };

    match state.service_context.account_service.create_account(request).await {
        Ok(account) => {
            tracing::info!(
                "{} created {} account {}",
                current_user.account.username,
                account.role.label(),
                account.username
            );

            if admin_form {
                let message = format!("Admin \"{}\" created successfully.", account.username);
                (flash::set(jar, Flash::success(message)), Redirect::to("/dashboard/")).into_response()
            } else {
                let message = format!("User '{}' created successfully!", account.username);
                (flash::set(jar, Flash::success(message)), Redirect::to("/users/")).into_response()
            }
        }
        Err(AppError::Validation(message)) | Err(AppError::Conflict(message)) => {
            render_form(&state, &current_user, &session_info, admin_form, Some(message), &form).await
        }
        Err(e) => {
            tracing::error!("Failed to create account {}: {}", form.username, e);
            render_form(
                &state,
                &current_user,
                &session_info,
                admin_form,
                Some("Could not create the account.".to_string()),
                &form,
            ).await
        }
    }
}

async fn render_form(
    state: &AppState,
    current_user: &CurrentUser,
    session_info: &SessionInfo,
    admin_form: bool,
    error: Option<String>,
    form: &AccountForm,
) -> Response {
    let (heading, action) = if admin_form {
        ("Add Admin", "/add-admin/")
    } else {
        ("Add User", "/users/add/")
    };

    HtmlTemplate(AccountFormTemplate {
        current_user: Some(UserInfo::from(&current_user.account)),
        csrf_token: issue_csrf(state, session_info).await,
        heading: heading.to_string(),
        action: action.to_string(),
        admin_form,
        error,
        username: form.username.clone(),
        email: form.email.clone(),
        is_admin: form.is_admin.as_deref().is_some_and(checkbox_ticked),
    }).into_response()
}

fn checkbox_ticked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1")
}

// GET /users/delete/:id/
pub async fn delete_user_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(user_id): Path<String>,
    jar: CookieJar,
) -> Response {
    let user_info = UserInfo::from(&current_user.account);

    let Ok(id) = Uuid::parse_str(&user_id) else {
        return not_found(Some(user_info));
    };

    match state.service_context.account_service
        .deletion_target(&current_user.account, id)
        .await
    {
        Ok(target) => HtmlTemplate(DeleteUserTemplate {
            current_user: Some(user_info),
            csrf_token: issue_csrf(&state, &session_info).await,
            user: AccountRow::new(&target, current_user.account.role),
        }).into_response(),
        Err(e) => deletion_error(e, jar, user_info),
    }
}

// POST /users/delete/:id/
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Extension(session_info): Extension<SessionInfo>,
    Path(user_id): Path<String>,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> Response {
    let user_info = UserInfo::from(&current_user.account);

    if !csrf_valid(&state, &session_info, &form.csrf_token).await {
        return csrf_failure(Some(user_info));
    }

    let Ok(id) = Uuid::parse_str(&user_id) else {
        return not_found(Some(user_info));
    };

    match state.service_context.account_service
        .delete_account(&current_user.account, id)
        .await
    {
        Ok(deleted) => {
            let message = format!("User '{}' deleted successfully!", deleted.username);
            (flash::set(jar, Flash::success(message)), Redirect::to("/users/")).into_response()
        }
        Err(e) => deletion_error(e, jar, user_info),
    }
}

fn deletion_error(error: AppError, jar: CookieJar, user_info: UserInfo) -> Response {
    match error {
        AppError::NotFound(_) => not_found(Some(user_info)),
        AppError::PermissionDenied(message) => {
            (flash::set(jar, Flash::error(message)), Redirect::to("/users/")).into_response()
        }
        e => {
            tracing::error!("Account deletion failed: {}", e);
            server_error(Some(user_info))
        }
    }
}
