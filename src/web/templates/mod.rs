pub mod auth;

use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    http::StatusCode,
};

use crate::domain::{check_deletion, Account, Role};

/// Signed-in console user shown in the page chrome.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role_label: String,
    pub is_superuser: bool,
}

impl From<&Account> for UserInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            role_label: account.role.label().to_string(),
            is_superuser: account.is_superuser(),
        }
    }
}

/// One account as listed in console tables.
#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role_label: String,
    pub is_staff: bool,
    pub joined_at: String,
    pub last_login: String,
    pub can_delete: bool,
}

impl AccountRow {
    pub fn new(account: &Account, viewer: Role) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            role_label: account.role.label().to_string(),
            is_staff: account.is_staff(),
            joined_at: account.created_at.format("%b %d, %Y").to_string(),
            last_login: account.last_login_at
                .map(|d| d.format("%b %d, %Y %H:%M").to_string())
                .unwrap_or_else(|| "Never".to_string()),
            can_delete: check_deletion(viewer, account.role).is_ok(),
        }
    }
}

// Make askama templates work with axum
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to render page",
                ).into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "console/message.html")]
pub struct MessageTemplate {
    pub current_user: Option<UserInfo>,
    pub title: String,
    pub message: String,
    pub back_link: String,
}

/// Plain status page (404, CSRF failure, unexpected errors).
pub fn message_page(
    status: StatusCode,
    current_user: Option<UserInfo>,
    title: &str,
    message: &str,
    back_link: &str,
) -> Response {
    (
        status,
        HtmlTemplate(MessageTemplate {
            current_user,
            title: title.to_string(),
            message: message.to_string(),
            back_link: back_link.to_string(),
        }),
    ).into_response()
}
