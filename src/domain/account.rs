use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_superuser(&self) -> bool {
        self.role.is_superuser()
    }
}

/// Privilege tier of an account. Variants are ordered from least to most
/// privileged so guards can compare against a minimum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Regular,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Admin console and admin-only API access.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn is_superuser(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Regular => "User",
            Role::Admin => "Admin",
            Role::SuperAdmin => "Super Admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Regular
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: Uuid,
    pub must_change_password: bool,
}

/// Password supplied when an account is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordInput {
    /// Typed by a person; always hashed, whatever it looks like.
    Plain(String),
    /// An argon2 PHC string produced elsewhere, stored as is.
    Hashed(String),
}

impl PasswordInput {
    pub fn plain(password: impl Into<String>) -> Self {
        PasswordInput::Plain(password.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PasswordInput::Plain(p) | PasswordInput::Hashed(p) => p.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    pub password: PasswordInput,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountCounts {
    pub total: i64,
    pub staff: i64,
    pub regular: i64,
}

/// Reasons the console refuses to delete an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionDenied {
    Superuser,
    AdminRequiresSuperuser,
}

impl DeletionDenied {
    pub fn message(self) -> &'static str {
        match self {
            DeletionDenied::Superuser => "You cannot delete a superuser!",
            DeletionDenied::AdminRequiresSuperuser => "Only a superuser can delete other admins!",
        }
    }
}

/// Tiered deletion rule: superusers are never deletable, admins only by a
/// superuser, regular accounts by anyone with console access.
pub fn check_deletion(requester: Role, target: Role) -> Result<(), DeletionDenied> {
    if target.is_superuser() {
        return Err(DeletionDenied::Superuser);
    }

    if target.is_staff() && !requester.is_superuser() {
        return Err(DeletionDenied::AdminRequiresSuperuser);
    }

    Ok(())
}
