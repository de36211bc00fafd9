//! Account Model (登录账户)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::staff::StaffRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    Admin,
    Chef,
    Waiter,
    Customer,
}

impl AccountRole {
    /// Role name carried in JWT claims
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Chef => "chef",
            Self::Waiter => "waiter",
            Self::Customer => "customer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(Self::Admin),
            "chef" => Some(Self::Chef),
            "waiter" => Some(Self::Waiter),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    pub fn staff_role(self) -> Option<StaffRole> {
        match self {
            Self::Chef => Some(StaffRole::Chef),
            Self::Waiter => Some(StaffRole::Waiter),
            _ => None,
        }
    }
}

impl From<StaffRole> for AccountRole {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Chef => Self::Chef,
            StaffRole::Waiter => Self::Waiter,
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored account (includes password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub name: String,
    /// Lower-cased, unique
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: AccountRole,
    pub password_hash: String,
    /// Disabled accounts can neither log in nor use existing tokens
    pub is_active: bool,
    pub invite_id: Option<String>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account response (without password)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: AccountRole,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            role: account.role,
            is_active: account.is_active,
            last_login_at: account.last_login_at,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Self-service profile edit; email is the login identity and stays fixed
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordChange {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

/// Admin activate / deactivate
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountStatusUpdate {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountInfo,
}
