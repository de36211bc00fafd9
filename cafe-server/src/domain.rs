//! Domain errors shared by the lifecycle services

use shared::models::{Account, AccountRole};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The state machine has no edge for this event from the current state
    #[error("Cannot {event} {entity} in status {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        event: &'static str,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request is well-formed but not allowed in the current state
    #[error("{0}")]
    BusinessRule(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Invalid invite: {0}")]
    InviteInvalid(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        event: &'static str,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            event,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: AccountRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    /// Admins may act on anything; everyone else only on what they own
    pub fn ensure_owner(&self, owner_id: &str, what: &str) -> DomainResult<()> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!("{what} belongs to another account")))
        }
    }
}

impl From<&crate::auth::CurrentUser> for Actor {
    fn from(user: &crate::auth::CurrentUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<&Account> for Actor {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Last six characters, the way order numbers are shown to customers
pub fn short_id(id: &str) -> &str {
    let start = id.len().saturating_sub(6);
    id.get(start..).unwrap_or(id)
}
