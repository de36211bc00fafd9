//! Staff Invite Model (员工邀请)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::staff::StaffRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

/// Stored invite. The capability token itself is never stored, only its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffInvite {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    /// SHA-256 hex digest of the raw token
    pub token_hash: String,
    pub role: StaffRole,
    pub invited_by: String,
    pub invited_by_name: String,
    pub email: Option<String>,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by_id: Option<String>,
    pub accepted_by_name: Option<String>,
}

impl StaffInvite {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Create invite payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteCreate {
    pub role: StaffRole,
    #[validate(email)]
    pub email: Option<String>,
}

/// Returned once, at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteCreated {
    pub invite: StaffInvite,
    pub token: String,
    pub link: String,
}

/// Token validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite: Option<StaffInvite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Accept invite payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteAccept {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteStats {
    pub total: u32,
    pub pending: u32,
    pub accepted: u32,
    pub expired: u32,
    pub revoked: u32,
}
