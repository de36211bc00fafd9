//! Staff invites
//!
//! An invite is a one-time capability: a random token handed out once,
//! inside the invite link. Only its SHA-256 digest is stored. Redeeming it
//! creates the staff account and the staff member in one transaction.

use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde_json::json;
use sha2::{Digest, Sha256};
use shared::models::{
    AccountRole, InviteAccept, InviteCreate, InviteCreated, InviteStats, InviteStatus,
    InviteValidation, NotificationKind, Recipient, StaffInvite, StaffMember, StaffStatus,
};

use crate::accounts::service::{create_account, normalize_email};
use crate::core::config::InviteSettings;
use crate::domain::{Actor, DomainError, DomainResult, new_id};
use crate::notifications::notify;
use crate::security_log;
use crate::store::{Store, StoreTxn};

/// Random bytes in a token
const TOKEN_BYTES: usize = 32;

/// Generate a random hex token
pub fn generate_token() -> DomainResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes)
        .map_err(|_| DomainError::Internal("Failed to generate invite token".to_string()))?;
    Ok(hex::encode(bytes))
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Why an invite cannot be redeemed, `None` when it can
fn rejection_reason(invite: &StaffInvite, now: DateTime<Utc>) -> Option<&'static str> {
    match invite.status {
        InviteStatus::Accepted => Some("This invite has already been used"),
        InviteStatus::Revoked => Some("This invite has been revoked"),
        InviteStatus::Expired => Some("This invite has expired"),
        InviteStatus::Pending if invite.is_expired_at(now) => Some("This invite has expired"),
        InviteStatus::Pending => None,
    }
}

fn find_by_token(txn: &StoreTxn, token: &str) -> DomainResult<Option<StaffInvite>> {
    let hash = hash_token(token.trim());
    Ok(txn
        .list::<StaffInvite>()?
        .into_iter()
        .find(|i| i.token_hash == hash))
}

#[derive(Clone)]
pub struct InviteService {
    store: Store,
    settings: InviteSettings,
}

impl InviteService {
    pub fn new(store: Store, settings: InviteSettings) -> Self {
        Self { store, settings }
    }

    fn link(&self, token: &str, role: &str) -> String {
        format!("{}?token={}&role={}", self.settings.link_base, token, role)
    }

    pub fn create(&self, actor: &Actor, data: InviteCreate) -> DomainResult<InviteCreated> {
        let token = generate_token()?;
        let invite = self.store.write(|txn| {
            let now = txn.now();
            let mut invite = StaffInvite {
                id: new_id(),
                version: 0,
                token_hash: hash_token(&token),
                role: data.role,
                invited_by: actor.id.clone(),
                invited_by_name: actor.name.clone(),
                email: data.email.as_deref().map(normalize_email),
                status: InviteStatus::Pending,
                created_at: now,
                expires_at: now + Duration::hours(self.settings.ttl_hours),
                accepted_at: None,
                accepted_by_id: None,
                accepted_by_name: None,
            };
            txn.insert(&mut invite)?;
            Ok::<_, DomainError>(invite)
        })?;

        tracing::info!(
            invite_id = %invite.id,
            role = %invite.role,
            invited_by = %actor.id,
            "Staff invite created"
        );
        let link = self.link(&token, invite.role.as_str());
        Ok(InviteCreated {
            invite,
            token,
            link,
        })
    }

    /// Check a token. A PENDING invite found past its expiry is marked EXPIRED.
    pub fn validate(&self, token: &str) -> DomainResult<InviteValidation> {
        self.store.write(|txn| {
            let Some(mut invite) = find_by_token(txn, token)? else {
                security_log!("WARN", "invite_unknown_token", token_len = token.len());
                return Ok(InviteValidation {
                    valid: false,
                    invite: None,
                    error: Some("Invalid invite link".to_string()),
                });
            };

            let now = txn.now();
            if let Some(reason) = rejection_reason(&invite, now) {
                if invite.status == InviteStatus::Pending {
                    invite.status = InviteStatus::Expired;
                    txn.update(&mut invite)?;
                }
                return Ok(InviteValidation {
                    valid: false,
                    invite: Some(invite),
                    error: Some(reason.to_string()),
                });
            }

            Ok(InviteValidation {
                valid: true,
                invite: Some(invite),
                error: None,
            })
        })
    }

    /// Redeem an invite: creates the account and the staff member
    pub fn accept(&self, data: InviteAccept) -> DomainResult<StaffMember> {
        // persists EXPIRED before the redeem transaction looks at it
        let validation = self.validate(&data.token)?;
        if !validation.valid {
            security_log!(
                "WARN",
                "invite_rejected",
                reason = validation.error.clone().unwrap_or_default()
            );
            return Err(DomainError::InviteInvalid(
                validation
                    .error
                    .unwrap_or_else(|| "Invalid invite link".to_string()),
            ));
        }

        self.store.write(|txn| {
            let mut invite = find_by_token(txn, &data.token)?
                .ok_or_else(|| DomainError::InviteInvalid("Invalid invite link".to_string()))?;
            let now = txn.now();
            if let Some(reason) = rejection_reason(&invite, now) {
                return Err(DomainError::InviteInvalid(reason.to_string()));
            }
            if let Some(expected) = &invite.email
                && *expected != normalize_email(&data.email)
            {
                return Err(DomainError::InviteInvalid(
                    "This invite was issued for a different email address".to_string(),
                ));
            }

            let account = create_account(
                txn,
                &data.name,
                &data.email,
                &data.password,
                AccountRole::from(invite.role),
                Some(invite.id.clone()),
            )?;

            let mut member = StaffMember {
                id: account.id.clone(),
                version: 0,
                name: account.name.clone(),
                email: account.email.clone(),
                role: invite.role,
                status: StaffStatus::Available,
                assigned_orders_count: 0,
                invite_id: Some(invite.id.clone()),
                created_at: now,
                updated_at: now,
            };
            txn.insert(&mut member)?;

            invite.status = InviteStatus::Accepted;
            invite.accepted_at = Some(now);
            invite.accepted_by_id = Some(account.id.clone());
            invite.accepted_by_name = Some(account.name.clone());
            txn.update(&mut invite)?;

            notify(
                txn,
                Recipient::Admin,
                NotificationKind::Info,
                "New staff member joined",
                format!("{} joined as {}", member.name, member.role),
                json!({ "staff_id": member.id, "invite_id": invite.id }),
            )?;

            tracing::info!(
                staff_id = %member.id,
                invite_id = %invite.id,
                role = %member.role,
                "Invite accepted"
            );
            Ok(member)
        })
    }

    pub fn revoke(&self, id: &str) -> DomainResult<StaffInvite> {
        self.store.write(|txn| {
            let mut invite: StaffInvite = txn
                .get(id)?
                .ok_or_else(|| DomainError::not_found("Invite", id))?;
            if invite.status != InviteStatus::Pending {
                return Err(DomainError::BusinessRule(format!(
                    "Only pending invites can be revoked, this one is {:?}",
                    invite.status
                )));
            }
            invite.status = InviteStatus::Revoked;
            txn.update(&mut invite)?;
            tracing::info!(invite_id = %id, "Invite revoked");
            Ok(invite)
        })
    }

    pub fn delete(&self, id: &str) -> DomainResult<StaffInvite> {
        self.store.write(|txn| {
            txn.get::<StaffInvite>(id)?
                .ok_or_else(|| DomainError::not_found("Invite", id))?;
            Ok(txn.delete::<StaffInvite>(id)?)
        })
    }

    /// Newest first
    pub fn list(&self) -> DomainResult<Vec<StaffInvite>> {
        let mut invites = self.store.list::<StaffInvite>()?;
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    pub fn stats(&self) -> DomainResult<InviteStats> {
        let now = Utc::now();
        let mut stats = InviteStats::default();
        for invite in self.store.list::<StaffInvite>()? {
            stats.total += 1;
            match invite.status {
                InviteStatus::Pending if invite.is_expired_at(now) => stats.expired += 1,
                InviteStatus::Pending => stats.pending += 1,
                InviteStatus::Accepted => stats.accepted += 1,
                InviteStatus::Expired => stats.expired += 1,
                InviteStatus::Revoked => stats.revoked += 1,
            }
        }
        Ok(stats)
    }

    /// Mark every PENDING invite past its expiry as EXPIRED; returns how many
    pub fn cleanup_expired(&self) -> DomainResult<u32> {
        self.store.write(|txn| {
            let now = txn.now();
            let mut expired = 0;
            for mut invite in txn.list::<StaffInvite>()? {
                if invite.status == InviteStatus::Pending && invite.is_expired_at(now) {
                    invite.status = InviteStatus::Expired;
                    txn.update(&mut invite)?;
                    expired += 1;
                }
            }
            Ok(expired)
        })
    }
}
