use serde_json::json;
use shared::models::{
    Account, AccountRole, NotificationKind, PasswordChange, ProfileUpdate, Recipient,
    RegisterRequest, StaffMember, StaffStatus,
};

use super::password::{hash_password, verify_password};
use crate::core::config::AdminSeed;
use crate::domain::{Actor, DomainError, DomainResult, new_id};
use crate::notifications::notify;
use crate::security_log;
use crate::staff::recalculate_counts;
use crate::staff::service::release_assignments;
use crate::store::{Store, StoreTxn};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account with this email (case-insensitive), if any
pub(crate) fn find_by_email(txn: &StoreTxn, email: &str) -> DomainResult<Option<Account>> {
    let email = normalize_email(email);
    Ok(txn
        .list::<Account>()?
        .into_iter()
        .find(|a| a.email == email))
}

/// Insert a new account; email must be unused
pub(crate) fn create_account(
    txn: &mut StoreTxn,
    name: &str,
    email: &str,
    password: &str,
    role: AccountRole,
    invite_id: Option<String>,
) -> DomainResult<Account> {
    if find_by_email(txn, email)?.is_some() {
        return Err(DomainError::Conflict(format!(
            "An account with email {} already exists",
            normalize_email(email)
        )));
    }
    let password_hash = hash_password(password)
        .map_err(|e| DomainError::Internal(format!("Password hashing failed: {}", e)))?;

    let now = txn.now();
    let mut account = Account {
        id: new_id(),
        version: 0,
        name: name.trim().to_string(),
        email: normalize_email(email),
        phone: None,
        role,
        password_hash,
        is_active: true,
        invite_id,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };
    txn.insert(&mut account)?;
    Ok(account)
}

fn require_account(txn: &StoreTxn, id: &str) -> DomainResult<Account> {
    txn.get(id)?
        .ok_or_else(|| DomainError::not_found("Account", id))
}

fn check_password(password: &str, hash: &str) -> DomainResult<bool> {
    verify_password(password, hash)
        .map_err(|e| DomainError::Internal(format!("Password verification failed: {}", e)))
}

#[derive(Clone)]
pub struct AccountService {
    store: Store,
}

impl AccountService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Self-service registration always creates a customer
    pub fn register(&self, data: RegisterRequest) -> DomainResult<Account> {
        let account = self.store.write(|txn| {
            create_account(
                txn,
                &data.name,
                &data.email,
                &data.password,
                AccountRole::Customer,
                None,
            )
        })?;
        tracing::info!(account_id = %account.id, "Customer registered");
        Ok(account)
    }

    /// Check credentials. Unknown email and wrong password fail the same way.
    pub fn authenticate(&self, email: &str, password: &str) -> DomainResult<Account> {
        let email = normalize_email(email);
        let account = self
            .store
            .list::<Account>()?
            .into_iter()
            .find(|a| a.email == email)
            .ok_or(DomainError::InvalidCredentials)?;

        if !check_password(password, &account.password_hash)? {
            return Err(DomainError::InvalidCredentials);
        }
        if !account.is_active {
            return Err(DomainError::Forbidden("Account has been disabled".to_string()));
        }

        // hashing stays outside the write lock; only the timestamp is written
        self.store.write(|txn| {
            let mut account = require_account(txn, &account.id)?;
            account.last_login_at = Some(txn.now());
            txn.update(&mut account)?;
            Ok(account)
        })
    }

    /// All accounts, newest first
    pub fn list(&self) -> DomainResult<Vec<Account>> {
        let mut accounts = self.store.list::<Account>()?;
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    /// Edit own name / phone. Staff members keep the same display name.
    pub fn update_profile(&self, actor: &Actor, data: ProfileUpdate) -> DomainResult<Account> {
        let name = data.name.as_deref().map(str::trim);
        if name.is_some_and(str::is_empty) {
            return Err(DomainError::Validation("name must not be empty".to_string()));
        }

        self.store.write(|txn| {
            let mut account = require_account(txn, &actor.id)?;
            if let Some(name) = name {
                account.name = name.to_string();
            }
            if let Some(phone) = data.phone.as_deref() {
                let phone = phone.trim();
                account.phone = (!phone.is_empty()).then(|| phone.to_string());
            }
            account.updated_at = txn.now();
            txn.update(&mut account)?;

            if let Some(mut member) = txn.get::<StaffMember>(&account.id)?
                && member.name != account.name
            {
                member.name = account.name.clone();
                member.updated_at = account.updated_at;
                txn.update(&mut member)?;
            }

            tracing::info!(account_id = %account.id, "Profile updated");
            Ok(account)
        })
    }

    pub fn change_password(&self, actor: &Actor, data: PasswordChange) -> DomainResult<()> {
        if data.current_password == data.new_password {
            return Err(DomainError::Validation(
                "New password must differ from the current one".to_string(),
            ));
        }
        let account = self.get(&actor.id)?;
        if !check_password(&data.current_password, &account.password_hash)? {
            security_log!("WARN", "password_change_rejected", account_id = account.id.clone());
            return Err(DomainError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }
        let password_hash = hash_password(&data.new_password)
            .map_err(|e| DomainError::Internal(format!("Password hashing failed: {}", e)))?;

        self.store.write(|txn| {
            let mut account = require_account(txn, &actor.id)?;
            account.password_hash = password_hash;
            account.updated_at = txn.now();
            txn.update(&mut account)?;
            Ok::<(), DomainError>(())
        })?;
        security_log!("INFO", "password_changed", account_id = actor.id.clone());
        Ok(())
    }

    /// Admin activate / deactivate.
    ///
    /// Deactivating a staff member marks them UNAVAILABLE and returns their
    /// kitchen orders to the queue in the same transaction.
    pub fn set_active(&self, actor: &Actor, id: &str, active: bool) -> DomainResult<Account> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden(
                "Only admins can change account status".to_string(),
            ));
        }
        if actor.id == id && !active {
            return Err(DomainError::BusinessRule(
                "You cannot deactivate your own account".to_string(),
            ));
        }

        let account = self.store.write(|txn| {
            let mut account = require_account(txn, id)?;
            if account.is_active == active {
                return Ok::<Account, DomainError>(account);
            }
            let now = txn.now();
            account.is_active = active;
            account.updated_at = now;
            txn.update(&mut account)?;

            if !active
                && let Some(mut member) = txn.get::<StaffMember>(id)?
            {
                if member.status != StaffStatus::Unavailable {
                    member.status = StaffStatus::Unavailable;
                    member.updated_at = now;
                    txn.update(&mut member)?;
                }
                release_assignments(txn, id)?;
                recalculate_counts(txn)?;
            }

            let verb = if active { "activated" } else { "deactivated" };
            notify(
                txn,
                Recipient::Admin,
                NotificationKind::Info,
                format!("Account {verb}"),
                format!("{} ({}) was {verb}", account.name, account.email),
                json!({ "account_id": account.id, "is_active": active }),
            )?;
            Ok(account)
        })?;

        security_log!(
            "INFO",
            "account_status_changed",
            account_id = account.id.clone(),
            is_active = active,
            by = actor.id.clone()
        );
        Ok(account)
    }

    pub fn get(&self, id: &str) -> DomainResult<Account> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Account", id))
    }

    /// Create the admin account on first start; returns `None` when it exists
    pub fn seed_admin(&self, seed: &AdminSeed) -> DomainResult<Option<Account>> {
        self.store.write(|txn| {
            if find_by_email(txn, &seed.email)?.is_some() {
                return Ok(None);
            }
            let account = create_account(
                txn,
                &seed.name,
                &seed.email,
                &seed.password,
                AccountRole::Admin,
                None,
            )?;
            tracing::info!(email = %account.email, "Admin account created");
            Ok(Some(account))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBus;

    fn service() -> AccountService {
        AccountService::new(Store::open_in_memory(MessageBus::new()).unwrap())
    }

    fn admin() -> Actor {
        Actor {
            id: "admin-1".to_string(),
            name: "Administrator".to_string(),
            email: "admin@cafe.local".to_string(),
            role: AccountRole::Admin,
        }
    }

    fn register(service: &AccountService, email: &str) -> DomainResult<Account> {
        service.register(RegisterRequest {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: "latte123".to_string(),
        })
    }

    #[test]
    fn test_register_and_authenticate() {
        let service = service();
        let account = register(&service, "Ana@Example.com").unwrap();
        assert_eq!(account.email, "ana@example.com");
        assert_eq!(account.role, AccountRole::Customer);

        let logged_in = service.authenticate("ANA@example.com", "latte123").unwrap();
        assert_eq!(logged_in.id, account.id);
        assert!(logged_in.last_login_at.is_some());
        assert_eq!(service.get(&account.id).unwrap().last_login_at, logged_in.last_login_at);

        assert!(matches!(
            service.authenticate("ana@example.com", "wrong"),
            Err(DomainError::InvalidCredentials)
        ));
        assert!(matches!(
            service.authenticate("nobody@example.com", "latte123"),
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_email_is_unique_case_insensitive() {
        let service = service();
        register(&service, "ana@example.com").unwrap();
        assert!(matches!(
            register(&service, "ANA@example.com"),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn test_seed_admin_runs_once() {
        let service = service();
        let seed = AdminSeed {
            email: "admin@cafe.local".to_string(),
            password: "admin".to_string(),
            name: "Administrator".to_string(),
        };
        let admin = service.seed_admin(&seed).unwrap().unwrap();
        assert_eq!(admin.role, AccountRole::Admin);
        assert!(service.seed_admin(&seed).unwrap().is_none());
    }

    #[test]
    fn test_profile_and_password_change() {
        let service = service();
        let account = register(&service, "ana@example.com").unwrap();
        let me = Actor::from(&account);

        let updated = service
            .update_profile(
                &me,
                ProfileUpdate {
                    name: Some("  Ana B ".to_string()),
                    phone: Some("555-0100".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Ana B");
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.email, "ana@example.com");

        let wrong = PasswordChange {
            current_password: "nope".to_string(),
            new_password: "espresso42".to_string(),
        };
        assert!(matches!(
            service.change_password(&me, wrong),
            Err(DomainError::Validation(_))
        ));

        service
            .change_password(
                &me,
                PasswordChange {
                    current_password: "latte123".to_string(),
                    new_password: "espresso42".to_string(),
                },
            )
            .unwrap();
        assert!(service.authenticate("ana@example.com", "espresso42").is_ok());
        assert!(matches!(
            service.authenticate("ana@example.com", "latte123"),
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_deactivated_account_cannot_log_in() {
        let service = service();
        let account = register(&service, "ana@example.com").unwrap();

        assert!(matches!(
            service.set_active(&Actor::from(&account), &account.id, false),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            service.set_active(&admin(), "admin-1", false),
            Err(DomainError::BusinessRule(_))
        ));

        let disabled = service.set_active(&admin(), &account.id, false).unwrap();
        assert!(!disabled.is_active);
        assert!(matches!(
            service.authenticate("ana@example.com", "latte123"),
            Err(DomainError::Forbidden(_))
        ));

        service.set_active(&admin(), &account.id, true).unwrap();
        assert!(service.authenticate("ana@example.com", "latte123").is_ok());
    }

    #[test]
    fn test_deactivating_staff_takes_them_off_shift() {
        let service = service();
        let account = register(&service, "remy@cafe.local").unwrap();
        service
            .store
            .write(|txn| {
                let now = txn.now();
                let mut member = StaffMember {
                    id: account.id.clone(),
                    version: 0,
                    name: account.name.clone(),
                    email: account.email.clone(),
                    role: shared::models::StaffRole::Chef,
                    status: StaffStatus::Available,
                    assigned_orders_count: 0,
                    invite_id: None,
                    created_at: now,
                    updated_at: now,
                };
                txn.insert(&mut member)?;
                Ok::<_, DomainError>(())
            })
            .unwrap();

        service.set_active(&admin(), &account.id, false).unwrap();
        let member = service.store.require::<StaffMember>(&account.id).unwrap();
        assert_eq!(member.status, StaffStatus::Unavailable);
    }
}
