use serde_json::Value;
use shared::models::{Notification, NotificationKind, Recipient, UnreadCount};

use crate::domain::{Actor, DomainError, DomainResult, new_id};
use crate::store::{Store, StoreResult, StoreTxn};

/// Write one inbox entry in the caller's transaction
pub fn notify(
    txn: &mut StoreTxn,
    recipient: Recipient,
    kind: NotificationKind,
    title: impl Into<String>,
    message: impl Into<String>,
    data: Value,
) -> StoreResult<Notification> {
    let mut notification = Notification {
        id: new_id(),
        version: 0,
        recipient,
        kind,
        title: title.into(),
        message: message.into(),
        data,
        is_read: false,
        created_at: txn.now(),
    };
    txn.insert(&mut notification)?;
    tracing::debug!(
        notification_id = %notification.id,
        kind = ?notification.kind,
        "Notification queued"
    );
    Ok(notification)
}

fn visible_to(recipient: &Recipient, actor: &Actor) -> bool {
    match recipient {
        Recipient::User(id) => *id == actor.id,
        Recipient::Admin => actor.is_admin(),
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Inbox of the actor, newest first. Admins also see the shared admin inbox.
    pub fn list(&self, actor: &Actor) -> DomainResult<Vec<Notification>> {
        let mut inbox: Vec<Notification> = self
            .store
            .list::<Notification>()?
            .into_iter()
            .filter(|n| visible_to(&n.recipient, actor))
            .collect();
        inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(inbox)
    }

    pub fn unread_count(&self, actor: &Actor) -> DomainResult<UnreadCount> {
        let unread = self
            .store
            .list::<Notification>()?
            .iter()
            .filter(|n| !n.is_read && visible_to(&n.recipient, actor))
            .count();
        Ok(UnreadCount {
            unread: unread as u32,
        })
    }

    pub fn mark_read(&self, actor: &Actor, id: &str) -> DomainResult<Notification> {
        self.store.write(|txn| {
            let mut notification: Notification = txn
                .get(id)?
                .ok_or_else(|| DomainError::not_found("Notification", id))?;
            if !visible_to(&notification.recipient, actor) {
                return Err(DomainError::Forbidden(
                    "notification belongs to another inbox".to_string(),
                ));
            }
            if !notification.is_read {
                notification.is_read = true;
                txn.update(&mut notification)?;
            }
            Ok(notification)
        })
    }

    /// Returns how many were flipped
    pub fn mark_all_read(&self, actor: &Actor) -> DomainResult<u32> {
        self.store.write(|txn| {
            let mut count = 0;
            for mut notification in txn.list::<Notification>()? {
                if notification.is_read || !visible_to(&notification.recipient, actor) {
                    continue;
                }
                notification.is_read = true;
                txn.update(&mut notification)?;
                count += 1;
            }
            Ok(count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBus;
    use serde_json::json;
    use shared::models::AccountRole;

    fn actor(id: &str, role: AccountRole) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            role,
        }
    }

    fn seeded() -> NotificationService {
        let store = Store::open_in_memory(MessageBus::new()).unwrap();
        store
            .write(|txn| {
                notify(
                    txn,
                    Recipient::User("cust-1".to_string()),
                    NotificationKind::BookingApproved,
                    "Approved",
                    "Your table is reserved",
                    json!({ "booking_id": "b-1" }),
                )?;
                notify(
                    txn,
                    Recipient::User("cust-2".to_string()),
                    NotificationKind::Info,
                    "Hello",
                    "Welcome",
                    Value::Null,
                )?;
                notify(
                    txn,
                    Recipient::Admin,
                    NotificationKind::StatusUpdate,
                    "Status",
                    "Booking b-1 changed",
                    Value::Null,
                )
            })
            .unwrap();
        NotificationService::new(store)
    }

    #[test]
    fn test_inbox_visibility() {
        let service = seeded();
        let customer = actor("cust-1", AccountRole::Customer);
        let admin = actor("admin-1", AccountRole::Admin);

        let inbox = service.list(&customer).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::BookingApproved);

        let admin_inbox = service.list(&admin).unwrap();
        assert_eq!(admin_inbox.len(), 1);
        assert_eq!(admin_inbox[0].recipient, Recipient::Admin);
    }

    #[test]
    fn test_mark_read_and_counts() {
        let service = seeded();
        let customer = actor("cust-1", AccountRole::Customer);
        let other = actor("cust-2", AccountRole::Customer);

        assert_eq!(service.unread_count(&customer).unwrap().unread, 1);
        let id = service.list(&customer).unwrap()[0].id.clone();

        let result = service.mark_read(&other, &id);
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        let read = service.mark_read(&customer, &id).unwrap();
        assert!(read.is_read);
        assert_eq!(service.unread_count(&customer).unwrap().unread, 0);

        assert_eq!(service.mark_all_read(&other).unwrap(), 1);
        assert_eq!(service.mark_all_read(&other).unwrap(), 0);
    }
}
