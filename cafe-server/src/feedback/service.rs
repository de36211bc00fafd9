use std::collections::BTreeMap;

use serde_json::json;
use shared::models::{
    Booking, Feedback, FeedbackCreate, FeedbackStats, FeedbackStatus, NotificationKind, Order,
    Recipient,
};

use crate::domain::{Actor, DomainError, DomainResult, new_id};
use crate::notifications::notify;
use crate::store::{Store, StoreTxn};

fn require_feedback(txn: &StoreTxn, id: &str) -> DomainResult<Feedback> {
    txn.get(id)?
        .ok_or_else(|| DomainError::not_found("Feedback", id))
}

/// Average rounded to one decimal place
fn average(values: impl Iterator<Item = u8>) -> f64 {
    let (sum, count) = values.fold((0u32, 0u32), |(s, c), v| (s + u32::from(v), c + 1));
    if count == 0 {
        return 0.0;
    }
    (f64::from(sum) / f64::from(count) * 10.0).round() / 10.0
}

#[derive(Clone)]
pub struct FeedbackService {
    store: Store,
}

impl FeedbackService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Submitted feedback is published right away; one entry per order
    pub fn submit(&self, actor: &Actor, data: FeedbackCreate) -> DomainResult<Feedback> {
        if !(1..=5).contains(&data.overall_rating) {
            return Err(DomainError::Validation(format!(
                "overall rating must be between 1 and 5, got {}",
                data.overall_rating
            )));
        }

        self.store.write(|txn| {
            if let Some(order_id) = &data.order_id {
                let order: Order = txn
                    .get(order_id)?
                    .ok_or_else(|| DomainError::not_found("Order", order_id))?;
                actor.ensure_owner(&order.customer_id, "order")?;
                let exists = txn
                    .list::<Feedback>()?
                    .iter()
                    .any(|f| f.order_id.as_deref() == Some(order_id.as_str()));
                if exists {
                    return Err(DomainError::Conflict(
                        "Feedback for this order was already submitted".to_string(),
                    ));
                }
            }
            if let Some(booking_id) = &data.booking_id {
                let booking: Booking = txn
                    .get(booking_id)?
                    .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
                actor.ensure_owner(&booking.customer_id, "booking")?;
            }

            let now = txn.now();
            let mut feedback = Feedback {
                id: new_id(),
                version: 0,
                customer_id: actor.id.clone(),
                customer_name: actor.name.clone(),
                order_id: data.order_id,
                booking_id: data.booking_id,
                kind: data.kind,
                food_quality: data.food_quality,
                service_quality: data.service_quality,
                ambiance: data.ambiance,
                value_for_money: data.value_for_money,
                overall_rating: data.overall_rating,
                comment: data.comment.trim().to_string(),
                status: FeedbackStatus::Published,
                admin_response: None,
                responded_at: None,
                created_at: now,
                updated_at: now,
            };
            txn.insert(&mut feedback)?;

            notify(
                txn,
                Recipient::Admin,
                NotificationKind::FeedbackReceived,
                "New feedback",
                format!(
                    "{} rated their visit {}/5",
                    feedback.customer_name, feedback.overall_rating
                ),
                json!({ "feedback_id": feedback.id, "rating": feedback.overall_rating }),
            )?;
            tracing::info!(
                feedback_id = %feedback.id,
                rating = feedback.overall_rating,
                "Feedback submitted"
            );
            Ok(feedback)
        })
    }

    pub fn respond(&self, id: &str, response: &str) -> DomainResult<Feedback> {
        let response = response.trim();
        if response.is_empty() {
            return Err(DomainError::Validation("Response must not be empty".to_string()));
        }

        self.store.write(|txn| {
            let mut feedback = require_feedback(txn, id)?;
            let now = txn.now();
            feedback.admin_response = Some(response.to_string());
            feedback.responded_at = Some(now);
            feedback.updated_at = now;
            txn.update(&mut feedback)?;

            notify(
                txn,
                Recipient::User(feedback.customer_id.clone()),
                NotificationKind::FeedbackResponse,
                "We replied to your feedback",
                response,
                json!({ "feedback_id": feedback.id }),
            )?;
            Ok(feedback)
        })
    }

    pub fn set_status(&self, id: &str, status: FeedbackStatus) -> DomainResult<Feedback> {
        self.store.write(|txn| {
            let mut feedback = require_feedback(txn, id)?;
            if feedback.status != status {
                feedback.status = status;
                feedback.updated_at = txn.now();
                txn.update(&mut feedback)?;
            }
            Ok(feedback)
        })
    }

    pub fn delete(&self, id: &str) -> DomainResult<Feedback> {
        self.store.write(|txn| {
            require_feedback(txn, id)?;
            Ok(txn.delete::<Feedback>(id)?)
        })
    }

    /// Newest first. Customers only see their own entries.
    pub fn list(&self, actor: &Actor) -> DomainResult<Vec<Feedback>> {
        let mut feedback: Vec<Feedback> = self
            .store
            .list::<Feedback>()?
            .into_iter()
            .filter(|f| actor.is_admin() || f.customer_id == actor.id)
            .collect();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feedback)
    }

    /// Aggregates over PUBLISHED feedback
    pub fn stats(&self) -> DomainResult<FeedbackStats> {
        let published: Vec<Feedback> = self
            .store
            .list::<Feedback>()?
            .into_iter()
            .filter(|f| f.status == FeedbackStatus::Published)
            .collect();

        let mut rating_distribution: BTreeMap<u8, u32> = (1..=5).map(|r| (r, 0)).collect();
        let mut by_kind: BTreeMap<_, u32> = BTreeMap::new();
        for f in &published {
            *rating_distribution.entry(f.overall_rating).or_default() += 1;
            *by_kind.entry(f.kind).or_default() += 1;
        }

        let responded = published.iter().filter(|f| f.admin_response.is_some()).count() as u32;
        Ok(FeedbackStats {
            total: published.len() as u32,
            average_rating: average(published.iter().map(|f| f.overall_rating)),
            rating_distribution,
            by_kind,
            pending: published.len() as u32 - responded,
            responded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBus;
    use shared::models::{AccountRole, FeedbackKind};

    fn actor(id: &str, role: AccountRole) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            role,
        }
    }

    fn rating(overall: u8) -> FeedbackCreate {
        FeedbackCreate {
            order_id: None,
            booking_id: None,
            kind: FeedbackKind::Overall,
            food_quality: Some(5),
            service_quality: None,
            ambiance: None,
            value_for_money: None,
            overall_rating: overall,
            comment: "  Lovely flat white  ".to_string(),
        }
    }

    fn service() -> FeedbackService {
        FeedbackService::new(Store::open_in_memory(MessageBus::new()).unwrap())
    }

    #[test]
    fn test_submit_respond_and_stats() {
        let feedback = service();
        let ada = actor("ada", AccountRole::Customer);
        let first = feedback.submit(&ada, rating(5)).unwrap();
        assert_eq!(first.comment, "Lovely flat white");
        assert_eq!(first.status, FeedbackStatus::Published);
        feedback.submit(&ada, rating(4)).unwrap();
        let hidden = feedback.submit(&ada, rating(1)).unwrap();
        feedback.set_status(&hidden.id, FeedbackStatus::Hidden).unwrap();

        feedback.respond(&first.id, "Thank you!").unwrap();

        let stats = feedback.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.rating_distribution[&5], 1);
        assert_eq!(stats.rating_distribution[&1], 0);
        assert_eq!(stats.by_kind[&FeedbackKind::Overall], 2);
        assert_eq!(stats.responded, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_customers_only_list_their_own() {
        let feedback = service();
        feedback
            .submit(&actor("ada", AccountRole::Customer), rating(5))
            .unwrap();
        feedback
            .submit(&actor("bob", AccountRole::Customer), rating(3))
            .unwrap();

        assert_eq!(
            feedback
                .list(&actor("ada", AccountRole::Customer))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            feedback.list(&actor("root", AccountRole::Admin)).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_rejects_bad_rating_and_unknown_order() {
        let feedback = service();
        let ada = actor("ada", AccountRole::Customer);
        assert!(matches!(
            feedback.submit(&ada, rating(0)),
            Err(DomainError::Validation(_))
        ));

        let mut for_order = rating(4);
        for_order.order_id = Some("missing".to_string());
        assert!(matches!(
            feedback.submit(&ada, for_order),
            Err(DomainError::NotFound { .. })
        ));
    }
}
