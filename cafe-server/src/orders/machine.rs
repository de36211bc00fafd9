//! Order lifecycle state machine
//!
//! ```text
//! PENDING → ACCEPTED → PREPARING → READY → SERVED → DELIVERED
//!    └─────────┴───────────┴──→ CANCELLED
//! ```

use shared::models::OrderStatus;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Accept,
    /// Explicit staff assignment
    Assign,
    StartPreparing,
    /// Staff dropped out mid-preparation
    Requeue,
    MarkReady,
    Serve,
    Deliver,
    Cancel,
}

impl OrderEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Assign => "assign",
            Self::StartPreparing => "start preparing",
            Self::Requeue => "requeue",
            Self::MarkReady => "mark ready",
            Self::Serve => "serve",
            Self::Deliver => "deliver",
            Self::Cancel => "cancel",
        }
    }
}

use OrderEvent as E;
use OrderStatus as S;

const TRANSITIONS: &[(OrderStatus, OrderEvent, OrderStatus)] = &[
    (S::Pending, E::Accept, S::Accepted),
    (S::Pending, E::Assign, S::Preparing),
    (S::Accepted, E::Assign, S::Preparing),
    (S::Preparing, E::Assign, S::Preparing),
    (S::Ready, E::Assign, S::Ready),
    (S::Served, E::Assign, S::Served),
    (S::Accepted, E::StartPreparing, S::Preparing),
    (S::Preparing, E::Requeue, S::Pending),
    (S::Preparing, E::MarkReady, S::Ready),
    (S::Ready, E::Serve, S::Served),
    (S::Served, E::Deliver, S::Delivered),
    (S::Pending, E::Cancel, S::Cancelled),
    (S::Accepted, E::Cancel, S::Cancelled),
    (S::Preparing, E::Cancel, S::Cancelled),
];

pub fn next_state(from: OrderStatus, event: OrderEvent) -> Option<OrderStatus> {
    TRANSITIONS
        .iter()
        .find(|(f, e, _)| *f == from && *e == event)
        .map(|(_, _, to)| *to)
}

pub fn transition(from: OrderStatus, event: OrderEvent) -> DomainResult<OrderStatus> {
    next_state(from, event)
        .ok_or_else(|| DomainError::invalid_transition("order", from, event.as_str()))
}

pub fn can_cancel(status: OrderStatus) -> bool {
    next_state(status, OrderEvent::Cancel).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut status = S::Pending;
        for event in [E::Accept, E::StartPreparing, E::MarkReady, E::Serve, E::Deliver] {
            status = transition(status, event).unwrap();
        }
        assert_eq!(status, S::Delivered);
    }

    #[test]
    fn test_cancel_only_before_ready() {
        assert!(can_cancel(S::Pending));
        assert!(can_cancel(S::Accepted));
        assert!(can_cancel(S::Preparing));
        for status in [S::Ready, S::Served, S::Delivered, S::Cancelled] {
            assert!(!can_cancel(status), "{status} should not be cancellable");
        }
    }

    #[test]
    fn test_terminal_states_have_no_edges() {
        for event in [
            E::Accept,
            E::Assign,
            E::StartPreparing,
            E::Requeue,
            E::MarkReady,
            E::Serve,
            E::Deliver,
            E::Cancel,
        ] {
            assert_eq!(next_state(S::Delivered, event), None);
            assert_eq!(next_state(S::Cancelled, event), None);
        }
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = transition(S::Pending, E::Serve).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(err.to_string(), "Cannot serve order in status PENDING");
    }
}
