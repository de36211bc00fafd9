//! Booking lifecycle state machine
//!
//! ```text
//! (create) ─▶ PENDING ──approve──▶ CONFIRMED ──served──▶ SERVED
//!                │                    │  └────no_show──▶ NO_SHOW
//!                └──reject/cancel──▶ CANCELLED ◀──cancel─┘
//! ```
//!
//! Creation picks PENDING or CONFIRMED from the table cache and is not an
//! edge of this table.

use shared::models::BookingStatus;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Approve,
    Reject,
    Cancel,
    CheckIn,
    MarkServed,
    MarkNoShow,
}

impl BookingEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::CheckIn => "check in",
            Self::MarkServed => "mark served",
            Self::MarkNoShow => "mark no-show",
        }
    }
}

use BookingEvent as E;
use BookingStatus as S;

const TRANSITIONS: &[(BookingStatus, BookingEvent, BookingStatus)] = &[
    (S::Pending, E::Approve, S::Confirmed),
    (S::Pending, E::Reject, S::Cancelled),
    (S::Pending, E::Cancel, S::Cancelled),
    (S::Confirmed, E::Cancel, S::Cancelled),
    (S::Confirmed, E::CheckIn, S::Confirmed),
    (S::Confirmed, E::MarkServed, S::Served),
    (S::Confirmed, E::MarkNoShow, S::NoShow),
];

pub fn next_state(from: BookingStatus, event: BookingEvent) -> Option<BookingStatus> {
    TRANSITIONS
        .iter()
        .find(|(f, e, _)| *f == from && *e == event)
        .map(|(_, _, to)| *to)
}

pub fn transition(from: BookingStatus, event: BookingEvent) -> DomainResult<BookingStatus> {
    next_state(from, event)
        .ok_or_else(|| DomainError::invalid_transition("booking", from, event.as_str()))
}
