//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use rust_decimal::prelude::*;
use shared::models::{OrderItem, OrderItemInput};

use crate::domain::{DomainError, DomainResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price
const MAX_PRICE: f64 = 100_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: u32 = 99;

/// Computed order totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Validate a cart line before pricing
pub fn validate_line(item: &OrderItemInput) -> DomainResult<()> {
    if !item.price.is_finite() {
        return Err(DomainError::Validation(format!(
            "price of '{}' must be a finite number, got {}",
            item.name, item.price
        )));
    }
    if item.price < 0.0 {
        return Err(DomainError::Validation(format!(
            "price of '{}' must be non-negative, got {}",
            item.name, item.price
        )));
    }
    if item.price > MAX_PRICE {
        return Err(DomainError::Validation(format!(
            "price of '{}' exceeds maximum allowed ({}), got {}",
            item.name, MAX_PRICE, item.price
        )));
    }
    if item.quantity == 0 || item.quantity > MAX_QUANTITY {
        return Err(DomainError::Validation(format!(
            "quantity of '{}' must be between 1 and {}, got {}",
            item.name, MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

#[inline]
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_total(item: &OrderItem) -> Decimal {
    round_money(to_decimal(item.price) * Decimal::from(item.quantity))
}

/// subtotal = Σ price × quantity, tax = round(subtotal × rate), total = subtotal + tax
pub fn calculate_totals(items: &[OrderItem], tax_rate: f64) -> Totals {
    let subtotal: Decimal = items.iter().map(line_total).sum();
    let tax = round_money(subtotal * to_decimal(tax_rate));
    Totals {
        subtotal: to_f64(subtotal),
        tax: to_f64(tax),
        total: to_f64(subtotal + tax),
    }
}

/// Sum of monetary values without float drift
pub fn sum_amounts(amounts: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(amounts.into_iter().map(to_decimal).sum())
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}
