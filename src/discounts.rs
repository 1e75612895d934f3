//! Discounts
//!
//! The layered discount policy: per-line quantity tiers, a cart-wide bulk
//! purchase bonus, and a hard combined cap.
//!
//! A line's rate is the highest tier it qualifies for, plus the bulk bonus
//! when any line in the cart is a bulk purchase, clamped to the cap. Rates
//! from different tiers never stack with each other.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::cart::{Cart, CartLine};

/// Line quantity at which a line counts as a bulk purchase.
pub const BULK_PURCHASE_THRESHOLD: u32 = 10;

/// Extra discount applied to every line when the cart holds a bulk line.
#[must_use]
pub fn bulk_purchase_bonus() -> Percentage {
    Percentage::from(0.05)
}

/// Upper bound on any line's combined discount rate.
#[must_use]
pub fn max_combined_discount() -> Percentage {
    Percentage::from(0.5)
}

/// Errors related to discount arithmetic.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// A percentage amount could not be represented in minor units.
    #[error("could not convert percentage to minor units")]
    PercentConversion,
}

/// The combined discount rate for one cart line.
///
/// Tiers whose minimum quantity exceeds the line quantity are ignored; among
/// the qualifying tiers only the highest rate applies. The bulk bonus is then
/// added if [`Cart::has_bulk_line`] holds, and the sum is clamped to
/// [`max_combined_discount`]. A line with no qualifying tier and no bonus
/// gets a zero rate.
pub fn max_applicable_discount(line: &CartLine, cart: &Cart) -> Percentage {
    let base = line
        .product()
        .discounts()
        .iter()
        .filter(|tier| line.quantity() >= tier.min_quantity())
        .map(|tier| tier.rate() * Decimal::ONE)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut combined = base;

    if cart.has_bulk_line() {
        combined += bulk_purchase_bonus() * Decimal::ONE;
    }

    Percentage::from(combined.min(max_combined_discount() * Decimal::ONE))
}

/// Calculate a percentage of an amount of minor units, rounding half away
/// from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the amount cannot be
/// represented as a [`Decimal`] or the result does not fit in an `i64`.
pub fn percent_of_minor(percent: &Percentage, minor_units: i64) -> Result<i64, DiscountError> {
    Decimal::from_i64(minor_units)
        .ok_or(DiscountError::PercentConversion)?
        .checked_mul(*percent * Decimal::ONE)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
