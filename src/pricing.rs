//! Pricing
//!
//! Turns a cart (and an optionally selected coupon) into money amounts.
//! All arithmetic happens on integer minor units lifted into [`Decimal`];
//! each line is rounded exactly once, and cart totals sum the already-rounded
//! line amounts.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    cart::{Cart, CartLine},
    coupons::{Coupon, CouponDiscount},
    discounts::{DiscountError, max_applicable_discount, percent_of_minor},
};

/// Errors related to price calculation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// An amount overflowed or could not be converted between numeric types.
    #[error("amount could not be represented in minor units")]
    Numeric,

    /// An underlying money operation failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// An underlying discount calculation failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// The totals for a cart, all in the cart's currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    total_before_discount: Money<'static, Currency>,
    total_after_discount: Money<'static, Currency>,
    coupon_discount: Money<'static, Currency>,
    final_total: Money<'static, Currency>,
    total_discount: Money<'static, Currency>,
}

impl CartTotals {
    /// Sum of undiscounted line amounts.
    pub fn total_before_discount(&self) -> &Money<'static, Currency> {
        &self.total_before_discount
    }

    /// Sum of line totals after per-line discounts, before any coupon.
    pub fn total_after_discount(&self) -> &Money<'static, Currency> {
        &self.total_after_discount
    }

    /// Amount the selected coupon took off.
    pub fn coupon_discount(&self) -> &Money<'static, Currency> {
        &self.coupon_discount
    }

    /// The amount payable.
    pub fn final_total(&self) -> &Money<'static, Currency> {
        &self.final_total
    }

    /// Everything saved: item discounts plus the coupon.
    pub fn total_discount(&self) -> &Money<'static, Currency> {
        &self.total_discount
    }
}

fn undiscounted_minor(line: &CartLine) -> Result<i64, PricingError> {
    line.product()
        .price()
        .to_minor_units()
        .checked_mul(i64::from(line.quantity()))
        .ok_or(PricingError::Numeric)
}

/// Price one line: unit price times quantity, reduced by the line's combined
/// discount rate, rounded half away from zero. Never negative.
///
/// # Errors
///
/// Returns [`PricingError::Numeric`] when an amount overflows minor-unit
/// arithmetic.
pub fn line_total(line: &CartLine, cart: &Cart) -> Result<Money<'static, Currency>, PricingError> {
    let rate = max_applicable_discount(line, cart) * Decimal::ONE;

    let base = Decimal::from_i64(undiscounted_minor(line)?).ok_or(PricingError::Numeric)?;

    let total = base
        .checked_mul(Decimal::ONE - rate)
        .ok_or(PricingError::Numeric)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Numeric)?
        .max(0);

    Ok(Money::from_minor(total, cart.currency()))
}

fn coupon_discount_minor(coupon: &Coupon, after_item_discounts: i64) -> Result<i64, PricingError> {
    match coupon.discount() {
        CouponDiscount::Amount(amount) => {
            Ok(amount.to_minor_units().min(after_item_discounts))
        }
        CouponDiscount::Percentage(rate) => Ok(percent_of_minor(&rate, after_item_discounts)?),
    }
}

/// Total up a cart, applying `coupon` after the per-line discounts.
///
/// An amount coupon is clamped to the post-item-discount subtotal; a
/// percentage coupon takes its share of that subtotal. The payable total
/// never goes below zero.
///
/// # Errors
///
/// Returns [`PricingError::Numeric`] when an amount overflows minor-unit
/// arithmetic.
pub fn cart_totals(cart: &Cart, coupon: Option<&Coupon>) -> Result<CartTotals, PricingError> {
    let mut before: i64 = 0;
    let mut after: i64 = 0;

    for line in cart.iter() {
        before = before
            .checked_add(undiscounted_minor(line)?)
            .ok_or(PricingError::Numeric)?;
        after = after
            .checked_add(line_total(line, cart)?.to_minor_units())
            .ok_or(PricingError::Numeric)?;
    }

    let coupon_amount = match coupon {
        Some(coupon) => coupon_discount_minor(coupon, after)?,
        None => 0,
    };

    let payable = after.checked_sub(coupon_amount).ok_or(PricingError::Numeric)?.max(0);
    let saved = before.checked_sub(payable).ok_or(PricingError::Numeric)?;

    let currency = cart.currency();

    Ok(CartTotals {
        total_before_discount: Money::from_minor(before, currency),
        total_after_discount: Money::from_minor(after, currency),
        coupon_discount: Money::from_minor(coupon_amount, currency),
        final_total: Money::from_minor(payable, currency),
        total_discount: Money::from_minor(saved, currency),
    })
}
