//! Coupons
//!
//! Cart-level coupons: a fixed amount off, or a percentage of the
//! post-item-discount subtotal. Codes are normalized to uppercase
//! alphanumerics and unique within a [`CouponBook`].

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cart::Cart,
    pricing::{PricingError, cart_totals},
};

/// Post-item-discount subtotal a cart must reach before a percentage coupon
/// may be applied, in minor units.
pub const PERCENTAGE_COUPON_MIN_SUBTOTAL: i64 = 10_000;

/// Largest fixed amount a coupon may take off, in minor units.
pub const MAX_COUPON_AMOUNT: i64 = 100_000;

/// Longest permitted coupon name, in characters.
pub const MAX_NAME_LENGTH: usize = 30;

/// Longest permitted coupon code, in characters.
pub const MAX_CODE_LENGTH: usize = 12;

/// Errors related to coupon validation and application.
#[derive(Debug, Error)]
pub enum CouponError {
    /// The coupon name was blank.
    #[error("coupon name cannot be empty")]
    EmptyName,

    /// The coupon name exceeded [`MAX_NAME_LENGTH`] characters.
    #[error("coupon name cannot exceed {MAX_NAME_LENGTH} characters")]
    NameTooLong,

    /// The code had no alphanumeric characters.
    #[error("coupon code cannot be empty")]
    EmptyCode,

    /// The code exceeded [`MAX_CODE_LENGTH`] characters after normalization.
    #[error("coupon code cannot exceed {MAX_CODE_LENGTH} characters")]
    CodeTooLong,

    /// An amount discount was outside `1..=`[`MAX_COUPON_AMOUNT`].
    #[error("coupon amount must be between 1 and {MAX_COUPON_AMOUNT} minor units")]
    AmountOutOfRange,

    /// A percentage discount was outside `(0, 1]`.
    #[error("coupon percentage must be between 1 and 100")]
    PercentageOutOfRange,

    /// A coupon with the same code already exists.
    #[error("a coupon with code {0} already exists")]
    DuplicateCode(CouponCode),

    /// The cart subtotal is below the percentage-coupon floor.
    #[error(
        "percentage coupons need a subtotal of at least {required} minor units, cart has {subtotal}"
    )]
    BelowMinimumSubtotal {
        /// Required post-item-discount subtotal in minor units.
        required: i64,
        /// The cart's actual post-item-discount subtotal in minor units.
        subtotal: i64,
    },

    /// The cart could not be totalled.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A normalized coupon code: uppercase ASCII alphanumerics only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalize `code` by dropping non-alphanumeric characters and
    /// uppercasing the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::EmptyCode`] when nothing survives
    /// normalization, or [`CouponError::CodeTooLong`] when the result exceeds
    /// [`MAX_CODE_LENGTH`] characters.
    pub fn new(code: &str) -> Result<Self, CouponError> {
        let normalized: String = code
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(CouponError::EmptyCode);
        }

        if normalized.len() > MAX_CODE_LENGTH {
            return Err(CouponError::CodeTooLong);
        }

        Ok(Self(normalized))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a coupon takes off the cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CouponDiscount {
    /// A fixed amount, clamped to the subtotal when applied.
    Amount(Money<'static, Currency>),

    /// A share of the post-item-discount subtotal.
    Percentage(Percentage),
}

/// A named, validated coupon.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    name: String,
    code: CouponCode,
    discount: CouponDiscount,
}

impl Coupon {
    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] when the name is blank or too long, an
    /// amount discount is outside `1..=`[`MAX_COUPON_AMOUNT`] minor units, or
    /// a percentage discount is outside `(0, 1]`.
    pub fn new(
        name: impl Into<String>,
        code: CouponCode,
        discount: CouponDiscount,
    ) -> Result<Self, CouponError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(CouponError::EmptyName);
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CouponError::NameTooLong);
        }

        match discount {
            CouponDiscount::Amount(amount) => {
                let minor = amount.to_minor_units();
                if !(1..=MAX_COUPON_AMOUNT).contains(&minor) {
                    return Err(CouponError::AmountOutOfRange);
                }
            }
            CouponDiscount::Percentage(rate) => {
                let rate = rate * Decimal::ONE;
                if rate <= Decimal::ZERO || rate > Decimal::ONE {
                    return Err(CouponError::PercentageOutOfRange);
                }
            }
        }

        Ok(Self {
            name,
            code,
            discount,
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized code.
    pub fn code(&self) -> &CouponCode {
        &self.code
    }

    /// The discount this coupon grants.
    pub fn discount(&self) -> CouponDiscount {
        self.discount
    }
}

/// The set of coupons on offer, unique by code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponBook {
    coupons: Vec<Coupon>,
}

impl CouponBook {
    /// Create an empty coupon book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coupon.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::DuplicateCode`] when a coupon with the same
    /// code is already present.
    pub fn add(&mut self, coupon: Coupon) -> Result<(), CouponError> {
        if self.get(coupon.code()).is_some() {
            return Err(CouponError::DuplicateCode(coupon.code().clone()));
        }

        self.coupons.push(coupon);
        Ok(())
    }

    /// Remove a coupon by code, returning it if it was present.
    pub fn remove(&mut self, code: &CouponCode) -> Option<Coupon> {
        let position = self.coupons.iter().position(|c| c.code() == code)?;
        Some(self.coupons.remove(position))
    }

    /// Get a coupon by code.
    pub fn get(&self, code: &CouponCode) -> Option<&Coupon> {
        self.coupons.iter().find(|c| c.code() == code)
    }

    /// Iterate over the coupons in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Coupon> {
        self.coupons.iter()
    }

    /// Number of coupons on offer.
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Check whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

/// Check whether `coupon` may be applied to `cart`.
///
/// Amount coupons always apply. Percentage coupons require the cart's
/// post-item-discount subtotal to reach
/// [`PERCENTAGE_COUPON_MIN_SUBTOTAL`] minor units.
///
/// # Errors
///
/// Returns [`CouponError::BelowMinimumSubtotal`] when a percentage coupon
/// does not meet the floor.
pub fn can_apply_coupon(cart: &Cart, coupon: &Coupon) -> Result<(), CouponError> {
    if let CouponDiscount::Percentage(_) = coupon.discount() {
        let subtotal = cart_totals(cart, None)?
            .total_after_discount()
            .to_minor_units();

        if subtotal < PERCENTAGE_COUPON_MIN_SUBTOTAL {
            return Err(CouponError::BelowMinimumSubtotal {
                required: PERCENTAGE_COUPON_MIN_SUBTOTAL,
                subtotal,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::KRW;
    use testresult::TestResult;

    use super::*;
    use crate::products::{Product, ProductId};

    fn percent10() -> Result<Coupon, CouponError> {
        Coupon::new(
            "Ten Percent",
            CouponCode::new("PERCENT10")?,
            CouponDiscount::Percentage(Percentage::from(0.1)),
        )
    }

    #[test]
    fn codes_are_normalized_to_uppercase_alphanumerics() -> TestResult {
        let code = CouponCode::new(" sum-mer 24! ")?;

        assert_eq!(code.as_str(), "SUMMER24");

        Ok(())
    }

    #[test]
    fn a_code_with_nothing_left_after_normalization_is_rejected() {
        let result = CouponCode::new("--- !!!");

        assert!(matches!(result, Err(CouponError::EmptyCode)));
    }

    #[test]
    fn over_long_codes_are_rejected() {
        let result = CouponCode::new("ABCDEFGHIJKLM");

        assert!(matches!(result, Err(CouponError::CodeTooLong)));
    }

    #[test]
    fn amount_coupons_outside_the_cap_are_rejected() -> TestResult {
        let result = Coupon::new(
            "Too Generous",
            CouponCode::new("BIG")?,
            CouponDiscount::Amount(Money::from_minor(100_001, KRW)),
        );

        assert!(matches!(result, Err(CouponError::AmountOutOfRange)));

        Ok(())
    }

    #[test]
    fn percentage_coupons_above_one_hundred_percent_are_rejected() -> TestResult {
        let result = Coupon::new(
            "Everything Free",
            CouponCode::new("FREE")?,
            CouponDiscount::Percentage(Percentage::from(1.01)),
        );

        assert!(matches!(result, Err(CouponError::PercentageOutOfRange)));

        Ok(())
    }

    #[test]
    fn the_book_rejects_duplicate_codes() -> TestResult {
        let mut book = CouponBook::new();
        book.add(percent10()?)?;

        let result = book.add(Coupon::new(
            "Same Code Again",
            CouponCode::new("percent10")?,
            CouponDiscount::Amount(Money::from_minor(1_000, KRW)),
        )?);

        assert!(matches!(result, Err(CouponError::DuplicateCode(_))));
        assert_eq!(book.len(), 1);

        Ok(())
    }

    #[test]
    fn percentage_coupons_need_the_minimum_subtotal() -> TestResult {
        let p = Product::new(
            ProductId::new("cheap"),
            "Cheap Widget",
            Money::from_minor(9_999, KRW),
            10,
        )?;
        let cart = Cart::new(KRW).add_item(&p)?;

        let result = can_apply_coupon(&cart, &percent10()?);

        match result {
            Err(CouponError::BelowMinimumSubtotal { required, subtotal }) => {
                assert_eq!(required, 10_000);
                assert_eq!(subtotal, 9_999);
            }
            other => panic!("expected BelowMinimumSubtotal error, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn the_subtotal_floor_is_inclusive() -> TestResult {
        let p = Product::new(
            ProductId::new("exact"),
            "Exact Widget",
            Money::from_minor(10_000, KRW),
            10,
        )?;
        let cart = Cart::new(KRW).add_item(&p)?;

        can_apply_coupon(&cart, &percent10()?)?;

        Ok(())
    }

    #[test]
    fn amount_coupons_apply_to_any_cart() -> TestResult {
        let p = Product::new(
            ProductId::new("cheap"),
            "Cheap Widget",
            Money::from_minor(500, KRW),
            10,
        )?;
        let cart = Cart::new(KRW).add_item(&p)?;

        let coupon = Coupon::new(
            "Small Saver",
            CouponCode::new("SAVER")?,
            CouponDiscount::Amount(Money::from_minor(5_000, KRW)),
        )?;

        can_apply_coupon(&cart, &coupon)?;

        Ok(())
    }
}
