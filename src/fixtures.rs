//! Fixtures
//!
//! A canned catalog and coupon book shared by integration tests and demos.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::KRW};
use thiserror::Error;

use crate::{
    coupons::{Coupon, CouponBook, CouponCode, CouponDiscount, CouponError},
    products::{Catalog, DiscountTier, Product, ProductError, ProductId},
};

/// Errors related to fixture construction.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// A fixture product failed validation.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// A fixture coupon failed validation.
    #[error(transparent)]
    Coupon(#[from] CouponError),
}

/// Three widgets priced in won, two of them tiered, one recommended.
///
/// # Errors
///
/// Returns a [`FixtureError`] if any fixture product fails validation.
pub fn sample_catalog() -> Result<Catalog, FixtureError> {
    let mut catalog = Catalog::new();

    catalog.add(
        Product::new(
            ProductId::new("p1"),
            "Premium Widget",
            Money::from_minor(10_000, KRW),
            20,
        )?
        .with_discounts([
            DiscountTier::new(10, Percentage::from(0.1))?,
            DiscountTier::new(20, Percentage::from(0.2))?,
        ])?
        .with_description("The flagship widget, milled from a single billet.")?,
    )?;

    catalog.add(
        Product::new(
            ProductId::new("p2"),
            "Everyday Widget",
            Money::from_minor(20_000, KRW),
            20,
        )?
        .with_discounts([DiscountTier::new(10, Percentage::from(0.15))?])?
        .recommended(),
    )?;

    catalog.add(
        Product::new(
            ProductId::new("p3"),
            "Workshop Widget",
            Money::from_minor(30_000, KRW),
            20,
        )?
        .with_discounts([
            DiscountTier::new(10, Percentage::from(0.2))?,
            DiscountTier::new(30, Percentage::from(0.25))?,
        ])?,
    )?;

    Ok(catalog)
}

/// A 5,000-won amount coupon and a 10% percentage coupon.
///
/// # Errors
///
/// Returns a [`FixtureError`] if any fixture coupon fails validation.
pub fn sample_coupons() -> Result<CouponBook, FixtureError> {
    let mut book = CouponBook::new();

    book.add(Coupon::new(
        "5,000 Won Off",
        CouponCode::new("AMOUNT5000")?,
        CouponDiscount::Amount(Money::from_minor(5_000, KRW)),
    )?)?;

    book.add(Coupon::new(
        "10% Off",
        CouponCode::new("PERCENT10")?,
        CouponDiscount::Percentage(Percentage::from(0.1)),
    )?)?;

    Ok(book)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn the_sample_catalog_builds() -> TestResult {
        let catalog = sample_catalog()?;

        assert_eq!(catalog.len(), 3);
        assert!(
            catalog
                .get(&ProductId::new("p2"))
                .is_some_and(Product::is_recommended)
        );

        Ok(())
    }

    #[test]
    fn the_sample_coupons_build() -> TestResult {
        let book = sample_coupons()?;

        assert_eq!(book.len(), 2);
        assert!(book.get(&CouponCode::new("AMOUNT5000")?).is_some());
        assert!(book.get(&CouponCode::new("PERCENT10")?).is_some());

        Ok(())
    }
}
