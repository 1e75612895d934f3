//! Checkout
//!
//! A [`Checkout`] session owns the catalog, the coupon book, the cart, and
//! the coupon selection. It is the only mutable surface of the crate: every
//! method resolves ids against the catalog, delegates to the pure cart and
//! pricing functions, and commits the result only on success.

use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    cart::{self, Cart, CartError},
    coupons::{Coupon, CouponBook, CouponCode, CouponError, can_apply_coupon},
    pricing::{CartTotals, PricingError, cart_totals},
    products::{Catalog, Product, ProductError, ProductId},
};

/// Errors related to checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No catalog product carries the given id.
    #[error("product {0} is not in the catalog")]
    ProductNotFound(ProductId),

    /// No coupon carries the given code.
    #[error("coupon {0} is not on offer")]
    CouponNotFound(CouponCode),

    /// The cart has nothing to order.
    #[error("cannot complete an order with an empty cart")]
    EmptyCart,

    /// A line asks for more units than the catalog has in stock.
    #[error("not enough stock to fulfil {product}")]
    InsufficientStock {
        /// Product name.
        product: String,
    },

    /// An underlying catalog operation failed.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// An underlying cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An underlying coupon check failed.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// An underlying price calculation failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A checkout session: catalog, coupon book, cart, and coupon selection.
#[derive(Debug, Clone)]
pub struct Checkout {
    catalog: Catalog,
    coupons: CouponBook,
    cart: Cart,
    selected_coupon: Option<Coupon>,
}

impl Checkout {
    /// Start a session with an empty catalog, coupon book, and cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            catalog: Catalog::new(),
            coupons: CouponBook::new(),
            cart: Cart::new(currency),
            selected_coupon: None,
        }
    }

    /// Reassemble a session from its parts, e.g. a restored snapshot.
    #[must_use]
    pub fn from_parts(catalog: Catalog, coupons: CouponBook, cart: Cart) -> Self {
        Self {
            catalog,
            coupons,
            cart,
            selected_coupon: None,
        }
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The coupon book.
    pub fn coupons(&self) -> &CouponBook {
        &self.coupons
    }

    /// The cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The currently selected coupon, if any.
    pub fn selected_coupon(&self) -> Option<&Coupon> {
        self.selected_coupon.as_ref()
    }

    /// Add one unit of a catalog product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ProductNotFound`] for an unknown id, or the
    /// cart's error when the product is out of stock or in another currency.
    pub fn add_to_cart(&mut self, product_id: &ProductId) -> Result<(), CheckoutError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CheckoutError::ProductNotFound(product_id.clone()))?;

        self.cart = self.cart.add_item(product)?;
        Ok(())
    }

    /// Set the cart quantity of a catalog product. Zero removes the line.
    ///
    /// The quantity is validated against the current catalog entry, so the
    /// guard follows admin stock edits made after the line was added.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ProductNotFound`] for an unknown id, or
    /// [`CartError::StockExceeded`] when the quantity is above the catalog
    /// product's stock.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CheckoutError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CheckoutError::ProductNotFound(product_id.clone()))?;

        self.cart = self.cart.update_line(product, quantity)?;
        Ok(())
    }

    /// Remove a product's line from the cart. A no-op when absent.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) {
        self.cart = self.cart.remove_item(product_id);
    }

    /// Remaining purchasable stock for a product, 0 for unknown ids.
    pub fn remaining_stock(&self, product_id: &ProductId) -> u32 {
        self.catalog
            .get(product_id)
            .map_or(0, |product| cart::remaining_stock(product, &self.cart))
    }

    /// Totals for the current cart and coupon selection.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when an amount overflows minor-unit
    /// arithmetic.
    pub fn totals(&self) -> Result<CartTotals, CheckoutError> {
        Ok(cart_totals(&self.cart, self.selected_coupon.as_ref())?)
    }

    /// Select a coupon by code.
    ///
    /// Selecting a second coupon replaces the first; only one coupon is ever
    /// in effect.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CouponNotFound`] for an unknown code, or
    /// [`CouponError::BelowMinimumSubtotal`] when a percentage coupon does
    /// not meet the subtotal floor. The previous selection survives a
    /// rejected application.
    pub fn apply_coupon(&mut self, code: &CouponCode) -> Result<(), CheckoutError> {
        let coupon = self
            .coupons
            .get(code)
            .ok_or_else(|| CheckoutError::CouponNotFound(code.clone()))?
            .clone();

        can_apply_coupon(&self.cart, &coupon)?;

        self.selected_coupon = Some(coupon);
        Ok(())
    }

    /// Drop the coupon selection.
    pub fn clear_coupon(&mut self) {
        self.selected_coupon = None;
    }

    /// Put a new coupon on offer.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::DuplicateCode`] when the code is taken.
    pub fn add_coupon(&mut self, coupon: Coupon) -> Result<(), CheckoutError> {
        self.coupons.add(coupon)?;
        Ok(())
    }

    /// Withdraw a coupon from offer. Clears the selection if it pointed at
    /// the withdrawn coupon.
    pub fn delete_coupon(&mut self, code: &CouponCode) -> Option<Coupon> {
        if self
            .selected_coupon
            .as_ref()
            .is_some_and(|selected| selected.code() == code)
        {
            self.selected_coupon = None;
        }

        self.coupons.remove(code)
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::DuplicateId`] when the id is taken.
    pub fn add_product(&mut self, product: Product) -> Result<(), CheckoutError> {
        self.catalog.add(product)?;
        Ok(())
    }

    /// Replace a catalog product in place.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NotFound`] for an unknown id.
    pub fn update_product(&mut self, product: Product) -> Result<(), CheckoutError> {
        self.catalog.update(product)?;
        Ok(())
    }

    /// Remove a product from the catalog, returning it.
    ///
    /// The cart keeps any existing line for the product; only catalog
    /// resolution stops working for it.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NotFound`] for an unknown id.
    pub fn remove_product(&mut self, product_id: &ProductId) -> Result<Product, CheckoutError> {
        Ok(self.catalog.remove(product_id)?)
    }

    /// Complete the order: validate stock, compute the final totals, and
    /// reset the cart and coupon selection.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart, or
    /// [`CheckoutError::InsufficientStock`] when a line asks for more units
    /// than the catalog holds. The session is unchanged on error.
    pub fn complete_order(&mut self) -> Result<CartTotals, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        for line in self.cart.iter() {
            let in_stock = self
                .catalog
                .get(line.product().id())
                .map_or(0, Product::stock);

            if line.quantity() > in_stock {
                return Err(CheckoutError::InsufficientStock {
                    product: line.product().name().to_string(),
                });
            }
        }

        let totals = self.totals()?;

        self.cart = Cart::new(self.cart.currency());
        self.selected_coupon = None;

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::{Money, iso::KRW};
    use testresult::TestResult;

    use super::*;
    use crate::{fixtures, products::DiscountTier};

    fn session() -> Result<Checkout, crate::fixtures::FixtureError> {
        Ok(Checkout::from_parts(
            fixtures::sample_catalog()?,
            fixtures::sample_coupons()?,
            Cart::new(KRW),
        ))
    }

    #[test]
    fn unknown_product_ids_are_rejected_before_the_cart_is_touched() -> TestResult {
        let mut checkout = session()?;

        let result = checkout.add_to_cart(&ProductId::new("ghost"));

        assert!(matches!(result, Err(CheckoutError::ProductNotFound(_))));
        assert!(checkout.cart().is_empty());

        Ok(())
    }

    #[test]
    fn remaining_stock_tracks_the_cart() -> TestResult {
        let mut checkout = session()?;
        let id = ProductId::new("p1");

        assert_eq!(checkout.remaining_stock(&id), 20);

        checkout.add_to_cart(&id)?;
        checkout.update_quantity(&id, 5)?;

        assert_eq!(checkout.remaining_stock(&id), 15);
        assert_eq!(checkout.remaining_stock(&ProductId::new("ghost")), 0);

        Ok(())
    }

    #[test]
    fn update_quantity_follows_catalog_stock_edits() -> TestResult {
        let mut checkout = session()?;
        let id = ProductId::new("p1");

        checkout.add_to_cart(&id)?;
        checkout.update_quantity(&id, 10)?;

        // An admin drops the stock underneath the cart.
        let depleted = Product::new(
            id.clone(),
            "Premium Widget",
            Money::from_minor(10_000, KRW),
            3,
        )?;
        checkout.update_product(depleted)?;

        assert_eq!(checkout.remaining_stock(&id), 0);

        let result = checkout.update_quantity(&id, 15);
        assert!(
            matches!(
                result,
                Err(CheckoutError::Cart(CartError::StockExceeded {
                    stock: 3,
                    ..
                }))
            ),
            "expected StockExceeded against the edited catalog, got {result:?}"
        );
        assert_eq!(checkout.cart().quantity_of(&id), 10);

        // Restocking makes the same request valid again.
        let restocked = Product::new(
            id.clone(),
            "Premium Widget",
            Money::from_minor(10_000, KRW),
            20,
        )?;
        checkout.update_product(restocked)?;
        checkout.update_quantity(&id, 15)?;

        assert_eq!(checkout.cart().quantity_of(&id), 15);

        Ok(())
    }

    #[test]
    fn a_rejected_coupon_keeps_the_previous_selection() -> TestResult {
        let mut checkout = session()?;
        checkout.add_to_cart(&ProductId::new("p1"))?;

        let amount = CouponCode::new("AMOUNT5000")?;
        let percent = CouponCode::new("PERCENT10")?;

        checkout.apply_coupon(&amount)?;

        // Shrink the cart below the percentage floor before the second apply.
        checkout.remove_from_cart(&ProductId::new("p1"));
        let cheap = Product::new(
            ProductId::new("tiny"),
            "Tiny Widget",
            Money::from_minor(500, KRW),
            10,
        )?;
        checkout.add_product(cheap)?;
        checkout.add_to_cart(&ProductId::new("tiny"))?;

        let result = checkout.apply_coupon(&percent);

        assert!(matches!(
            result,
            Err(CheckoutError::Coupon(
                CouponError::BelowMinimumSubtotal { .. }
            ))
        ));
        assert_eq!(checkout.selected_coupon().map(Coupon::code), Some(&amount));

        Ok(())
    }

    #[test]
    fn deleting_the_selected_coupon_clears_the_selection() -> TestResult {
        let mut checkout = session()?;
        checkout.add_to_cart(&ProductId::new("p1"))?;

        let code = CouponCode::new("AMOUNT5000")?;
        checkout.apply_coupon(&code)?;

        let removed = checkout.delete_coupon(&code);

        assert!(removed.is_some());
        assert!(checkout.selected_coupon().is_none());
        assert!(checkout.coupons().get(&code).is_none());

        Ok(())
    }

    #[test]
    fn completing_an_order_resets_cart_and_selection() -> TestResult {
        let mut checkout = session()?;
        let id = ProductId::new("p1");

        checkout.add_to_cart(&id)?;
        checkout.update_quantity(&id, 10)?;
        checkout.apply_coupon(&CouponCode::new("PERCENT10")?)?;

        let totals = checkout.complete_order()?;

        assert_eq!(totals.final_total(), &Money::from_minor(76_500, KRW));
        assert!(checkout.cart().is_empty());
        assert!(checkout.selected_coupon().is_none());

        Ok(())
    }

    #[test]
    fn completing_an_empty_order_is_rejected() -> TestResult {
        let mut checkout = session()?;

        let result = checkout.complete_order();

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));

        Ok(())
    }

    #[test]
    fn orders_are_checked_against_catalog_stock() -> TestResult {
        let mut checkout = session()?;
        let id = ProductId::new("p1");

        checkout.add_to_cart(&id)?;
        checkout.update_quantity(&id, 10)?;

        // Stock drops underneath the cart before the order completes.
        let depleted = Product::new(
            id.clone(),
            "Premium Widget",
            Money::from_minor(10_000, KRW),
            3,
        )?
        .with_discounts([DiscountTier::new(10, Percentage::from(0.1))?])?;

        checkout.update_product(depleted)?;

        let result = checkout.complete_order();

        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock { .. })
        ));
        assert_eq!(checkout.cart().quantity_of(&id), 10);

        Ok(())
    }
}
