//! Cart
//!
//! Stock-aware cart mutation. Every operation is a pure transformation that
//! returns a new [`Cart`]; on rejection the caller's cart is untouched.

use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    discounts::BULK_PURCHASE_THRESHOLD,
    products::{Product, ProductId},
};

/// Errors related to cart construction or mutation.
#[derive(Debug, Error)]
pub enum CartError {
    /// A product's currency differs from the cart currency.
    #[error("{product} is priced in {product_currency}, but the cart uses {cart_currency}")]
    CurrencyMismatch {
        /// Product name.
        product: String,
        /// Product price currency code.
        product_currency: &'static str,
        /// Cart currency code.
        cart_currency: &'static str,
    },

    /// Adding one more unit would exceed the product's remaining stock.
    #[error("{product} is out of stock")]
    OutOfStock {
        /// Product name.
        product: String,
    },

    /// The requested quantity exceeds the product's total stock.
    #[error("only {stock} units of {product} are in stock")]
    StockExceeded {
        /// Product name.
        product: String,
        /// Total catalog stock for the product.
        stock: u32,
    },

    /// A cart line can never hold a zero quantity.
    #[error("cart line quantity must be at least 1")]
    ZeroQuantity,

    /// Two lines reference the same product id.
    #[error("cart already has a line for product {0}")]
    DuplicateLine(ProductId),
}

/// One product entry in a cart.
///
/// Invariant: `quantity >= 1`. A line whose quantity would reach zero is
/// removed from the cart, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    product: Product,
    quantity: u32,
}

impl CartLine {
    /// Create a new cart line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] if `quantity` is zero.
    pub fn new(product: Product, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        Ok(Self { product, quantity })
    }

    /// The product this line holds.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Units of the product in the cart.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// An ordered cart of lines, fixed to a single currency.
///
/// Insertion order is preserved for display; it has no effect on totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Create a cart from existing lines, e.g. a deserialized snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if a line's currency differs from the cart
    /// currency or two lines share a product id.
    pub fn with_lines(
        lines: impl Into<Vec<CartLine>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let lines = lines.into();

        for (i, line) in lines.iter().enumerate() {
            let line_currency = line.product().price().currency();
            if line_currency != currency {
                return Err(CartError::CurrencyMismatch {
                    product: line.product().name().to_string(),
                    product_currency: line_currency.iso_alpha_code,
                    cart_currency: currency.iso_alpha_code,
                });
            }

            if lines
                .iter()
                .take(i)
                .any(|earlier| earlier.product().id() == line.product().id())
            {
                return Err(CartError::DuplicateLine(line.product().id().clone()));
            }
        }

        Ok(Cart { lines, currency })
    }

    /// Add one unit of a product: increment its line, or append a new
    /// quantity-1 line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when the product's remaining stock is
    /// exhausted, or [`CartError::CurrencyMismatch`] when the product is
    /// priced in another currency. The receiver cart is unchanged on error.
    pub fn add_item(&self, product: &Product) -> Result<Self, CartError> {
        let product_currency = product.price().currency();
        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                product: product.name().to_string(),
                product_currency: product_currency.iso_alpha_code,
                cart_currency: self.currency.iso_alpha_code,
            });
        }

        if remaining_stock(product, self) == 0 {
            return Err(CartError::OutOfStock {
                product: product.name().to_string(),
            });
        }

        let mut lines = self.lines.clone();

        if let Some(line) = lines
            .iter_mut()
            .find(|line| line.product().id() == product.id())
        {
            line.quantity += 1;
        } else {
            lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            });
        }

        Ok(Cart {
            lines,
            currency: self.currency,
        })
    }

    /// Replace a line's quantity.
    ///
    /// A quantity of zero removes the line. A missing line is a no-op, not an
    /// error; resolving unknown product ids is the caller's concern. The
    /// stock guard uses the product captured on the line; callers holding a
    /// live catalog should prefer [`Cart::update_line`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StockExceeded`] when `quantity` is above the
    /// product's total stock. The receiver cart is unchanged on error.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<Self, CartError> {
        let Some(existing) = self.line(product_id) else {
            return Ok(self.clone());
        };

        let product = existing.product().clone();
        self.update_line(&product, quantity)
    }

    /// Replace a line's product and quantity in place.
    ///
    /// The authoritative product is passed in, so the stock guard and the
    /// retained line track the caller's catalog rather than the copy
    /// captured when the line was added. A quantity of zero removes the
    /// line; a missing line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StockExceeded`] when `quantity` is above the
    /// product's stock, or [`CartError::CurrencyMismatch`] when the product
    /// is priced in another currency. The receiver cart is unchanged on
    /// error.
    pub fn update_line(&self, product: &Product, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Ok(self.remove_item(product.id()));
        }

        if self.line(product.id()).is_none() {
            return Ok(self.clone());
        }

        let product_currency = product.price().currency();
        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                product: product.name().to_string(),
                product_currency: product_currency.iso_alpha_code,
                cart_currency: self.currency.iso_alpha_code,
            });
        }

        if quantity > product.stock() {
            return Err(CartError::StockExceeded {
                product: product.name().to_string(),
                stock: product.stock(),
            });
        }

        let lines = self
            .lines
            .iter()
            .map(|line| {
                if line.product().id() == product.id() {
                    CartLine {
                        product: product.clone(),
                        quantity,
                    }
                } else {
                    line.clone()
                }
            })
            .collect();

        Ok(Cart {
            lines,
            currency: self.currency,
        })
    }

    /// Remove a product's line. A no-op when the line is absent; idempotent.
    #[must_use]
    pub fn remove_item(&self, product_id: &ProductId) -> Self {
        Cart {
            lines: self
                .lines
                .iter()
                .filter(|line| line.product().id() != product_id)
                .cloned()
                .collect(),
            currency: self.currency,
        }
    }

    /// Get the line for a product, if present.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.product().id() == product_id)
    }

    /// Units of a product currently in the cart (0 when absent).
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.line(product_id).map_or(0, CartLine::quantity)
    }

    /// Whether any line qualifies as a bulk purchase
    /// (quantity >= [`BULK_PURCHASE_THRESHOLD`]).
    pub fn has_bulk_line(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.quantity() >= BULK_PURCHASE_THRESHOLD)
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Number of lines in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check whether the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_units(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |sum, line| sum.saturating_add(line.quantity()))
    }

    /// Currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// Remaining purchasable stock for a product given the current cart:
/// `max(0, product.stock - quantity_in_cart)`.
///
/// This is the single source of truth for "can I add more of this product";
/// it is derived on every call and never cached.
pub fn remaining_stock(product: &Product, cart: &Cart) -> u32 {
    product.stock().saturating_sub(cart.quantity_of(product.id()))
}
