//! Products
//!
//! The catalog side of the engine: products with quantity-tier discounts and
//! the admin-facing [`Catalog`] that keeps ids unique.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

/// Maximum stock a single product may carry.
pub const MAX_STOCK: u32 = 9_999;

/// Maximum product price, in minor currency units.
pub const MAX_PRICE: i64 = 10_000_000;

/// Maximum number of discount tiers per product.
pub const MAX_DISCOUNT_TIERS: usize = 5;

/// Maximum product name length, in characters.
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum product description length, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Errors related to product construction or catalog maintenance.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Product name is empty or longer than [`MAX_NAME_LENGTH`].
    #[error("product name must be 1..={MAX_NAME_LENGTH} characters")]
    InvalidName,

    /// Product price is negative or above [`MAX_PRICE`] minor units.
    #[error("product price {0} is outside 0..={MAX_PRICE}")]
    InvalidPrice(i64),

    /// Product stock exceeds [`MAX_STOCK`].
    #[error("product stock {0} exceeds the maximum of {MAX_STOCK}")]
    StockOverMax(u32),

    /// A discount tier requires a minimum quantity of zero.
    #[error("discount tier minimum quantity must be at least 1")]
    ZeroTierQuantity,

    /// A discount tier rate is outside the (0, 1] range.
    #[error("discount tier rate must be greater than 0% and at most 100%")]
    InvalidTierRate,

    /// More than [`MAX_DISCOUNT_TIERS`] tiers were supplied.
    #[error("a product may have at most {MAX_DISCOUNT_TIERS} discount tiers, got {0}")]
    TooManyTiers(usize),

    /// Product description exceeds [`MAX_DESCRIPTION_LENGTH`] characters.
    #[error("product description exceeds {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,

    /// A product with this id already exists in the catalog.
    #[error("a product with id {0} already exists")]
    DuplicateId(ProductId),

    /// No product with this id exists in the catalog.
    #[error("no product with id {0}")]
    NotFound(ProductId),
}

/// Opaque product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A quantity-tier discount rule: buy at least `min_quantity` units, get `rate` off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountTier {
    min_quantity: u32,
    rate: Percentage,
}

impl DiscountTier {
    /// Create a new discount tier.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if `min_quantity` is zero or `rate` is
    /// outside the (0, 1] range.
    pub fn new(min_quantity: u32, rate: Percentage) -> Result<Self, ProductError> {
        if min_quantity == 0 {
            return Err(ProductError::ZeroTierQuantity);
        }

        let rate_dec = rate * Decimal::ONE;
        if rate_dec <= Decimal::ZERO || rate_dec > Decimal::ONE {
            return Err(ProductError::InvalidTierRate);
        }

        Ok(Self { min_quantity, rate })
    }

    /// Minimum quantity required to qualify for this tier.
    pub fn min_quantity(&self) -> u32 {
        self.min_quantity
    }

    /// Discount rate granted once the tier qualifies.
    pub fn rate(&self) -> Percentage {
        self.rate
    }
}

/// A catalog product.
///
/// `stock` is the catalog-level counter of purchasable units; it is never
/// decremented by cart operations. Remaining availability is always derived
/// from the cart (see [`crate::cart::remaining_stock`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Money<'static, Currency>,
    stock: u32,
    discounts: SmallVec<[DiscountTier; MAX_DISCOUNT_TIERS]>,
    description: Option<String>,
    recommended: bool,
}

impl Product {
    /// Create a new product with no discount tiers.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the name, price, or stock is outside the
    /// catalog limits.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Money<'static, Currency>,
        stock: u32,
    ) -> Result<Self, ProductError> {
        let name = name.into();

        if name.trim().is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(ProductError::InvalidName);
        }

        let price_minor = price.to_minor_units();
        if !(0..=MAX_PRICE).contains(&price_minor) {
            return Err(ProductError::InvalidPrice(price_minor));
        }

        if stock > MAX_STOCK {
            return Err(ProductError::StockOverMax(stock));
        }

        Ok(Self {
            id,
            name,
            price,
            stock,
            discounts: SmallVec::new(),
            description: None,
            recommended: false,
        })
    }

    /// Replace the discount tiers.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::TooManyTiers`] if more than
    /// [`MAX_DISCOUNT_TIERS`] tiers are supplied.
    pub fn with_discounts(
        mut self,
        tiers: impl IntoIterator<Item = DiscountTier>,
    ) -> Result<Self, ProductError> {
        let tiers: SmallVec<[DiscountTier; MAX_DISCOUNT_TIERS]> = tiers.into_iter().collect();

        if tiers.len() > MAX_DISCOUNT_TIERS {
            return Err(ProductError::TooManyTiers(tiers.len()));
        }

        self.discounts = tiers;
        Ok(self)
    }

    /// Attach a description.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::DescriptionTooLong`] if the description exceeds
    /// [`MAX_DESCRIPTION_LENGTH`] characters.
    pub fn with_description(mut self, description: impl Into<String>) -> Result<Self, ProductError> {
        let description = description.into();

        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ProductError::DescriptionTooLong);
        }

        self.description = Some(description);
        Ok(self)
    }

    /// Mark the product as recommended.
    #[must_use]
    pub fn recommended(mut self) -> Self {
        self.recommended = true;
        self
    }

    /// Product id.
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    pub fn price(&self) -> &Money<'static, Currency> {
        &self.price
    }

    /// Total catalog stock, independent of any cart.
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Discount tiers, in the order they were defined.
    pub fn discounts(&self) -> &[DiscountTier] {
        &self.discounts
    }

    /// Optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the product is flagged as recommended.
    pub fn is_recommended(&self) -> bool {
        self.recommended
    }
}

/// The product catalog: an ordered product list with unique ids.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::DuplicateId`] if a product with the same id
    /// already exists.
    pub fn add(&mut self, product: Product) -> Result<(), ProductError> {
        if self.index.contains_key(product.id()) {
            return Err(ProductError::DuplicateId(product.id().clone()));
        }

        self.index.insert(product.id().clone(), self.products.len());
        self.products.push(product);
        Ok(())
    }

    /// Replace an existing product, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NotFound`] if no product with the id exists.
    pub fn update(&mut self, product: Product) -> Result<(), ProductError> {
        let idx = *self
            .index
            .get(product.id())
            .ok_or_else(|| ProductError::NotFound(product.id().clone()))?;

        if let Some(slot) = self.products.get_mut(idx) {
            *slot = product;
        }

        Ok(())
    }

    /// Remove a product and return it.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NotFound`] if no product with the id exists.
    pub fn remove(&mut self, id: &ProductId) -> Result<Product, ProductError> {
        let idx = self
            .index
            .remove(id)
            .ok_or_else(|| ProductError::NotFound(id.clone()))?;

        let product = self.products.remove(idx);

        // Positions after the removed product shift down by one.
        for (i, p) in self.products.iter().enumerate().skip(idx) {
            self.index.insert(p.id().clone(), i);
        }

        Ok(product)
    }

    /// Look up a product by id.
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|idx| self.products.get(*idx))
    }

    /// Case-insensitive substring search over product names and descriptions.
    ///
    /// A blank term matches every product.
    pub fn search(&self, term: &str) -> Vec<&Product> {
        let term = term.trim().to_lowercase();

        if term.is_empty() {
            return self.products.iter().collect();
        }

        self.products
            .iter()
            .filter(|product| {
                product.name().to_lowercase().contains(&term)
                    || product
                        .description()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Iterate over the products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
