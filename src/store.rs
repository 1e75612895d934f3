//! Store
//!
//! Snapshot persistence for a checkout session. The [`Snapshot`] DTOs carry
//! plain integers and `camelCase` field names so the JSON stays stable across
//! releases; restoring goes back through the validating domain constructors.

use std::{cell::RefCell, fs, io, path::PathBuf};

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartLine},
    checkout::Checkout,
    coupons::{Coupon, CouponBook, CouponCode, CouponDiscount, CouponError},
    products::{Catalog, DiscountTier, Product, ProductError, ProductId},
};

/// Errors related to snapshot persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The snapshot JSON could not be parsed or serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A persisted product failed domain validation.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// A persisted coupon failed domain validation.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// A persisted cart failed domain validation.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// One discount tier as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierData {
    /// Minimum line quantity for the tier.
    pub quantity: u32,
    /// Discount rate as a fraction, e.g. `0.1` for 10%.
    pub rate: f64,
}

/// One product as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    /// Product id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unit price in minor units.
    pub price: i64,
    /// Units in stock.
    pub stock: u32,
    /// Quantity discount tiers.
    #[serde(default)]
    pub discounts: Vec<TierData>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the product is flagged as recommended.
    #[serde(default)]
    pub is_recommended: bool,
}

/// The kind of discount a persisted coupon grants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountTypeData {
    /// Fixed amount off.
    Amount,
    /// Percentage off.
    Percentage,
}

/// One coupon as persisted. `discount_value` holds minor units for amount
/// coupons and percentage points for percentage coupons; it is a plain JSON
/// number, so fractional rates like 10.5% persist losslessly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponData {
    /// Display name.
    pub name: String,
    /// Normalized code.
    pub code: String,
    /// Discount kind.
    pub discount_type: DiscountTypeData,
    /// Discount magnitude.
    pub discount_value: f64,
}

/// One cart line as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineData {
    /// The product on the line.
    pub product: ProductData,
    /// Units in the cart.
    pub quantity: u32,
}

/// A full persisted checkout state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The catalog.
    pub products: Vec<ProductData>,
    /// The cart lines.
    pub cart: Vec<CartLineData>,
    /// The coupons on offer.
    pub coupons: Vec<CouponData>,
}

fn product_data(product: &Product) -> ProductData {
    ProductData {
        id: product.id().as_str().to_string(),
        name: product.name().to_string(),
        price: product.price().to_minor_units(),
        stock: product.stock(),
        discounts: product
            .discounts()
            .iter()
            .map(|tier| TierData {
                quantity: tier.min_quantity(),
                rate: (tier.rate() * Decimal::ONE).to_f64().unwrap_or(0.0),
            })
            .collect(),
        description: product.description().map(str::to_string),
        is_recommended: product.is_recommended(),
    }
}

fn coupon_data(coupon: &Coupon) -> CouponData {
    let (discount_type, discount_value) = match coupon.discount() {
        CouponDiscount::Amount(amount) => (
            DiscountTypeData::Amount,
            Decimal::from(amount.to_minor_units()).to_f64().unwrap_or(0.0),
        ),
        CouponDiscount::Percentage(rate) => (
            DiscountTypeData::Percentage,
            ((rate * Decimal::ONE) * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0),
        ),
    };

    CouponData {
        name: coupon.name().to_string(),
        code: coupon.code().as_str().to_string(),
        discount_type,
        discount_value,
    }
}

fn restore_product(
    data: &ProductData,
    currency: &'static Currency,
) -> Result<Product, StoreError> {
    let mut product = Product::new(
        ProductId::new(data.id.clone()),
        data.name.clone(),
        Money::from_minor(data.price, currency),
        data.stock,
    )?;

    let tiers = data
        .discounts
        .iter()
        .map(|tier| DiscountTier::new(tier.quantity, Percentage::from(tier.rate)))
        .collect::<Result<Vec<_>, _>>()?;
    product = product.with_discounts(tiers)?;

    if let Some(description) = &data.description {
        product = product.with_description(description.clone())?;
    }

    if data.is_recommended {
        product = product.recommended();
    }

    Ok(product)
}

fn restore_coupon(data: &CouponData, currency: &'static Currency) -> Result<Coupon, StoreError> {
    // An unrepresentable number degrades to zero, which the coupon
    // constructor rejects as out of range.
    let discount = match data.discount_type {
        DiscountTypeData::Amount => {
            let minor = Decimal::from_f64(data.discount_value)
                .and_then(|amount| amount.to_i64())
                .unwrap_or(0);
            CouponDiscount::Amount(Money::from_minor(minor, currency))
        }
        DiscountTypeData::Percentage => CouponDiscount::Percentage(Percentage::from(
            Decimal::from_f64(data.discount_value).unwrap_or_default() / Decimal::ONE_HUNDRED,
        )),
    };

    Ok(Coupon::new(
        data.name.clone(),
        CouponCode::new(&data.code)?,
        discount,
    )?)
}

/// Capture a session as a snapshot.
///
/// The coupon selection is deliberately not captured; it is session state,
/// re-validated against the cart on every application.
#[must_use]
pub fn capture(checkout: &Checkout) -> Snapshot {
    Snapshot {
        products: checkout.catalog().iter().map(product_data).collect(),
        cart: checkout
            .cart()
            .iter()
            .map(|line| CartLineData {
                product: product_data(line.product()),
                quantity: line.quantity(),
            })
            .collect(),
        coupons: checkout.coupons().iter().map(coupon_data).collect(),
    }
}

/// Rebuild a session from a snapshot.
///
/// # Errors
///
/// Returns a [`StoreError`] when any persisted product, coupon, or cart line
/// fails domain validation.
pub fn restore(snapshot: &Snapshot, currency: &'static Currency) -> Result<Checkout, StoreError> {
    let mut catalog = Catalog::new();
    for data in &snapshot.products {
        catalog.add(restore_product(data, currency)?)?;
    }

    let mut coupons = CouponBook::new();
    for data in &snapshot.coupons {
        coupons.add(restore_coupon(data, currency)?)?;
    }

    let lines = snapshot
        .cart
        .iter()
        .map(|line| {
            let product = restore_product(&line.product, currency)?;
            Ok(CartLine::new(product, line.quantity)?)
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let cart = Cart::with_lines(lines, currency)?;

    Ok(Checkout::from_parts(catalog, coupons, cart))
}

/// Where snapshots are kept between sessions.
pub trait StateStore {
    /// Load the last saved snapshot, `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing medium fails or holds
    /// unparseable data.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Persist a snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing medium fails.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// A [`StateStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// An in-memory [`StateStore`] for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RefCell<Option<Snapshot>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }
}
