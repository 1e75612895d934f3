//! Till
//!
//! Till is a pure, synchronous storefront checkout core: a validated product
//! catalog, a stock-aware cart, a layered quantity-discount policy, cart
//! coupons, and JSON snapshot persistence.

pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod store;
