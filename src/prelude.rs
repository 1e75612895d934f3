//! Till prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine, remaining_stock},
    checkout::{Checkout, CheckoutError},
    coupons::{
        Coupon, CouponBook, CouponCode, CouponDiscount, CouponError, can_apply_coupon,
    },
    discounts::{
        BULK_PURCHASE_THRESHOLD, DiscountError, bulk_purchase_bonus, max_applicable_discount,
        max_combined_discount,
    },
    pricing::{CartTotals, PricingError, cart_totals, line_total},
    products::{Catalog, DiscountTier, Product, ProductError, ProductId},
    store::{JsonFileStore, MemoryStore, Snapshot, StateStore, StoreError, capture, restore},
};
