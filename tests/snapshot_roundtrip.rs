//! Integration test for snapshot persistence through a real file.
//!
//! A session built from the fixture storefront is captured, written to disk
//! by [`JsonFileStore`], read back, and restored. The restored session must
//! hold the same catalog, coupons, and cart, and produce the same totals.

use rusty_money::iso::KRW;
use tempfile::TempDir;
use testresult::TestResult;

use till::{
    cart::Cart,
    checkout::Checkout,
    fixtures,
    products::ProductId,
    store::{JsonFileStore, StateStore, capture, restore},
};

fn storefront() -> Result<Checkout, fixtures::FixtureError> {
    Ok(Checkout::from_parts(
        fixtures::sample_catalog()?,
        fixtures::sample_coupons()?,
        Cart::new(KRW),
    ))
}

#[test]
fn a_session_survives_a_trip_through_the_file_store() -> TestResult {
    let dir = TempDir::new()?;
    let store = JsonFileStore::new(dir.path().join("state.json"));

    let mut checkout = storefront()?;
    checkout.add_to_cart(&ProductId::new("p1"))?;
    checkout.update_quantity(&ProductId::new("p1"), 10)?;
    checkout.add_to_cart(&ProductId::new("p2"))?;

    store.save(&capture(&checkout))?;

    let loaded = store.load()?.ok_or("no snapshot on disk")?;
    let restored = restore(&loaded, KRW)?;

    assert_eq!(restored.catalog().len(), checkout.catalog().len());
    assert_eq!(restored.coupons().len(), checkout.coupons().len());
    assert_eq!(restored.cart(), checkout.cart());
    assert_eq!(restored.totals()?, checkout.totals()?);

    Ok(())
}

#[test]
fn a_missing_file_loads_as_a_fresh_start() -> TestResult {
    let dir = TempDir::new()?;
    let store = JsonFileStore::new(dir.path().join("never-written.json"));

    assert!(store.load()?.is_none());

    Ok(())
}

#[test]
fn saving_twice_replaces_the_earlier_snapshot() -> TestResult {
    let dir = TempDir::new()?;
    let store = JsonFileStore::new(dir.path().join("state.json"));

    let mut checkout = storefront()?;
    store.save(&capture(&checkout))?;

    checkout.add_to_cart(&ProductId::new("p3"))?;
    store.save(&capture(&checkout))?;

    let loaded = store.load()?.ok_or("no snapshot on disk")?;
    let restored = restore(&loaded, KRW)?;

    assert_eq!(restored.cart().quantity_of(&ProductId::new("p3")), 1);

    Ok(())
}

#[test]
fn the_persisted_json_is_human_readable() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("state.json");
    let store = JsonFileStore::new(&path);

    store.save(&capture(&storefront()?))?;

    let contents = std::fs::read_to_string(&path)?;

    assert!(contents.contains("\"products\""));
    assert!(contents.contains("\"isRecommended\""));
    assert!(contents.contains("\"discountType\""));
    assert!(contents.contains('\n'), "expected pretty-printed JSON");

    Ok(())
}
