//! Demo catalog loaded on startup when seeding is enabled.

use std::collections::HashSet;

use crate::{Money, NewProduct, Result, repository::ProductRepository};

/// Returns the demo products.
pub fn demo_catalog() -> Vec<NewProduct> {
    vec![
        NewProduct::new(
            "Dell Inspiron 15 Laptop",
            "Electronics",
            Money::from_cents(299_999),
            10,
        )
        .with_description("15.6 inch laptop with Intel Core i5, 8GB RAM and 256GB SSD"),
        NewProduct::new(
            "Logitech MX Master 3 Mouse",
            "Peripherals",
            Money::from_cents(39_999),
            25,
        )
        .with_description("Ergonomic wireless mouse with programmable buttons"),
        NewProduct::new(
            "RGB Mechanical Keyboard",
            "Peripherals",
            Money::from_cents(59_999),
            15,
        )
        .with_description("Mechanical keyboard with blue switches and RGB lighting"),
        NewProduct::new(
            "LG UltraWide 29\" Monitor",
            "Electronics",
            Money::from_cents(129_999),
            8,
        )
        .with_description("29 inch UltraWide monitor, Full HD resolution"),
        NewProduct::new(
            "Logitech C920 Webcam",
            "Peripherals",
            Money::from_cents(44_999),
            12,
        )
        .with_description("Full HD 1080p webcam with stereo microphone"),
    ]
}

/// Inserts every demo product whose name is not already in the catalog.
///
/// Returns how many products were inserted, so running it twice inserts
/// nothing the second time.
pub async fn seed_catalog<R: ProductRepository + ?Sized>(repo: &R) -> Result<usize> {
    let existing: HashSet<String> = repo
        .list_products()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let mut inserted = 0;
    for product in demo_catalog() {
        if existing.contains(&product.name) {
            tracing::debug!(name = %product.name, "demo product already present");
            continue;
        }
        repo.insert_product(product).await?;
        inserted += 1;
    }

    tracing::info!(inserted, "seeded demo catalog");
    Ok(inserted)
}
