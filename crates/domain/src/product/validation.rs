//! Field checks run before a product is written.

use store::{NewProduct, ProductPatch};

use crate::error::DomainError;

/// Column widths of the `products` table.
const MAX_NAME_LEN: usize = 255;
const MAX_CATEGORY_LEN: usize = 100;
const MAX_IMAGE_URL_LEN: usize = 500;

fn check_text(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid(format!("Product {field} must not be empty")));
    }
    check_len(field, value, max_len)
}

fn check_len(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.chars().count() > max_len {
        return Err(DomainError::invalid(format!(
            "Product {field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

fn check_price(cents: i64) -> Result<(), DomainError> {
    if cents < 0 {
        return Err(DomainError::invalid(format!(
            "Product price must not be negative (got {cents} cents)"
        )));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::invalid(format!(
            "Stock quantity must not be negative (got {stock})"
        )));
    }
    Ok(())
}

/// Checks the fields of a product about to be created.
pub fn validate_new_product(product: &NewProduct) -> Result<(), DomainError> {
    check_text("name", &product.name, MAX_NAME_LEN)?;
    check_text("category", &product.category, MAX_CATEGORY_LEN)?;
    if let Some(ref url) = product.image_url {
        check_len("image_url", url, MAX_IMAGE_URL_LEN)?;
    }
    check_price(product.price.cents())?;
    check_stock(product.stock_quantity)
}

/// Checks only the fields a patch sets.
pub fn validate_patch(patch: &ProductPatch) -> Result<(), DomainError> {
    if let Some(ref name) = patch.name {
        check_text("name", name, MAX_NAME_LEN)?;
    }
    if let Some(ref category) = patch.category {
        check_text("category", category, MAX_CATEGORY_LEN)?;
    }
    if let Some(ref url) = patch.image_url {
        check_len("image_url", url, MAX_IMAGE_URL_LEN)?;
    }
    if let Some(price) = patch.price {
        check_price(price.cents())?;
    }
    if let Some(stock) = patch.stock_quantity {
        check_stock(stock)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn product() -> NewProduct {
        NewProduct::new("Mouse", "Peripherals", Money::from_cents(3999), 25)
    }

    #[test]
    fn accepts_valid_product() {
        assert!(validate_new_product(&product()).is_ok());
        assert!(validate_new_product(&NewProduct::new("Free", "Promo", Money::zero(), 0)).is_ok());
    }

    #[test]
    fn rejects_blank_text_fields() {
        let mut p = product();
        p.name = "   ".to_string();
        let err = validate_new_product(&p).unwrap_err();
        assert_eq!(err.to_string(), "Product name must not be empty");

        let mut p = product();
        p.category = String::new();
        assert!(validate_new_product(&p).is_err());
    }

    #[test]
    fn rejects_negative_numbers() {
        let mut p = product();
        p.price = Money::from_cents(-1);
        assert!(validate_new_product(&p).is_err());

        let mut p = product();
        p.stock_quantity = -5;
        let err = validate_new_product(&p).unwrap_err();
        assert!(err.to_string().contains("-5"));
    }

    #[test]
    fn rejects_text_wider_than_its_column() {
        let mut p = product();
        p.name = "n".repeat(255);
        assert!(validate_new_product(&p).is_ok());
        p.name = "n".repeat(256);
        let err = validate_new_product(&p).unwrap_err();
        assert_eq!(err.to_string(), "Product name must be at most 255 characters");

        let mut p = product();
        p.category = "c".repeat(101);
        assert!(validate_new_product(&p).is_err());

        let p = product().with_image_url("u".repeat(501));
        assert!(validate_new_product(&p).is_err());

        // Multi-byte characters count once.
        let mut p = product();
        p.name = "é".repeat(255);
        assert!(validate_new_product(&p).is_ok());

        let patch = ProductPatch {
            image_url: Some("u".repeat(501)),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn patch_checks_only_present_fields() {
        assert!(validate_patch(&ProductPatch::default()).is_ok());
        assert!(validate_patch(&ProductPatch::stock(0)).is_ok());
        assert!(validate_patch(&ProductPatch::stock(-1)).is_err());

        let patch = ProductPatch {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }
}
