use crate::error::DomainError;

use super::PlaceOrder;

/// Checks the shape of an order request before any product is looked up.
pub fn validate_place_order(cmd: &PlaceOrder) -> Result<(), DomainError> {
    if cmd.items.is_empty() {
        return Err(DomainError::invalid("Order must contain at least one item"));
    }

    for item in &cmd.items {
        if item.quantity < 1 {
            return Err(DomainError::invalid(format!(
                "Invalid quantity {} for product {} (must be at least 1)",
                item.quantity, item.product_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderItemRequest;
    use common::ProductId;

    #[test]
    fn rejects_empty_orders() {
        let err = validate_place_order(&PlaceOrder::new(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "Order must contain at least one item");
    }

    #[test]
    fn rejects_non_positive_quantities() {
        for quantity in [0, -3] {
            let cmd = PlaceOrder::new(vec![
                OrderItemRequest::new(ProductId::new(), 1),
                OrderItemRequest::new(ProductId::new(), quantity),
            ]);
            assert!(validate_place_order(&cmd).is_err());
        }
    }

    #[test]
    fn accepts_duplicate_lines() {
        let id = ProductId::new();
        let cmd = PlaceOrder::new(vec![
            OrderItemRequest::new(id, 2),
            OrderItemRequest::new(id, 3),
        ]);
        assert!(validate_place_order(&cmd).is_ok());
    }
}
