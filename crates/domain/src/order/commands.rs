//! Order commands.

use common::ProductId;

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl OrderItemRequest {
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to place a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub items: Vec<OrderItemRequest>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(items: Vec<OrderItemRequest>) -> Self {
        Self { items }
    }

    /// Creates a single-line order request.
    pub fn single(product_id: ProductId, quantity: i32) -> Self {
        Self::new(vec![OrderItemRequest::new(product_id, quantity)])
    }
}
