use thiserror::Error;

use crate::{OrderId, OrderStatus, ProductId};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stock change referenced a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Applying a stock change would drive the stock below zero.
    #[error(
        "Insufficient stock for product {product_name} ({product_id}): available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        available: i32,
        requested: i32,
    },

    /// The order's status changed between being read and being written.
    #[error("Status conflict for order {order_id}: expected {expected}, found {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// Restoring stock would exceed the representable range.
    #[error("Stock overflow for product {0}")]
    StockOverflow(ProductId),

    /// A persisted row could not be decoded into a domain record.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
