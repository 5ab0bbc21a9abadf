//! Domain error types.

use common::{OrderId, ProductId};
use store::{OrderStatus, StoreError};
use thiserror::Error;

/// How a [`DomainError`] should be reported to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The request failed validation.
    #[error("{0}")]
    InvalidRequest(String),

    /// An order line asks for more than the product has in stock.
    #[error(
        "Insufficient stock for product '{product_name}': available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        available: i32,
        requested: i32,
    },

    /// Completing the order would drive a product's stock below zero.
    #[error(
        "Cannot complete order: insufficient stock for product '{product_name}' (available {available}, requested {requested})"
    )]
    CannotComplete {
        product_id: ProductId,
        product_name: String,
        available: i32,
        requested: i32,
    },

    /// The order changed status between being read and being written.
    #[error("Order {order_id} is no longer {expected} (now {actual})")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidRequest(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::ProductNotFound(_) | DomainError::OrderNotFound(_) => ErrorKind::NotFound,
            DomainError::InvalidRequest(_)
            | DomainError::InsufficientStock { .. }
            | DomainError::CannotComplete { .. }
            | DomainError::Store(StoreError::StockOverflow(_)) => ErrorKind::InvalidRequest,
            DomainError::StatusConflict { .. } => ErrorKind::Conflict,
            DomainError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ProductNotFound(id) => DomainError::ProductNotFound(id),
            StoreError::OrderNotFound(id) => DomainError::OrderNotFound(id),
            StoreError::StatusConflict {
                order_id,
                expected,
                actual,
            } => DomainError::StatusConflict {
                order_id,
                expected,
                actual,
            },
            other => DomainError::Store(other),
        }
    }
}
