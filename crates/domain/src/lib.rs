//! Business rules for the catalog and order backend.
//!
//! This crate provides:
//! - `ProductService` for catalog management
//! - `OrderService` for placing orders and moving them between statuses
//! - `StockEffect`, the inventory side effect of a status change
//! - `DomainError` and its `ErrorKind` classification

pub mod error;
pub mod order;
pub mod product;

pub use error::{DomainError, ErrorKind};
pub use order::{OrderItemRequest, OrderService, PlaceOrder, StockEffect};
pub use product::ProductService;
