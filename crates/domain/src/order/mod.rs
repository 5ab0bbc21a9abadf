//! Order placement and status transitions.

mod commands;
mod service;
mod transition;
pub mod validation;

pub use commands::{OrderItemRequest, PlaceOrder};
pub use service::OrderService;
pub use transition::StockEffect;
