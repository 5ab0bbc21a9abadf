//! Inventory side effects of order status changes.

use store::{OrderLineItem, OrderStatus, StockChange};

/// What a status change does to product stock.
///
/// Any status may be written over any other; only two edges touch stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Take each line's quantity out of stock.
    Reserve,
    /// Put each line's quantity back, skipping deleted products.
    Restore,
    Unchanged,
}

impl StockEffect {
    pub fn between(current: OrderStatus, target: OrderStatus) -> Self {
        match (current, target) {
            (OrderStatus::Completed, OrderStatus::Completed) => StockEffect::Unchanged,
            (_, OrderStatus::Completed) => StockEffect::Reserve,
            (OrderStatus::Completed, OrderStatus::Cancelled) => StockEffect::Restore,
            _ => StockEffect::Unchanged,
        }
    }

    /// Turns the effect into per-line stock changes, in line order.
    pub fn stock_changes(&self, items: &[OrderLineItem]) -> Vec<StockChange> {
        match self {
            StockEffect::Reserve => items
                .iter()
                .map(|item| StockChange::take(item.product_id, item.quantity))
                .collect(),
            StockEffect::Restore => items
                .iter()
                .map(|item| StockChange::give_back(item.product_id, item.quantity))
                .collect(),
            StockEffect::Unchanged => Vec::new(),
        }
    }
}
