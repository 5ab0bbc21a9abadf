use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    NewOrder, NewProduct, Order, OrderId, OrderStatus, Page, PageRequest, Product, ProductId,
    ProductPatch, Result, StoreError,
};

/// What to do when a stock change names a product that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingProduct {
    /// Abort the whole transition with `ProductNotFound`.
    Fail,
    /// Ignore this change and carry on.
    Skip,
}

/// A signed adjustment of one product's stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub delta: i32,
    pub on_missing: MissingProduct,
}

impl StockChange {
    /// Takes `quantity` units out of stock; a missing product is an error.
    pub fn take(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            delta: -quantity,
            on_missing: MissingProduct::Fail,
        }
    }

    /// Puts `quantity` units back; a missing product is skipped.
    pub fn give_back(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            delta: quantity,
            on_missing: MissingProduct::Skip,
        }
    }
}

/// A status write guarded by the status the caller last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub order_id: OrderId,
    /// Status the order must still have when the write happens.
    pub expected: OrderStatus,
    pub target: OrderStatus,
    /// Applied in order; all of them or none.
    pub stock_changes: Vec<StockChange>,
}

/// Product persistence.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Returns every product, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Returns one page of products, oldest first.
    async fn list_products_page(&self, request: PageRequest) -> Result<Page<Product>>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Applies a partial update. Returns `None` if the product doesn't exist.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>>;

    /// Deletes a product. Returns false if it didn't exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;
}

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Returns every order, oldest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Writes a new status together with its stock changes as one atomic unit.
    ///
    /// Fails with `OrderNotFound` if the order is gone, `StatusConflict` if its
    /// status is no longer `transition.expected`, `ProductNotFound` for a
    /// missing product whose change says [`MissingProduct::Fail`], and
    /// `InsufficientStock` if any stock would go negative. On failure nothing
    /// is written. Stock checks see the effect of earlier changes in the same
    /// transition, so repeated products accumulate.
    async fn transition_order(&self, transition: StatusTransition) -> Result<Order>;
}

/// A backend holding both products and orders, so transitions can span them.
pub trait Store: ProductRepository + OrderRepository {}

impl<T: ProductRepository + OrderRepository + ?Sized> Store for T {}

/// Computes the stock each touched product ends up with, without writing.
///
/// `lookup` returns the name and current stock of a product, or `None` if it
/// doesn't exist. Both adapters call this with their rows already locked.
pub(crate) fn plan_stock_changes<'a>(
    changes: &[StockChange],
    lookup: impl Fn(&ProductId) -> Option<(&'a str, i32)>,
) -> Result<HashMap<ProductId, i32>> {
    let mut planned: HashMap<ProductId, i32> = HashMap::new();

    for change in changes {
        let Some((name, stored)) = lookup(&change.product_id) else {
            match change.on_missing {
                MissingProduct::Fail => return Err(StoreError::ProductNotFound(change.product_id)),
                MissingProduct::Skip => {
                    tracing::debug!(product_id = %change.product_id, "skipping stock change for missing product");
                    continue;
                }
            }
        };

        let current = planned.get(&change.product_id).copied().unwrap_or(stored);
        let next = current
            .checked_add(change.delta)
            .ok_or(StoreError::StockOverflow(change.product_id))?;

        if next < 0 {
            return Err(StoreError::InsufficientStock {
                product_id: change.product_id,
                product_name: name.to_string(),
                available: current,
                requested: -change.delta,
            });
        }

        planned.insert(change.product_id, next);
    }

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_accumulates_and_reports_remaining_stock() {
        let id = ProductId::new();
        let lookup = |_: &ProductId| Some(("Widget", 10));

        let planned = plan_stock_changes(
            &[StockChange::take(id, 3), StockChange::take(id, 2)],
            lookup,
        )
        .unwrap();
        assert_eq!(planned[&id], 5);

        let err = plan_stock_changes(
            &[StockChange::take(id, 8), StockChange::take(id, 3)],
            lookup,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
    }

    #[test]
    fn plan_skips_or_fails_on_missing_products() {
        let id = ProductId::new();
        let lookup = |_: &ProductId| -> Option<(&'static str, i32)> { None };

        let planned = plan_stock_changes(&[StockChange::give_back(id, 1)], lookup).unwrap();
        assert!(planned.is_empty());

        let err = plan_stock_changes(&[StockChange::take(id, 1)], lookup).unwrap_err();
        assert!(matches!(err, StoreError::ProductNotFound(missing) if missing == id));
    }

    #[test]
    fn plan_detects_overflow() {
        let id = ProductId::new();
        let err = plan_stock_changes(&[StockChange::give_back(id, 1)], |_| {
            Some(("Widget", i32::MAX))
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::StockOverflow(_)));
    }

    #[test]
    fn take_is_negative_and_strict() {
        let id = ProductId::new();
        let change = StockChange::take(id, 4);
        assert_eq!(change.delta, -4);
        assert_eq!(change.on_missing, MissingProduct::Fail);
    }

    #[test]
    fn give_back_is_positive_and_lenient() {
        let id = ProductId::new();
        let change = StockChange::give_back(id, 4);
        assert_eq!(change.delta, 4);
        assert_eq!(change.on_missing, MissingProduct::Skip);
    }
}
