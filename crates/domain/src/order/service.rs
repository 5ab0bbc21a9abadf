//! Order service: placement and status transitions.

use std::time::Instant;

use common::{Money, OrderId};
use store::{NewOrder, Order, OrderLineItem, OrderStatus, StatusTransition, Store, StoreError};

use crate::error::DomainError;

use super::{PlaceOrder, StockEffect, validation::validate_place_order};

/// Service for managing orders.
///
/// Placement only checks stock; stock moves when an order is completed or
/// a completed order is cancelled.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(id)
            .await?
            .ok_or(DomainError::OrderNotFound(id))
    }

    /// Places a new Pending order.
    ///
    /// Every line is checked against the product's current stock on its own;
    /// the first failing line aborts the placement and nothing is persisted.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let start = Instant::now();

        let result = self.place(cmd).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed").increment(1);
                metrics::histogram!("order_placement_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(order_id = %order.id, total = %order.total, "order placed");
            }
            Err(e) => {
                metrics::counter!("order_placement_rejected", "reason" => e.kind().as_str())
                    .increment(1);
            }
        }

        result
    }

    async fn place(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        validate_place_order(&cmd)?;

        let mut items = Vec::with_capacity(cmd.items.len());
        let mut total = Money::zero();

        for request in cmd.items {
            let product = self
                .store
                .get_product(request.product_id)
                .await?
                .ok_or(DomainError::ProductNotFound(request.product_id))?;

            if request.quantity > product.stock_quantity {
                tracing::warn!(
                    product_id = %product.id,
                    available = product.stock_quantity,
                    requested = request.quantity,
                    "insufficient stock for order line"
                );
                return Err(DomainError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    available: product.stock_quantity,
                    requested: request.quantity,
                });
            }

            let item = OrderLineItem::new(product.id, request.quantity, product.price);
            total = item
                .line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| DomainError::invalid("Order total is too large"))?;
            items.push(item);
        }

        let order = self
            .store
            .insert_order(NewOrder {
                status: OrderStatus::Pending,
                total,
                items,
            })
            .await?;

        Ok(order)
    }

    /// Moves an order to `target`, applying its stock effect atomically.
    ///
    /// Fails with `StatusConflict` if the order changed status after it was
    /// read here, in which case nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, DomainError> {
        let order = self.get_order(id).await?;
        let effect = StockEffect::between(order.status, target);

        let transition = StatusTransition {
            order_id: id,
            expected: order.status,
            target,
            stock_changes: effect.stock_changes(&order.items),
        };

        let updated = self
            .store
            .transition_order(transition)
            .await
            .map_err(|e| match e {
                StoreError::InsufficientStock {
                    product_id,
                    product_name,
                    available,
                    requested,
                } => {
                    tracing::warn!(
                        order_id = %id,
                        product_id = %product_id,
                        available,
                        requested,
                        "cannot complete order"
                    );
                    DomainError::CannotComplete {
                        product_id,
                        product_name,
                        available,
                        requested,
                    }
                }
                other => DomainError::from(other),
            })?;

        metrics::counter!("order_status_transitions", "to" => target.as_str()).increment(1);
        tracing::info!(
            order_id = %id,
            from = %order.status,
            to = %target,
            effect = ?effect,
            "order status updated"
        );

        Ok(updated)
    }
}
