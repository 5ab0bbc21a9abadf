use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    NewOrder, NewProduct, Order, OrderId, Page, PageRequest, Product, ProductId, ProductPatch,
    Result, StatusTransition, StoreError,
    repository::{OrderRepository, ProductRepository, plan_stock_changes},
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store for tests and database-less runs.
///
/// Products and orders share one lock so a status transition and its stock
/// changes are applied atomically, the same guarantee the PostgreSQL store
/// gets from a transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all products and orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.products.clear();
        state.orders.clear();
    }
}

fn sorted_products(state: &State) -> Vec<Product> {
    let mut products: Vec<_> = state.products.values().cloned().collect();
    products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    products
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(sorted_products(&state))
    }

    async fn list_products_page(&self, request: PageRequest) -> Result<Page<Product>> {
        let state = self.state.read().await;
        let products = sorted_products(&state);
        let total = products.len() as u64;

        let data = products
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();

        Ok(Page::new(data, total, request))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let product = product.into_product(Utc::now());
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let mut state = self.state.write().await;
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(product, Utc::now());
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.products.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order(Utc::now());
        let mut state = self.state.write().await;
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn transition_order(&self, transition: StatusTransition) -> Result<Order> {
        let mut state = self.state.write().await;

        let actual = state
            .orders
            .get(&transition.order_id)
            .map(|o| o.status)
            .ok_or(StoreError::OrderNotFound(transition.order_id))?;

        if actual != transition.expected {
            return Err(StoreError::StatusConflict {
                order_id: transition.order_id,
                expected: transition.expected,
                actual,
            });
        }

        // Everything is checked before the first write.
        let products = &state.products;
        let planned = plan_stock_changes(&transition.stock_changes, |id| {
            products
                .get(id)
                .map(|p| (p.name.as_str(), p.stock_quantity))
        })?;

        let now = Utc::now();
        for (product_id, stock) in planned {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock_quantity = stock;
                product.updated_at = now;
            }
        }

        let order = state
            .orders
            .get_mut(&transition.order_id)
            .ok_or(StoreError::OrderNotFound(transition.order_id))?;
        order.status = transition.target;
        order.updated_at = now;

        Ok(order.clone())
    }
}
