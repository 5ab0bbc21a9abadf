use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Money, NewOrder, NewProduct, Order, OrderId, OrderLineItem, OrderStatus, Page, PageRequest,
    Product, ProductId, ProductPatch, Result, StatusTransition, StoreError,
    repository::{OrderRepository, ProductRepository, plan_stock_changes},
};

const PRODUCT_COLUMNS: &str = "id, name, category, description, image_url, price_cents, stock_quantity, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, status, total_cents, items, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock_quantity: row.try_get("stock_quantity")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<OrderLineItem> = serde_json::from_value(items_json)?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            status,
            total: Money::from_cents(row.try_get("total_cents")?),
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_products_page(&self, request: PageRequest) -> Result<Page<Product>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(request.limit()))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let data = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(data, total.max(0) as u64, request))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let product = product.into_product(Utc::now());

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (id, name, category, description, image_url, price_cents, stock_quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                image_url = COALESCE($5, image_url),
                price_cents = COALESCE($6, price_cents),
                stock_quantity = COALESCE($7, stock_quantity),
                updated_at = $8
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.category)
        .bind(patch.description)
        .bind(patch.image_url)
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.stock_quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order(Utc::now());
        let items_json = serde_json::to_value(&order.items)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (id, status, total_cents, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total.cents())
        .bind(items_json)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(row)
    }

    async fn transition_order(&self, transition: StatusTransition) -> Result<Order> {
        let order_id = transition.order_id;

        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let actual = status
            .ok_or(StoreError::OrderNotFound(order_id))?
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        if actual != transition.expected {
            return Err(StoreError::StatusConflict {
                order_id,
                expected: transition.expected,
                actual,
            });
        }

        let now = Utc::now();

        if !transition.stock_changes.is_empty() {
            let ids: Vec<Uuid> = transition
                .stock_changes
                .iter()
                .map(|c| c.product_id.as_uuid())
                .collect();

            // Lock in id order so concurrent transitions can't deadlock.
            let rows = sqlx::query(
                "SELECT id, name, stock_quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            )
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;

            let mut locked: HashMap<ProductId, (String, i32)> = HashMap::new();
            for row in rows {
                let id = ProductId::from_uuid(row.try_get::<Uuid, _>("id")?);
                locked.insert(id, (row.try_get("name")?, row.try_get("stock_quantity")?));
            }

            let planned = plan_stock_changes(&transition.stock_changes, |id| {
                locked
                    .get(id)
                    .map(|(name, stock)| (name.as_str(), *stock))
            })?;

            for (product_id, stock) in planned {
                sqlx::query(
                    "UPDATE products SET stock_quantity = $2, updated_at = $3 WHERE id = $1",
                )
                .bind(product_id.as_uuid())
                .bind(stock)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id.as_uuid())
        .bind(transition.target.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let order = Self::row_to_order(row)?;
        tx.commit().await?;

        Ok(order)
    }
}
