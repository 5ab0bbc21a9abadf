//! Persisted records for products and orders.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Money, OrderId, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Money,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a product that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Money,
    pub stock_quantity: i32,
}

impl NewProduct {
    /// Creates product fields with no description or image.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        stock_quantity: i32,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: None,
            image_url: None,
            price,
            stock_quantity,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Materializes the record under a fresh identifier.
    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::new(),
            name: self.name,
            category: self.category,
            description: self.description,
            image_url: self.image_url,
            price: self.price,
            stock_quantity: self.stock_quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial product update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Money>,
    pub stock_quantity: Option<i32>,
}

impl ProductPatch {
    /// A patch that only sets the stock quantity.
    pub fn stock(stock_quantity: i32) -> Self {
        Self {
            stock_quantity: Some(stock_quantity),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch in place and bumps `updated_at`.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            product.name = name.clone();
        }
        if let Some(ref category) = self.category {
            product.category = category.clone();
        }
        if let Some(ref description) = self.description {
            product.description = Some(description.clone());
        }
        if let Some(ref image_url) = self.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock_quantity {
            product.stock_quantity = stock;
        }
        product.updated_at = now;
    }
}

/// Lifecycle status of an order.
///
/// The set of transitions is not enforced here: any status may be written
/// over any other. Stock side effects are decided by the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Returns the status name as stored and exposed over HTTP.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status '{0}' (expected Pending, Completed or Cancelled)")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A line of an order, embedded in the order record.
///
/// `product_id` is a weak reference: the product may be deleted later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price per unit captured when the order was placed.
    #[serde(rename = "unit_price_cents")]
    pub unit_price: Money,
}

impl OrderLineItem {
    pub fn new(product_id: ProductId, quantity: i32, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Returns `unit_price * quantity`, or `None` if it overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Money,
    pub items: Vec<OrderLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order about to be persisted. The total is taken as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub status: OrderStatus,
    pub total: Money,
    pub items: Vec<OrderLineItem>,
}

impl NewOrder {
    /// Materializes the record under a fresh identifier.
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(),
            status: self.status,
            total: self.total,
            items: self.items,
            created_at: now,
            updated_at: now,
        }
    }
}
