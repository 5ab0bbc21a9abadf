//! Order placement and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, ProductId};
use domain::{OrderItemRequest, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::{Order, OrderStatus, Store};

use crate::AppState;
use crate::error::ApiError;

use super::parse_id;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemBody>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemBody {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status.to_string(),
            total_cents: order.total.cents(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_service.list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.order_service.get_order(id).await?;
    Ok(Json(order.into()))
}

/// POST /orders: place a Pending order for the given lines.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;
    let items = req
        .items
        .iter()
        .map(|item| {
            let product_id: ProductId = parse_id(&item.product_id)?;
            Ok(OrderItemRequest::new(product_id, item.quantity))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let order = state
        .order_service
        .create_order(PlaceOrder::new(items))
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// PUT /orders/{id}/status: move an order to another status.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Json(req) = payload?;
    let id: OrderId = parse_id(&id)?;
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|e: store::ParseStatusError| ApiError::BadRequest(e.to_string()))?;

    let order = state.order_service.update_order_status(id, status).await?;
    Ok(Json(order.into()))
}
