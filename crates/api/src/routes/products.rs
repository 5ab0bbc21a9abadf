//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{NewProduct, Page, PageRequest, Product, ProductPatch, Store};

use crate::AppState;
use crate::error::ApiError;

use super::parse_id;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock_quantity: i32,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            name: req.name,
            category: req.category,
            description: req.description,
            image_url: req.image_url,
            price: Money::from_cents(req.price_cents),
            stock_quantity: req.stock_quantity,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i32>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            category: req.category,
            description: req.description,
            image_url: req.image_url,
            price: req.price_cents.map(Money::from_cents),
            stock_quantity: req.stock_quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            category: p.category,
            description: p.description,
            image_url: p.image_url,
            price_cents: p.price.cents(),
            stock_quantity: p.stock_quantity,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// GET /products: list the whole catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.product_service.list_products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/paginated?page=&limit=: one page of the catalog.
#[tracing::instrument(skip(state))]
pub async fn list_paginated<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Page<ProductResponse>>, ApiError> {
    let request = PageRequest::from_parts(params.page, params.limit);
    let page = state.product_service.list_products_page(request).await?;
    Ok(Json(page.map(ProductResponse::from)))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.product_service.get_product(id).await?;
    Ok(Json(product.into()))
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(req) = payload?;
    let product = state.product_service.create_product(req.into()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /products/{id}: partial update; absent fields are left as they are.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Json(req) = payload?;
    let id: ProductId = parse_id(&id)?;
    let product = state.product_service.update_product(id, req.into()).await?;
    Ok(Json(product.into()))
}

/// DELETE /products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.product_service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
