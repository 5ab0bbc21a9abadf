//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client, caught before reaching a service.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Domain(err) => {
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal server error");
                }
                err.to_string()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

/// Malformed or mistyped JSON bodies are client errors like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};
    use store::{OrderStatus, StoreError};

    #[test]
    fn maps_error_kinds_to_status_codes() {
        let cases = [
            (
                ApiError::from(DomainError::ProductNotFound(ProductId::new())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(DomainError::invalid("bad")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(DomainError::StatusConflict {
                    order_id: OrderId::new(),
                    expected: OrderStatus::Pending,
                    actual: OrderStatus::Cancelled,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(DomainError::from(StoreError::InvalidData(
                    "corrupt".to_string(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::BadRequest("Invalid ID format".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err:?}");
        }
    }

    #[test]
    fn response_carries_status() {
        let response = ApiError::from(DomainError::OrderNotFound(OrderId::new())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
