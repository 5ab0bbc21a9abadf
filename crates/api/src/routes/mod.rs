pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use uuid::Uuid;

use crate::error::ApiError;

/// Parses a path identifier, rejecting malformed UUIDs with 400.
pub(crate) fn parse_id<T: From<Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
