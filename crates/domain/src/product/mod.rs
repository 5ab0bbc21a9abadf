//! Catalog management.

mod service;
pub mod validation;

pub use service::ProductService;
