//! Product service providing the catalog operations.

use common::ProductId;
use store::{NewProduct, Page, PageRequest, Product, ProductPatch, Store};

use crate::error::DomainError;

use super::validation::{validate_new_product, validate_patch};

/// Service for managing the product catalog.
pub struct ProductService<S: Store> {
    store: S,
}

impl<S: Store> ProductService<S> {
    /// Creates a new product service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products_page(
        &self,
        request: PageRequest,
    ) -> Result<Page<Product>, DomainError> {
        Ok(self.store.list_products_page(request).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Validates and inserts a new product.
    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        validate_new_product(&product)?;

        let product = self.store.insert_product(product).await?;
        metrics::counter!("products_created").increment(1);
        tracing::info!(product_id = %product.id, name = %product.name, "product created");

        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// A missing product is reported before any validation failure.
    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, DomainError> {
        if self.store.get_product(id).await?.is_none() {
            return Err(DomainError::ProductNotFound(id));
        }
        validate_patch(&patch)?;

        // The product can still disappear between the two calls.
        self.store
            .update_product(id, patch)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Deletes a product. Orders that reference it are left as they are.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), DomainError> {
        if !self.store.delete_product(id).await? {
            return Err(DomainError::ProductNotFound(id));
        }

        metrics::counter!("products_deleted").increment(1);
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
