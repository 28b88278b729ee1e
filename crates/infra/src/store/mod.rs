//! Product record storage.
//!
//! The store owns persistence and identifier assignment. It does not validate or
//! stamp timestamps; that is the repository's job (see [`crate::repository`]).

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product};
use chrono::{DateTime, Utc};

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;

/// Store operation error.
///
/// These are **infrastructure errors** (the backing store is unavailable or returned
/// something unusable), as opposed to domain errors (validation, not found).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be turned back into a product.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Persistence seam for product records.
///
/// Every method is atomic: it either takes full effect before returning `Ok` or has
/// no effect at all.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new record, assigning a fresh identifier that is never reused.
    async fn insert(&self, new: NewProduct, at: DateTime<Utc>) -> Result<Product, StoreError>;

    async fn fetch(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// All records, ordered by name then id.
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Overwrite an existing record. Returns `false` when no record has that id.
    async fn replace(&self, product: &Product) -> Result<bool, StoreError>;

    /// Permanently remove a record. Returns `false` when no record has that id.
    async fn remove(&self, id: ProductId) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn insert(&self, new: NewProduct, at: DateTime<Utc>) -> Result<Product, StoreError> {
        (**self).insert(new, at).await
    }

    async fn fetch(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).fetch(id).await
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).fetch_all().await
    }

    async fn replace(&self, product: &Product) -> Result<bool, StoreError> {
        (**self).replace(product).await
    }

    async fn remove(&self, id: ProductId) -> Result<bool, StoreError> {
        (**self).remove(id).await
    }
}

/// Canonical listing order: name ascending (byte-wise), then id.
pub fn sort_by_name(products: &mut [Product]) {
    products.sort_by(|a, b| {
        a.name()
            .cmp(b.name())
            .then_with(|| a.id_typed().cmp(&b.id_typed()))
    });
}
