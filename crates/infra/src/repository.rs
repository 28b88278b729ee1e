//! Product repository: the CRUD contract over product records.
//!
//! ```text
//! operation
//!   ↓
//! 1. Validate input (domain rules in `catalog-products`)
//!   ↓
//! 2. Stamp timestamps from the injected clock
//!   ↓
//! 3. Persist through the store (single atomic store call)
//!   ↓
//! Product | ValidationError | NotFound
//! ```
//!
//! The repository holds no mutable state of its own. Nothing is persisted unless the
//! whole operation succeeds.

use catalog_core::{Clock, DomainError, FieldErrors, ProductId, SystemClock};
use catalog_products::{Product, ProductChanges, ProductFields};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::store::{ProductStore, StoreError, sort_by_name};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No record has the referenced id.
    #[error("product {0} not found")]
    NotFound(ProductId),
    /// A field constraint was violated. Always recoverable with corrected input.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// The backing store failed. Not part of the domain taxonomy.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Field validation only ever yields `Validation`; anything else is reported as a
/// form-wide message.
fn rejected(err: DomainError) -> RepositoryError {
    match err {
        DomainError::Validation(fields) => RepositoryError::Validation(fields),
        other => {
            let mut fields = FieldErrors::new();
            fields.add("__all__", other.to_string());
            RepositoryError::Validation(fields)
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// CRUD access to product records with validation and ordering guarantees.
///
/// ## Generic Parameters
///
/// - `S`: where records live (in-memory or Postgres)
/// - `C`: where `created` / `changed` come from
#[derive(Debug, Clone)]
pub struct ProductRepository<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S> ProductRepository<S, SystemClock>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S, C> ProductRepository<S, C>
where
    S: ProductStore,
    C: Clock,
{
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All records ordered by name ascending. An empty catalog is an empty list.
    #[instrument(skip(self), err)]
    pub async fn list(&self) -> RepositoryResult<Vec<Product>> {
        let mut products = self.store.fetch_all().await?;
        // Stores already order by name; re-sorting keeps the guarantee independent of
        // any store's collation.
        sort_by_name(&mut products);
        debug!(count = products.len(), "listed products");
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn get(&self, id: ProductId) -> RepositoryResult<Product> {
        self.store
            .fetch(id)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: ProductFields) -> RepositoryResult<Product> {
        let new = input.validate().map_err(rejected)?;
        let product = self.store.insert(new, self.clock.now()).await?;
        info!(product_id = %product.id_typed(), name = %product.name(), "product created");
        Ok(product)
    }

    /// Apply the supplied fields. An absent id is reported before any validation.
    #[instrument(skip(self, changes), fields(product_id = %id), err)]
    pub async fn update(&self, id: ProductId, changes: ProductChanges) -> RepositoryResult<Product> {
        let current = self.get(id).await?;
        let changes = changes.validate().map_err(rejected)?;

        let updated = current.with_changes(&changes, self.clock.now());
        if !self.store.replace(&updated).await? {
            // Deleted between the read and the write.
            return Err(RepositoryError::NotFound(id));
        }
        info!(product_id = %id, "product updated");
        Ok(updated)
    }

    /// Permanently remove a record. Deleting the same id twice fails the second time.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        if !self.store.remove(id).await? {
            return Err(RepositoryError::NotFound(id));
        }
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
