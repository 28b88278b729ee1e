use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use catalog_core::{Entity, ProductId};
use catalog_products::{NewProduct, Product};

use super::{ProductStore, StoreError, sort_by_name};

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    records: BTreeMap<ProductId, Product>,
}

/// In-memory product store for tests/dev.
///
/// Identifiers come from a counter that only ever grows, so a deleted id is never
/// handed out again.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<State>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, new: NewProduct, at: DateTime<Utc>) -> Result<Product, StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        state.last_id += 1;
        let id = ProductId::from_raw(state.last_id);
        let product = Product::from_new(id, new, at);
        state.records.insert(id, product.clone());
        Ok(product)
    }

    async fn fetch(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let state = self.inner.read().map_err(poisoned)?;
        Ok(state.records.get(&id).cloned())
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.inner.read().map_err(poisoned)?;
        let mut all: Vec<Product> = state.records.values().cloned().collect();
        sort_by_name(&mut all);
        Ok(all)
    }

    async fn replace(&self, product: &Product) -> Result<bool, StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        match state.records.get_mut(product.id()) {
            Some(slot) => {
                *slot = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        Ok(state.records.remove(&id).is_some())
    }
}
