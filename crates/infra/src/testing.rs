//! Shared fixtures and test doubles.
//!
//! Compiled for this crate's own tests and, behind the `test-support` feature, for
//! other crates' tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use catalog_core::{Clock, ProductId};
use catalog_products::{NewProduct, Product, ProductFields};

use crate::repository::ProductRepository;
use crate::store::{ProductStore, StoreError};

/// A generic, valid product.
pub fn sample_product_fields() -> ProductFields {
    ProductFields {
        name: "Test Product".to_string(),
        description: "A test product description".to_string(),
        price: "29.99".into(),
    }
}

/// Widget / "A widget" / 9.99.
pub fn widget_fields() -> ProductFields {
    ProductFields {
        name: "Widget".to_string(),
        description: "A widget".to_string(),
        price: "9.99".into(),
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn current(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = match self.now.lock() {
            Ok(now) => now,
            Err(poisoned) => poisoned.into_inner(),
        };
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // 2024-01-01T12:00:00Z
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_704_110_400))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current()
    }
}

/// Store whose backend is always down.
#[derive(Debug, Default, Copy, Clone)]
pub struct UnavailableStore;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait::async_trait]
impl ProductStore for UnavailableStore {
    async fn insert(&self, _new: NewProduct, _at: DateTime<Utc>) -> Result<Product, StoreError> {
        Err(down())
    }

    async fn fetch(&self, _id: ProductId) -> Result<Option<Product>, StoreError> {
        Err(down())
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        Err(down())
    }

    async fn replace(&self, _product: &Product) -> Result<bool, StoreError> {
        Err(down())
    }

    async fn remove(&self, _id: ProductId) -> Result<bool, StoreError> {
        Err(down())
    }
}

/// Repository over `store`, pre-populated with the given products.
pub async fn seeded_repository<S: ProductStore>(
    store: S,
    products: impl IntoIterator<Item = ProductFields>,
) -> ProductRepository<S> {
    let repo = ProductRepository::new(store);
    for fields in products {
        if let Err(e) = repo.create(fields).await {
            panic!("seed product rejected: {e}");
        }
    }
    repo
}
