//! Infrastructure layer: storage, the product repository, configuration.

pub mod config;
pub mod repository;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;


pub use config::{AppConfig, ConfigError, StoreConfig};
pub use repository::{ProductRepository, RepositoryError, RepositoryResult};
pub use store::{InMemoryProductStore, PostgresProductStore, ProductStore, StoreError};
