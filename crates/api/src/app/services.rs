//! Infrastructure wiring: picks the product store from configuration and hands the
//! handlers a ready repository.

use std::path::PathBuf;
use std::sync::Arc;

use catalog_infra::{
    AppConfig, InMemoryProductStore, PostgresProductStore, ProductRepository, ProductStore,
    StoreConfig, StoreError,
};

/// Repository type shared by every handler: the store is chosen at startup.
pub type Products = ProductRepository<Arc<dyn ProductStore>>;

/// Everything handlers need, shared behind an `Arc` extension.
#[derive(Clone)]
pub struct AppServices {
    pub products: Products,
    /// Directory static assets are read from.
    pub static_root: PathBuf,
}

impl AppServices {
    pub fn new(products: Products, static_root: impl Into<PathBuf>) -> Self {
        Self {
            products,
            static_root: static_root.into(),
        }
    }

    /// Wrap any store (tests use doubles here).
    pub fn with_store(store: impl ProductStore + 'static, static_root: impl Into<PathBuf>) -> Self {
        let store: Arc<dyn ProductStore> = Arc::new(store);
        Self::new(ProductRepository::new(store), static_root)
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    match &config.store {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory product store");
            Ok(build_in_memory_services(config))
        }
        StoreConfig::Postgres { database_url } => build_persistent_services(config, database_url).await,
    }
}

fn build_in_memory_services(config: &AppConfig) -> AppServices {
    AppServices::with_store(InMemoryProductStore::new(), config.static_root.clone())
}

async fn build_persistent_services(
    config: &AppConfig,
    database_url: &str,
) -> Result<AppServices, StoreError> {
    let store = PostgresProductStore::connect(database_url).await?;
    tracing::info!("using postgres product store");
    Ok(AppServices::with_store(store, config.static_root.clone()))
}
