//! Postgres-backed product store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database / PoolClosed / Io / other | `Unavailable` |
//! | Row decode failure, out-of-precision price | `Corrupt` |
//!
//! ## Identifiers
//!
//! `id` is a `BIGSERIAL`; Postgres sequences never hand out a value twice, even
//! after the row holding it is deleted.
//!
//! ## Ordering
//!
//! Listing orders by `name COLLATE "C"` so the database agrees with the byte-wise
//! ordering used by the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use catalog_core::ProductId;
use catalog_products::{NewProduct, Price, Product};

use super::{ProductStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id          BIGSERIAL PRIMARY KEY,
    name        VARCHAR(100) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price       NUMERIC(8, 2) NOT NULL,
    created     TIMESTAMPTZ NOT NULL,
    changed     TIMESTAMPTZ NOT NULL,
    CHECK (created <= changed)
)
"#;

/// Postgres-backed product store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`. Each operation is a single
/// statement, so atomicity comes from Postgres itself.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the `products` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the `products` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    created: DateTime<Utc>,
    changed: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price)
            .map_err(|e| StoreError::Corrupt(format!("product {}: {e}", row.id)))?;
        Ok(Product::restore(
            ProductId::from_raw(row.id),
            row.name,
            row.description,
            price,
            row.created,
            row.changed,
        ))
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, new), fields(name = %new.name()), err)]
    async fn insert(&self, new: NewProduct, at: DateTime<Utc>) -> Result<Product, StoreError> {
        let row: ProductRow = sqlx::query_as(
            r#"
            INSERT INTO products (name, description, price, created, changed)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, name, description, price, created, changed
            "#,
        )
        .bind(new.name())
        .bind(new.description())
        .bind(new.price().amount())
        .bind(at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        row.try_into()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn fetch(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, price, created, changed
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch", e))?;

        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, price, created, changed
            FROM products
            ORDER BY name COLLATE "C" ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_all", e))?;

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id_typed()), err)]
    async fn replace(&self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, changed = $5
            WHERE id = $1
            "#,
        )
        .bind(product.id_typed().as_i64())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price().amount())
        .bind(product.changed())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("replace", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn remove(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove", e))?;

        Ok(result.rows_affected() == 1)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("failed to decode row in {}: {}", operation, err))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
