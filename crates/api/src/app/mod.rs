//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the shared repository
//! - `routes/`: HTTP routes + handlers (pages, admin, static assets, system)
//! - `dto.rs`: form/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use catalog_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router_with(services, &config.static_url))
}

/// Router over already-built services.
pub fn router_with(services: services::AppServices, static_url: &str) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(static_url))
        .layer(Extension(Arc::new(services)))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_tracing_middleware)),
        )
}
