use axum::Router;

pub mod admin;
pub mod products;
pub mod static_files;
pub mod system;

/// Router for catalog pages, the admin surface and static assets.
pub fn router(static_url: &str) -> Router {
    Router::new()
        .merge(products::router())
        .nest("/admin", admin::router())
        .nest(static_url, static_files::router())
}
