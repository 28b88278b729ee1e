//! Catalog pages: one dispatch table mapping route and method onto the five
//! repository operations.
//!
//! Successful writes redirect to the list page with an outcome message; invalid
//! forms are presented again with their values and field errors.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use catalog_core::{FieldErrors, ProductId};
use catalog_infra::RepositoryError;
use catalog_products::ProductChanges;

use crate::app::dto::{self, ListQuery, ProductForm};
use crate::app::errors;
use crate::app::services::AppServices;

pub const CREATED_REDIRECT: &str = "/?message=Product%20successfully%20created!";
pub const UPDATED_REDIRECT: &str = "/?message=Product%20successfully%20updated!";
pub const DELETED_REDIRECT: &str = "/?message=Product%20successfully%20deleted!";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/view/:id", get(view_product))
        .route("/new", get(new_product_form).post(create_product))
        .route("/edit/:id", get(edit_product_form).post(update_product))
        .route("/delete/:id", get(confirm_delete_product).post(delete_product))
}

/// Ids are positive integers; anything else matches no record.
fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::not_found(format!("no product at {raw}")))
}

fn redirect(location: &'static str) -> axum::response::Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn invalid_form(action: String, values: ProductForm, errors: FieldErrors) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(dto::form_to_json(action, values, errors)),
    )
        .into_response()
}

/// Validation failures re-present the form; everything else maps as usual.
fn form_error(err: RepositoryError, action: String, values: ProductForm) -> axum::response::Response {
    match err {
        RepositoryError::Validation(fields) => invalid_form(action, values, fields),
        other => errors::repository_error_to_response(other),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services.products.list().await {
        Ok(products) => Json(dto::product_list_to_json(&products, query.message)).into_response(),
        Err(e) => errors::repository_error_to_response(e),
    }
}

pub async fn view_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.get(id).await {
        Ok(product) => Json(dto::product_to_json(&product)).into_response(),
        Err(e) => errors::repository_error_to_response(e),
    }
}

pub async fn new_product_form() -> axum::response::Response {
    Json(dto::form_to_json("/new", ProductForm::default(), FieldErrors::new())).into_response()
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<ProductForm>,
) -> axum::response::Response {
    match services.products.create(form.to_fields()).await {
        Ok(_) => redirect(CREATED_REDIRECT),
        Err(e) => form_error(e, "/new".to_string(), form),
    }
}

pub async fn edit_product_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.get(id).await {
        Ok(product) => Json(dto::form_to_json(
            format!("/edit/{id}"),
            ProductForm::from_product(&product),
            FieldErrors::new(),
        ))
        .into_response(),
        Err(e) => errors::repository_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    // The repository reports a missing record before it validates the form.
    match services.products.update(id, ProductChanges::from(form.to_fields())).await {
        Ok(_) => redirect(UPDATED_REDIRECT),
        Err(e) => form_error(e, format!("/edit/{id}"), form),
    }
}

pub async fn confirm_delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.get(id).await {
        Ok(product) => Json(dto::delete_confirmation_to_json(&product)).into_response(),
        Err(e) => errors::repository_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.delete(id).await {
        Ok(()) => redirect(DELETED_REDIRECT),
        Err(e) => errors::repository_error_to_response(e),
    }
}
