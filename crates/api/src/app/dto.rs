use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{FieldErrors, ProductId};
use catalog_products::{Price, PriceInput, Product, ProductFields};

// -------------------------
// Request DTOs
// -------------------------

/// Query string of the list page; `message` carries the outcome of the last write.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub message: Option<String>,
}

/// Urlencoded product form. Every field arrives as text; missing fields are empty.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price().to_string(),
        }
    }

    /// The submitted text as product input; validation happens in the repository.
    pub fn to_fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            description: self.description.clone(),
            price: PriceInput::from(self.price.as_str()),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
    pub url: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id_typed(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price(),
            created: product.created(),
            changed: product.changed(),
            url: product.absolute_url(),
        }
    }
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::to_value(ProductView::from(product)).unwrap_or(serde_json::Value::Null)
}

pub fn product_list_to_json(products: &[Product], message: Option<String>) -> serde_json::Value {
    serde_json::json!({
        "items": products.iter().map(ProductView::from).collect::<Vec<_>>(),
        "message": message,
    })
}

/// A form as presented to the user: where it posts, what it holds, what is wrong.
#[derive(Debug, Serialize)]
pub struct FormDocument {
    pub action: String,
    pub values: ProductForm,
    pub errors: FieldErrors,
}

pub fn form_to_json(action: impl Into<String>, values: ProductForm, errors: FieldErrors) -> serde_json::Value {
    serde_json::json!({
        "form": FormDocument {
            action: action.into(),
            values,
            errors,
        }
    })
}

pub fn delete_confirmation_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "confirm_delete": {
            "action": format!("/delete/{}", product.id_typed()),
            "product": ProductView::from(product),
        }
    })
}
