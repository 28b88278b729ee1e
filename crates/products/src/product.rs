use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Entity, FieldErrors, ProductId};

use crate::price::{Price, PriceInput};

/// Maximum length of a product name, in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// A catalog product record.
///
/// Only the store constructs these (on insert or when loading); every other change
/// goes through [`Product::with_changes`], which keeps `created` fixed and moves
/// `changed` strictly forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Price,
    created: DateTime<Utc>,
    changed: DateTime<Utc>,
}

impl Product {
    /// Materialize a freshly inserted record: `created == changed == at`.
    pub fn from_new(id: ProductId, new: NewProduct, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            created: at,
            changed: at,
        }
    }

    /// Rebuild a record loaded from storage.
    pub fn restore(
        id: ProductId,
        name: String,
        description: String,
        price: Price,
        created: DateTime<Utc>,
        changed: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            price,
            created,
            changed,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn changed(&self) -> DateTime<Utc> {
        self.changed
    }

    /// Canonical location of a product: its edit page.
    pub fn absolute_url(&self) -> String {
        format!("/edit/{}", self.id)
    }

    /// Return the updated record. `self` is left untouched so a failed write leaves
    /// nothing half-applied.
    ///
    /// `changed` becomes `now`, or one microsecond past the previous value when the
    /// clock has not moved forward.
    pub fn with_changes(&self, changes: &ValidatedChanges, now: DateTime<Utc>) -> Self {
        let floor = self.changed + Duration::microseconds(1);
        let mut next = self.clone();
        if let Some(name) = &changes.name {
            next.name = name.clone();
        }
        if let Some(description) = &changes.description {
            next.description = description.clone();
        }
        if let Some(price) = changes.price {
            next.price = price;
        }
        next.changed = if now > floor { now } else { floor };
        next
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Raw input for creating (or fully replacing) a product.
///
/// Missing fields deserialize as empty so they are reported as required fields
/// rather than as malformed input.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: PriceInput,
}

impl ProductFields {
    /// Check every field, reporting all violations together.
    pub fn validate(self) -> DomainResult<NewProduct> {
        let mut errors = FieldErrors::new();
        let name = collect(validate_name(&self.name), &mut errors);
        let description = collect(validate_description(&self.description), &mut errors);
        let price = collect(self.price.parse(), &mut errors);

        match (name, description, price) {
            (Some(name), Some(description), Some(price)) => Ok(NewProduct {
                name,
                description,
                price,
            }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

/// Validated create input, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    name: String,
    description: String,
    price: Price,
}

impl NewProduct {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Price {
        self.price
    }
}

/// Raw input for updating a product. Absent fields are left as they are.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
}

impl ProductChanges {
    pub fn validate(self) -> DomainResult<ValidatedChanges> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .map(|n| collect(validate_name(&n), &mut errors));
        let description = self
            .description
            .map(|d| collect(validate_description(&d), &mut errors));
        let price = self.price.map(|p| collect(p.parse(), &mut errors));
        errors.into_result()?;

        Ok(ValidatedChanges {
            name: name.flatten(),
            description: description.flatten(),
            price: price.flatten(),
        })
    }
}

impl From<ProductFields> for ProductChanges {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: Some(fields.name),
            description: Some(fields.description),
            price: Some(fields.price),
        }
    }
}

/// Validated update input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidatedChanges {
    name: Option<String>,
    description: Option<String>,
    price: Option<Price>,
}

const NULL_CHARACTERS: &str = "Null characters are not allowed.";

/// Trim and check a product name: required, at most [`NAME_MAX_CHARS`] characters,
/// no NUL characters.
pub fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::field("name", "This field is required."));
    }

    let mut errors = FieldErrors::new();
    let len = name.chars().count();
    if len > NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("Ensure this value has at most {NAME_MAX_CHARS} characters (it has {len})."),
        );
    }
    if name.contains('\0') {
        errors.add("name", NULL_CHARACTERS);
    }
    errors.into_result()?;
    Ok(name.to_string())
}

/// Descriptions are free text and may be empty, but text columns cannot hold NUL.
pub fn validate_description(raw: &str) -> DomainResult<String> {
    if raw.contains('\0') {
        return Err(DomainError::field("description", NULL_CHARACTERS));
    }
    Ok(raw.to_string())
}

fn collect<T>(result: DomainResult<T>, errors: &mut FieldErrors) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(DomainError::Validation(fields)) => {
            errors.merge(fields);
            None
        }
        Err(other) => {
            errors.add("__all__", other.to_string());
            None
        }
    }
}
