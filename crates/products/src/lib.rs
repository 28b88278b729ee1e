//! Products domain module.
//!
//! This crate contains the business rules for the product catalog, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod price;
pub mod product;

pub use price::{PRICE_DECIMAL_PLACES, PRICE_MAX_DIGITS, Price, PriceInput};
pub use product::{
    NAME_MAX_CHARS, NewProduct, Product, ProductChanges, ProductFields, ValidatedChanges,
    validate_description, validate_name,
};
