//! Catalog and account records.
//!
//! These mirror the rows of the `products` and `categories` tables and the
//! user objects of the auth provider. Field names follow the column names, so
//! the structs deserialize straight from REST responses.

use serde::{Deserialize, Deserializer};

pub mod category;
pub mod product;
pub mod user;

pub use category::{Category, CategoryPatch, NewCategory};
pub use product::{NewProduct, Product, ProductPatch};
pub use user::{NewUser, User, UserFilters, UserPatch};

/// Deserialize a nullable column, mapping `null` to the type's default.
///
/// `#[serde(default)]` alone only covers a missing key; REST responses send
/// `NULL` columns as an explicit `null`.
///
/// # Errors
///
/// Returns the deserializer's error if the value is neither `null` nor a `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
