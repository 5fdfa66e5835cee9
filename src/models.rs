use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// A single catalog entry.
///
/// The `id` is derived from the numeric value of the zero-padded `code`, so
/// it is stable across full-refresh imports of the same catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct Product {
    pub id: i64,
    /// External catalog identifier, zero-padded to 10 digits, unique.
    pub code: String,
    pub description: String,
    /// Non-negative price, rounded to 2 fractional digits.
    pub price: f64,
    /// Unit-of-measure code (e.g. `EA`, `PK`).
    pub unit: String,
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub data: Vec<Product>,
    /// One-based page index this response covers.
    pub page: i64,
    pub per_page: i64,
    /// Total number of stored products across all pages.
    pub total: i64,
}
