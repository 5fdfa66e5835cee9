//! Query parameter helpers for the listing endpoint.
//!
//! Typed `FromForm` parsing for URL query strings, deriving `JsonSchema` so
//! the generated OpenAPI document reflects the parameters and their defaults.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    1
}

const fn default_per_page() -> i64 {
    10
}

const MAX_PER_PAGE: i64 = 100;

/// Pagination parameters accepted by the product listing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// One-based page index (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page (clamped between 1 and 100, default 10).
    #[field(default = 10)]
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Normalized 1-based page index.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Normalized page size capped at [`MAX_PER_PAGE`].
    pub fn per_page(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}
