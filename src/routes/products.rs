//! Product listing and catalog import endpoints.

use crate::cache::{ListingCache, ListingKey};
use crate::error::ApiError;
use crate::import::{ImportLock, ReconciliationReport, Reconciler};
use crate::models::{Product, ProductPage};
use crate::routes::params::PaginationParams;
use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;

/// Paginated product listing.
///
/// Pages are served from the listing cache when a fresh entry exists for the
/// exact pagination parameters; otherwise the page is read from storage and
/// cached for subsequent requests.
#[openapi(tag = "Products")]
#[get("/products?<params..>")]
pub async fn list_products(
    params: PaginationParams,
    pool: &State<PgPool>,
    cache: &State<ListingCache>,
) -> Result<Json<ProductPage>, ApiError> {
    let key = ListingKey {
        page: params.page(),
        per_page: params.per_page(),
    };
    // Capture before reading storage so a page fetched while an import was
    // committing cannot be cached over the import's invalidation.
    let generation = cache.generation();

    if let Some(cached) = cache.get(&key) {
        log::debug!(
            "listing cache hit: page {} per_page {}",
            key.page,
            key.per_page
        );
        return Ok(Json(cached));
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool.inner())
        .await?;

    let products: Vec<Product> = sqlx::query_as(
        r#"SELECT id, code, description, price, unit
           FROM products
           ORDER BY code ASC
           LIMIT $1 OFFSET $2"#,
    )
    .bind(key.per_page)
    .bind(params.offset())
    .fetch_all(pool.inner())
    .await?;

    let listing = ProductPage {
        data: products,
        page: key.page,
        per_page: key.per_page,
        total,
    };
    cache.insert_at(key, listing.clone(), generation);

    Ok(Json(listing))
}

/// Import a catalog feed, replacing the stored product set.
///
/// The body is the raw `;`-delimited feed, one record per line, no header.
/// Runs are serialized through the import lock; the response summarizes
/// created/updated counts and any rejected lines. Run-level failures
/// (clearing or committing) surface as a single error and leave the prior
/// catalog untouched.
#[openapi(tag = "Products")]
#[post("/products/import", data = "<feed>")]
pub async fn import_catalog(
    feed: String,
    pool: &State<PgPool>,
    cache: &State<ListingCache>,
    lock: &State<ImportLock>,
) -> Result<Json<ReconciliationReport>, ApiError> {
    let _guard = lock.acquire().await;

    let report = Reconciler::new(pool.inner(), cache.inner())
        .reconcile(&feed)
        .await?;

    Ok(Json(report))
}
