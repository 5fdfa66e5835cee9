//! Full-refresh reconciliation of the stored catalog against a feed.
//!
//! A run stages every mutation in memory and writes once: the transaction
//! clears the stored set, valid rows accumulate into an ordered batch deduped
//! by code, and the batch is inserted and committed at the end. Readers never
//! observe a partially imported catalog. On commit the listing cache is
//! invalidated before the run is acknowledged to the caller.

use crate::cache::ListingCache;
use crate::import::normalizer::{RejectReason, normalize_row};
use crate::models::Product;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Upper bound for any single statement issued during a run, so a
/// pathological feed or lock contention cannot hang the request.
const STATEMENT_TIMEOUT: &str = "30s";

/// Run-level failures. Either leaves the stored catalog untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The run could not snapshot or clear the existing catalog. No rows
    /// were processed.
    #[error("failed to clear existing products: {0}")]
    ClearFailed(#[source] sqlx::Error),
    /// Writing or committing the staged batch failed. All staged changes
    /// were rolled back.
    #[error("failed to commit reconciled batch: {0}")]
    CommitFailed(#[source] sqlx::Error),
}

/// One rejected feed line, kept for the caller's diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RowRejection {
    /// 1-based line number within the feed.
    pub line: usize,
    /// The raw line as received.
    pub raw: String,
    pub reason: RejectReason,
}

/// How a run ended. Fatal failures are reported as [`ImportError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ReconcileOutcome {
    /// The staged batch was committed and the cache invalidated.
    Completed,
    /// No valid rows existed; the prior catalog was left untouched.
    NothingProcessed,
}

/// Summary returned for every non-fatal run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub outcome: ReconcileOutcome,
    /// Rows whose code was absent from the catalog before the run.
    pub created: usize,
    /// Rows whose code already existed before the run, plus in-feed
    /// duplicates folded into an already staged row.
    pub updated: usize,
    pub rejected: usize,
    pub rejections: Vec<RowRejection>,
}

/// Drives one reconciliation run. Collaborators are injected; nothing here
/// touches process-wide state.
pub struct Reconciler<'a> {
    pool: &'a PgPool,
    cache: &'a ListingCache,
}

impl<'a> Reconciler<'a> {
    pub fn new(pool: &'a PgPool, cache: &'a ListingCache) -> Self {
        Self { pool, cache }
    }

    /// Replace the stored catalog with the valid rows of `feed`.
    ///
    /// Blank lines are skipped. Row-level rejections are recorded and never
    /// abort the run; only clearing the catalog or committing the batch can
    /// fail, in which case the transaction rolls back and the prior catalog
    /// stays visible.
    pub async fn reconcile(&self, feed: &str) -> Result<ReconciliationReport, ImportError> {
        let mut tx = self.pool.begin().await.map_err(ImportError::ClearFailed)?;

        sqlx::query(&format!("SET LOCAL statement_timeout = '{STATEMENT_TIMEOUT}'"))
            .execute(&mut *tx)
            .await
            .map_err(ImportError::ClearFailed)?;

        // Snapshot the pre-run codes so rows can be classified as created or
        // updated after the full delete.
        let prior_codes: HashSet<String> = sqlx::query_scalar("SELECT code FROM products")
            .fetch_all(&mut *tx)
            .await
            .map_err(ImportError::ClearFailed)?
            .into_iter()
            .collect();

        sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await
            .map_err(ImportError::ClearFailed)?;

        let mut staged: Vec<Product> = Vec::new();
        let mut staged_by_code: HashMap<String, usize> = HashMap::new();
        let mut rejections: Vec<RowRejection> = Vec::new();
        let mut created = 0usize;
        let mut updated = 0usize;

        for (index, line) in feed.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;

            let row = match normalize_row(line) {
                Ok(row) => row,
                Err(reason) => {
                    log::warn!("rejecting feed line {}: {:?}", line_number, reason);
                    rejections.push(RowRejection {
                        line: line_number,
                        raw: line.to_string(),
                        reason,
                    });
                    continue;
                }
            };

            // The id is the numeric value of the code. normalize_row only
            // passes fixed-width digit strings, so this cannot overflow an
            // i64; a parse failure still just rejects the row.
            let id: i64 = match row.code.parse() {
                Ok(id) => id,
                Err(_) => {
                    rejections.push(RowRejection {
                        line: line_number,
                        raw: line.to_string(),
                        reason: RejectReason::MalformedRow,
                    });
                    continue;
                }
            };

            match staged_by_code.get(&row.code) {
                Some(&slot) => {
                    // Later occurrence of a code already in this feed: fold
                    // it into the staged row, identity unchanged.
                    let product = &mut staged[slot];
                    product.description = row.description;
                    product.price = row.price;
                    product.unit = row.unit;
                    updated += 1;
                }
                None => {
                    if prior_codes.contains(&row.code) {
                        updated += 1;
                    } else {
                        created += 1;
                    }
                    staged_by_code.insert(row.code.clone(), staged.len());
                    staged.push(Product {
                        id,
                        code: row.code,
                        description: row.description,
                        price: row.price,
                        unit: row.unit,
                    });
                }
            }
        }

        if staged.is_empty() {
            // Nothing valid to import. Discard the delete too, keeping the
            // prior catalog visible rather than wiping it for a bad feed.
            if let Err(e) = tx.rollback().await {
                log::warn!("rollback after empty batch failed: {}", e);
            }
            log::info!(
                "catalog reconciliation processed nothing: {} rows rejected",
                rejections.len()
            );
            return Ok(ReconciliationReport {
                outcome: ReconcileOutcome::NothingProcessed,
                created: 0,
                updated: 0,
                rejected: rejections.len(),
                rejections,
            });
        }

        for product in &staged {
            sqlx::query(
                r#"INSERT INTO products (id, code, description, price, unit)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(product.id)
            .bind(&product.code)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.unit)
            .execute(&mut *tx)
            .await
            .map_err(ImportError::CommitFailed)?;
        }

        tx.commit().await.map_err(ImportError::CommitFailed)?;

        // Invalidation must happen after commit and before the caller sees
        // the report, so an acknowledged run is never shadowed by stale
        // cached pages.
        self.cache.invalidate_all();

        log::info!(
            "catalog reconciled: {} created, {} updated, {} rejected",
            created,
            updated,
            rejections.len()
        );

        Ok(ReconciliationReport {
            outcome: ReconcileOutcome::Completed,
            created,
            updated,
            rejected: rejections.len(),
            rejections,
        })
    }
}
