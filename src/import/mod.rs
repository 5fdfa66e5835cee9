//! Catalog feed import.
//!
//! The import pipeline has two parts:
//!
//! - **`normalizer`**: turns one raw `;`-delimited feed line into a validated
//!   candidate row or a structured rejection. Pure, no I/O.
//! - **`reconciler`**: drives the normalizer over a whole feed, stages the
//!   resulting batch in memory, replaces the stored catalog in one
//!   transaction, and invalidates the listing cache on success.
//!
//! A run is authoritative for the entire catalog snapshot: it clears the
//! stored set and repopulates it from the current feed, so rows missing from
//! the new feed disappear. Row-level validation failures are recorded and
//! skipped; only clearing or committing the batch can fail a run.

pub mod normalizer;
pub mod reconciler;

pub use normalizer::{CandidateRow, RejectReason, normalize_price, normalize_row};
pub use reconciler::{
    ImportError, ReconcileOutcome, ReconciliationReport, Reconciler, RowRejection,
};

use tokio::sync::{Mutex, MutexGuard};

/// Serializes reconciliation runs.
///
/// Two concurrent runs would interleave destructively (one run's delete
/// racing another's inserts), so the import route holds this lock for the
/// whole run.
#[derive(Default)]
pub struct ImportLock(Mutex<()>);

impl ImportLock {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}
