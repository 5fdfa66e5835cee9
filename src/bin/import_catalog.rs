use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use catalog_server::cache::ListingCache;
use catalog_server::import::{ReconcileOutcome, Reconciler};

#[derive(Parser, Debug)]
#[command(
    name = "import_catalog",
    about = "Reconcile a semicolon-delimited catalog feed against the product database"
)]
struct Args {
    /// Path to the feed file (one `code;description;price;unit` record per line).
    feed: PathBuf,

    /// Print each rejected line instead of only the counts.
    #[arg(long)]
    verbose_rejections: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let feed = std::fs::read_to_string(&args.feed)?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    catalog_server::db::run_migrations(&pool).await?;

    // The CLI owns its own cache instance; nothing reads it here, but the
    // reconciler contract requires one to invalidate.
    let cache = ListingCache::new();
    let report = Reconciler::new(&pool, &cache).reconcile(&feed).await?;

    match report.outcome {
        ReconcileOutcome::Completed => {
            println!(
                "catalog reconciled: {} created, {} updated, {} rejected",
                report.created, report.updated, report.rejected
            );
        }
        ReconcileOutcome::NothingProcessed => {
            writeln!(
                io::stderr(),
                "no valid rows in '{}'; catalog left untouched ({} rejected)",
                args.feed.display(),
                report.rejected
            )?;
        }
    }

    if args.verbose_rejections {
        for rejection in &report.rejections {
            writeln!(
                io::stderr(),
                "line {}: {:?}: {}",
                rejection.line,
                rejection.reason,
                rejection.raw
            )?;
        }
    }

    Ok(())
}
