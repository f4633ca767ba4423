use anyhow::Result;
use tracing_subscriber::EnvFilter;

use logistics_analytics::cache::QueryCache;
use logistics_analytics::config::Config;
use logistics_analytics::queries::LogisticsQueries;
use logistics_analytics::{db, ingest};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let reset = std::env::args().any(|a| a == "reset");

    let pool = db::init_db_pool(&config).await?;

    if reset {
        tracing::warn!("resetting schema: dropping all tables");
        db::schema::drop_all_tables(&pool).await?;
    }
    db::schema::create_tables(&pool).await?;

    let cache = QueryCache::new();
    let summary = ingest::run_ingestion(&pool, &config, &cache).await?;

    for source in &summary.sources {
        tracing::info!(
            source = %source.load.source,
            seen = source.load.seen,
            accepted = source.load.accepted,
            rejected = source.load.rejected,
            rows_written = source.batch.rows_written,
            failed_ranges = ?source.batch.failed_ranges,
            "source summary"
        );
    }
    tracing::info!(
        orphaned_tracking = summary.data_quality.orphaned_tracking,
        orphaned_costs = summary.data_quality.orphaned_costs,
        orphan_courier_refs = summary.data_quality.orphan_courier_refs,
        "data quality"
    );

    // Quick sanity pass over the headline KPIs after the load.
    let queries = LogisticsQueries::new(pool);
    let total = queries.get_total_shipments().await?;
    let delivered = queries.get_delivered_percentage().await?;
    tracing::info!(total, delivered_percentage = delivered, "store ready");

    Ok(())
}
