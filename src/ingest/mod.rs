use std::path::Path;

use serde::Serialize;

use crate::cache::QueryCache;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::Result;

pub mod loader;
pub mod upsert;

pub use loader::{LoadOutcome, LoadReport, RejectReason};
pub use upsert::{
    BatchReport, CostStore, CourierStore, EntityStore, RouteStore, ShipmentStore, TrackingStore,
    WarehouseStore, load_in_batches,
};

/// Per-source accounting: what the loader saw and what the upserter wrote.
#[derive(Debug)]
pub struct SourceSummary {
    pub load: LoadReport,
    pub batch: BatchReport,
}

/// Post-load referential checks. Orphan courier references are tolerated
/// by the loader and reported here as a data-quality warning.
#[derive(Debug, Clone, Serialize)]
pub struct DataQualityReport {
    pub orphaned_tracking: i64,
    pub orphaned_costs: i64,
    pub orphan_courier_refs: i64,
}

/// Aggregated result of one ingestion run. Nothing is silently swallowed:
/// every rejected record and failed batch range shows up here.
#[derive(Debug)]
pub struct IngestSummary {
    pub sources: Vec<SourceSummary>,
    pub data_quality: DataQualityReport,
}

impl IngestSummary {
    pub fn total_accepted(&self) -> u64 {
        self.sources.iter().map(|s| s.load.accepted).sum()
    }

    pub fn total_rejected(&self) -> u64 {
        self.sources.iter().map(|s| s.load.rejected).sum()
    }

    pub fn total_failed_rows(&self) -> usize {
        self.sources.iter().map(|s| s.batch.rows_failed()).sum()
    }
}

/// Run the full ingestion pipeline against the configured data directory.
///
/// Reference tables (couriers, routes, warehouses) load before the tables
/// that depend on them, so foreign-key checks on tracking events and cost
/// records see their shipments already in place. The query cache is
/// invalidated at the end of the run.
pub async fn run_ingestion(
    pool: &DbPool,
    config: &Config,
    cache: &QueryCache,
) -> Result<IngestSummary> {
    tracing::info!(data_dir = %config.data_dir, batch_size = config.batch_size, "starting ingestion");

    let batch_size = config.batch_size;
    let mut sources = Vec::with_capacity(6);

    let couriers = loader::load_couriers(Path::new(&config.source_path("courier_staff.csv")))?;
    sources.push(SourceSummary {
        batch: load_in_batches(pool, &CourierStore, &couriers.records, batch_size).await?,
        load: couriers.report,
    });

    let routes = loader::load_routes(Path::new(&config.source_path("routes.csv")))?;
    sources.push(SourceSummary {
        batch: load_in_batches(pool, &RouteStore, &routes.records, batch_size).await?,
        load: routes.report,
    });

    let warehouses = loader::load_warehouses(Path::new(&config.source_path("warehouses.json")))?;
    sources.push(SourceSummary {
        batch: load_in_batches(pool, &WarehouseStore, &warehouses.records, batch_size).await?,
        load: warehouses.report,
    });

    let shipments = loader::load_shipments(Path::new(&config.source_path("shipments.json")))?;
    sources.push(SourceSummary {
        batch: load_in_batches(pool, &ShipmentStore, &shipments.records, batch_size).await?,
        load: shipments.report,
    });

    let costs = loader::load_costs(Path::new(&config.source_path("costs.csv")))?;
    sources.push(SourceSummary {
        batch: load_in_batches(pool, &CostStore, &costs.records, batch_size).await?,
        load: costs.report,
    });

    let tracking =
        loader::load_tracking_events(Path::new(&config.source_path("shipment_tracking.csv")))?;
    sources.push(SourceSummary {
        batch: load_in_batches(pool, &TrackingStore, &tracking.records, batch_size).await?,
        load: tracking.report,
    });

    let data_quality = check_data_quality(pool).await?;

    cache.invalidate_all();

    let summary = IngestSummary {
        sources,
        data_quality,
    };
    tracing::info!(
        accepted = summary.total_accepted(),
        rejected = summary.total_rejected(),
        failed_rows = summary.total_failed_rows(),
        "ingestion finished"
    );
    Ok(summary)
}

/// Count rows violating the soft referential expectations.
///
/// Tracking and cost orphans should be zero when foreign keys held during
/// the load; orphan courier references are expected in real source data.
pub async fn check_data_quality(pool: &DbPool) -> Result<DataQualityReport> {
    let (orphaned_tracking,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM shipment_tracking st \
         WHERE NOT EXISTS (SELECT 1 FROM shipments s WHERE s.shipment_id = st.shipment_id)",
    )
    .fetch_one(pool)
    .await?;

    let (orphaned_costs,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM costs c \
         WHERE NOT EXISTS (SELECT 1 FROM shipments s WHERE s.shipment_id = c.shipment_id)",
    )
    .fetch_one(pool)
    .await?;

    let (orphan_courier_refs,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM shipments s \
         WHERE s.courier_id IS NOT NULL \
         AND NOT EXISTS (SELECT 1 FROM courier_staff c WHERE c.courier_id = s.courier_id)",
    )
    .fetch_one(pool)
    .await?;

    if orphan_courier_refs > 0 {
        tracing::warn!(orphan_courier_refs, "shipments reference unknown couriers");
    }

    Ok(DataQualityReport {
        orphaned_tracking,
        orphaned_costs,
        orphan_courier_refs,
    })
}
