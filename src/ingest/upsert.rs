use async_trait::async_trait;
use sqlx::QueryBuilder;

use crate::db::DbPool;
use crate::error::Result;
use crate::models::{Courier, CostRecord, Route, Shipment, TrackingEvent, Warehouse};

/// Writes one batch of records as a single multi-row upsert keyed by the
/// entity's natural identifier. Re-running the same batch is idempotent.
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Record: Send + Sync;

    fn entity(&self) -> &'static str;

    async fn upsert_batch(&self, pool: &DbPool, batch: &[Self::Record]) -> Result<u64>;
}

/// Outcome of loading one record sequence in fixed-size batches.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub entity: &'static str,
    pub rows_written: u64,
    /// Row-offset bounds (start..end, end exclusive) of batches that
    /// failed after one retry. The run continues past them.
    pub failed_ranges: Vec<(usize, usize)>,
}

impl BatchReport {
    pub fn rows_failed(&self) -> usize {
        self.failed_ranges.iter().map(|(s, e)| e - s).sum()
    }
}

/// Partition `records` into `batch_size` groups and upsert each group.
///
/// A failing batch is retried exactly once; if it fails again its
/// row-offset range is recorded and loading continues with the next
/// batch. Committed batches are never affected by a later failure.
pub async fn load_in_batches<S: EntityStore>(
    pool: &DbPool,
    store: &S,
    records: &[S::Record],
    batch_size: usize,
) -> Result<BatchReport> {
    let batch_size = batch_size.max(1);
    let mut report = BatchReport {
        entity: store.entity(),
        rows_written: 0,
        failed_ranges: Vec::new(),
    };

    for (index, batch) in records.chunks(batch_size).enumerate() {
        let start = index * batch_size;
        let end = start + batch.len();

        match store.upsert_batch(pool, batch).await {
            Ok(written) => {
                report.rows_written += written;
                tracing::debug!(entity = store.entity(), start, end, "batch committed");
            }
            Err(first_err) => {
                tracing::warn!(
                    entity = store.entity(),
                    start,
                    end,
                    error = %first_err,
                    "batch failed, retrying once"
                );
                match store.upsert_batch(pool, batch).await {
                    Ok(written) => report.rows_written += written,
                    Err(second_err) => {
                        tracing::error!(
                            entity = store.entity(),
                            start,
                            end,
                            error = %second_err,
                            "batch failed after retry, skipping range"
                        );
                        report.failed_ranges.push((start, end));
                    }
                }
            }
        }
    }

    tracing::info!(
        entity = store.entity(),
        rows_written = report.rows_written,
        failed_ranges = report.failed_ranges.len(),
        "batch load finished"
    );
    Ok(report)
}

pub struct CourierStore;

#[async_trait]
impl EntityStore for CourierStore {
    type Record = Courier;

    fn entity(&self) -> &'static str {
        "couriers"
    }

    async fn upsert_batch(&self, pool: &DbPool, batch: &[Courier]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO courier_staff (courier_id, name, rating, vehicle_type) ",
        );
        qb.push_values(batch, |mut b, c| {
            b.push_bind(&c.courier_id)
                .push_bind(&c.name)
                .push_bind(c.rating)
                .push_bind(&c.vehicle_type);
        });
        qb.push(
            " ON CONFLICT(courier_id) DO UPDATE SET \
             name = excluded.name, rating = excluded.rating, \
             vehicle_type = excluded.vehicle_type",
        );
        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct RouteStore;

#[async_trait]
impl EntityStore for RouteStore {
    type Record = Route;

    fn entity(&self) -> &'static str {
        "routes"
    }

    async fn upsert_batch(&self, pool: &DbPool, batch: &[Route]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO routes (route_id, origin, destination, distance_km, avg_time_hours) ",
        );
        qb.push_values(batch, |mut b, r| {
            b.push_bind(&r.route_id)
                .push_bind(&r.origin)
                .push_bind(&r.destination)
                .push_bind(r.distance_km)
                .push_bind(r.avg_time_hours);
        });
        qb.push(
            " ON CONFLICT(route_id) DO UPDATE SET \
             origin = excluded.origin, destination = excluded.destination, \
             distance_km = excluded.distance_km, avg_time_hours = excluded.avg_time_hours",
        );
        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct WarehouseStore;

#[async_trait]
impl EntityStore for WarehouseStore {
    type Record = Warehouse;

    fn entity(&self) -> &'static str {
        "warehouses"
    }

    async fn upsert_batch(&self, pool: &DbPool, batch: &[Warehouse]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut qb =
            QueryBuilder::new("INSERT INTO warehouses (warehouse_id, city, state, capacity) ");
        qb.push_values(batch, |mut b, w| {
            b.push_bind(&w.warehouse_id)
                .push_bind(&w.city)
                .push_bind(&w.state)
                .push_bind(w.capacity);
        });
        qb.push(
            " ON CONFLICT(warehouse_id) DO UPDATE SET \
             city = excluded.city, state = excluded.state, capacity = excluded.capacity",
        );
        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct ShipmentStore;

#[async_trait]
impl EntityStore for ShipmentStore {
    type Record = Shipment;

    fn entity(&self) -> &'static str {
        "shipments"
    }

    async fn upsert_batch(&self, pool: &DbPool, batch: &[Shipment]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO shipments \
             (shipment_id, order_date, origin, destination, weight, courier_id, status, delivery_date) ",
        );
        qb.push_values(batch, |mut b, s| {
            b.push_bind(&s.shipment_id)
                .push_bind(s.order_date)
                .push_bind(&s.origin)
                .push_bind(&s.destination)
                .push_bind(s.weight)
                .push_bind(&s.courier_id)
                .push_bind(s.status)
                .push_bind(s.delivery_date);
        });
        // Only the lifecycle fields change after creation.
        qb.push(
            " ON CONFLICT(shipment_id) DO UPDATE SET \
             status = excluded.status, delivery_date = excluded.delivery_date",
        );
        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct TrackingStore;

#[async_trait]
impl EntityStore for TrackingStore {
    type Record = TrackingEvent;

    fn entity(&self) -> &'static str {
        "tracking_events"
    }

    async fn upsert_batch(&self, pool: &DbPool, batch: &[TrackingEvent]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO shipment_tracking (tracking_id, shipment_id, status, timestamp) ",
        );
        qb.push_values(batch, |mut b, t| {
            b.push_bind(t.tracking_id)
                .push_bind(&t.shipment_id)
                .push_bind(t.status)
                .push_bind(t.timestamp);
        });
        qb.push(
            " ON CONFLICT(tracking_id) DO UPDATE SET \
             status = excluded.status, timestamp = excluded.timestamp",
        );
        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct CostStore;

#[async_trait]
impl EntityStore for CostStore {
    type Record = CostRecord;

    fn entity(&self) -> &'static str {
        "costs"
    }

    async fn upsert_batch(&self, pool: &DbPool, batch: &[CostRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO costs (shipment_id, fuel_cost, labor_cost, misc_cost) ",
        );
        qb.push_values(batch, |mut b, c| {
            b.push_bind(&c.shipment_id)
                .push_bind(c.fuel_cost)
                .push_bind(c.labor_cost)
                .push_bind(c.misc_cost);
        });
        qb.push(
            " ON CONFLICT(shipment_id) DO UPDATE SET \
             fuel_cost = excluded.fuel_cost, labor_cost = excluded.labor_cost, \
             misc_cost = excluded.misc_cost",
        );
        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}
