use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::{AppError, Result};
use crate::models::{CostRecord, Shipment, ShipmentStatus, TrackingEvent};
use crate::queries::LogisticsQueries;

pub const DEFAULT_FILTER_LIMIT: i64 = 1000;

/// One shipment with its cost total (if a cost row exists) and the full
/// tracking history, oldest event first.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentDetails {
    pub shipment: Shipment,
    pub total_cost: Option<f64>,
    pub tracking: Vec<TrackingEvent>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourierRef {
    pub courier_id: String,
    pub name: String,
}

/// AND-composed shipment predicates; an omitted field imposes no
/// constraint. Construct directly from typed values, or go through
/// [`ShipmentFilter::parse`] to validate raw dashboard input.
#[derive(Debug, Clone)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub courier_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
}

impl Default for ShipmentFilter {
    fn default() -> Self {
        Self {
            status: None,
            origin: None,
            destination: None,
            courier_id: None,
            start_date: None,
            end_date: None,
            limit: DEFAULT_FILTER_LIMIT,
        }
    }
}

impl ShipmentFilter {
    /// Validate raw filter strings. A malformed date or unknown status is
    /// a validation error, which callers must keep distinct from a query
    /// that simply matches zero rows.
    pub fn parse(
        status: Option<&str>,
        origin: Option<&str>,
        destination: Option<&str>,
        courier_id: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self> {
        let status = status
            .map(ShipmentStatus::from_str)
            .transpose()?;
        let start_date = start_date.map(parse_filter_date).transpose()?;
        let end_date = end_date.map(parse_filter_date).transpose()?;

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::Validation(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }

        Ok(Self {
            status,
            origin: origin.map(str::to_string),
            destination: destination.map(str::to_string),
            courier_id: courier_id.map(str::to_string),
            start_date,
            end_date,
            limit: DEFAULT_FILTER_LIMIT,
        })
    }
}

fn parse_filter_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("unparsable date filter: {s:?}")))
}

impl LogisticsQueries {
    /// Look up one shipment by its natural identifier. An unknown id
    /// returns Ok(None), not an error.
    pub async fn search_shipment(&self, shipment_id: &str) -> Result<Option<ShipmentDetails>> {
        let shipment = sqlx::query_as::<_, Shipment>(
            "SELECT shipment_id, order_date, origin, destination, weight, courier_id, \
                    status, delivery_date \
             FROM shipments WHERE shipment_id = ?",
        )
        .bind(shipment_id)
        .fetch_optional(self.pool())
        .await?;

        let Some(shipment) = shipment else {
            return Ok(None);
        };

        let total_cost = sqlx::query_as::<_, CostRecord>(
            "SELECT shipment_id, fuel_cost, labor_cost, misc_cost \
             FROM costs WHERE shipment_id = ?",
        )
        .bind(shipment_id)
        .fetch_optional(self.pool())
        .await?
        .map(|c| c.total());

        let tracking = self.get_tracking_history(shipment_id).await?;

        Ok(Some(ShipmentDetails {
            shipment,
            total_cost,
            tracking,
        }))
    }

    /// Complete tracking history for a shipment, timestamp ascending.
    pub async fn get_tracking_history(&self, shipment_id: &str) -> Result<Vec<TrackingEvent>> {
        let events = sqlx::query_as::<_, TrackingEvent>(
            "SELECT tracking_id, shipment_id, status, timestamp \
             FROM shipment_tracking \
             WHERE shipment_id = ? \
             ORDER BY timestamp ASC",
        )
        .bind(shipment_id)
        .fetch_all(self.pool())
        .await?;
        Ok(events)
    }

    /// Filter shipments by AND-composing every supplied predicate.
    pub async fn filter_shipments(&self, filter: &ShipmentFilter) -> Result<Vec<Shipment>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT shipment_id, order_date, origin, destination, weight, courier_id, \
                    status, delivery_date \
             FROM shipments WHERE 1=1",
        );

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(origin) = &filter.origin {
            qb.push(" AND origin = ").push_bind(origin);
        }
        if let Some(destination) = &filter.destination {
            qb.push(" AND destination = ").push_bind(destination);
        }
        if let Some(courier_id) = &filter.courier_id {
            qb.push(" AND courier_id = ").push_bind(courier_id);
        }
        if let Some(start) = filter.start_date {
            qb.push(" AND order_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND order_date <= ").push_bind(end);
        }

        qb.push(" ORDER BY order_date, shipment_id LIMIT ")
            .push_bind(filter.limit);

        let rows = qb
            .build_query_as::<Shipment>()
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    // Dimension lookups that feed the dashboard's filter dropdowns.

    pub async fn get_unique_origins(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT origin FROM shipments ORDER BY origin")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(o,)| o).collect())
    }

    pub async fn get_unique_destinations(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT destination FROM shipments ORDER BY destination")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }

    pub async fn get_shipment_statuses(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT status FROM shipments ORDER BY status")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    pub async fn get_couriers(&self) -> Result<Vec<CourierRef>> {
        let rows = sqlx::query_as::<_, CourierRef>(
            "SELECT courier_id, name FROM courier_staff ORDER BY name",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
