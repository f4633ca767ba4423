use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::queries::LogisticsQueries;

/// Average delivery performance per (origin, destination) pair. The route
/// columns are optional: a shipment pair may have no route row at all.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoutePerformance {
    pub origin: String,
    pub destination: String,
    pub avg_delivery_days: f64,
    pub num_shipments: i64,
    pub distance_km: Option<f64>,
    pub avg_time_hours: Option<f64>,
}

/// Observed delivery days against the route's expected transit time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RouteDelay {
    pub origin: String,
    pub destination: String,
    pub distance_km: Option<f64>,
    pub avg_delivery_days: f64,
    pub expected_days: Option<f64>,
    pub delay_days: Option<f64>,
    pub num_shipments: i64,
}

impl LogisticsQueries {
    /// Average delivery time per route, slowest first. LEFT JOIN keeps
    /// pairs with no matching route row.
    pub async fn get_route_performance(&self, limit: i64) -> Result<Vec<RoutePerformance>> {
        let rows = sqlx::query_as::<_, RoutePerformance>(
            "SELECT \
                 s.origin, \
                 s.destination, \
                 ROUND(AVG(julianday(s.delivery_date) - julianday(s.order_date)), 2) AS avg_delivery_days, \
                 COUNT(s.shipment_id) AS num_shipments, \
                 r.distance_km, \
                 r.avg_time_hours \
             FROM shipments s \
             LEFT JOIN routes r ON s.origin = r.origin AND s.destination = r.destination \
             WHERE s.status = 'Delivered' AND s.delivery_date IS NOT NULL \
             GROUP BY s.origin, s.destination, r.distance_km, r.avg_time_hours \
             ORDER BY avg_delivery_days DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Most delayed routes: observed delivery days minus the expected
    /// transit time derived from the route's average hours.
    pub async fn get_most_delayed_routes(&self, limit: i64) -> Result<Vec<RouteDelay>> {
        let rows = sqlx::query_as::<_, RouteDelay>(
            "SELECT \
                 s.origin, \
                 s.destination, \
                 r.distance_km, \
                 ROUND(AVG(julianday(s.delivery_date) - julianday(s.order_date)), 2) AS avg_delivery_days, \
                 ROUND(r.avg_time_hours / 24, 2) AS expected_days, \
                 ROUND(AVG(julianday(s.delivery_date) - julianday(s.order_date)) - (r.avg_time_hours / 24), 2) AS delay_days, \
                 COUNT(s.shipment_id) AS num_shipments \
             FROM shipments s \
             LEFT JOIN routes r ON s.origin = r.origin AND s.destination = r.destination \
             WHERE s.status = 'Delivered' AND s.delivery_date IS NOT NULL \
             GROUP BY s.origin, s.destination, r.distance_km, r.avg_time_hours \
             ORDER BY delay_days DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
