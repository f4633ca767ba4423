use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::queries::LogisticsQueries;

/// Shipment traffic originating in each warehouse city, relative to the
/// warehouse capacity.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseUtilization {
    pub warehouse_id: String,
    pub city: String,
    pub state: Option<String>,
    pub capacity: i64,
    pub num_shipments: i64,
    pub utilization_rate: f64,
}

/// Traffic through each warehouse city: distinct shipments, distinct
/// couriers seen, and the average shipment weight.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseTraffic {
    pub city: String,
    pub state: Option<String>,
    pub num_shipments: i64,
    pub num_couriers: i64,
    pub avg_weight: Option<f64>,
    pub capacity: i64,
}

impl LogisticsQueries {
    pub async fn get_warehouse_utilization(&self, limit: i64) -> Result<Vec<WarehouseUtilization>> {
        let rows = sqlx::query_as::<_, WarehouseUtilization>(
            "SELECT \
                 w.warehouse_id, \
                 w.city, \
                 w.state, \
                 w.capacity, \
                 COUNT(s.shipment_id) AS num_shipments, \
                 ROUND(COUNT(s.shipment_id) * 100.0 / w.capacity, 2) AS utilization_rate \
             FROM warehouses w \
             LEFT JOIN shipments s ON w.city = s.origin \
             GROUP BY w.warehouse_id, w.city, w.state, w.capacity \
             ORDER BY utilization_rate DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Busiest warehouse cities by distinct shipment count.
    pub async fn get_high_traffic_warehouses(&self, limit: i64) -> Result<Vec<WarehouseTraffic>> {
        let rows = sqlx::query_as::<_, WarehouseTraffic>(
            "SELECT \
                 w.city, \
                 w.state, \
                 COUNT(DISTINCT s.shipment_id) AS num_shipments, \
                 COUNT(DISTINCT s.courier_id) AS num_couriers, \
                 ROUND(AVG(s.weight), 2) AS avg_weight, \
                 w.capacity \
             FROM warehouses w \
             LEFT JOIN shipments s ON w.city = s.origin \
             GROUP BY w.city, w.state, w.capacity \
             ORDER BY num_shipments DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
