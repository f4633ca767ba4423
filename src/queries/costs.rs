use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::queries::LogisticsQueries;

/// Aggregate costs per (origin, destination) pair.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RouteCost {
    pub origin: String,
    pub destination: String,
    pub total_fuel_cost: f64,
    pub total_labor_cost: f64,
    pub total_misc_cost: f64,
    pub total_cost: f64,
    pub num_shipments: i64,
    pub avg_cost_per_shipment: f64,
}

/// Overall cost component totals, input to the cost-pattern breakdown.
#[derive(Debug, Clone, Copy, Default, Serialize, FromRow)]
pub struct CostTotals {
    pub fuel_total: f64,
    pub labor_total: f64,
    pub misc_total: f64,
}

/// Per-shipment cost detail with every component broken out.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShipmentCost {
    pub shipment_id: String,
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    pub fuel_cost: f64,
    pub labor_cost: f64,
    pub misc_cost: f64,
    pub total_cost: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HighCostShipment {
    pub shipment_id: String,
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    pub total_cost: f64,
    /// Null when weight is zero in legacy rows.
    pub cost_per_kg: Option<f64>,
    pub status: String,
}

impl LogisticsQueries {
    pub async fn get_cost_per_route(&self, limit: i64) -> Result<Vec<RouteCost>> {
        let rows = sqlx::query_as::<_, RouteCost>(
            "SELECT \
                 s.origin, \
                 s.destination, \
                 ROUND(SUM(c.fuel_cost), 2) AS total_fuel_cost, \
                 ROUND(SUM(c.labor_cost), 2) AS total_labor_cost, \
                 ROUND(SUM(c.misc_cost), 2) AS total_misc_cost, \
                 ROUND(SUM(c.fuel_cost + c.labor_cost + c.misc_cost), 2) AS total_cost, \
                 COUNT(c.shipment_id) AS num_shipments, \
                 ROUND(AVG(c.fuel_cost + c.labor_cost + c.misc_cost), 2) AS avg_cost_per_shipment \
             FROM costs c \
             JOIN shipments s ON c.shipment_id = s.shipment_id \
             GROUP BY s.origin, s.destination \
             ORDER BY total_cost DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Cost component totals over every cost record; zeros on empty data.
    pub async fn get_cost_totals(&self) -> Result<CostTotals> {
        let totals = sqlx::query_as::<_, CostTotals>(
            "SELECT \
                 COALESCE(SUM(fuel_cost), 0.0) AS fuel_total, \
                 COALESCE(SUM(labor_cost), 0.0) AS labor_total, \
                 COALESCE(SUM(misc_cost), 0.0) AS misc_total \
             FROM costs",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(totals)
    }

    /// Individual shipment costs with each component, most expensive
    /// first.
    pub async fn get_cost_per_shipment(&self, limit: i64) -> Result<Vec<ShipmentCost>> {
        let rows = sqlx::query_as::<_, ShipmentCost>(
            "SELECT \
                 c.shipment_id, \
                 s.origin, \
                 s.destination, \
                 s.weight, \
                 ROUND(c.fuel_cost, 2) AS fuel_cost, \
                 ROUND(c.labor_cost, 2) AS labor_cost, \
                 ROUND(c.misc_cost, 2) AS misc_cost, \
                 ROUND(c.fuel_cost + c.labor_cost + c.misc_cost, 2) AS total_cost, \
                 s.status \
             FROM costs c \
             JOIN shipments s ON c.shipment_id = s.shipment_id \
             ORDER BY (c.fuel_cost + c.labor_cost + c.misc_cost) DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn get_high_cost_shipments(&self, limit: i64) -> Result<Vec<HighCostShipment>> {
        let rows = sqlx::query_as::<_, HighCostShipment>(
            "SELECT \
                 c.shipment_id, \
                 s.origin, \
                 s.destination, \
                 s.weight, \
                 ROUND(c.fuel_cost + c.labor_cost + c.misc_cost, 2) AS total_cost, \
                 ROUND((c.fuel_cost + c.labor_cost + c.misc_cost) / NULLIF(s.weight, 0), 2) AS cost_per_kg, \
                 s.status \
             FROM costs c \
             JOIN shipments s ON c.shipment_id = s.shipment_id \
             ORDER BY (c.fuel_cost + c.labor_cost + c.misc_cost) DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
