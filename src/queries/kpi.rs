use crate::error::Result;
use crate::models::ShipmentStatus;
use crate::queries::LogisticsQueries;

impl LogisticsQueries {
    /// Total number of shipment rows.
    pub async fn get_total_shipments(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shipments")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// Percentage of shipments in the given status, 0.0 on an empty table.
    pub async fn get_status_percentage(&self, status: ShipmentStatus) -> Result<f64> {
        let (pct,): (Option<f64>,) = sqlx::query_as(
            "SELECT ROUND(COUNT(CASE WHEN status = ? THEN 1 END) * 100.0 / COUNT(*), 2) \
             FROM shipments",
        )
        .bind(status)
        .fetch_one(self.pool())
        .await?;
        Ok(pct.unwrap_or(0.0))
    }

    pub async fn get_delivered_percentage(&self) -> Result<f64> {
        self.get_status_percentage(ShipmentStatus::Delivered).await
    }

    pub async fn get_cancelled_percentage(&self) -> Result<f64> {
        self.get_status_percentage(ShipmentStatus::Cancelled).await
    }

    pub async fn get_in_transit_percentage(&self) -> Result<f64> {
        self.get_status_percentage(ShipmentStatus::InTransit).await
    }

    /// Average delivery duration in days, over delivered shipments with a
    /// recorded delivery date only. None when no such shipment exists.
    pub async fn get_average_delivery_days(&self) -> Result<Option<f64>> {
        let (avg,): (Option<f64>,) = sqlx::query_as(
            "SELECT ROUND(AVG(julianday(delivery_date) - julianday(order_date)), 2) \
             FROM shipments \
             WHERE status = 'Delivered' AND delivery_date IS NOT NULL",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(avg)
    }

    /// Sum of all cost components across every cost record.
    pub async fn get_total_operational_cost(&self) -> Result<f64> {
        let (total,): (Option<f64>,) = sqlx::query_as(
            "SELECT ROUND(SUM(fuel_cost + labor_cost + misc_cost), 2) FROM costs",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(total.unwrap_or(0.0))
    }
}
