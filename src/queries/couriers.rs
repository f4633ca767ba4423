use serde::Serialize;
use sqlx::FromRow;

use crate::error::Result;
use crate::queries::LogisticsQueries;

/// Per-courier shipment statistics. Couriers with no shipments still
/// appear (LEFT JOIN) with zero counts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourierPerformance {
    pub courier_id: String,
    pub name: String,
    pub vehicle_type: Option<String>,
    pub rating: Option<f64>,
    pub num_shipments: i64,
    pub delivered_count: i64,
    pub cancelled_count: i64,
    pub delivery_rate: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourierCancellation {
    pub courier_id: String,
    pub name: String,
    pub total_shipments: i64,
    pub cancelled: i64,
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OriginCancellation {
    pub origin: String,
    pub total_shipments: i64,
    pub cancelled: i64,
    pub cancellation_rate: f64,
}

/// Delivery success and speed per courier, delivered work only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourierDeliveryStats {
    pub courier_id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub total_shipments: i64,
    pub delivered: i64,
    /// Null when none of the delivered shipments has a delivery date.
    pub avg_days: Option<f64>,
    pub delivery_success_rate: f64,
}

/// Aggregate delivery outcomes per courier rating band. Ratings are
/// optional, so the null band collects shipments of unrated couriers.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RatingBandPerformance {
    pub rating: Option<f64>,
    pub num_shipments: i64,
    pub delivered: i64,
    pub delivery_rate: f64,
    pub avg_delivery_days: Option<f64>,
}

/// How long cancelled shipments lingered before the cancellation event,
/// per (origin, destination) pair.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CancellationLag {
    pub origin: String,
    pub destination: String,
    pub cancelled_count: i64,
    pub avg_days_to_cancel: f64,
}

impl LogisticsQueries {
    pub async fn get_courier_performance(&self, limit: i64) -> Result<Vec<CourierPerformance>> {
        let rows = sqlx::query_as::<_, CourierPerformance>(
            "SELECT \
                 c.courier_id, \
                 c.name, \
                 c.vehicle_type, \
                 c.rating, \
                 COUNT(s.shipment_id) AS num_shipments, \
                 COUNT(CASE WHEN s.status = 'Delivered' THEN 1 END) AS delivered_count, \
                 COUNT(CASE WHEN s.status = 'Cancelled' THEN 1 END) AS cancelled_count, \
                 COALESCE(ROUND(COUNT(CASE WHEN s.status = 'Delivered' THEN 1 END) * 100.0 \
                     / NULLIF(COUNT(s.shipment_id), 0), 2), 0.0) AS delivery_rate \
             FROM courier_staff c \
             LEFT JOIN shipments s ON c.courier_id = s.courier_id \
             GROUP BY c.courier_id, c.name, c.vehicle_type, c.rating \
             ORDER BY num_shipments DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn get_cancellation_rate_by_courier(
        &self,
        limit: i64,
    ) -> Result<Vec<CourierCancellation>> {
        let rows = sqlx::query_as::<_, CourierCancellation>(
            "SELECT \
                 c.courier_id, \
                 c.name, \
                 COUNT(s.shipment_id) AS total_shipments, \
                 COUNT(CASE WHEN s.status = 'Cancelled' THEN 1 END) AS cancelled, \
                 ROUND(COUNT(CASE WHEN s.status = 'Cancelled' THEN 1 END) * 100.0 \
                     / COUNT(s.shipment_id), 2) AS cancellation_rate \
             FROM courier_staff c \
             LEFT JOIN shipments s ON c.courier_id = s.courier_id \
             GROUP BY c.courier_id, c.name \
             HAVING total_shipments > 0 \
             ORDER BY cancellation_rate DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Delivery success rate and average delivery speed per courier,
    /// best first. Couriers without a single delivery are omitted.
    pub async fn get_ontime_delivery_by_courier(
        &self,
        limit: i64,
    ) -> Result<Vec<CourierDeliveryStats>> {
        let rows = sqlx::query_as::<_, CourierDeliveryStats>(
            "SELECT \
                 c.courier_id, \
                 c.name, \
                 c.rating, \
                 COUNT(s.shipment_id) AS total_shipments, \
                 COUNT(CASE WHEN s.status = 'Delivered' THEN 1 END) AS delivered, \
                 ROUND(AVG(CASE WHEN s.status = 'Delivered' AND s.delivery_date IS NOT NULL \
                     THEN julianday(s.delivery_date) - julianday(s.order_date) END), 2) AS avg_days, \
                 ROUND(COUNT(CASE WHEN s.status = 'Delivered' THEN 1 END) * 100.0 \
                     / COUNT(s.shipment_id), 2) AS delivery_success_rate \
             FROM courier_staff c \
             LEFT JOIN shipments s ON c.courier_id = s.courier_id \
             GROUP BY c.courier_id, c.name, c.rating \
             HAVING delivered > 0 \
             ORDER BY delivery_success_rate DESC, avg_days ASC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Delivery outcomes grouped by courier rating, highest rating first.
    pub async fn get_courier_rating_comparison(&self) -> Result<Vec<RatingBandPerformance>> {
        let rows = sqlx::query_as::<_, RatingBandPerformance>(
            "SELECT \
                 c.rating, \
                 COUNT(s.shipment_id) AS num_shipments, \
                 COUNT(CASE WHEN s.status = 'Delivered' THEN 1 END) AS delivered, \
                 COALESCE(ROUND(COUNT(CASE WHEN s.status = 'Delivered' THEN 1 END) * 100.0 \
                     / NULLIF(COUNT(s.shipment_id), 0), 2), 0.0) AS delivery_rate, \
                 ROUND(AVG(CASE WHEN s.status = 'Delivered' AND s.delivery_date IS NOT NULL \
                     THEN julianday(s.delivery_date) - julianday(s.order_date) END), 2) AS avg_delivery_days \
             FROM courier_staff c \
             LEFT JOIN shipments s ON c.courier_id = s.courier_id \
             GROUP BY c.rating \
             ORDER BY c.rating DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Average days from order to the cancellation event, fastest
    /// cancellations first. Only shipments whose tracking log carries a
    /// cancellation event contribute.
    pub async fn get_time_to_cancellation(&self, limit: i64) -> Result<Vec<CancellationLag>> {
        let rows = sqlx::query_as::<_, CancellationLag>(
            "SELECT \
                 s.origin, \
                 s.destination, \
                 COUNT(s.shipment_id) AS cancelled_count, \
                 ROUND(AVG(julianday(DATE(st.timestamp)) - julianday(s.order_date)), 2) AS avg_days_to_cancel \
             FROM shipments s \
             JOIN shipment_tracking st ON s.shipment_id = st.shipment_id \
             WHERE s.status = 'Cancelled' AND st.status = 'Cancelled' \
             GROUP BY s.origin, s.destination \
             ORDER BY avg_days_to_cancel ASC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn get_cancellation_rate_by_origin(
        &self,
        limit: i64,
    ) -> Result<Vec<OriginCancellation>> {
        let rows = sqlx::query_as::<_, OriginCancellation>(
            "SELECT \
                 origin, \
                 COUNT(shipment_id) AS total_shipments, \
                 COUNT(CASE WHEN status = 'Cancelled' THEN 1 END) AS cancelled, \
                 ROUND(COUNT(CASE WHEN status = 'Cancelled' THEN 1 END) * 100.0 \
                     / COUNT(shipment_id), 2) AS cancellation_rate \
             FROM shipments \
             GROUP BY origin \
             ORDER BY cancellation_rate DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
