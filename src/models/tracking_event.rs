use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::ShipmentStatus;

/// One entry in the append-only tracking log of a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingEvent {
    pub tracking_id: i64,
    pub shipment_id: String,
    pub status: ShipmentStatus,
    pub timestamp: NaiveDateTime,
}
