use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Lifecycle status of a shipment, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ShipmentStatus {
    Delivered,
    #[serde(rename = "In Transit")]
    #[sqlx(rename = "In Transit")]
    InTransit,
    Pending,
    Cancelled,
    Returned,
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::Cancelled => "Cancelled",
            ShipmentStatus::Returned => "Returned",
        };
        f.write_str(s)
    }
}

impl FromStr for ShipmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Delivered" => Ok(ShipmentStatus::Delivered),
            "In Transit" => Ok(ShipmentStatus::InTransit),
            "Pending" => Ok(ShipmentStatus::Pending),
            "Cancelled" => Ok(ShipmentStatus::Cancelled),
            "Returned" => Ok(ShipmentStatus::Returned),
            other => Err(AppError::Validation(format!(
                "unknown shipment status: {other:?}"
            ))),
        }
    }
}

/// A shipment row. Immutable after creation except for status and
/// delivery_date, which only re-ingestion (upsert) may change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shipment {
    pub shipment_id: String,
    pub order_date: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    pub courier_id: Option<String>,
    pub status: ShipmentStatus,
    pub delivery_date: Option<NaiveDate>,
}

impl Shipment {
    /// Delivery duration in days, defined only for delivered shipments
    /// with a recorded delivery date.
    pub fn delivery_days(&self) -> Option<i64> {
        match (self.status, self.delivery_date) {
            (ShipmentStatus::Delivered, Some(delivered)) => {
                Some((delivered - self.order_date).num_days())
            }
            _ => None,
        }
    }
}
