use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Route reference data. Shipments match routes by (origin, destination),
/// not by a foreign key; a shipment pair may have no route row at all.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub avg_time_hours: f64,
}
