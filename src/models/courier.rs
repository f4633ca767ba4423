use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Courier staff reference data, rarely mutated after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Courier {
    pub courier_id: String,
    pub name: String,
    /// Rating bounded to 1.0..=5.0 at the ingestion boundary.
    pub rating: Option<f64>,
    pub vehicle_type: Option<String>,
}
