use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-shipment cost components, one-to-one with a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CostRecord {
    pub shipment_id: String,
    pub fuel_cost: f64,
    pub labor_cost: f64,
    pub misc_cost: f64,
}

impl CostRecord {
    pub fn total(&self) -> f64 {
        self.fuel_cost + self.labor_cost + self.misc_cost
    }
}
