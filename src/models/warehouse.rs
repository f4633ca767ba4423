use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Warehouse reference data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Warehouse {
    pub warehouse_id: String,
    pub city: String,
    pub state: Option<String>,
    pub capacity: i64,
}
