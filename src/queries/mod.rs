use crate::db::DbPool;

pub mod couriers;
pub mod costs;
pub mod kpi;
pub mod routes;
pub mod search;
pub mod warehouses;

pub use couriers::{
    CancellationLag, CourierCancellation, CourierDeliveryStats, CourierPerformance,
    OriginCancellation, RatingBandPerformance,
};
pub use costs::{CostTotals, HighCostShipment, RouteCost, ShipmentCost};
pub use routes::{RouteDelay, RoutePerformance};
pub use search::{CourierRef, ShipmentDetails, ShipmentFilter};
pub use warehouses::{WarehouseTraffic, WarehouseUtilization};

/// Fixed catalog of read-only aggregation and filter operations over the
/// normalized store. Each method returns typed, named-column rows; all
/// aggregation happens server-side.
#[derive(Clone)]
pub struct LogisticsQueries {
    pool: DbPool,
}

impl LogisticsQueries {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}
