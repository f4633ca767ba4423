pub mod cost_record;
pub mod courier;
pub mod route;
pub mod shipment;
pub mod tracking_event;
pub mod warehouse;

pub use cost_record::CostRecord;
pub use courier::Courier;
pub use route::Route;
pub use shipment::{Shipment, ShipmentStatus};
pub use tracking_event::TrackingEvent;
pub use warehouse::Warehouse;
