use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Courier, CostRecord, Route, Shipment, ShipmentStatus, TrackingEvent, Warehouse};

/// Why a source record was rejected. The display string is what ends up
/// in the per-reason breakdown of a [`LoadReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingId,
    MissingOrigin,
    MissingDestination,
    MissingField(&'static str),
    InvalidDate,
    InvalidTimestamp,
    InvalidWeight,
    InvalidStatus,
    InvalidRating,
    InvalidCapacity,
    InvalidCost,
    InvalidNumber(&'static str),
    Unparsable,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingId => write!(f, "missing identifier"),
            RejectReason::MissingOrigin => write!(f, "missing origin"),
            RejectReason::MissingDestination => write!(f, "missing destination"),
            RejectReason::MissingField(field) => write!(f, "missing {field}"),
            RejectReason::InvalidDate => write!(f, "invalid date"),
            RejectReason::InvalidTimestamp => write!(f, "invalid timestamp"),
            RejectReason::InvalidWeight => write!(f, "invalid weight"),
            RejectReason::InvalidStatus => write!(f, "invalid status"),
            RejectReason::InvalidRating => write!(f, "invalid rating"),
            RejectReason::InvalidCapacity => write!(f, "invalid capacity"),
            RejectReason::InvalidCost => write!(f, "invalid cost"),
            RejectReason::InvalidNumber(field) => write!(f, "invalid {field}"),
            RejectReason::Unparsable => write!(f, "unparsable row"),
        }
    }
}

/// Accounting for one processed source file.
/// `seen == accepted + rejected` holds at all times.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: String,
    pub seen: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub reasons: BTreeMap<String, u64>,
}

impl LoadReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            seen: 0,
            accepted: 0,
            rejected: 0,
            reasons: BTreeMap::new(),
        }
    }

    fn accept(&mut self) {
        self.seen += 1;
        self.accepted += 1;
    }

    fn reject(&mut self, row: u64, reason: RejectReason) {
        self.seen += 1;
        self.rejected += 1;
        *self.reasons.entry(reason.to_string()).or_insert(0) += 1;
        tracing::warn!(source = %self.source, row, %reason, "rejected record");
    }
}

/// Parsed records from one source plus the acceptance/rejection report.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    pub records: Vec<T>,
    pub report: LoadReport,
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---- field coercion helpers ----

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Numeric coercion for JSON fields that may arrive as a number or as a
/// numeric string. Malformed values map to None; callers reject the
/// record rather than defaulting to zero.
fn coerce_f64(value: Option<&serde_json::Value>) -> Option<f64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_i64(value: Option<&serde_json::Value>) -> Option<i64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

// ---- shipments (JSON) ----

#[derive(Debug, Deserialize)]
struct RawShipment {
    shipment_id: Option<String>,
    order_date: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    weight: Option<serde_json::Value>,
    courier_id: Option<String>,
    status: Option<String>,
    delivery_date: Option<String>,
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| AppError::Source(format!("{}: {e}", source_name(path))))
}

/// Load and validate the shipments JSON source.
pub fn load_shipments(path: &Path) -> Result<LoadOutcome<Shipment>> {
    let file = open_source(path)?;
    let raw: Vec<RawShipment> = serde_json::from_reader(BufReader::new(file))?;

    let mut report = LoadReport::new(source_name(path));
    let mut records = Vec::with_capacity(raw.len());

    for (i, rec) in raw.into_iter().enumerate() {
        let row = i as u64 + 1;

        let Some(shipment_id) = non_blank(rec.shipment_id.as_ref()) else {
            report.reject(row, RejectReason::MissingId);
            continue;
        };
        let Some(origin) = non_blank(rec.origin.as_ref()) else {
            report.reject(row, RejectReason::MissingOrigin);
            continue;
        };
        let Some(destination) = non_blank(rec.destination.as_ref()) else {
            report.reject(row, RejectReason::MissingDestination);
            continue;
        };
        let Some(order_date) = non_blank(rec.order_date.as_ref()).and_then(parse_date) else {
            report.reject(row, RejectReason::InvalidDate);
            continue;
        };
        let Some(weight) = coerce_f64(rec.weight.as_ref()).filter(|w| *w > 0.0) else {
            report.reject(row, RejectReason::InvalidWeight);
            continue;
        };
        let Some(status) = non_blank(rec.status.as_ref())
            .and_then(|s| ShipmentStatus::from_str(s).ok())
        else {
            report.reject(row, RejectReason::InvalidStatus);
            continue;
        };

        // Absent or blank delivery date means "not yet delivered".
        let delivery_date = match non_blank(rec.delivery_date.as_ref()) {
            Some(s) => match parse_date(s) {
                Some(d) => Some(d),
                None => {
                    report.reject(row, RejectReason::InvalidDate);
                    continue;
                }
            },
            None => None,
        };

        records.push(Shipment {
            shipment_id: shipment_id.to_string(),
            order_date,
            origin: origin.to_string(),
            destination: destination.to_string(),
            weight,
            courier_id: non_blank(rec.courier_id.as_ref()).map(str::to_string),
            status,
            delivery_date,
        });
        report.accept();
    }

    log_report(&report);
    Ok(LoadOutcome { records, report })
}

// ---- tracking events (CSV) ----

#[derive(Debug, Deserialize)]
struct RawTracking {
    tracking_id: Option<String>,
    shipment_id: Option<String>,
    status: Option<String>,
    timestamp: Option<String>,
}

/// Load and validate the shipment tracking CSV source.
pub fn load_tracking_events(path: &Path) -> Result<LoadOutcome<TrackingEvent>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut report = LoadReport::new(source_name(path));
    let mut records = Vec::new();

    for (i, result) in reader.deserialize::<RawTracking>().enumerate() {
        let row = i as u64 + 1;
        let rec = match result {
            Ok(rec) => rec,
            Err(e) => {
                tracing::warn!(source = %report.source, row, error = %e, "bad CSV row");
                report.reject(row, RejectReason::Unparsable);
                continue;
            }
        };

        let Some(tracking_id) = non_blank(rec.tracking_id.as_ref())
            .and_then(|s| s.parse::<i64>().ok())
        else {
            report.reject(row, RejectReason::MissingId);
            continue;
        };
        let Some(shipment_id) = non_blank(rec.shipment_id.as_ref()) else {
            report.reject(row, RejectReason::MissingField("shipment_id"));
            continue;
        };
        let Some(status) = non_blank(rec.status.as_ref())
            .and_then(|s| ShipmentStatus::from_str(s).ok())
        else {
            report.reject(row, RejectReason::InvalidStatus);
            continue;
        };
        let Some(timestamp) = non_blank(rec.timestamp.as_ref()).and_then(parse_datetime) else {
            report.reject(row, RejectReason::InvalidTimestamp);
            continue;
        };

        records.push(TrackingEvent {
            tracking_id,
            shipment_id: shipment_id.to_string(),
            status,
            timestamp,
        });
        report.accept();
    }

    log_report(&report);
    Ok(LoadOutcome { records, report })
}

// ---- courier staff (CSV) ----

#[derive(Debug, Deserialize)]
struct RawCourier {
    courier_id: Option<String>,
    name: Option<String>,
    rating: Option<String>,
    vehicle_type: Option<String>,
}

/// Load and validate the courier staff CSV source.
pub fn load_couriers(path: &Path) -> Result<LoadOutcome<Courier>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut report = LoadReport::new(source_name(path));
    let mut records = Vec::new();

    for (i, result) in reader.deserialize::<RawCourier>().enumerate() {
        let row = i as u64 + 1;
        let rec = match result {
            Ok(rec) => rec,
            Err(e) => {
                tracing::warn!(source = %report.source, row, error = %e, "bad CSV row");
                report.reject(row, RejectReason::Unparsable);
                continue;
            }
        };

        let Some(courier_id) = non_blank(rec.courier_id.as_ref()) else {
            report.reject(row, RejectReason::MissingId);
            continue;
        };
        let Some(name) = non_blank(rec.name.as_ref()) else {
            report.reject(row, RejectReason::MissingField("name"));
            continue;
        };

        // Rating is optional but must be within 1..=5 when present.
        let rating = match non_blank(rec.rating.as_ref()) {
            Some(s) => match parse_f64(s).filter(|r| (1.0..=5.0).contains(r)) {
                Some(r) => Some(r),
                None => {
                    report.reject(row, RejectReason::InvalidRating);
                    continue;
                }
            },
            None => None,
        };

        records.push(Courier {
            courier_id: courier_id.to_string(),
            name: name.to_string(),
            rating,
            vehicle_type: non_blank(rec.vehicle_type.as_ref()).map(str::to_string),
        });
        report.accept();
    }

    log_report(&report);
    Ok(LoadOutcome { records, report })
}

// ---- routes (CSV) ----

#[derive(Debug, Deserialize)]
struct RawRoute {
    route_id: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    distance_km: Option<String>,
    avg_time_hours: Option<String>,
}

/// Load and validate the routes CSV source.
pub fn load_routes(path: &Path) -> Result<LoadOutcome<Route>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut report = LoadReport::new(source_name(path));
    let mut records = Vec::new();

    for (i, result) in reader.deserialize::<RawRoute>().enumerate() {
        let row = i as u64 + 1;
        let rec = match result {
            Ok(rec) => rec,
            Err(e) => {
                tracing::warn!(source = %report.source, row, error = %e, "bad CSV row");
                report.reject(row, RejectReason::Unparsable);
                continue;
            }
        };

        let Some(route_id) = non_blank(rec.route_id.as_ref()) else {
            report.reject(row, RejectReason::MissingId);
            continue;
        };
        let Some(origin) = non_blank(rec.origin.as_ref()) else {
            report.reject(row, RejectReason::MissingOrigin);
            continue;
        };
        let Some(destination) = non_blank(rec.destination.as_ref()) else {
            report.reject(row, RejectReason::MissingDestination);
            continue;
        };
        let Some(distance_km) = non_blank(rec.distance_km.as_ref())
            .and_then(parse_f64)
            .filter(|d| *d > 0.0)
        else {
            report.reject(row, RejectReason::InvalidNumber("distance"));
            continue;
        };
        let Some(avg_time_hours) = non_blank(rec.avg_time_hours.as_ref())
            .and_then(parse_f64)
            .filter(|h| *h > 0.0)
        else {
            report.reject(row, RejectReason::InvalidNumber("transit time"));
            continue;
        };

        records.push(Route {
            route_id: route_id.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            distance_km,
            avg_time_hours,
        });
        report.accept();
    }

    log_report(&report);
    Ok(LoadOutcome { records, report })
}

// ---- warehouses (JSON) ----

#[derive(Debug, Deserialize)]
struct RawWarehouse {
    warehouse_id: Option<String>,
    city: Option<String>,
    state: Option<String>,
    capacity: Option<serde_json::Value>,
}

/// Load and validate the warehouses JSON source.
pub fn load_warehouses(path: &Path) -> Result<LoadOutcome<Warehouse>> {
    let file = open_source(path)?;
    let raw: Vec<RawWarehouse> = serde_json::from_reader(BufReader::new(file))?;

    let mut report = LoadReport::new(source_name(path));
    let mut records = Vec::with_capacity(raw.len());

    for (i, rec) in raw.into_iter().enumerate() {
        let row = i as u64 + 1;

        let Some(warehouse_id) = non_blank(rec.warehouse_id.as_ref()) else {
            report.reject(row, RejectReason::MissingId);
            continue;
        };
        let Some(city) = non_blank(rec.city.as_ref()) else {
            report.reject(row, RejectReason::MissingField("city"));
            continue;
        };
        let Some(capacity) = coerce_i64(rec.capacity.as_ref()).filter(|c| *c > 0) else {
            report.reject(row, RejectReason::InvalidCapacity);
            continue;
        };

        records.push(Warehouse {
            warehouse_id: warehouse_id.to_string(),
            city: city.to_string(),
            state: non_blank(rec.state.as_ref()).map(str::to_string),
            capacity,
        });
        report.accept();
    }

    log_report(&report);
    Ok(LoadOutcome { records, report })
}

// ---- cost records (CSV) ----

#[derive(Debug, Deserialize)]
struct RawCost {
    shipment_id: Option<String>,
    fuel_cost: Option<String>,
    labor_cost: Option<String>,
    misc_cost: Option<String>,
}

/// Load and validate the costs CSV source.
pub fn load_costs(path: &Path) -> Result<LoadOutcome<CostRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut report = LoadReport::new(source_name(path));
    let mut records = Vec::new();

    for (i, result) in reader.deserialize::<RawCost>().enumerate() {
        let row = i as u64 + 1;
        let rec = match result {
            Ok(rec) => rec,
            Err(e) => {
                tracing::warn!(source = %report.source, row, error = %e, "bad CSV row");
                report.reject(row, RejectReason::Unparsable);
                continue;
            }
        };

        let Some(shipment_id) = non_blank(rec.shipment_id.as_ref()) else {
            report.reject(row, RejectReason::MissingId);
            continue;
        };

        let cost = |field: Option<&String>| {
            non_blank(field).and_then(parse_f64).filter(|c| *c >= 0.0)
        };
        let (Some(fuel_cost), Some(labor_cost), Some(misc_cost)) = (
            cost(rec.fuel_cost.as_ref()),
            cost(rec.labor_cost.as_ref()),
            cost(rec.misc_cost.as_ref()),
        ) else {
            report.reject(row, RejectReason::InvalidCost);
            continue;
        };

        records.push(CostRecord {
            shipment_id: shipment_id.to_string(),
            fuel_cost,
            labor_cost,
            misc_cost,
        });
        report.accept();
    }

    log_report(&report);
    Ok(LoadOutcome { records, report })
}

fn log_report(report: &LoadReport) {
    tracing::info!(
        source = %report.source,
        seen = report.seen,
        accepted = report.accepted,
        rejected = report.rejected,
        "source processed"
    );
    for (reason, count) in &report.reasons {
        tracing::info!(source = %report.source, %reason, count, "rejection breakdown");
    }
}
