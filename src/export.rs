//! Flat-file exports for downstream reporting tools.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::PerformanceReport;
use crate::error::Result;
use crate::models::{Shipment, ShipmentStatus};

#[derive(Debug, Serialize)]
struct ShipmentCsvRow<'a> {
    shipment_id: &'a str,
    order_date: NaiveDate,
    origin: &'a str,
    destination: &'a str,
    weight: f64,
    courier_id: Option<&'a str>,
    status: ShipmentStatus,
    delivery_date: Option<NaiveDate>,
    delivery_days: Option<i64>,
}

/// Write shipments to a CSV file, one row per shipment with the derived
/// delivery duration as the last column. Returns the number of rows
/// written.
pub fn export_shipments_csv(path: &Path, shipments: &[Shipment]) -> Result<u64> {
    let mut writer = csv::Writer::from_path(path)?;
    for s in shipments {
        writer.serialize(ShipmentCsvRow {
            shipment_id: &s.shipment_id,
            order_date: s.order_date,
            origin: &s.origin,
            destination: &s.destination,
            weight: s.weight,
            courier_id: s.courier_id.as_deref(),
            status: s.status,
            delivery_date: s.delivery_date,
            delivery_days: s.delivery_days(),
        })?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = shipments.len(), "shipments exported");
    Ok(shipments.len() as u64)
}

/// Write a performance report as `key: value` lines for plain-text
/// consumers.
pub fn export_report_txt(path: &Path, report: &PerformanceReport) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "generated_at: {}", report.generated_at.to_rfc3339())?;
    writeln!(file, "period_days: {}", report.period_days)?;
    writeln!(file, "total_shipments: {}", report.metrics.total_shipments)?;
    writeln!(
        file,
        "delivered_percentage: {}",
        report.metrics.delivered_percentage
    )?;
    writeln!(
        file,
        "cancelled_percentage: {}",
        report.metrics.cancelled_percentage
    )?;
    match report.metrics.avg_delivery_days {
        Some(days) => writeln!(file, "avg_delivery_days: {days}")?,
        None => writeln!(file, "avg_delivery_days: n/a")?,
    }
    writeln!(
        file,
        "total_operational_cost: {}",
        report.metrics.total_operational_cost
    )?;
    tracing::info!(path = %path.display(), "report exported");
    Ok(())
}
