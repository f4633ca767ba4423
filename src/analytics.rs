//! Derived computations over query outputs. Everything here is a pure
//! function of its inputs: no pool access, no clock reads, so the whole
//! module is unit-testable without a live store.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::queries::{CostTotals, CourierPerformance, RouteCost, RoutePerformance};

pub const DEFAULT_BOTTLENECK_PERCENTILE: f64 = 75.0;

/// Linear-interpolation percentile over the values, matching the
/// quantile semantics the dashboard's charts were built against.
/// Returns None for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let weight = rank - lo as f64;
    Some(sorted[lo] * (1.0 - weight) + sorted[hi] * weight)
}

/// [`identify_bottleneck_routes`] at the default threshold.
pub fn bottleneck_routes(routes: &[RoutePerformance]) -> Vec<RoutePerformance> {
    identify_bottleneck_routes(routes, DEFAULT_BOTTLENECK_PERCENTILE)
}

/// Routes whose average delivery duration is at or above the given
/// percentile of the overall distribution.
pub fn identify_bottleneck_routes(
    routes: &[RoutePerformance],
    threshold_percentile: f64,
) -> Vec<RoutePerformance> {
    let days: Vec<f64> = routes.iter().map(|r| r.avg_delivery_days).collect();
    let Some(threshold) = percentile(&days, threshold_percentile) else {
        return Vec::new();
    };
    routes
        .iter()
        .filter(|r| r.avg_delivery_days >= threshold)
        .cloned()
        .collect()
}

/// Share of total cost attributable to each component, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub fuel_percent: f64,
    pub labor_percent: f64,
    pub misc_percent: f64,
}

/// Overall cost-pattern breakdown. None when there is no cost at all.
pub fn cost_pattern_breakdown(totals: &CostTotals) -> Option<CostBreakdown> {
    let total = totals.fuel_total + totals.labor_total + totals.misc_total;
    if total <= 0.0 {
        return None;
    }
    Some(CostBreakdown {
        fuel_percent: totals.fuel_total * 100.0 / total,
        labor_percent: totals.labor_total * 100.0 / total,
        misc_percent: totals.misc_total * 100.0 / total,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteCostBreakdown {
    pub origin: String,
    pub destination: String,
    pub breakdown: CostBreakdown,
}

/// Per-route cost-pattern breakdown; routes with zero total are skipped.
pub fn per_route_cost_breakdown(routes: &[RouteCost]) -> Vec<RouteCostBreakdown> {
    routes
        .iter()
        .filter_map(|r| {
            let totals = CostTotals {
                fuel_total: r.total_fuel_cost,
                labor_total: r.total_labor_cost,
                misc_total: r.total_misc_cost,
            };
            cost_pattern_breakdown(&totals).map(|breakdown| RouteCostBreakdown {
                origin: r.origin.clone(),
                destination: r.destination.clone(),
                breakdown,
            })
        })
        .collect()
}

/// KPI values gathered by the caller from the query library.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub total_shipments: i64,
    pub delivered_percentage: f64,
    pub cancelled_percentage: f64,
    pub avg_delivery_days: Option<f64>,
    pub total_operational_cost: f64,
}

/// Bundled KPI report over a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub period_days: u32,
    pub metrics: Kpis,
}

/// Bundle KPI values into one report. The timestamp is supplied by the
/// caller so the assembly stays deterministic.
pub fn assemble_performance_report(
    metrics: Kpis,
    generated_at: DateTime<Utc>,
    period_days: u32,
) -> PerformanceReport {
    PerformanceReport {
        generated_at,
        period_days,
        metrics,
    }
}

/// Ranking criterion for [`top_performers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopMetric {
    Shipments,
    Rating,
    DeliveryRate,
}

/// Rank courier performance rows by the chosen metric, best first.
/// Couriers without a rating sort last when ranking by rating.
pub fn top_performers(
    couriers: &[CourierPerformance],
    metric: TopMetric,
    limit: usize,
) -> Vec<CourierPerformance> {
    let mut ranked: Vec<CourierPerformance> = couriers.to_vec();
    match metric {
        TopMetric::Shipments => ranked.sort_by(|a, b| b.num_shipments.cmp(&a.num_shipments)),
        TopMetric::Rating => ranked.sort_by(|a, b| {
            b.rating
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&a.rating.unwrap_or(f64::NEG_INFINITY))
        }),
        TopMetric::DeliveryRate => {
            ranked.sort_by(|a, b| b.delivery_rate.total_cmp(&a.delivery_rate))
        }
    }
    ranked.truncate(limit);
    ranked
}
