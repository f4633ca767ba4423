use std::fs::File;
use std::io::Write;
use std::path::Path;

use logistics_analytics::cache::QueryCache;
use logistics_analytics::config::Config;
use logistics_analytics::db::{self, DbPool, schema};
use logistics_analytics::ingest::{self, TrackingStore, load_in_batches, loader};
use logistics_analytics::models::ShipmentStatus;
use logistics_analytics::queries::{LogisticsQueries, ShipmentFilter};

fn write_file(dir: &Path, name: &str, contents: &str) {
    let mut f = File::create(dir.join(name)).expect("create fixture");
    f.write_all(contents.as_bytes()).expect("write fixture");
}

/// Lay down the six source files the pipeline expects.
fn write_sources(dir: &Path) {
    write_file(
        dir,
        "courier_staff.csv",
        "courier_id,name,rating,vehicle_type\n\
         c1,Ana Ortiz,4.5,Van\n\
         c2,Bob Lane,3.8,Truck\n\
         c3,Cleo Park,4.9,Bike\n",
    );
    write_file(
        dir,
        "routes.csv",
        "route_id,origin,destination,distance_km,avg_time_hours\n\
         r1,New York,Boston,300.0,10.0\n",
    );
    write_file(
        dir,
        "warehouses.json",
        r#"[{"warehouse_id": "w1", "city": "New York", "state": "NY", "capacity": 100}]"#,
    );
    write_file(
        dir,
        "shipments.json",
        r#"[
            {"shipment_id": "dc84cc15", "order_date": "2024-01-01", "origin": "New York",
             "destination": "Boston", "weight": 12.5, "courier_id": "c1",
             "status": "Delivered", "delivery_date": "2024-01-04"},
            {"shipment_id": "s2", "order_date": "2024-01-02", "origin": "Newark",
             "destination": "Chicago", "weight": 8.0, "courier_id": "c2",
             "status": "Delivered", "delivery_date": "2024-01-07"},
            {"shipment_id": "s3", "order_date": "2024-01-03", "origin": "Austin",
             "destination": "Denver", "weight": 3.0, "courier_id": "ghost",
             "status": "In Transit", "delivery_date": null},
            {"shipment_id": "s4", "order_date": "2024-01-04", "origin": "New York",
             "destination": "Boston", "weight": 2.0, "courier_id": "c1",
             "status": "Cancelled", "delivery_date": null}
        ]"#,
    );
    write_file(
        dir,
        "costs.csv",
        "shipment_id,fuel_cost,labor_cost,misc_cost\n\
         dc84cc15,10.0,5.0,1.0\n\
         s2,20.0,10.0,5.0\n",
    );
    // Tracking rows deliberately out of timestamp order.
    write_file(
        dir,
        "shipment_tracking.csv",
        "tracking_id,shipment_id,status,timestamp\n\
         3,dc84cc15,In Transit,2024-01-03 09:00:00\n\
         1,dc84cc15,Pending,2024-01-01 08:00:00\n\
         4,dc84cc15,Delivered,2024-01-04 10:30:00\n\
         2,dc84cc15,In Transit,2024-01-02 08:00:00\n\
         5,s2,Delivered,2024-01-07 12:00:00\n\
         6,s4,Cancelled,2024-01-06 09:00:00\n",
    );
}

async fn setup(dir: &Path) -> (DbPool, Config, QueryCache) {
    let config = Config {
        database_url: format!("sqlite://{}", dir.join("test.db").display()),
        data_dir: dir.display().to_string(),
        batch_size: 2,
        max_connect_attempts: 1,
    };
    let pool = db::init_db_pool(&config).await.expect("init pool");
    schema::create_tables(&pool).await.expect("create tables");
    (pool, config, QueryCache::new())
}

#[tokio::test]
async fn schema_operations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (pool, _, _) = setup(dir.path()).await;

    // Re-running either operation must not fail.
    schema::create_tables(&pool).await.unwrap();
    schema::drop_all_tables(&pool).await.unwrap();
    schema::drop_all_tables(&pool).await.unwrap();
    schema::create_tables(&pool).await.unwrap();
}

#[tokio::test]
async fn ingestion_is_idempotent_and_accounted() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;

    let first = ingest::run_ingestion(&pool, &config, &cache).await.unwrap();
    for source in &first.sources {
        assert_eq!(
            source.load.seen,
            source.load.accepted + source.load.rejected,
            "rejection accounting broken for {}",
            source.load.source
        );
        assert!(source.batch.failed_ranges.is_empty());
    }

    let queries = LogisticsQueries::new(pool.clone());
    assert_eq!(queries.get_total_shipments().await.unwrap(), 4);

    // Second run updates in place instead of duplicating.
    let second = ingest::run_ingestion(&pool, &config, &cache).await.unwrap();
    assert_eq!(queries.get_total_shipments().await.unwrap(), 4);
    assert_eq!(first.total_accepted(), second.total_accepted());

    let (tracking_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shipment_tracking")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(tracking_rows, 6);
    let (cost_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM costs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cost_rows, 2);
}

#[tokio::test]
async fn kpi_aggregates_match_the_ingested_data() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);
    assert_eq!(queries.get_total_shipments().await.unwrap(), 4);
    assert_eq!(queries.get_delivered_percentage().await.unwrap(), 50.0);
    assert_eq!(queries.get_cancelled_percentage().await.unwrap(), 25.0);
    assert_eq!(queries.get_in_transit_percentage().await.unwrap(), 25.0);
    // Delivered in 3 and 5 days.
    assert_eq!(queries.get_average_delivery_days().await.unwrap(), Some(4.0));
    assert_eq!(queries.get_total_operational_cost().await.unwrap(), 51.0);
}

#[tokio::test]
async fn filters_compose_with_and_semantics() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);

    let both = ShipmentFilter {
        status: Some(ShipmentStatus::Delivered),
        origin: Some("New York".to_string()),
        ..Default::default()
    };
    let rows = queries.filter_shipments(&both).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].shipment_id, "dc84cc15");

    // Omitting origin returns the superset satisfying only the status.
    let status_only = ShipmentFilter {
        status: Some(ShipmentStatus::Delivered),
        ..Default::default()
    };
    let rows = queries.filter_shipments(&status_only).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|s| s.status == ShipmentStatus::Delivered));

    let date_range = ShipmentFilter {
        start_date: Some("2024-01-03".parse().unwrap()),
        end_date: Some("2024-01-04".parse().unwrap()),
        ..Default::default()
    };
    let rows = queries.filter_shipments(&date_range).await.unwrap();
    assert_eq!(rows.len(), 2);

    let unconstrained = ShipmentFilter::default();
    assert_eq!(queries.filter_shipments(&unconstrained).await.unwrap().len(), 4);
}

#[tokio::test]
async fn search_returns_tracking_history_in_ascending_order() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);

    let details = queries
        .search_shipment("dc84cc15")
        .await
        .unwrap()
        .expect("shipment should exist");
    assert_eq!(details.shipment.shipment_id, "dc84cc15");
    assert_eq!(details.total_cost, Some(16.0));
    assert_eq!(details.tracking.len(), 4);
    assert!(
        details
            .tracking
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );

    // Unknown identifier is an empty result, not an error.
    assert!(queries.search_shipment("nonexistent").await.unwrap().is_none());
}

#[tokio::test]
async fn join_queries_keep_rows_without_a_route_match() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);

    let routes = queries.get_route_performance(20).await.unwrap();
    assert_eq!(routes.len(), 2);
    let ny_boston = routes
        .iter()
        .find(|r| r.origin == "New York" && r.destination == "Boston")
        .unwrap();
    assert_eq!(ny_boston.distance_km, Some(300.0));
    assert_eq!(ny_boston.avg_delivery_days, 3.0);

    // Newark→Chicago has no route row and must still appear.
    let newark = routes.iter().find(|r| r.origin == "Newark").unwrap();
    assert_eq!(newark.distance_km, None);
    assert_eq!(newark.avg_delivery_days, 5.0);

    let couriers = queries.get_courier_performance(30).await.unwrap();
    let c1 = couriers.iter().find(|c| c.courier_id == "c1").unwrap();
    assert_eq!(c1.num_shipments, 2);
    assert_eq!(c1.delivered_count, 1);
    assert_eq!(c1.cancelled_count, 1);
    assert_eq!(c1.delivery_rate, 50.0);
    // Courier with no shipments survives the outer join.
    let c3 = couriers.iter().find(|c| c.courier_id == "c3").unwrap();
    assert_eq!(c3.num_shipments, 0);

    let utilization = queries.get_warehouse_utilization(10).await.unwrap();
    assert_eq!(utilization.len(), 1);
    assert_eq!(utilization[0].num_shipments, 2);
    assert_eq!(utilization[0].utilization_rate, 2.0);
}

#[tokio::test]
async fn cost_catalog_matches_ingested_totals() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);

    let totals = queries.get_cost_totals().await.unwrap();
    assert_eq!(totals.fuel_total, 30.0);
    assert_eq!(totals.labor_total, 15.0);
    assert_eq!(totals.misc_total, 6.0);

    // Newark→Chicago (35.0) outranks New York→Boston (16.0).
    let per_route = queries.get_cost_per_route(10).await.unwrap();
    assert_eq!(per_route.len(), 2);
    assert_eq!(per_route[0].origin, "Newark");
    assert_eq!(per_route[0].total_fuel_cost, 20.0);
    assert_eq!(per_route[0].total_cost, 35.0);
    assert_eq!(per_route[0].num_shipments, 1);
    assert_eq!(per_route[0].avg_cost_per_shipment, 35.0);
    assert_eq!(per_route[1].total_cost, 16.0);

    let per_shipment = queries.get_cost_per_shipment(10).await.unwrap();
    assert_eq!(per_shipment.len(), 2);
    assert_eq!(per_shipment[0].shipment_id, "s2");
    assert_eq!(per_shipment[0].fuel_cost, 20.0);
    assert_eq!(per_shipment[0].labor_cost, 10.0);
    assert_eq!(per_shipment[0].misc_cost, 5.0);
    assert_eq!(per_shipment[0].total_cost, 35.0);
    assert_eq!(per_shipment[1].shipment_id, "dc84cc15");
    assert_eq!(per_shipment[1].status, "Delivered");

    let high_cost = queries.get_high_cost_shipments(10).await.unwrap();
    assert_eq!(high_cost[0].shipment_id, "s2");
    assert_eq!(high_cost[0].total_cost, 35.0);
    // 16.0 over 12.5 kg.
    assert_eq!(high_cost[1].cost_per_kg, Some(1.28));
}

#[tokio::test]
async fn cancellation_and_courier_catalog_over_live_store() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);

    let by_courier = queries.get_cancellation_rate_by_courier(10).await.unwrap();
    // c3 has no shipments and is excluded; c1 leads with 1 of 2 cancelled.
    assert_eq!(by_courier.len(), 2);
    assert_eq!(by_courier[0].courier_id, "c1");
    assert_eq!(by_courier[0].total_shipments, 2);
    assert_eq!(by_courier[0].cancelled, 1);
    assert_eq!(by_courier[0].cancellation_rate, 50.0);

    let by_origin = queries.get_cancellation_rate_by_origin(10).await.unwrap();
    assert_eq!(by_origin.len(), 3);
    assert_eq!(by_origin[0].origin, "New York");
    assert_eq!(by_origin[0].cancellation_rate, 50.0);

    // s4 ordered 2024-01-04, cancellation event dated 2024-01-06.
    let lags = queries.get_time_to_cancellation(10).await.unwrap();
    assert_eq!(lags.len(), 1);
    assert_eq!(lags[0].origin, "New York");
    assert_eq!(lags[0].cancelled_count, 1);
    assert_eq!(lags[0].avg_days_to_cancel, 2.0);

    let ontime = queries.get_ontime_delivery_by_courier(10).await.unwrap();
    assert_eq!(ontime.len(), 2);
    assert_eq!(ontime[0].courier_id, "c2");
    assert_eq!(ontime[0].delivery_success_rate, 100.0);
    assert_eq!(ontime[0].avg_days, Some(5.0));
    assert_eq!(ontime[1].courier_id, "c1");
    assert_eq!(ontime[1].total_shipments, 2);
    assert_eq!(ontime[1].delivered, 1);
    assert_eq!(ontime[1].avg_days, Some(3.0));

    let bands = queries.get_courier_rating_comparison().await.unwrap();
    assert_eq!(bands.len(), 3);
    // Highest rating first; c3 (4.9) has no shipments at all.
    assert_eq!(bands[0].rating, Some(4.9));
    assert_eq!(bands[0].num_shipments, 0);
    assert_eq!(bands[0].delivery_rate, 0.0);
    assert_eq!(bands[1].rating, Some(4.5));
    assert_eq!(bands[1].num_shipments, 2);
    assert_eq!(bands[1].delivered, 1);
    assert_eq!(bands[1].avg_delivery_days, Some(3.0));

    let delayed = queries.get_most_delayed_routes(10).await.unwrap();
    assert_eq!(delayed.len(), 2);
    // Only New York→Boston has a route row; 3 days observed against
    // 10 hours expected.
    assert_eq!(delayed[0].origin, "New York");
    assert_eq!(delayed[0].expected_days, Some(0.42));
    assert_eq!(delayed[0].delay_days, Some(2.58));
    assert_eq!(delayed[1].delay_days, None);

    let traffic = queries.get_high_traffic_warehouses(10).await.unwrap();
    assert_eq!(traffic.len(), 1);
    assert_eq!(traffic[0].num_shipments, 2);
    assert_eq!(traffic[0].num_couriers, 1);
    assert_eq!(traffic[0].avg_weight, Some(7.25));

    assert_eq!(
        queries.get_unique_origins().await.unwrap(),
        vec!["Austin", "New York", "Newark"]
    );
    assert_eq!(
        queries.get_unique_destinations().await.unwrap(),
        vec!["Boston", "Chicago", "Denver"]
    );
    assert_eq!(
        queries.get_shipment_statuses().await.unwrap(),
        vec!["Cancelled", "Delivered", "In Transit"]
    );
    let couriers = queries.get_couriers().await.unwrap();
    let names: Vec<&str> = couriers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Ana Ortiz", "Bob Lane", "Cleo Park"]);
}

#[tokio::test]
async fn referential_checks_report_orphan_courier_references() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    let summary = ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    // Shipment s3 references the unknown courier "ghost"; tolerated but
    // reported. Tracking and cost rows are fully covered.
    assert_eq!(summary.data_quality.orphan_courier_refs, 1);
    assert_eq!(summary.data_quality.orphaned_tracking, 0);
    assert_eq!(summary.data_quality.orphaned_costs, 0);
}

#[tokio::test]
async fn failing_batch_is_skipped_without_corrupting_committed_batches() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    // Batch of 2: the first pair contains an event for a shipment that
    // does not exist, so the whole multi-row insert violates the foreign
    // key. The second pair must still commit.
    write_file(
        dir.path(),
        "extra_tracking.csv",
        "tracking_id,shipment_id,status,timestamp\n\
         10,dc84cc15,In Transit,2024-01-05 08:00:00\n\
         11,no-such-shipment,In Transit,2024-01-05 09:00:00\n\
         12,s2,In Transit,2024-01-05 10:00:00\n\
         13,s2,Delivered,2024-01-05 11:00:00\n",
    );
    let outcome = loader::load_tracking_events(&dir.path().join("extra_tracking.csv")).unwrap();
    assert_eq!(outcome.report.accepted, 4);

    let report = load_in_batches(&pool, &TrackingStore, &outcome.records, 2)
        .await
        .unwrap();
    assert_eq!(report.failed_ranges, vec![(0, 2)]);
    assert_eq!(report.rows_failed(), 2);

    // Rows 12 and 13 landed; nothing from the failed range did.
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM shipment_tracking WHERE tracking_id IN (10, 11, 12, 13)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 2);

    // Referential completeness still holds.
    let quality = ingest::check_data_quality(&pool).await.unwrap();
    assert_eq!(quality.orphaned_tracking, 0);
    assert_eq!(quality.orphaned_costs, 0);
}

#[tokio::test]
async fn reingestion_invalidates_the_query_cache() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;

    cache.put("total_shipments", "{}", serde_json::json!(0));
    assert!(!cache.is_empty());

    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn status_updates_flow_through_reingestion_only() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (pool, config, cache) = setup(dir.path()).await;
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    // The in-transit shipment gets delivered in a refreshed source file.
    write_file(
        dir.path(),
        "shipments.json",
        r#"[
            {"shipment_id": "s3", "order_date": "2024-01-03", "origin": "Austin",
             "destination": "Denver", "weight": 3.0, "courier_id": "ghost",
             "status": "Delivered", "delivery_date": "2024-01-09"}
        ]"#,
    );
    ingest::run_ingestion(&pool, &config, &cache).await.unwrap();

    let queries = LogisticsQueries::new(pool);
    // Still four shipments; s3 upserted in place.
    assert_eq!(queries.get_total_shipments().await.unwrap(), 4);
    let s3 = queries
        .search_shipment("s3")
        .await
        .unwrap()
        .expect("s3 exists");
    assert_eq!(s3.shipment.status, ShipmentStatus::Delivered);
    assert_eq!(
        s3.shipment.delivery_date,
        Some("2024-01-09".parse().unwrap())
    );
}
