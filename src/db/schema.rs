use crate::db::DbPool;
use crate::error::Result;

/// Create all six tables and their secondary indexes if absent.
///
/// Every statement is `IF NOT EXISTS`, so a failure midway leaves the
/// prior complete schema untouched and the call can simply be repeated.
pub async fn create_tables(pool: &DbPool) -> Result<()> {
    // Reference tables first, then tables with outgoing foreign keys.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courier_staff (
            courier_id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            rating REAL,
            vehicle_type TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS routes (
            route_id TEXT PRIMARY KEY NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,
            distance_km REAL NOT NULL,
            avg_time_hours REAL NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS warehouses (
            warehouse_id TEXT PRIMARY KEY NOT NULL,
            city TEXT NOT NULL,
            state TEXT,
            capacity INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // courier_id is indexed but deliberately not an enforced foreign key:
    // source data contains orphan courier references and the loader must
    // accept them. The data-quality check reports the count instead.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shipments (
            shipment_id TEXT PRIMARY KEY NOT NULL,
            order_date TEXT NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,
            weight REAL NOT NULL,
            courier_id TEXT,
            status TEXT NOT NULL,
            delivery_date TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shipment_tracking (
            tracking_id INTEGER PRIMARY KEY NOT NULL,
            shipment_id TEXT NOT NULL,
            status TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (shipment_id) REFERENCES shipments(shipment_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS costs (
            shipment_id TEXT PRIMARY KEY NOT NULL,
            fuel_cost REAL NOT NULL,
            labor_cost REAL NOT NULL,
            misc_cost REAL NOT NULL,
            FOREIGN KEY (shipment_id) REFERENCES shipments(shipment_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_shipments_status ON shipments(status)",
        "CREATE INDEX IF NOT EXISTS idx_shipments_courier_id ON shipments(courier_id)",
        "CREATE INDEX IF NOT EXISTS idx_shipments_order_date ON shipments(order_date)",
        "CREATE INDEX IF NOT EXISTS idx_shipments_origin_destination ON shipments(origin, destination)",
        "CREATE INDEX IF NOT EXISTS idx_tracking_shipment_id ON shipment_tracking(shipment_id)",
        "CREATE INDEX IF NOT EXISTS idx_tracking_timestamp ON shipment_tracking(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_routes_origin_destination ON routes(origin, destination)",
        "CREATE INDEX IF NOT EXISTS idx_warehouses_city ON warehouses(city)",
    ];

    for stmt in indexes {
        sqlx::query(stmt).execute(pool).await?;
    }

    tracing::info!("schema ready");
    Ok(())
}

/// Drop all tables, dependents before the tables they reference.
/// Used by the explicit reset operation only.
pub async fn drop_all_tables(pool: &DbPool) -> Result<()> {
    let tables = [
        "shipment_tracking",
        "costs",
        "shipments",
        "courier_staff",
        "routes",
        "warehouses",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(pool)
            .await?;
        tracing::debug!(table, "dropped table");
    }

    tracing::info!("all tables dropped");
    Ok(())
}
