use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Schema bootstrap, executed statement by statement on startup.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS connections (
        id TEXT PRIMARY KEY NOT NULL,
        platform TEXT NOT NULL,
        shop_id TEXT NOT NULL,
        shop_name TEXT NOT NULL DEFAULT '',
        access_token TEXT NOT NULL,
        refresh_token TEXT NOT NULL DEFAULT '',
        token_expires_at TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        settings TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_connections_platform_shop ON connections (platform, shop_id);",
    r#"
    CREATE TABLE IF NOT EXISTS sync_jobs (
        id TEXT PRIMARY KEY NOT NULL,
        connection_id TEXT NOT NULL,
        job_type TEXT NOT NULL,
        payload TEXT NOT NULL DEFAULT '{}',
        status TEXT NOT NULL DEFAULT 'pending',
        attempts INTEGER NOT NULL DEFAULT 0,
        max_attempts INTEGER NOT NULL DEFAULT 3,
        error_message TEXT,
        scheduled_at TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sync_jobs_status_scheduled ON sync_jobs (status, scheduled_at);",
    "CREATE INDEX IF NOT EXISTS idx_sync_jobs_connection ON sync_jobs (connection_id);",
    r#"
    CREATE TABLE IF NOT EXISTS product_mappings (
        id TEXT PRIMARY KEY NOT NULL,
        connection_id TEXT NOT NULL,
        internal_product_id TEXT NOT NULL,
        external_product_id TEXT NOT NULL,
        external_sku TEXT NOT NULL DEFAULT '',
        sync_status TEXT NOT NULL DEFAULT 'synced',
        last_synced_at TEXT,
        sync_error TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_product_mappings_connection ON product_mappings (connection_id, internal_product_id);",
    r#"
    CREATE TABLE IF NOT EXISTS variant_mappings (
        id TEXT PRIMARY KEY NOT NULL,
        product_mapping_id TEXT NOT NULL,
        internal_variant_id TEXT NOT NULL,
        external_variant_id TEXT NOT NULL,
        external_sku TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS category_mappings (
        id TEXT PRIMARY KEY NOT NULL,
        connection_id TEXT NOT NULL,
        internal_category_id TEXT NOT NULL,
        external_category_id TEXT NOT NULL,
        external_category_name TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS imported_products (
        id TEXT PRIMARY KEY NOT NULL,
        connection_id TEXT NOT NULL,
        external_product_id TEXT NOT NULL,
        external_sku TEXT NOT NULL DEFAULT '',
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price REAL NOT NULL DEFAULT 0,
        stock INTEGER NOT NULL DEFAULT 0,
        category_id TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT '',
        image_url TEXT NOT NULL DEFAULT '',
        is_mapped INTEGER NOT NULL DEFAULT 0,
        mapped_to_product_id TEXT,
        imported_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_imported_products_external ON imported_products (connection_id, external_product_id);",
    r#"
    CREATE TABLE IF NOT EXISTS marketplace_orders (
        id TEXT PRIMARY KEY NOT NULL,
        connection_id TEXT NOT NULL,
        internal_order_id TEXT,
        external_order_id TEXT NOT NULL,
        platform TEXT NOT NULL,
        status TEXT NOT NULL,
        order_data TEXT NOT NULL DEFAULT '{}',
        shipping_info TEXT NOT NULL DEFAULT '{}',
        buyer_info TEXT NOT NULL DEFAULT '{}',
        total_amount REAL NOT NULL DEFAULT 0,
        currency TEXT NOT NULL DEFAULT 'MYR',
        synced_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_marketplace_orders_external ON marketplace_orders (platform, external_order_id);",
    r#"
    CREATE TABLE IF NOT EXISTS webhook_events (
        id TEXT PRIMARY KEY NOT NULL,
        platform TEXT NOT NULL,
        event_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        signature TEXT NOT NULL DEFAULT '',
        payload_hash TEXT NOT NULL DEFAULT '',
        processed INTEGER NOT NULL DEFAULT 0,
        error_message TEXT,
        received_at TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_webhook_events_platform_hash ON webhook_events (platform, payload_hash);",
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/marketplace.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;
    tracing::info!("Database ready at {}", absolute_path.display());

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Creates missing tables and indexes.
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await?;
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
