#![allow(
    clippy::useless_format,
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::derivable_impls
)]

pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    let config = shared::config::load_config()?;
    shared::config::set_config(config.clone());

    system::tracing::initialize()?;

    let db_path = shared::config::get_database_path(&config)?;
    let db_path_str = db_path.to_string_lossy().to_string();
    shared::data::db::initialize_database(Some(&db_path_str))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    shared::crypto::init_encryptor(&config.security.encryption_key)?;
    shared::marketplaces::init_providers(&config);
    shared::clients::init_clients(&config.services);

    // Фоновые задачи: очередь заданий, обновление токенов, слушатель остатков
    let (worker, scheduler) = system::jobs::initialization::initialize_jobs(&config.worker);
    tokio::spawn(async move {
        worker.run_loop().await;
    });
    tokio::spawn(async move {
        scheduler.run_loop().await;
    });
    shared::events::spawn_stock_listener();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = routes::configure_routes()
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server.host '{}': {}", config.server.host, e))?;
    let addr = SocketAddr::new(host, config.server.port);

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    addr.port()
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
