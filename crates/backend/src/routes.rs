use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use crate::handlers;

const ADMIN_PREFIX: &str = "/api/v1/admin/marketplace";

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest(ADMIN_PREFIX, admin_routes())
        // ========================================
        // INBOUND (marketplaces and internal services)
        // ========================================
        .route("/api/v1/webhooks/shopee", post(handlers::webhooks::shopee))
        .route("/api/v1/webhooks/tiktok", post(handlers::webhooks::tiktok))
        .route(
            "/api/v1/events/stock-changed",
            post(handlers::events::stock_changed),
        )
}

fn admin_routes() -> Router {
    Router::new()
        // Connections
        .route("/connections", get(handlers::connections::list_all))
        .route(
            "/connections/active",
            get(handlers::connections::list_active),
        )
        .route(
            "/connections/:id",
            get(handlers::connections::get_by_id).delete(handlers::connections::disconnect),
        )
        .route(
            "/connections/:id/refresh",
            post(handlers::connections::refresh_token),
        )
        // OAuth
        .route(
            "/shopee/callback",
            get(handlers::connections::shopee_callback),
        )
        .route(
            "/tiktok/callback",
            get(handlers::connections::tiktok_callback),
        )
        .route(
            "/shopee/auth-url",
            get(handlers::connections::shopee_auth_url),
        )
        .route(
            "/tiktok/auth-url",
            get(handlers::connections::tiktok_auth_url),
        )
        // Products
        .route("/connections/:id/products", get(handlers::products::list))
        .route(
            "/connections/:id/products/push",
            post(handlers::products::push),
        )
        .route(
            "/connections/:id/products/update",
            post(handlers::products::update),
        )
        .route(
            "/connections/:id/products/import",
            post(handlers::products::import),
        )
        .route(
            "/connections/:id/products/:mapping_id",
            put(handlers::products::update_status).delete(handlers::products::delete),
        )
        .route(
            "/connections/:id/imported-products",
            get(handlers::products::imported),
        )
        // Inventory
        .route(
            "/connections/:id/inventory/push",
            post(handlers::inventory::push),
        )
        .route(
            "/connections/:id/inventory/status",
            post(handlers::inventory::status),
        )
        // Categories
        .route(
            "/connections/:id/categories/external",
            get(handlers::categories::external),
        )
        .route(
            "/connections/:id/categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/connections/:id/categories/:mapping_id",
            axum::routing::delete(handlers::categories::delete),
        )
        // Orders
        .route("/orders", get(handlers::orders::list))
        .route("/orders/stats", get(handlers::orders::stats))
        .route(
            "/connections/:id/orders/sync",
            post(handlers::orders::sync),
        )
        .route("/orders/:id/import", post(handlers::orders::import))
        .route("/orders/:id/status", put(handlers::orders::update_status))
        // Jobs
        .route("/connections/:id/jobs", get(handlers::jobs::list))
        .route(
            "/connections/:id/jobs/retry",
            post(handlers::jobs::retry_failed),
        )
        .route("/jobs/:id", get(handlers::jobs::get_by_id))
        .route("/jobs/:id/log", get(handlers::jobs::get_log))
        // Webhook journal
        .route("/webhook-events", get(handlers::webhooks::list_events))
}
