//! Repositories and one worker tick against a temporary SQLite file.
//!
//! The connection lives in a process-wide cell, so everything runs inside a
//! single test.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use contracts::domain::a001_connection::aggregate::Connection;
use contracts::domain::a002_sync_job::aggregate::{
    SyncJob, SyncJobFilter, SyncJobId, SyncJobStatus, SyncJobType,
};
use contracts::domain::a003_product_mapping::aggregate::{
    MappingSyncStatus, ProductMapping, ProductMappingFilter, VariantMapping,
};
use contracts::domain::a004_category_mapping::aggregate::CreateCategoryMappingDto;
use contracts::domain::a005_imported_product::aggregate::{ImportedProduct, ImportedProductFilter};
use contracts::domain::a006_marketplace_order::aggregate::{MarketplaceOrder, MarketplaceOrderFilter};
use contracts::domain::a007_webhook_event::aggregate::{WebhookEvent, WebhookEventFilter};
use contracts::enums::Platform;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::db;
use crate::domain::{
    a001_connection, a002_sync_job, a003_product_mapping, a004_category_mapping,
    a005_imported_product, a006_marketplace_order, a007_webhook_event,
};
use crate::shared::config::WorkerConfig;
use crate::shared::crypto;
use crate::shared::marketplaces::tiktok;
use crate::usecases::u106_process_webhook;
use crate::domain::a002_sync_job::repository::{StaleRecovery, LOST_JOB_ERROR};
use crate::system::jobs::{
    handler::JobHandler,
    logger::JobLogger,
    registry::JobHandlerRegistry,
    worker::{retry_window, SyncJobWorker},
};

fn connection(platform: Platform, shop_id: &str, expires_in: Duration) -> Connection {
    Connection::new_for_insert(
        platform,
        shop_id.to_string(),
        format!("Shop {}", shop_id),
        "access".into(),
        "refresh".into(),
        Some(Utc::now() + expires_in),
    )
}

#[tokio::test]
async fn test_repositories_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marketplace.db");
    db::initialize_database(Some(path.to_str().unwrap())).await.unwrap();
    // bootstrap is idempotent
    db::bootstrap_schema(db::get_connection()).await.unwrap();

    let shop = check_connections().await;
    check_sync_jobs(&shop).await;
    check_product_mappings(&shop).await;
    check_category_mappings(&shop).await;
    check_imported_products(&shop).await;
    check_orders(&shop).await;
    check_webhook_events().await;
    check_worker_tick(&shop, dir.path()).await;
}

async fn check_connections() -> Connection {
    use a001_connection::{repository, service};

    let soon = connection(Platform::Shopee, "1001", Duration::minutes(10));
    let later = connection(Platform::TikTok, "7002", Duration::days(2));
    let spare = connection(Platform::Shopee, "1003", Duration::days(2));
    for c in [&soon, &later, &spare] {
        repository::create(c).await.unwrap();
    }

    let found = repository::get_by_platform_and_shop_id(Platform::Shopee, "1001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, soon.id);
    assert_eq!(found.shop_name, "Shop 1001");
    assert_eq!(found.settings, json!({}));

    let refresh: Vec<_> = service::list_needing_refresh(30)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(refresh, vec![soon.id]);

    // re-authorizing the same shop keeps the row
    let mut again = connection(Platform::Shopee, "1001", Duration::hours(4));
    again.shop_name = "Renamed".into();
    let upserted = repository::upsert_by_shop(&again).await.unwrap();
    assert_eq!(upserted.id, soon.id);
    assert_eq!(upserted.shop_name, "Renamed");
    assert!(service::list_needing_refresh(30).await.unwrap().is_empty());

    let expires = Utc::now() + Duration::hours(6);
    assert!(repository::update_tokens(soon.id, "a2", "r2", Some(expires))
        .await
        .unwrap());
    let reloaded = repository::get_by_id(soon.id).await.unwrap().unwrap();
    assert_eq!(reloaded.access_token, "a2");
    assert_eq!(reloaded.refresh_token, "r2");

    assert!(repository::deactivate(spare.id).await.unwrap());
    assert!(service::find_active(Platform::Shopee, "1003").await.unwrap().is_none());
    assert_eq!(repository::list_active().await.unwrap().len(), 2);
    assert_eq!(repository::list_all().await.unwrap().len(), 3);
    assert_eq!(
        repository::list_active_by_platform(Platform::TikTok).await.unwrap().len(),
        1
    );
    assert!(repository::delete(spare.id).await.unwrap());
    assert!(repository::get_by_id(spare.id).await.unwrap().is_none());

    reloaded
}

async fn check_sync_jobs(shop: &Connection) {
    use a002_sync_job::{repository, service};

    let job = service::enqueue(shop.id, SyncJobType::InventorySync, &json!({"mapping_id": "m"}))
        .await
        .unwrap();
    assert!(repository::has_pending(shop.id, SyncJobType::InventorySync).await.unwrap());
    assert!(!repository::has_pending(shop.id, SyncJobType::OrderSync).await.unwrap());

    let mut later = SyncJob::new(shop.id, SyncJobType::OrderSync, json!({}));
    later.scheduled_at = Utc::now() + Duration::hours(1);
    repository::create(&later).await.unwrap();

    let due: Vec<_> = repository::get_pending_jobs(10)
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(due, vec![job.id]);

    assert!(repository::mark_processing(job.id).await.unwrap());
    assert!(!repository::mark_processing(job.id).await.unwrap());
    repository::mark_failed(job.id, "boom").await.unwrap();
    let failed = repository::get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(failed.status, SyncJobStatus::Failed);
    assert_eq!(failed.attempts, 1);
    assert_eq!(failed.error_message.as_deref(), Some("boom"));
    assert_eq!(repository::get_failed_jobs(shop.id).await.unwrap().len(), 1);

    // a failure is retried once retry_delay has passed, due at requeue time
    let retry = WorkerConfig {
        retry_delay_seconds: 60,
        ..Default::default()
    };
    let (failed_before, retry_at) = retry_window(&retry, Utc::now());
    assert_eq!(repository::requeue_failed(failed_before, retry_at).await.unwrap(), 0);
    let (failed_before, retry_at) = retry_window(&retry, Utc::now() + Duration::seconds(61));
    assert_eq!(repository::requeue_failed(failed_before, retry_at).await.unwrap(), 1);
    let retried = repository::get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(retried.status, SyncJobStatus::Pending);
    assert!((retried.scheduled_at - retry_at).num_milliseconds().abs() < 1);
    assert!(retried.completed_at.is_none());

    assert!(repository::mark_processing(job.id).await.unwrap());
    assert_eq!(
        repository::requeue_stale_processing(Utc::now() + Duration::seconds(1))
            .await
            .unwrap(),
        StaleRecovery {
            requeued: 1,
            failed: 0
        }
    );

    let filter = SyncJobFilter {
        job_type: Some(SyncJobType::OrderSync),
        ..Default::default()
    };
    let page = service::list_by_connection(shop.id, &filter).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, later.id);

    let counts = repository::count_by_status(shop.id).await.unwrap();
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.failed, 0);

    // lost on its final attempt: failed for good, no longer counted as pending
    let mut last_try = SyncJob::new(shop.id, SyncJobType::TokenRefresh, json!({}));
    last_try.attempts = last_try.max_attempts - 1;
    repository::create(&last_try).await.unwrap();
    assert!(repository::mark_processing(last_try.id).await.unwrap());
    assert_eq!(
        repository::requeue_stale_processing(Utc::now() + Duration::seconds(1))
            .await
            .unwrap(),
        StaleRecovery {
            requeued: 0,
            failed: 1
        }
    );
    let lost = repository::get_by_id(last_try.id).await.unwrap().unwrap();
    assert_eq!(lost.status, SyncJobStatus::Failed);
    assert_eq!(lost.attempts, lost.max_attempts);
    assert_eq!(lost.error_message.as_deref(), Some(LOST_JOB_ERROR));
    assert!(lost.completed_at.is_some());
    assert!(!repository::has_pending(shop.id, SyncJobType::TokenRefresh).await.unwrap());
    assert_eq!(
        repository::requeue_failed(Utc::now() + Duration::seconds(1), Utc::now())
            .await
            .unwrap(),
        0
    );
    assert!(repository::delete(last_try.id).await.unwrap());

    // exhausted jobs are neither due nor retried
    let mut exhausted = SyncJob::new(shop.id, SyncJobType::InventorySync, json!({}));
    exhausted.status = SyncJobStatus::Failed;
    exhausted.attempts = exhausted.max_attempts;
    repository::create(&exhausted).await.unwrap();
    assert_eq!(service::retry_failed(shop.id).await.unwrap(), 0);
    assert_eq!(
        repository::requeue_failed(Utc::now() + Duration::seconds(1), Utc::now())
            .await
            .unwrap(),
        0
    );

    // a row whose type this build does not know is failed in place
    let bogus = Uuid::new_v4().to_string();
    insert_raw_job(&bogus, shop, "catalog_rebuild", "{}", "pending").await;
    // so is one whose payload is not JSON
    let broken = Uuid::new_v4().to_string();
    insert_raw_job(&broken, shop, "inventory_sync", "{not json", "pending").await;
    let due: Vec<_> = repository::get_pending_jobs(10)
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(due, vec![job.id]);
    assert_eq!(raw_status(&bogus).await.as_deref(), Some("failed"));
    assert_eq!(raw_status(&broken).await.as_deref(), Some("failed"));

    // an unknown status is an error, not a pending job
    let paused = Uuid::new_v4().to_string();
    insert_raw_job(&paused, shop, "inventory_sync", "{}", "paused").await;
    let err = repository::get_by_id(SyncJobId(Uuid::parse_str(&paused).unwrap()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown status 'paused'"));

    repository::mark_completed(job.id).await.unwrap();
    assert_eq!(repository::delete_old_completed(0).await.unwrap(), 1);
    assert!(repository::get_by_id(job.id).await.unwrap().is_none());

    for id in [later.id, exhausted.id] {
        assert!(repository::delete(id).await.unwrap());
    }
    db::get_connection()
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "DELETE FROM sync_jobs".to_string(),
        ))
        .await
        .unwrap();
}

async fn insert_raw_job(id: &str, shop: &Connection, job_type: &str, payload: &str, status: &str) {
    let now = Utc::now().to_rfc3339();
    db::get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO sync_jobs (id, connection_id, job_type, payload, status, attempts, max_attempts, scheduled_at, created_at) \
             VALUES (?, ?, ?, ?, ?, 0, 3, ?, ?)",
            [
                id.into(),
                shop.id.value().to_string().into(),
                job_type.into(),
                payload.into(),
                status.into(),
                "2000-01-01T00:00:00+00:00".into(),
                now.into(),
            ],
        ))
        .await
        .unwrap();
}

async fn raw_status(id: &str) -> Option<String> {
    db::get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT status FROM sync_jobs WHERE id = ?",
            [id.into()],
        ))
        .await
        .unwrap()
        .map(|row| row.try_get("", "status").unwrap())
}

async fn check_product_mappings(shop: &Connection) {
    use a003_product_mapping::{repository, service};

    let product_id = Uuid::new_v4();
    let mut mapping = ProductMapping::new_for_insert(shop.id, product_id, "987".into(), "SKU-1".into());
    mapping.variant_mappings.push(VariantMapping::new_for_insert(
        mapping.id,
        Uuid::new_v4(),
        "SKU-1-RED".into(),
        "SKU-1-RED".into(),
    ));
    repository::create(&mapping).await.unwrap();

    let loaded = repository::get_by_id(mapping.id).await.unwrap().unwrap();
    assert_eq!(loaded.variant_mappings.len(), 1);
    assert_eq!(loaded.sync_status, MappingSyncStatus::Synced);
    let by_internal = repository::get_by_connection_and_internal_id(shop.id, product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_internal.id, mapping.id);
    assert!(repository::get_by_connection_and_external_id(shop.id, "987")
        .await
        .unwrap()
        .is_some());

    let other = ProductMapping::new_for_insert(shop.id, Uuid::new_v4(), "988".into(), "SKU-2".into());
    assert_eq!(repository::create_batch(&[other.clone()]).await.unwrap(), 1);

    assert!(repository::update_sync_status(mapping.id, MappingSyncStatus::Error, Some("rejected".into()))
        .await
        .unwrap());
    let errors = repository::list_errors(shop.id).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].sync_error.as_deref(), Some("rejected"));

    let filter = ProductMappingFilter {
        sync_status: Some(MappingSyncStatus::Synced),
        ..Default::default()
    };
    let page = service::list(shop.id, &filter).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, other.id);
    assert_eq!(repository::list_by_internal_product(product_id).await.unwrap().len(), 1);

    assert!(service::set_status(other.id, MappingSyncStatus::Pending).await.unwrap());
    assert_eq!(repository::list_pending(10).await.unwrap().len(), 1);

    assert!(repository::delete(mapping.id).await.unwrap());
    assert!(repository::list_variants(mapping.id).await.unwrap().is_empty());
    assert_eq!(repository::delete_by_connection(shop.id).await.unwrap(), 1);
}

async fn check_category_mappings(shop: &Connection) {
    use a004_category_mapping::{repository, service, service::CategoryMappingError};

    let internal = Uuid::new_v4();
    let dto = CreateCategoryMappingDto {
        internal_category_id: internal,
        external_category_id: "100644".into(),
        external_category_name: Some("Phones".into()),
    };
    let created = service::create(shop.id, &dto).await.unwrap();
    assert!(matches!(
        service::create(shop.id, &dto).await,
        Err(CategoryMappingError::Conflict(id)) if id == internal
    ));

    assert_eq!(
        service::resolve_external(shop.id, None, Some(internal)).await.unwrap(),
        Some("100644".to_string())
    );
    assert_eq!(
        service::resolve_external(shop.id, Some(created.id.value()), None)
            .await
            .unwrap(),
        Some("100644".to_string())
    );
    assert_eq!(
        service::resolve_external(shop.id, None, Some(Uuid::new_v4())).await.unwrap(),
        None
    );
    assert!(repository::get_by_external_category(shop.id, "100644")
        .await
        .unwrap()
        .is_some());

    assert!(repository::delete(created.id).await.unwrap());
    assert!(service::list(shop.id).await.unwrap().is_empty());
}

async fn check_imported_products(shop: &Connection) {
    use a005_imported_product::repository;

    let mut first = ImportedProduct::new_for_insert(shop.id, "p-1".into(), "Phone case".into());
    first.status = "active".into();
    repository::upsert(&first).await.unwrap();

    // same external id, new data: one row, updated
    let mut again = ImportedProduct::new_for_insert(shop.id, "p-1".into(), "Phone case v2".into());
    again.price = 12.5;
    again.status = "active".into();
    let second = ImportedProduct::new_for_insert(shop.id, "p-2".into(), "Charger".into());
    repository::upsert_batch(&[again, second]).await.unwrap();

    let (items, total) = repository::list(shop.id, &ImportedProductFilter::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);
    let stored = repository::get_by_external_id(shop.id, "p-1").await.unwrap().unwrap();
    assert_eq!(stored.name, "Phone case v2");
    assert_eq!(stored.price, 12.5);

    assert!(repository::set_mapped(stored.id, Uuid::new_v4()).await.unwrap());
    assert_eq!(repository::count_unmapped(shop.id).await.unwrap(), 1);
    let search = ImportedProductFilter {
        search: Some("charg".into()),
        ..Default::default()
    };
    assert_eq!(repository::list(shop.id, &search).await.unwrap().1, 1);
    assert!(repository::set_unmapped(stored.id).await.unwrap());
    assert_eq!(repository::count_unmapped(shop.id).await.unwrap(), 2);

    assert!(repository::delete(stored.id).await.unwrap());
    assert_eq!(repository::delete_by_connection(shop.id).await.unwrap(), 1);
}

async fn check_orders(shop: &Connection) {
    use a006_marketplace_order::{repository, service};

    let mut first = MarketplaceOrder::new_for_insert(shop.id, shop.platform, "ORD-1".into(), "pending".into());
    first.total_amount = 100.0;
    let mut second = MarketplaceOrder::new_for_insert(shop.id, shop.platform, "ORD-2".into(), "shipped".into());
    second.total_amount = 50.5;
    repository::create(&first).await.unwrap();
    repository::create(&second).await.unwrap();

    // re-sync keeps id and link
    let internal = Uuid::new_v4();
    assert!(repository::link_to_internal_order(first.id, internal).await.unwrap());
    let mut resynced = MarketplaceOrder::new_for_insert(shop.id, shop.platform, "ORD-1".into(), "processing".into());
    resynced.total_amount = 100.0;
    let saved = service::upsert(resynced).await.unwrap();
    assert_eq!(saved.id, first.id);
    assert_eq!(saved.internal_order_id, Some(internal));
    assert!(saved.synced_at.is_some());
    assert_eq!(
        repository::get_by_internal_id(internal).await.unwrap().unwrap().status,
        "processing"
    );

    let stats = service::stats(Some(shop.id)).await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.imported_orders, 1);
    assert_eq!(stats.pending_orders, 0);
    assert!((stats.total_revenue - 150.5).abs() < 1e-9);

    let imported = MarketplaceOrderFilter {
        imported_only: Some(true),
        ..Default::default()
    };
    assert_eq!(service::list(&imported).await.unwrap().total, 1);
    let search = MarketplaceOrderFilter {
        search: Some("ORD-2".into()),
        ..Default::default()
    };
    assert_eq!(service::list(&search).await.unwrap().items[0].id, second.id);

    let unimported = repository::list_unimported(10).await.unwrap();
    assert_eq!(unimported.len(), 1);
    assert!(repository::update_status(second.id, "delivered").await.unwrap());
    assert_eq!(
        repository::get_by_external_id(shop.platform, "ORD-2")
            .await
            .unwrap()
            .unwrap()
            .status,
        "delivered"
    );
    assert_eq!(repository::list_by_platform(shop.platform, 10).await.unwrap().len(), 2);
    assert!(repository::delete(second.id).await.unwrap());
}

async fn check_webhook_events() {
    use a007_webhook_event::repository;

    let ok = WebhookEvent::new_for_insert(
        Platform::TikTok,
        "order.status_changed",
        json!({"type": 1}),
        "sig".into(),
        "hash-1".into(),
    );
    let bad = WebhookEvent::new_for_insert(
        Platform::Shopee,
        "order.created",
        json!({"code": 3}),
        String::new(),
        "hash-2".into(),
    );
    repository::create(&ok).await.unwrap();
    repository::create(&bad).await.unwrap();

    // still in flight counts as delivered
    assert!(repository::find_delivered_by_hash(Platform::TikTok, "hash-1")
        .await
        .unwrap()
        .is_some());
    assert!(repository::find_delivered_by_hash(Platform::Shopee, "hash-1")
        .await
        .unwrap()
        .is_none());
    assert!(repository::mark_processed(ok.id).await.unwrap());
    assert!(repository::find_delivered_by_hash(Platform::TikTok, "hash-1")
        .await
        .unwrap()
        .is_some());

    assert!(repository::mark_failed(bad.id, "no connection").await.unwrap());
    assert!(repository::find_delivered_by_hash(Platform::Shopee, "hash-2")
        .await
        .unwrap()
        .is_none());
    let failed = repository::get_by_id(bad.id).await.unwrap().unwrap();
    assert!(!failed.processed);
    assert_eq!(failed.error_message.as_deref(), Some("no connection"));
    assert_eq!(repository::list_unprocessed(10).await.unwrap().len(), 1);
    assert_eq!(
        repository::list_recent(Some(Platform::TikTok), 10).await.unwrap().len(),
        1
    );

    let filter = WebhookEventFilter {
        processed: Some(false),
        ..Default::default()
    };
    let (items, total) = repository::list(&filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].id, bad.id);

    // a redelivery while the first copy is being handled is dropped
    let body = br#"{"type":"PRODUCT_CREATION","shop_id":"7002","data":{}}"#;
    let pending = WebhookEvent::new_for_insert(
        Platform::TikTok,
        "tiktok.product.created",
        json!({}),
        "sig".into(),
        crypto::sha256_hex(body),
    );
    repository::create(&pending).await.unwrap();
    let payload = tiktok::webhook::parse_push(body).unwrap();
    assert!(u106_process_webhook::service::accept(Platform::TikTok, body, "sig", payload)
        .await
        .unwrap()
        .is_none());

    let body = br#"{"type":"PRODUCT_DELETION","shop_id":"7002","data":{}}"#;
    let payload = tiktok::webhook::parse_push(body).unwrap();
    let stored = u106_process_webhook::service::accept(Platform::TikTok, body, "sig", payload.clone())
        .await
        .unwrap()
        .unwrap();
    assert!(repository::get_by_id(stored).await.unwrap().unwrap().processed);
    assert!(u106_process_webhook::service::accept(Platform::TikTok, body, "sig", payload)
        .await
        .unwrap()
        .is_none());
}

struct Succeeds;

#[async_trait]
impl JobHandler for Succeeds {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::InventorySync
    }

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()> {
        logger.log(job.id, "pushed 1 item");
        Ok(())
    }
}

struct Fails;

#[async_trait]
impl JobHandler for Fails {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::OrderSync
    }

    async fn run(&self, _job: &SyncJob, _logger: &JobLogger) -> Result<()> {
        anyhow::bail!("order service unavailable")
    }
}

async fn check_worker_tick(shop: &Connection, log_base: &std::path::Path) {
    use a002_sync_job::{repository, service};

    let mut registry = JobHandlerRegistry::new();
    registry.register(Succeeds);
    registry.register(Fails);
    let logger = Arc::new(JobLogger::new(log_base));
    let config = WorkerConfig {
        retry_delay_seconds: 3600,
        ..Default::default()
    };
    let worker = SyncJobWorker::new(Arc::new(registry), Arc::clone(&logger), config);

    let ok = service::enqueue(shop.id, SyncJobType::InventorySync, &json!({})).await.unwrap();
    let failing = service::enqueue(shop.id, SyncJobType::OrderSync, &json!({})).await.unwrap();
    let orphan = service::enqueue(shop.id, SyncJobType::TokenRefresh, &json!({})).await.unwrap();
    let mut final_try = SyncJob::new(shop.id, SyncJobType::OrderSync, json!({}));
    final_try.attempts = final_try.max_attempts - 1;
    repository::create(&final_try).await.unwrap();
    // left behind by a crashed worker on its last attempt
    let mut abandoned = SyncJob::new(shop.id, SyncJobType::InventorySync, json!({}));
    abandoned.status = SyncJobStatus::Processing;
    abandoned.attempts = abandoned.max_attempts;
    abandoned.started_at = Some(Utc::now() - Duration::hours(1));
    repository::create(&abandoned).await.unwrap();

    assert_eq!(worker.tick().await.unwrap(), 4);

    let abandoned = repository::get_by_id(abandoned.id).await.unwrap().unwrap();
    assert_eq!(abandoned.status, SyncJobStatus::Failed);
    assert!(abandoned.is_terminal());

    let mut finished = Vec::new();
    for _ in 0..200 {
        finished.clear();
        for id in [ok.id, failing.id, orphan.id, final_try.id] {
            let job = repository::get_by_id(id).await.unwrap().unwrap();
            if matches!(job.status, SyncJobStatus::Completed | SyncJobStatus::Failed) {
                finished.push(job);
            }
        }
        if finished.len() == 4 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    assert_eq!(finished.len(), 4, "jobs did not finish");

    assert_eq!(finished[0].status, SyncJobStatus::Completed);
    assert_eq!(finished[0].attempts, 1);
    assert_eq!(finished[1].status, SyncJobStatus::Failed);
    assert_eq!(finished[1].error_message.as_deref(), Some("order service unavailable"));
    assert_eq!(finished[2].status, SyncJobStatus::Failed);
    assert!(finished[2]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("No handler"));

    let log = logger.read_log(ok.id).unwrap().unwrap();
    assert!(log.contains("pushed 1 item"));
    assert!(log.contains("Completed"));

    assert_eq!(finished[3].status, SyncJobStatus::Failed);
    assert_eq!(finished[3].attempts, finished[3].max_attempts);
    assert!(finished[3].is_terminal());
    let log = logger.read_log(final_try.id).unwrap().unwrap();
    assert!(log.contains("attempt 3/3"));

    // failures wait for the retry delay
    assert_eq!(worker.tick().await.unwrap(), 0);
    assert_eq!(
        repository::get_by_id(failing.id).await.unwrap().unwrap().status,
        SyncJobStatus::Failed
    );

    // once it has passed only jobs with attempts left come back
    assert_eq!(
        repository::requeue_failed(Utc::now() + Duration::seconds(1), Utc::now())
            .await
            .unwrap(),
        2
    );
    for id in [final_try.id, abandoned.id] {
        let job = repository::get_by_id(id).await.unwrap().unwrap();
        assert_eq!(job.status, SyncJobStatus::Failed);
    }
    assert_eq!(
        repository::get_by_id(failing.id).await.unwrap().unwrap().status,
        SyncJobStatus::Pending
    );
}
