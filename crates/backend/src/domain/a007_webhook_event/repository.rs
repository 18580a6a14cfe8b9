use chrono::{DateTime, Utc};
use contracts::domain::a007_webhook_event::aggregate::{WebhookEvent, WebhookEventFilter, WebhookEventId};
use contracts::enums::Platform;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub platform: String,
    pub event_type: String,
    pub payload: String,
    pub signature: String,
    pub payload_hash: String,
    pub processed: bool,
    pub error_message: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for WebhookEvent {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let platform = Platform::from_code(&m.platform)
            .ok_or_else(|| anyhow::anyhow!("Unknown platform '{}' in webhook {}", m.platform, m.id))?;
        Ok(WebhookEvent {
            id: WebhookEventId(Uuid::parse_str(&m.id)?),
            platform,
            event_type: m.event_type,
            payload: serde_json::from_str(&m.payload).unwrap_or(serde_json::Value::String(m.payload)),
            signature: m.signature,
            payload_hash: m.payload_hash,
            processed: m.processed,
            error_message: m.error_message,
            received_at: m.received_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn convert(models: Vec<Model>) -> anyhow::Result<Vec<WebhookEvent>> {
    models.into_iter().map(WebhookEvent::try_from).collect()
}

pub async fn create(event: &WebhookEvent) -> anyhow::Result<WebhookEventId> {
    let active = ActiveModel {
        id: Set(event.id.value().to_string()),
        platform: Set(event.platform.code().to_string()),
        event_type: Set(event.event_type.clone()),
        payload: Set(event.payload.to_string()),
        signature: Set(event.signature.clone()),
        payload_hash: Set(event.payload_hash.clone()),
        processed: Set(event.processed),
        error_message: Set(event.error_message.clone()),
        received_at: Set(event.received_at),
    };
    active.insert(conn()).await?;
    Ok(event.id)
}

pub async fn get_by_id(id: WebhookEventId) -> anyhow::Result<Option<WebhookEvent>> {
    Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(WebhookEvent::try_from)
        .transpose()
}

/// Delivery of the same body on the same platform that is processed or
/// still being handled. Failed deliveries do not count.
pub async fn find_delivered_by_hash(platform: Platform, payload_hash: &str) -> anyhow::Result<Option<WebhookEvent>> {
    Entity::find()
        .filter(Column::Platform.eq(platform.code()))
        .filter(Column::PayloadHash.eq(payload_hash))
        .filter(
            Condition::any()
                .add(Column::Processed.eq(true))
                .add(Column::ErrorMessage.is_null()),
        )
        .one(conn())
        .await?
        .map(WebhookEvent::try_from)
        .transpose()
}

pub async fn mark_processed(id: WebhookEventId) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::Processed, Expr::value(true))
        .col_expr(Column::ErrorMessage, Expr::value(Option::<String>::None))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Keeps `processed = false` so the event stays visible among unprocessed ones.
pub async fn mark_failed(id: WebhookEventId, error: &str) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::ErrorMessage, Expr::value(error))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn list_unprocessed(limit: u64) -> anyhow::Result<Vec<WebhookEvent>> {
    convert(
        Entity::find()
            .filter(Column::Processed.eq(false))
            .order_by_asc(Column::ReceivedAt)
            .limit(limit)
            .all(conn())
            .await?,
    )
}

pub async fn list_recent(platform: Option<Platform>, limit: u64) -> anyhow::Result<Vec<WebhookEvent>> {
    let mut query = Entity::find();
    if let Some(platform) = platform {
        query = query.filter(Column::Platform.eq(platform.code()));
    }
    convert(
        query
            .order_by_desc(Column::ReceivedAt)
            .limit(limit)
            .all(conn())
            .await?,
    )
}

pub async fn list(filter: &WebhookEventFilter) -> anyhow::Result<(Vec<WebhookEvent>, u64)> {
    let page = filter.page_request();
    let mut query = Entity::find();
    if let Some(platform) = filter.platform {
        query = query.filter(Column::Platform.eq(platform.code()));
    }
    if let Some(event_type) = filter.event_type.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(Column::EventType.eq(event_type));
    }
    if let Some(processed) = filter.processed {
        query = query.filter(Column::Processed.eq(processed));
    }
    let paginator = query
        .order_by_desc(Column::ReceivedAt)
        .paginate(conn(), page.page_size);
    let total = paginator.num_items().await?;
    let items = convert(paginator.fetch_page(page.index()).await?)?;
    Ok((items, total))
}
