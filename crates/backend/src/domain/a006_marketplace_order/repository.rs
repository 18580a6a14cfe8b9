use chrono::{DateTime, Utc};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a006_marketplace_order::aggregate::{
    order_status, MarketplaceOrder, MarketplaceOrderFilter, MarketplaceOrderId, OrderStats,
};
use contracts::enums::Platform;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, QuerySelect, Select, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marketplace_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub connection_id: String,
    pub internal_order_id: Option<String>,
    pub external_order_id: String,
    pub platform: String,
    pub status: String,
    pub order_data: String,
    pub shipping_info: String,
    pub buyer_info: String,
    pub total_amount: f64,
    pub currency: String,
    pub synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn json_or_empty(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
}

impl TryFrom<Model> for MarketplaceOrder {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let platform = Platform::from_code(&m.platform)
            .ok_or_else(|| anyhow::anyhow!("Unknown platform '{}' in order {}", m.platform, m.id))?;
        Ok(MarketplaceOrder {
            id: MarketplaceOrderId(Uuid::parse_str(&m.id)?),
            connection_id: ConnectionId(Uuid::parse_str(&m.connection_id)?),
            internal_order_id: m.internal_order_id.and_then(|s| Uuid::parse_str(&s).ok()),
            external_order_id: m.external_order_id,
            platform,
            status: m.status,
            order_data: json_or_empty(&m.order_data),
            shipping_info: json_or_empty(&m.shipping_info),
            buyer_info: json_or_empty(&m.buyer_info),
            total_amount: m.total_amount,
            currency: m.currency,
            synced_at: m.synced_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(o: &MarketplaceOrder) -> ActiveModel {
    ActiveModel {
        id: Set(o.id.value().to_string()),
        connection_id: Set(o.connection_id.value().to_string()),
        internal_order_id: Set(o.internal_order_id.map(|id| id.to_string())),
        external_order_id: Set(o.external_order_id.clone()),
        platform: Set(o.platform.code().to_string()),
        status: Set(o.status.clone()),
        order_data: Set(o.order_data.to_string()),
        shipping_info: Set(o.shipping_info.to_string()),
        buyer_info: Set(o.buyer_info.to_string()),
        total_amount: Set(o.total_amount),
        currency: Set(o.currency.clone()),
        synced_at: Set(o.synced_at),
        created_at: Set(o.created_at),
        updated_at: Set(o.updated_at),
    }
}

fn convert(models: Vec<Model>) -> anyhow::Result<Vec<MarketplaceOrder>> {
    models.into_iter().map(MarketplaceOrder::try_from).collect()
}

fn by_connection(query: Select<Entity>, connection_id: Option<ConnectionId>) -> Select<Entity> {
    match connection_id {
        Some(id) => query.filter(Column::ConnectionId.eq(id.value().to_string())),
        None => query,
    }
}

pub async fn create(order: &MarketplaceOrder) -> anyhow::Result<MarketplaceOrderId> {
    to_active(order).insert(conn()).await?;
    Ok(order.id)
}

pub async fn get_by_id(id: MarketplaceOrderId) -> anyhow::Result<Option<MarketplaceOrder>> {
    Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(MarketplaceOrder::try_from)
        .transpose()
}

pub async fn get_by_external_id(
    platform: Platform,
    external_order_id: &str,
) -> anyhow::Result<Option<MarketplaceOrder>> {
    Entity::find()
        .filter(Column::Platform.eq(platform.code()))
        .filter(Column::ExternalOrderId.eq(external_order_id))
        .one(conn())
        .await?
        .map(MarketplaceOrder::try_from)
        .transpose()
}

pub async fn get_by_internal_id(internal_order_id: Uuid) -> anyhow::Result<Option<MarketplaceOrder>> {
    Entity::find()
        .filter(Column::InternalOrderId.eq(internal_order_id.to_string()))
        .one(conn())
        .await?
        .map(MarketplaceOrder::try_from)
        .transpose()
}

pub async fn list(filter: &MarketplaceOrderFilter) -> anyhow::Result<(Vec<MarketplaceOrder>, u64)> {
    let page = filter.page_request();
    let mut query = by_connection(Entity::find(), filter.connection_id);
    if let Some(platform) = filter.platform {
        query = query.filter(Column::Platform.eq(platform.code()));
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(Column::Status.eq(status));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(Column::ExternalOrderId.contains(search));
    }
    if filter.imported_only.unwrap_or(false) {
        query = query.filter(Column::InternalOrderId.is_not_null());
    }
    if let Some(from) = filter.date_from {
        query = query.filter(Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(Column::CreatedAt.lte(to));
    }

    let paginator = query
        .order_by_desc(Column::CreatedAt)
        .paginate(conn(), page.page_size);
    let total = paginator.num_items().await?;
    let items = convert(paginator.fetch_page(page.index()).await?)?;
    Ok((items, total))
}

pub async fn list_by_platform(platform: Platform, limit: u64) -> anyhow::Result<Vec<MarketplaceOrder>> {
    convert(
        Entity::find()
            .filter(Column::Platform.eq(platform.code()))
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(conn())
            .await?,
    )
}

pub async fn update(order: &MarketplaceOrder) -> anyhow::Result<()> {
    to_active(order).update(conn()).await?;
    Ok(())
}

pub async fn update_status(id: MarketplaceOrderId, status: &str) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(status))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn link_to_internal_order(id: MarketplaceOrderId, internal_order_id: Uuid) -> anyhow::Result<bool> {
    let now = Utc::now();
    let result = Entity::update_many()
        .col_expr(Column::InternalOrderId, Expr::value(internal_order_id.to_string()))
        .col_expr(Column::SyncedAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete(id: MarketplaceOrderId) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.value().to_string())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Orders not yet created in the order service, oldest first
pub async fn list_unimported(limit: u64) -> anyhow::Result<Vec<MarketplaceOrder>> {
    convert(
        Entity::find()
            .filter(Column::InternalOrderId.is_null())
            .order_by_asc(Column::CreatedAt)
            .limit(limit)
            .all(conn())
            .await?,
    )
}

pub async fn stats(connection_id: Option<ConnectionId>) -> anyhow::Result<OrderStats> {
    let total_orders = by_connection(Entity::find(), connection_id)
        .count(conn())
        .await?;
    let imported_orders = by_connection(Entity::find(), connection_id)
        .filter(Column::InternalOrderId.is_not_null())
        .count(conn())
        .await?;
    let pending_orders = by_connection(Entity::find(), connection_id)
        .filter(Column::Status.eq(order_status::PENDING))
        .count(conn())
        .await?;
    let total_revenue: Option<Option<f64>> = by_connection(Entity::find(), connection_id)
        .select_only()
        .column_as(Expr::col(Column::TotalAmount).sum(), "total_revenue")
        .into_tuple()
        .one(conn())
        .await?;

    Ok(OrderStats {
        total_orders,
        imported_orders,
        pending_orders,
        total_revenue: total_revenue.flatten().unwrap_or(0.0),
    })
}
