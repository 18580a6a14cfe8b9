use chrono::{DateTime, Duration, Utc};
use contracts::domain::a001_connection::aggregate::{Connection, ConnectionId};
use contracts::enums::Platform;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub platform: String,
    pub shop_id: String,
    pub shop_name: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub settings: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Connection {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let platform = Platform::from_code(&m.platform)
            .ok_or_else(|| anyhow::anyhow!("Unknown platform '{}' in connection {}", m.platform, m.id))?;
        Ok(Connection {
            id: ConnectionId(Uuid::parse_str(&m.id)?),
            platform,
            shop_id: m.shop_id,
            shop_name: m.shop_name,
            access_token: m.access_token,
            refresh_token: m.refresh_token,
            token_expires_at: m.token_expires_at,
            is_active: m.is_active,
            settings: serde_json::from_str(&m.settings).unwrap_or_else(|_| serde_json::json!({})),
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(c: &Connection) -> ActiveModel {
    ActiveModel {
        id: Set(c.id.value().to_string()),
        platform: Set(c.platform.code().to_string()),
        shop_id: Set(c.shop_id.clone()),
        shop_name: Set(c.shop_name.clone()),
        access_token: Set(c.access_token.clone()),
        refresh_token: Set(c.refresh_token.clone()),
        token_expires_at: Set(c.token_expires_at),
        is_active: Set(c.is_active),
        settings: Set(c.settings.to_string()),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
    }
}

fn convert(models: Vec<Model>) -> anyhow::Result<Vec<Connection>> {
    models.into_iter().map(Connection::try_from).collect()
}

pub async fn create(connection: &Connection) -> anyhow::Result<ConnectionId> {
    to_active(connection).insert(conn()).await?;
    Ok(connection.id)
}

pub async fn get_by_id(id: ConnectionId) -> anyhow::Result<Option<Connection>> {
    Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(Connection::try_from)
        .transpose()
}

pub async fn get_by_platform_and_shop_id(platform: Platform, shop_id: &str) -> anyhow::Result<Option<Connection>> {
    Entity::find()
        .filter(Column::Platform.eq(platform.code()))
        .filter(Column::ShopId.eq(shop_id))
        .one(conn())
        .await?
        .map(Connection::try_from)
        .transpose()
}

pub async fn list_all() -> anyhow::Result<Vec<Connection>> {
    convert(
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .all(conn())
            .await?,
    )
}

pub async fn list_active() -> anyhow::Result<Vec<Connection>> {
    convert(
        Entity::find()
            .filter(Column::IsActive.eq(true))
            .order_by_desc(Column::CreatedAt)
            .all(conn())
            .await?,
    )
}

pub async fn list_active_by_platform(platform: Platform) -> anyhow::Result<Vec<Connection>> {
    convert(
        Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::Platform.eq(platform.code()))
            .order_by_desc(Column::CreatedAt)
            .all(conn())
            .await?,
    )
}

/// Active connections whose token expires before `now + within`.
pub async fn list_needing_refresh(within: Duration) -> anyhow::Result<Vec<Connection>> {
    let deadline = Utc::now() + within;
    convert(
        Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::TokenExpiresAt.is_not_null())
            .filter(Column::TokenExpiresAt.lt(deadline))
            .order_by_asc(Column::TokenExpiresAt)
            .all(conn())
            .await?,
    )
}

pub async fn update(connection: &Connection) -> anyhow::Result<()> {
    to_active(connection).update(conn()).await?;
    Ok(())
}

pub async fn update_tokens(
    id: ConnectionId,
    access_token: &str,
    refresh_token: &str,
    expires_at: Option<DateTime<Utc>>,
) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::AccessToken, Expr::value(access_token))
        .col_expr(Column::RefreshToken, Expr::value(refresh_token))
        .col_expr(Column::TokenExpiresAt, Expr::value(expires_at))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn deactivate(id: ConnectionId) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsActive, Expr::value(false))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete(id: ConnectionId) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.value().to_string())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Inserts a new connection or refreshes the existing `(platform, shop_id)`
/// row with the new tokens and reactivates it. Returns the stored row.
pub async fn upsert_by_shop(connection: &Connection) -> anyhow::Result<Connection> {
    match get_by_platform_and_shop_id(connection.platform, &connection.shop_id).await? {
        Some(mut existing) => {
            existing.shop_name = connection.shop_name.clone();
            existing.access_token = connection.access_token.clone();
            existing.refresh_token = connection.refresh_token.clone();
            existing.token_expires_at = connection.token_expires_at;
            existing.is_active = true;
            if connection.settings.as_object().map(|o| !o.is_empty()).unwrap_or(false) {
                existing.settings = connection.settings.clone();
            }
            existing.before_write();
            update(&existing).await?;
            Ok(existing)
        }
        None => {
            create(connection).await?;
            Ok(connection.clone())
        }
    }
}
