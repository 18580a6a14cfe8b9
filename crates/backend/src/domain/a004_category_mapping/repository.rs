use chrono::{DateTime, Utc};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a004_category_mapping::aggregate::{CategoryMapping, CategoryMappingId};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_mappings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub connection_id: String,
    pub internal_category_id: String,
    pub external_category_id: String,
    pub external_category_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CategoryMapping {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(CategoryMapping {
            id: CategoryMappingId(Uuid::parse_str(&m.id)?),
            connection_id: ConnectionId(Uuid::parse_str(&m.connection_id)?),
            internal_category_id: Uuid::parse_str(&m.internal_category_id)?,
            external_category_id: m.external_category_id,
            external_category_name: m.external_category_name,
            created_at: m.created_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(m: &CategoryMapping) -> ActiveModel {
    ActiveModel {
        id: Set(m.id.value().to_string()),
        connection_id: Set(m.connection_id.value().to_string()),
        internal_category_id: Set(m.internal_category_id.to_string()),
        external_category_id: Set(m.external_category_id.clone()),
        external_category_name: Set(m.external_category_name.clone()),
        created_at: Set(m.created_at),
    }
}

pub async fn create(mapping: &CategoryMapping) -> anyhow::Result<CategoryMappingId> {
    to_active(mapping).insert(conn()).await?;
    Ok(mapping.id)
}

pub async fn get_by_id(id: CategoryMappingId) -> anyhow::Result<Option<CategoryMapping>> {
    Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(CategoryMapping::try_from)
        .transpose()
}

pub async fn list_by_connection(connection_id: ConnectionId) -> anyhow::Result<Vec<CategoryMapping>> {
    Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .order_by_asc(Column::ExternalCategoryName)
        .all(conn())
        .await?
        .into_iter()
        .map(CategoryMapping::try_from)
        .collect()
}

pub async fn get_by_internal_category(
    connection_id: ConnectionId,
    internal_category_id: Uuid,
) -> anyhow::Result<Option<CategoryMapping>> {
    Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::InternalCategoryId.eq(internal_category_id.to_string()))
        .one(conn())
        .await?
        .map(CategoryMapping::try_from)
        .transpose()
}

pub async fn get_by_external_category(
    connection_id: ConnectionId,
    external_category_id: &str,
) -> anyhow::Result<Option<CategoryMapping>> {
    Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::ExternalCategoryId.eq(external_category_id))
        .one(conn())
        .await?
        .map(CategoryMapping::try_from)
        .transpose()
}

pub async fn update(mapping: &CategoryMapping) -> anyhow::Result<()> {
    to_active(mapping).update(conn()).await?;
    Ok(())
}

pub async fn delete(id: CategoryMappingId) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.value().to_string())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete_by_connection(connection_id: ConnectionId) -> anyhow::Result<u64> {
    let result = Entity::delete_many()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}
