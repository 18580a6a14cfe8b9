use chrono::{DateTime, Utc};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a005_imported_product::aggregate::{
    ImportedProduct, ImportedProductFilter, ImportedProductId,
};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{Condition, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "imported_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub connection_id: String,
    pub external_product_id: String,
    pub external_sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub category_id: String,
    pub status: String,
    pub image_url: String,
    pub is_mapped: bool,
    pub mapped_to_product_id: Option<String>,
    pub imported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ImportedProduct {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(ImportedProduct {
            id: ImportedProductId(Uuid::parse_str(&m.id)?),
            connection_id: ConnectionId(Uuid::parse_str(&m.connection_id)?),
            external_product_id: m.external_product_id,
            external_sku: m.external_sku,
            name: m.name,
            description: m.description,
            price: m.price,
            stock: m.stock,
            category_id: m.category_id,
            status: m.status,
            image_url: m.image_url,
            is_mapped: m.is_mapped,
            mapped_to_product_id: m.mapped_to_product_id.and_then(|s| Uuid::parse_str(&s).ok()),
            imported_at: m.imported_at,
            updated_at: m.updated_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(p: &ImportedProduct) -> ActiveModel {
    ActiveModel {
        id: Set(p.id.value().to_string()),
        connection_id: Set(p.connection_id.value().to_string()),
        external_product_id: Set(p.external_product_id.clone()),
        external_sku: Set(p.external_sku.clone()),
        name: Set(p.name.clone()),
        description: Set(p.description.clone()),
        price: Set(p.price),
        stock: Set(p.stock),
        category_id: Set(p.category_id.clone()),
        status: Set(p.status.clone()),
        image_url: Set(p.image_url.clone()),
        is_mapped: Set(p.is_mapped),
        mapped_to_product_id: Set(p.mapped_to_product_id.map(|id| id.to_string())),
        imported_at: Set(p.imported_at),
        updated_at: Set(p.updated_at),
    }
}

/// Re-imports refresh the marketplace fields and keep id, mapping and
/// `imported_at` of the existing row.
fn on_conflict() -> OnConflict {
    OnConflict::columns([Column::ConnectionId, Column::ExternalProductId])
        .update_columns([
            Column::ExternalSku,
            Column::Name,
            Column::Description,
            Column::Price,
            Column::Stock,
            Column::CategoryId,
            Column::Status,
            Column::ImageUrl,
            Column::UpdatedAt,
        ])
        .to_owned()
}

pub async fn upsert(product: &ImportedProduct) -> anyhow::Result<()> {
    Entity::insert(to_active(product))
        .on_conflict(on_conflict())
        .exec_without_returning(conn())
        .await?;
    Ok(())
}

pub async fn upsert_batch(products: &[ImportedProduct]) -> anyhow::Result<u64> {
    if products.is_empty() {
        return Ok(0);
    }
    let rows = Entity::insert_many(products.iter().map(to_active))
        .on_conflict(on_conflict())
        .exec_without_returning(conn())
        .await?;
    Ok(rows)
}

pub async fn get_by_id(id: ImportedProductId) -> anyhow::Result<Option<ImportedProduct>> {
    Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(ImportedProduct::try_from)
        .transpose()
}

pub async fn get_by_external_id(
    connection_id: ConnectionId,
    external_product_id: &str,
) -> anyhow::Result<Option<ImportedProduct>> {
    Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::ExternalProductId.eq(external_product_id))
        .one(conn())
        .await?
        .map(ImportedProduct::try_from)
        .transpose()
}

pub async fn list(
    connection_id: ConnectionId,
    filter: &ImportedProductFilter,
) -> anyhow::Result<(Vec<ImportedProduct>, u64)> {
    let page = filter.page_request();
    let mut query = Entity::find().filter(Column::ConnectionId.eq(connection_id.value().to_string()));
    if let Some(is_mapped) = filter.is_mapped {
        query = query.filter(Column::IsMapped.eq(is_mapped));
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(Column::Status.eq(status));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(Column::Name.contains(search))
                .add(Column::ExternalSku.contains(search))
                .add(Column::ExternalProductId.contains(search)),
        );
    }

    let paginator = query
        .order_by_desc(Column::ImportedAt)
        .paginate(conn(), page.page_size);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(page.index())
        .await?
        .into_iter()
        .map(ImportedProduct::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok((items, total))
}

pub async fn set_mapped(id: ImportedProductId, product_id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsMapped, Expr::value(true))
        .col_expr(Column::MappedToProductId, Expr::value(product_id.to_string()))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn set_unmapped(id: ImportedProductId) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsMapped, Expr::value(false))
        .col_expr(Column::MappedToProductId, Expr::value(Option::<String>::None))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete(id: ImportedProductId) -> anyhow::Result<bool> {
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

pub async fn count_unmapped(connection_id: ConnectionId) -> anyhow::Result<u64> {
    Ok(Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::IsMapped.eq(false))
        .count(conn())
        .await?)
}
