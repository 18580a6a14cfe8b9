use chrono::{DateTime, Utc};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a003_product_mapping::aggregate::{
    MappingSyncStatus, ProductMapping, ProductMappingFilter, ProductMappingId, VariantMapping,
    VariantMappingId,
};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_mappings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub connection_id: String,
    pub internal_product_id: String,
    pub external_product_id: String,
    pub external_sku: String,
    pub sync_status: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Таблица `variant_mappings`
pub mod variant {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "variant_mappings")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub product_mapping_id: String,
        pub internal_variant_id: String,
        pub external_variant_id: String,
        pub external_sku: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl TryFrom<Model> for ProductMapping {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(ProductMapping {
            id: ProductMappingId(Uuid::parse_str(&m.id)?),
            connection_id: ConnectionId(Uuid::parse_str(&m.connection_id)?),
            internal_product_id: Uuid::parse_str(&m.internal_product_id)?,
            external_product_id: m.external_product_id,
            external_sku: m.external_sku,
            sync_status: MappingSyncStatus::parse(&m.sync_status).unwrap_or_default(),
            last_synced_at: m.last_synced_at,
            sync_error: m.sync_error,
            created_at: m.created_at,
            updated_at: m.updated_at,
            variant_mappings: Vec::new(),
        })
    }
}

impl TryFrom<variant::Model> for VariantMapping {
    type Error = anyhow::Error;

    fn try_from(m: variant::Model) -> Result<Self, Self::Error> {
        Ok(VariantMapping {
            id: VariantMappingId(Uuid::parse_str(&m.id)?),
            product_mapping_id: ProductMappingId(Uuid::parse_str(&m.product_mapping_id)?),
            internal_variant_id: Uuid::parse_str(&m.internal_variant_id)?,
            external_variant_id: m.external_variant_id,
            external_sku: m.external_sku,
            created_at: m.created_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(m: &ProductMapping) -> ActiveModel {
    ActiveModel {
        id: Set(m.id.value().to_string()),
        connection_id: Set(m.connection_id.value().to_string()),
        internal_product_id: Set(m.internal_product_id.to_string()),
        external_product_id: Set(m.external_product_id.clone()),
        external_sku: Set(m.external_sku.clone()),
        sync_status: Set(m.sync_status.as_str().to_string()),
        last_synced_at: Set(m.last_synced_at),
        sync_error: Set(m.sync_error.clone()),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

fn convert(models: Vec<Model>) -> anyhow::Result<Vec<ProductMapping>> {
    models.into_iter().map(ProductMapping::try_from).collect()
}

async fn with_variants(mapping: Option<ProductMapping>) -> anyhow::Result<Option<ProductMapping>> {
    match mapping {
        Some(mut m) => {
            m.variant_mappings = list_variants(m.id).await?;
            Ok(Some(m))
        }
        None => Ok(None),
    }
}

/// Inserts the mapping together with its variant mappings.
pub async fn create(mapping: &ProductMapping) -> anyhow::Result<ProductMappingId> {
    to_active(mapping).insert(conn()).await?;
    for v in &mapping.variant_mappings {
        create_variant(v).await?;
    }
    Ok(mapping.id)
}

pub async fn create_batch(mappings: &[ProductMapping]) -> anyhow::Result<u64> {
    if mappings.is_empty() {
        return Ok(0);
    }
    Entity::insert_many(mappings.iter().map(to_active))
        .exec(conn())
        .await?;
    Ok(mappings.len() as u64)
}

pub async fn get_by_id(id: ProductMappingId) -> anyhow::Result<Option<ProductMapping>> {
    let mapping = Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(ProductMapping::try_from)
        .transpose()?;
    with_variants(mapping).await
}

pub async fn get_by_connection_and_internal_id(
    connection_id: ConnectionId,
    internal_product_id: Uuid,
) -> anyhow::Result<Option<ProductMapping>> {
    let mapping = Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::InternalProductId.eq(internal_product_id.to_string()))
        .one(conn())
        .await?
        .map(ProductMapping::try_from)
        .transpose()?;
    with_variants(mapping).await
}

pub async fn get_by_connection_and_external_id(
    connection_id: ConnectionId,
    external_product_id: &str,
) -> anyhow::Result<Option<ProductMapping>> {
    Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::ExternalProductId.eq(external_product_id))
        .one(conn())
        .await?
        .map(ProductMapping::try_from)
        .transpose()
}

pub async fn list_by_connection(
    connection_id: ConnectionId,
    filter: &ProductMappingFilter,
) -> anyhow::Result<(Vec<ProductMapping>, u64)> {
    let page = filter.page_request();
    let mut query = Entity::find().filter(Column::ConnectionId.eq(connection_id.value().to_string()));
    if let Some(status) = filter.sync_status {
        query = query.filter(Column::SyncStatus.eq(status.as_str()));
    }
    if let Some(product_id) = filter.internal_product_id {
        query = query.filter(Column::InternalProductId.eq(product_id.to_string()));
    }

    let paginator = query
        .order_by_desc(Column::CreatedAt)
        .paginate(conn(), page.page_size);
    let total = paginator.num_items().await?;
    let items = convert(paginator.fetch_page(page.index()).await?)?;
    Ok((items, total))
}

/// Все сопоставления товара по всем подключениям
pub async fn list_by_internal_product(internal_product_id: Uuid) -> anyhow::Result<Vec<ProductMapping>> {
    convert(
        Entity::find()
            .filter(Column::InternalProductId.eq(internal_product_id.to_string()))
            .all(conn())
            .await?,
    )
}

pub async fn update(mapping: &ProductMapping) -> anyhow::Result<()> {
    to_active(mapping).update(conn()).await?;
    Ok(())
}

pub async fn update_sync_status(
    id: ProductMappingId,
    status: MappingSyncStatus,
    error: Option<String>,
) -> anyhow::Result<bool> {
    let Some(model) = Entity::find_by_id(id.value().to_string()).one(conn()).await? else {
        return Ok(false);
    };
    let mut mapping = ProductMapping::try_from(model)?;
    mapping.apply_sync_status(status, error);
    update(&mapping).await?;
    Ok(true)
}

pub async fn delete(id: ProductMappingId) -> anyhow::Result<bool> {
    delete_variants(id).await?;
    let result = Entity::delete_by_id(id.value().to_string())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete_by_connection(connection_id: ConnectionId) -> anyhow::Result<u64> {
    let ids: Vec<String> = Entity::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .into_tuple()
        .all(conn())
        .await?;
    if !ids.is_empty() {
        variant::Entity::delete_many()
            .filter(variant::Column::ProductMappingId.is_in(ids))
            .exec(conn())
            .await?;
    }
    let result = Entity::delete_many()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}

pub async fn list_pending(limit: u64) -> anyhow::Result<Vec<ProductMapping>> {
    convert(
        Entity::find()
            .filter(Column::SyncStatus.eq(MappingSyncStatus::Pending.as_str()))
            .order_by_asc(Column::UpdatedAt)
            .limit(limit)
            .all(conn())
            .await?,
    )
}

pub async fn list_errors(connection_id: ConnectionId) -> anyhow::Result<Vec<ProductMapping>> {
    convert(
        Entity::find()
            .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
            .filter(Column::SyncStatus.eq(MappingSyncStatus::Error.as_str()))
            .order_by_desc(Column::UpdatedAt)
            .all(conn())
            .await?,
    )
}

pub async fn create_variant(v: &VariantMapping) -> anyhow::Result<VariantMappingId> {
    let active = variant::ActiveModel {
        id: Set(v.id.value().to_string()),
        product_mapping_id: Set(v.product_mapping_id.value().to_string()),
        internal_variant_id: Set(v.internal_variant_id.to_string()),
        external_variant_id: Set(v.external_variant_id.clone()),
        external_sku: Set(v.external_sku.clone()),
        created_at: Set(v.created_at),
    };
    active.insert(conn()).await?;
    Ok(v.id)
}

pub async fn list_variants(product_mapping_id: ProductMappingId) -> anyhow::Result<Vec<VariantMapping>> {
    variant::Entity::find()
        .filter(variant::Column::ProductMappingId.eq(product_mapping_id.value().to_string()))
        .order_by_asc(variant::Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(VariantMapping::try_from)
        .collect()
}

pub async fn delete_variants(product_mapping_id: ProductMappingId) -> anyhow::Result<u64> {
    let result = variant::Entity::delete_many()
        .filter(variant::Column::ProductMappingId.eq(product_mapping_id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}
