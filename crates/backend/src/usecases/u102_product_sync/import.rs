use chrono::Utc;
use contracts::domain::a001_connection::aggregate::{Connection, ConnectionId};
use contracts::domain::a005_imported_product::aggregate::{ImportedProduct, ImportedProductFilter};
use contracts::domain::common::{ListingStatus, Paged};

use crate::domain::a005_imported_product::repository;
use crate::shared::marketplaces::types::ExternalProduct;
use crate::usecases::u101_connect_marketplace::{access_for, load_active};

const IMPORT_PAGE_SIZE: u32 = 50;
/// Upper bound on pages per import run
const MAX_IMPORT_PAGES: u32 = 200;

pub fn to_imported(connection: &Connection, p: ExternalProduct) -> ImportedProduct {
    let mut imported = ImportedProduct::new_for_insert(connection.id, p.external_product_id, p.name);
    imported.external_sku = p.external_sku;
    imported.description = p.description;
    imported.price = p.price;
    imported.stock = p.stock;
    imported.category_id = p.category_id;
    imported.status = ListingStatus::from_marketplace(&p.status).as_str().to_string();
    imported.image_url = p.image_url;
    imported.updated_at = Utc::now();
    imported
}

/// Загружает каталог магазина в `imported_products`, возвращает число товаров
pub async fn import_products(connection_id: ConnectionId) -> anyhow::Result<u64> {
    let connection = load_active(connection_id).await?;
    let (provider, token) = access_for(&connection)?;

    let mut imported = 0u64;
    let mut page = 1u32;
    loop {
        let batch = provider
            .list_products(&token, &connection.shop_id, page, IMPORT_PAGE_SIZE)
            .await?;
        let products: Vec<ImportedProduct> = batch
            .items
            .into_iter()
            .filter(|p| !p.external_product_id.is_empty())
            .map(|p| to_imported(&connection, p))
            .collect();
        repository::upsert_batch(&products).await?;
        imported += products.len() as u64;

        if !batch.has_more || products.is_empty() {
            break;
        }
        if page >= MAX_IMPORT_PAGES {
            tracing::warn!(
                "Import for connection {} stopped after {} pages",
                connection_id,
                MAX_IMPORT_PAGES
            );
            break;
        }
        page += 1;
    }

    tracing::info!(
        "Imported {} product(s) from {} shop {}",
        imported,
        connection.platform,
        connection.shop_id
    );
    Ok(imported)
}

pub async fn imported_products(
    connection_id: ConnectionId,
    filter: &ImportedProductFilter,
) -> anyhow::Result<Paged<ImportedProduct>> {
    let (items, total) = repository::list(connection_id, filter).await?;
    Ok(Paged::new(items, total, filter.page_request()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::enums::Platform;

    #[test]
    fn test_to_imported_normalizes_status() {
        let connection = Connection::new_for_insert(
            Platform::TikTok,
            "7001".into(),
            "Shop".into(),
            "a".into(),
            "r".into(),
            None,
        );
        let product = ExternalProduct {
            external_product_id: "1729".into(),
            external_sku: "SKU-1".into(),
            name: "Mug".into(),
            price: 12.5,
            stock: 3,
            status: "LIVE".into(),
            ..Default::default()
        };
        let imported = to_imported(&connection, product);
        assert_eq!(imported.connection_id, connection.id);
        assert_eq!(imported.external_product_id, "1729");
        assert_eq!(imported.status, "active");
        assert_eq!(imported.stock, 3);
        assert!(!imported.is_mapped);

        let unlisted = to_imported(
            &connection,
            ExternalProduct {
                external_product_id: "1".into(),
                status: "UNLIST".into(),
                ..Default::default()
            },
        );
        assert_eq!(unlisted.status, "paused");
    }
}
