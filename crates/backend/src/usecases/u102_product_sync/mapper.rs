//! Catalog product -> marketplace request conversion.

use uuid::Uuid;

use crate::shared::clients::CatalogProduct;
use crate::shared::marketplaces::types::{
    Dimensions, ProductPushRequest, ProductPushResponse, ProductUpdateRequest, VariantMappingResult,
    VariantRequest,
};

pub const DEFAULT_CONDITION: &str = "NEW";

pub fn push_request(product: &CatalogProduct, external_category_id: &str) -> ProductPushRequest {
    let dimensions = match (product.length, product.width, product.height) {
        (Some(length), Some(width), Some(height)) => Some(Dimensions { length, width, height }),
        _ => None,
    };
    let sku = if product.sku.is_empty() {
        product.id.to_string()
    } else {
        product.sku.clone()
    };

    ProductPushRequest {
        internal_id: product.id.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price,
        original_price: product.compare_at_price.unwrap_or(product.price),
        stock: product.stock,
        sku,
        category_id: external_category_id.to_string(),
        images: product.images.clone(),
        weight: product.weight,
        dimensions,
        variants: product
            .variants
            .iter()
            .map(|v| VariantRequest {
                sku: v.sku.clone(),
                name: v.name.clone(),
                price: if v.price > 0.0 { v.price } else { product.price },
                stock: v.stock,
                image_url: v.image_url.clone(),
            })
            .collect(),
        attributes: serde_json::Map::new(),
        brand: product.brand.clone(),
        condition: DEFAULT_CONDITION.to_string(),
    }
}

pub fn update_request(product: &CatalogProduct) -> ProductUpdateRequest {
    ProductUpdateRequest {
        name: product.name.clone(),
        description: product.description.clone(),
        price: Some(product.price),
        original_price: product.compare_at_price,
        stock: Some(product.stock),
        images: product.images.clone(),
        attributes: serde_json::Map::new(),
    }
}

/// Pairs the SKUs reported back by the marketplace with catalog variant ids.
/// SKUs the catalog does not know are skipped.
pub fn match_variants(
    product: &CatalogProduct,
    response: &ProductPushResponse,
) -> Vec<(Uuid, VariantMappingResult)> {
    response
        .variant_mappings
        .iter()
        .filter_map(|vm| {
            product
                .variants
                .iter()
                .find(|v| !v.sku.is_empty() && v.sku == vm.internal_sku)
                .map(|v| (v.id, vm.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::clients::CatalogVariant;

    fn product() -> CatalogProduct {
        CatalogProduct {
            id: Uuid::new_v4(),
            name: "Kettle".into(),
            description: "1.7L steel kettle".into(),
            price: 89.9,
            compare_at_price: Some(119.0),
            sku: "KT-1".into(),
            stock: 12,
            images: vec!["https://img/1.jpg".into()],
            weight: 1200.0,
            length: Some(25.0),
            width: Some(18.0),
            height: Some(22.0),
            brand: "Acme".into(),
            variants: vec![
                CatalogVariant {
                    id: Uuid::new_v4(),
                    sku: "KT-1-RED".into(),
                    name: "Red".into(),
                    price: 0.0,
                    stock: 5,
                    image_url: String::new(),
                },
                CatalogVariant {
                    id: Uuid::new_v4(),
                    sku: "KT-1-BLK".into(),
                    name: "Black".into(),
                    price: 95.0,
                    stock: 7,
                    image_url: String::new(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_push_request() {
        let p = product();
        let req = push_request(&p, "100644");
        assert_eq!(req.internal_id, p.id.to_string());
        assert_eq!(req.category_id, "100644");
        assert_eq!(req.original_price, 119.0);
        assert_eq!(req.condition, "NEW");
        assert_eq!(req.dimensions.as_ref().map(|d| d.height), Some(22.0));
        assert_eq!(req.variants.len(), 2);
        // variant without its own price inherits the product price
        assert_eq!(req.variants[0].price, 89.9);
        assert_eq!(req.variants[1].price, 95.0);
    }

    #[test]
    fn test_push_request_fallbacks() {
        let mut p = product();
        p.sku.clear();
        p.compare_at_price = None;
        p.height = None;
        let req = push_request(&p, "1");
        assert_eq!(req.sku, p.id.to_string());
        assert_eq!(req.original_price, 89.9);
        assert!(req.dimensions.is_none());
    }

    #[test]
    fn test_match_variants() {
        let p = product();
        let response = ProductPushResponse {
            external_product_id: "998877".into(),
            variant_mappings: vec![
                VariantMappingResult {
                    internal_sku: "KT-1-BLK".into(),
                    external_sku: "shp-blk".into(),
                },
                VariantMappingResult {
                    internal_sku: "UNKNOWN".into(),
                    external_sku: "shp-x".into(),
                },
            ],
            ..Default::default()
        };
        let matched = match_variants(&p, &response);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].0, p.variants[1].id);
        assert_eq!(matched[0].1.external_sku, "shp-blk");
    }
}
