use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::TikTokClient;
use crate::shared::marketplaces::error::ProviderResult;
use crate::shared::marketplaces::types::{
    build_category_tree, ExternalCategory, ExternalProduct, ProductPage, ProductPushRequest,
    ProductPushResponse, ProductUpdateRequest, VariantMappingResult,
};

pub const CREATE_PRODUCT_PATH: &str = "/api/products";
pub const CATEGORIES_PATH: &str = "/api/products/categories";
pub const SEARCH_PRODUCTS_PATH: &str = "/api/products/search";

#[derive(Debug, Deserialize)]
struct CategoriesData {
    #[serde(default)]
    categories: Vec<TikTokCategory>,
}

#[derive(Debug, Deserialize)]
struct TikTokCategory {
    id: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    local_name: String,
    #[serde(default)]
    is_leaf: bool,
}

#[derive(Debug, Deserialize)]
struct CreatedProduct {
    product_id: String,
    #[serde(default)]
    skus: Vec<CreatedSku>,
}

#[derive(Debug, Deserialize)]
struct CreatedSku {
    id: String,
    #[serde(default)]
    seller_sku: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchData {
    #[serde(default)]
    pub products: Vec<SearchProduct>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchProduct {
    #[serde(alias = "id")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub skus: Vec<SearchSku>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchSku {
    pub id: String,
    #[serde(default)]
    pub seller_sku: String,
    #[serde(default)]
    pub price: Option<SkuPrice>,
    #[serde(default)]
    pub stock_infos: Vec<StockInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SkuPrice {
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub sale_price: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StockInfo {
    #[serde(default)]
    pub available_stock: i32,
}

impl SearchSku {
    pub(super) fn available_stock(&self) -> i32 {
        self.stock_infos.first().map(|s| s.available_stock).unwrap_or(0)
    }
}

/// Prices come back as decimal strings
pub fn parse_price(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Product status as text; numeric codes are mapped to their names.
fn status_text(status: &Value) -> String {
    match status {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(1) => "DRAFT".into(),
            Some(2) => "PENDING".into(),
            Some(3) => "FAILED".into(),
            Some(4) => "LIVE".into(),
            Some(5) => "SELLER_DEACTIVATED".into(),
            Some(6) => "PLATFORM_DEACTIVATED".into(),
            Some(7) => "FREEZE".into(),
            Some(8) => "DELETED".into(),
            _ => n.to_string(),
        },
        _ => String::new(),
    }
}

impl SearchProduct {
    fn into_external(self) -> ExternalProduct {
        let status = status_text(&self.status);
        let first = self.skus.first();
        let price = first
            .and_then(|s| s.price.as_ref())
            .map(|p| {
                let sale = parse_price(&p.sale_price);
                if sale > 0.0 { sale } else { parse_price(&p.original_price) }
            })
            .unwrap_or(0.0);
        let external_sku = first.map(|s| s.seller_sku.clone()).unwrap_or_default();
        let stock = self.skus.iter().map(SearchSku::available_stock).sum();
        ExternalProduct {
            external_product_id: self.product_id,
            external_sku,
            name: self.name,
            description: String::new(),
            price,
            stock,
            category_id: String::new(),
            status,
            image_url: String::new(),
        }
    }
}

/// Body of `POST /api/products`. Price `%.2f`, weight grams to kg `%.2f`.
pub(super) fn create_product_body(req: &ProductPushRequest) -> Value {
    let price = if req.original_price > 0.0 { req.original_price } else { req.price };
    let images: Vec<Value> = req.images.iter().map(|id| json!({ "id": id })).collect();

    let mut skus = vec![json!({
        "seller_sku": req.sku,
        "original_price": format!("{:.2}", price),
        "sales_attributes": [],
        "stock_infos": [{ "available_stock": req.stock.max(0), "warehouse_id": "" }],
    })];
    for v in &req.variants {
        skus.push(json!({
            "seller_sku": v.sku,
            "original_price": format!("{:.2}", if v.price > 0.0 { v.price } else { price }),
            "sales_attributes": [{ "attribute_name": "Variant", "custom_value": v.name }],
            "stock_infos": [{ "available_stock": v.stock.max(0), "warehouse_id": "" }],
        }));
    }

    let mut body = json!({
        "title": req.name,
        "description": req.description,
        "category_id": req.category_id,
        "brand_id": "",
        "images": images,
        "skus": skus,
        "package_weight": format!("{:.2}", req.weight / 1000.0),
    });
    if let Some(d) = &req.dimensions {
        body["package_dimensions"] = json!({
            "length": format!("{:.0}", d.length),
            "width": format!("{:.0}", d.width),
            "height": format!("{:.0}", d.height),
            "unit": "CM",
        });
    }
    body
}

fn update_product_body(external_id: &str, req: &ProductUpdateRequest) -> Value {
    let mut body = json!({ "product_id": external_id });
    if !req.name.is_empty() {
        body["title"] = json!(req.name);
    }
    if !req.description.is_empty() {
        body["description"] = json!(req.description);
    }
    if !req.images.is_empty() {
        body["images"] = Value::Array(req.images.iter().map(|id| json!({ "id": id })).collect());
    }
    body
}

impl TikTokClient {
    pub async fn create_product(
        &self,
        access_token: &str,
        shop_id: &str,
        req: &ProductPushRequest,
    ) -> ProviderResult<ProductPushResponse> {
        let body = create_product_body(req);
        let created: CreatedProduct = self
            .call_data(Method::POST, CREATE_PRODUCT_PATH, Some(access_token), Some(shop_id), &[], Some(&body))
            .await?;
        let external_sku = created.skus.first().map(|s| s.id.clone()).unwrap_or_default();
        let variant_mappings = created
            .skus
            .iter()
            .map(|s| VariantMappingResult {
                internal_sku: s.seller_sku.clone(),
                external_sku: s.id.clone(),
            })
            .collect();
        Ok(ProductPushResponse {
            external_product_id: created.product_id,
            external_sku,
            status: "created".into(),
            variant_mappings,
            warnings: Vec::new(),
        })
    }

    pub async fn update_product(
        &self,
        access_token: &str,
        shop_id: &str,
        external_id: &str,
        req: &ProductUpdateRequest,
    ) -> ProviderResult<()> {
        let path = format!("{}/{}", CREATE_PRODUCT_PATH, external_id);
        let body = update_product_body(external_id, req);
        let _: Option<Value> = self
            .call(Method::PUT, &path, Some(access_token), Some(shop_id), &[], Some(&body))
            .await?;
        Ok(())
    }

    pub async fn delete_product(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}", CREATE_PRODUCT_PATH, external_id);
        let _: Option<Value> = self
            .call(Method::DELETE, &path, Some(access_token), Some(shop_id), &[], None)
            .await?;
        Ok(())
    }

    pub(super) async fn search_products(&self, access_token: &str, shop_id: &str, body: &Value) -> ProviderResult<SearchData> {
        Ok(self
            .call::<SearchData>(Method::POST, SEARCH_PRODUCTS_PATH, Some(access_token), Some(shop_id), &[], Some(body))
            .await?
            .unwrap_or_default())
    }

    pub async fn list_products(&self, access_token: &str, shop_id: &str, page: u32, page_size: u32) -> ProviderResult<ProductPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let body = json!({ "page_number": page, "page_size": page_size });
        let data = self.search_products(access_token, shop_id, &body).await?;
        let has_more = (page as i64) * (page_size as i64) < data.total;
        Ok(ProductPage {
            items: data.products.into_iter().map(SearchProduct::into_external).collect(),
            has_more,
        })
    }

    pub async fn categories(&self, access_token: &str, shop_id: &str) -> ProviderResult<Vec<ExternalCategory>> {
        let data: CategoriesData = self
            .call_data(Method::GET, CATEGORIES_PATH, Some(access_token), Some(shop_id), &[], None)
            .await?;
        let flat = data
            .categories
            .into_iter()
            .map(|c| ExternalCategory {
                category_id: c.id,
                category_name: c.local_name,
                parent_id: c.parent_id,
                is_leaf: c.is_leaf,
                children: Vec::new(),
            })
            .collect();
        Ok(build_category_tree(flat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::marketplaces::types::{Dimensions, VariantRequest};

    #[test]
    fn test_create_product_body_formats() {
        let req = ProductPushRequest {
            name: "Teh Tarik".into(),
            description: "Instant".into(),
            price: 12.0,
            original_price: 15.5,
            stock: 30,
            sku: "TEH-1".into(),
            category_id: "600001".into(),
            images: vec!["tos-img-1".into()],
            weight: 250.0,
            dimensions: Some(Dimensions { length: 20.4, width: 10.0, height: 5.6 }),
            ..Default::default()
        };
        let body = create_product_body(&req);
        assert_eq!(body["title"], "Teh Tarik");
        assert_eq!(body["brand_id"], "");
        assert_eq!(body["images"][0]["id"], "tos-img-1");
        assert_eq!(body["skus"][0]["original_price"], "15.50");
        assert_eq!(body["skus"][0]["stock_infos"][0]["available_stock"], 30);
        assert_eq!(body["package_weight"], "0.25");
        assert_eq!(body["package_dimensions"]["length"], "20");
        assert_eq!(body["package_dimensions"]["height"], "6");
        assert_eq!(body["package_dimensions"]["unit"], "CM");
    }

    #[test]
    fn test_create_product_body_with_variants() {
        let req = ProductPushRequest {
            price: 10.0,
            sku: "BASE".into(),
            variants: vec![VariantRequest {
                sku: "BASE-L".into(),
                name: "Large".into(),
                price: 0.0,
                stock: 4,
                image_url: String::new(),
            }],
            ..Default::default()
        };
        let body = create_product_body(&req);
        assert_eq!(body["skus"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(body["skus"][1]["original_price"], "10.00");
        assert_eq!(body["skus"][1]["sales_attributes"][0]["custom_value"], "Large");
        assert!(body.get("package_dimensions").is_none());
    }

    #[test]
    fn test_update_product_body_only_sets_given_fields() {
        let body = update_product_body(
            "172900",
            &ProductUpdateRequest {
                name: "New".into(),
                ..Default::default()
            },
        );
        assert_eq!(body["product_id"], "172900");
        assert_eq!(body["title"], "New");
        assert!(body.get("description").is_none());
    }

    #[test]
    fn test_search_product_mapping() {
        let data: SearchData = serde_json::from_str(
            r#"{"total": 1, "products":[{"id":"1729","name":"Teh","status":4,"skus":[
                {"id":"sku-1","seller_sku":"TEH-1","price":{"original_price":"15.50","sale_price":"12.00"},"stock_infos":[{"available_stock":3}]},
                {"id":"sku-2","seller_sku":"TEH-2","stock_infos":[{"available_stock":5}]}
            ]}]}"#,
        )
        .unwrap();
        let product = data.products.into_iter().next().unwrap().into_external();
        assert_eq!(product.external_product_id, "1729");
        assert_eq!(product.external_sku, "TEH-1");
        assert_eq!(product.price, 12.0);
        assert_eq!(product.stock, 8);
        assert_eq!(product.status, "LIVE");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("19.90"), 19.9);
        assert_eq!(parse_price(" 5 "), 5.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("n/a"), 0.0);
    }
}
