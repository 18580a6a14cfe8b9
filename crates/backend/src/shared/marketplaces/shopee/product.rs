use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{ShopAuth, ShopeeClient};
use crate::shared::marketplaces::error::{ProviderError, ProviderResult};
use crate::shared::marketplaces::types::{
    build_category_tree, ExternalCategory, ExternalProduct, ProductPage, ProductPushRequest,
    ProductPushResponse, ProductUpdateRequest,
};

pub const ADD_ITEM_PATH: &str = "/api/v2/product/add_item";
pub const UPDATE_ITEM_PATH: &str = "/api/v2/product/update_item";
pub const UPDATE_PRICE_PATH: &str = "/api/v2/product/update_price";
pub const DELETE_ITEM_PATH: &str = "/api/v2/product/delete_item";
pub const ITEM_LIST_PATH: &str = "/api/v2/product/get_item_list";
pub const ITEM_BASE_INFO_PATH: &str = "/api/v2/product/get_item_base_info";
pub const CATEGORY_PATH: &str = "/api/v2/product/get_category";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
}

impl<T> Envelope<T> {
    fn into_response(self, path: &str) -> ProviderResult<T> {
        self.response
            .ok_or_else(|| ProviderError::Decode(format!("{}: response is missing", path)))
    }
}

#[derive(Debug, Deserialize)]
struct AddItemResponse {
    item_id: i64,
    #[serde(default)]
    item_sku: String,
}

#[derive(Debug, Deserialize)]
struct ItemListResponse {
    #[serde(default)]
    item: Vec<ItemRef>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct ItemRef {
    item_id: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ItemBaseInfoResponse {
    #[serde(default)]
    pub item_list: Vec<ItemBaseInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ItemBaseInfo {
    pub item_id: i64,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub item_sku: String,
    #[serde(default)]
    pub item_status: String,
    #[serde(default)]
    pub category_id: i64,
    #[serde(default)]
    pub image: Option<ItemImage>,
    #[serde(default)]
    pub price_info: Vec<PriceInfo>,
    #[serde(default)]
    pub stock_info_v2: Option<StockInfoV2>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ItemImage {
    #[serde(default)]
    pub image_url_list: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PriceInfo {
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub original_price: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct StockInfoV2 {
    #[serde(default)]
    pub summary_info: StockSummary,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct StockSummary {
    #[serde(default)]
    pub total_available_stock: i32,
    #[serde(default)]
    pub total_reserved_stock: i32,
}

impl ItemBaseInfo {
    pub(super) fn available_stock(&self) -> i32 {
        self.stock_info_v2
            .as_ref()
            .map(|s| s.summary_info.total_available_stock)
            .unwrap_or(0)
    }

    pub(super) fn reserved_stock(&self) -> i32 {
        self.stock_info_v2
            .as_ref()
            .map(|s| s.summary_info.total_reserved_stock)
            .unwrap_or(0)
    }

    fn into_external(self) -> ExternalProduct {
        let price = self
            .price_info
            .first()
            .map(|p| if p.current_price > 0.0 { p.current_price } else { p.original_price })
            .unwrap_or(0.0);
        let stock = self.available_stock();
        ExternalProduct {
            external_product_id: self.item_id.to_string(),
            external_sku: self.item_sku,
            name: self.item_name,
            description: self.description,
            price,
            stock,
            category_id: self.category_id.to_string(),
            status: self.item_status,
            image_url: self
                .image
                .and_then(|i| i.image_url_list.into_iter().next())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    #[serde(default)]
    category_list: Vec<ShopeeCategory>,
}

#[derive(Debug, Deserialize)]
struct ShopeeCategory {
    category_id: i64,
    #[serde(default)]
    parent_category_id: i64,
    #[serde(default)]
    original_category_name: String,
    #[serde(default)]
    display_category_name: String,
    #[serde(default)]
    has_children: bool,
}

pub(super) fn parse_item_id(id: &str) -> ProviderResult<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| ProviderError::Decode(format!("Shopee item id must be numeric, got '{}'", id)))
}

/// Body of `add_item`. Weight is converted from grams to kilograms.
pub(super) fn add_item_body(req: &ProductPushRequest) -> ProviderResult<Value> {
    let category_id = req
        .category_id
        .trim()
        .parse::<i64>()
        .map_err(|_| ProviderError::Decode(format!("Shopee category id must be numeric, got '{}'", req.category_id)))?;
    let original_price = if req.original_price > 0.0 { req.original_price } else { req.price };
    let condition = if req.condition.is_empty() {
        "NEW".to_string()
    } else {
        req.condition.to_uppercase()
    };
    let brand = if req.brand.is_empty() { "NoBrand" } else { req.brand.as_str() };
    let mut body = json!({
        "item_name": req.name,
        "description": req.description,
        "original_price": original_price,
        "seller_stock": [{ "stock": req.stock.max(0) }],
        "weight": req.weight / 1000.0,
        "item_sku": req.sku,
        "category_id": category_id,
        "image": { "image_id_list": req.images },
        "condition": condition,
        "brand": { "brand_id": 0, "original_brand_name": brand },
    });
    if let Some(d) = &req.dimensions {
        body["dimension"] = json!({
            "package_length": d.length.round() as i64,
            "package_width": d.width.round() as i64,
            "package_height": d.height.round() as i64,
        });
    }
    Ok(body)
}

impl ShopeeClient {
    pub async fn add_item(&self, auth: ShopAuth<'_>, req: &ProductPushRequest) -> ProviderResult<ProductPushResponse> {
        let body = add_item_body(req)?;
        let env: Envelope<AddItemResponse> = self
            .call(Method::POST, ADD_ITEM_PATH, Some(auth), &[], Some(&body))
            .await?;
        let created = env.into_response(ADD_ITEM_PATH)?;
        let mut warnings = Vec::new();
        if !req.variants.is_empty() {
            warnings.push("Shopee variants (tier variations) are not pushed, only the base item".to_string());
        }
        Ok(ProductPushResponse {
            external_product_id: created.item_id.to_string(),
            external_sku: if created.item_sku.is_empty() { req.sku.clone() } else { created.item_sku },
            status: "created".into(),
            variant_mappings: Vec::new(),
            warnings,
        })
    }

    pub async fn update_item(&self, auth: ShopAuth<'_>, external_id: &str, req: &ProductUpdateRequest) -> ProviderResult<()> {
        let item_id = parse_item_id(external_id)?;
        let mut body = json!({ "item_id": item_id });
        if !req.name.is_empty() {
            body["item_name"] = json!(req.name);
        }
        if !req.description.is_empty() {
            body["description"] = json!(req.description);
        }
        if !req.images.is_empty() {
            body["image"] = json!({ "image_id_list": req.images });
        }
        let _: Value = self
            .call(Method::POST, UPDATE_ITEM_PATH, Some(auth), &[], Some(&body))
            .await?;

        if let Some(price) = req.original_price.or(req.price) {
            let body = json!({
                "item_id": item_id,
                "price_list": [{ "model_id": 0, "original_price": price }],
            });
            let _: Value = self
                .call(Method::POST, UPDATE_PRICE_PATH, Some(auth), &[], Some(&body))
                .await?;
        }
        if let Some(stock) = req.stock {
            self.update_stock(auth, item_id, stock).await?;
        }
        Ok(())
    }

    pub async fn delete_item(&self, auth: ShopAuth<'_>, external_id: &str) -> ProviderResult<()> {
        let body = json!({ "item_id": parse_item_id(external_id)? });
        let _: Value = self
            .call(Method::POST, DELETE_ITEM_PATH, Some(auth), &[], Some(&body))
            .await?;
        Ok(())
    }

    pub(super) async fn item_base_info(&self, auth: ShopAuth<'_>, item_ids: &[i64]) -> ProviderResult<Vec<ItemBaseInfo>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = item_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let env: Envelope<ItemBaseInfoResponse> = self
            .call(Method::GET, ITEM_BASE_INFO_PATH, Some(auth), &[("item_id_list", ids)], None)
            .await?;
        Ok(env.into_response(ITEM_BASE_INFO_PATH)?.item_list)
    }

    pub async fn list_items(&self, auth: ShopAuth<'_>, page: u32, page_size: u32) -> ProviderResult<ProductPage> {
        let page_size = page_size.clamp(1, 100);
        let offset = page.saturating_sub(1) * page_size;
        let env: Envelope<ItemListResponse> = self
            .call(
                Method::GET,
                ITEM_LIST_PATH,
                Some(auth),
                &[
                    ("offset", offset.to_string()),
                    ("page_size", page_size.to_string()),
                    ("item_status", "NORMAL".to_string()),
                ],
                None,
            )
            .await?;
        let list = env.into_response(ITEM_LIST_PATH)?;
        let ids: Vec<i64> = list.item.iter().map(|i| i.item_id).collect();
        let mut items = Vec::with_capacity(ids.len());
        // get_item_base_info accepts at most 50 ids
        for chunk in ids.chunks(50) {
            items.extend(
                self.item_base_info(auth, chunk)
                    .await?
                    .into_iter()
                    .map(ItemBaseInfo::into_external),
            );
        }
        Ok(ProductPage {
            items,
            has_more: list.has_next_page,
        })
    }

    pub async fn categories(&self, auth: ShopAuth<'_>) -> ProviderResult<Vec<ExternalCategory>> {
        let env: Envelope<CategoryResponse> = self
            .call(Method::GET, CATEGORY_PATH, Some(auth), &[("language", "en".to_string())], None)
            .await?;
        let flat = env
            .into_response(CATEGORY_PATH)?
            .category_list
            .into_iter()
            .map(|c| ExternalCategory {
                category_id: c.category_id.to_string(),
                category_name: if c.display_category_name.is_empty() {
                    c.original_category_name
                } else {
                    c.display_category_name
                },
                parent_id: c.parent_category_id.to_string(),
                is_leaf: !c.has_children,
                children: Vec::new(),
            })
            .collect();
        Ok(build_category_tree(flat))
    }
}
