use chrono::{Duration, Utc};
use reqwest::Method;
use serde::Deserialize;

use super::client::TikTokClient;
use crate::shared::marketplaces::error::{ProviderError, ProviderResult};
use crate::shared::marketplaces::types::{ShopInfo, TokenResponse};

pub const AUTH_URL: &str = "https://auth.tiktok-shops.com/oauth/authorize";
pub const TOKEN_PATH: &str = "/api/v2/token/get";
pub const REFRESH_TOKEN_PATH: &str = "/api/v2/token/refresh";
pub const SHOP_INFO_PATH: &str = "/api/v2/seller/shop";

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    access_token_expire_in: i64,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    open_id: String,
    #[serde(default)]
    seller_name: String,
}

#[derive(Debug, Deserialize)]
struct ShopsData {
    #[serde(default)]
    shops: Vec<TikTokShop>,
}

#[derive(Debug, Deserialize)]
struct TikTokShop {
    #[serde(default)]
    shop_id: String,
    #[serde(default)]
    shop_name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    status: i64,
}

fn region_currency(region: &str) -> &'static str {
    match region.to_uppercase().as_str() {
        "SG" => "SGD",
        "ID" => "IDR",
        "TH" => "THB",
        "PH" => "PHP",
        "VN" => "VND",
        "GB" | "UK" => "GBP",
        "US" => "USD",
        _ => "MYR",
    }
}

fn to_token_response(data: TokenData) -> ProviderResult<TokenResponse> {
    if data.access_token.is_empty() {
        return Err(ProviderError::Decode("TikTok token response has no access_token".into()));
    }
    // access_token_expire_in is seconds from now
    Ok(TokenResponse {
        access_token: data.access_token,
        refresh_token: data.refresh_token,
        expires_at: Utc::now() + Duration::seconds(data.access_token_expire_in),
        shop_id: data.open_id,
        shop_name: data.seller_name,
    })
}

fn to_shop_info(data: ShopsData) -> ProviderResult<ShopInfo> {
    let shop = data
        .shops
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::api("no_shops", "no shops found", 404))?;
    Ok(ShopInfo {
        currency: region_currency(&shop.region).to_string(),
        shop_id: shop.shop_id,
        shop_name: shop.shop_name,
        status: if shop.status == 1 { "active" } else { "inactive" }.to_string(),
        region: shop.region,
        shop_logo: String::new(),
        description: String::new(),
    })
}

impl TikTokClient {
    pub fn auth_url(&self, state: &str) -> String {
        format!(
            "{}?app_key={}&state={}",
            AUTH_URL,
            urlencoding::encode(self.app_key()),
            urlencoding::encode(state)
        )
    }

    async fn token_call(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<TokenResponse> {
        let mut params = vec![("app_secret", self.app_secret().to_string())];
        params.extend(query.iter().cloned());
        let data: TokenData = self
            .call_data(Method::GET, path, None, None, &params, None)
            .await?;
        to_token_response(data)
    }

    pub async fn exchange_code(&self, code: &str) -> ProviderResult<TokenResponse> {
        self.token_call(
            TOKEN_PATH,
            &[
                ("auth_code", code.to_string()),
                ("grant_type", "authorized_code".to_string()),
            ],
        )
        .await
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> ProviderResult<TokenResponse> {
        self.token_call(
            REFRESH_TOKEN_PATH,
            &[
                ("refresh_token", refresh_token.to_string()),
                ("grant_type", "refresh_token".to_string()),
            ],
        )
        .await
    }

    pub async fn shop_info(&self, access_token: &str, shop_id: &str) -> ProviderResult<ShopInfo> {
        let data: ShopsData = self
            .call_data(Method::GET, SHOP_INFO_PATH, Some(access_token), Some(shop_id), &[], None)
            .await?;
        to_shop_info(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::TikTokConfig;

    #[test]
    fn test_auth_url() {
        let client = TikTokClient::new(&TikTokConfig {
            app_key: "6abc".into(),
            app_secret: "s".into(),
            redirect_url: String::new(),
        });
        assert_eq!(
            client.auth_url("tiktok_00ff"),
            "https://auth.tiktok-shops.com/oauth/authorize?app_key=6abc&state=tiktok_00ff"
        );
    }

    #[test]
    fn test_token_mapping_uses_open_id_as_shop() {
        let data: TokenData = serde_json::from_str(
            r#"{"access_token":"a","access_token_expire_in":604800,"refresh_token":"r","refresh_token_expire_in":1,"open_id":"open-1","seller_name":"Kedai","seller_base_region":"MY"}"#,
        )
        .unwrap();
        let token = to_token_response(data).unwrap();
        assert_eq!(token.shop_id, "open-1");
        assert_eq!(token.shop_name, "Kedai");
        assert!(token.expires_at > Utc::now() + Duration::days(6));
    }

    #[test]
    fn test_shop_info_status() {
        let data: ShopsData = serde_json::from_str(
            r#"{"shops":[{"shop_id":"7001","shop_name":"Kedai","region":"SG","status":1}]}"#,
        )
        .unwrap();
        let info = to_shop_info(data).unwrap();
        assert_eq!(info.status, "active");
        assert_eq!(info.currency, "SGD");

        let data: ShopsData = serde_json::from_str(r#"{"shops":[{"shop_id":"1","status":2}]}"#).unwrap();
        assert_eq!(to_shop_info(data).unwrap().status, "inactive");

        let empty: ShopsData = serde_json::from_str(r#"{"shops":[]}"#).unwrap();
        let err = to_shop_info(empty).unwrap_err();
        assert!(err.to_string().contains("no shops found"));
    }
}
