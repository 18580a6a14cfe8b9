use chrono::{Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::client::{ShopAuth, ShopeeClient};
use crate::shared::marketplaces::error::{ProviderError, ProviderResult};
use crate::shared::marketplaces::types::{ShopInfo, TokenResponse};

pub const AUTH_PARTNER_PATH: &str = "/api/v2/shop/auth_partner";
pub const TOKEN_GET_PATH: &str = "/api/v2/auth/token/get";
pub const TOKEN_REFRESH_PATH: &str = "/api/v2/auth/access_token/get";
pub const SHOP_INFO_PATH: &str = "/api/v2/shop/get_shop_info";

#[derive(Debug, Deserialize)]
struct ShopeeTokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Seconds
    #[serde(default)]
    expire_in: i64,
    #[serde(default)]
    shop_id_list: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ShopeeShopInfoResponse {
    #[serde(default)]
    shop_name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    shop_description: String,
    #[serde(default)]
    shop_logo: String,
}

/// Default currency per Shopee region
fn region_currency(region: &str) -> &'static str {
    match region.to_uppercase().as_str() {
        "SG" => "SGD",
        "ID" => "IDR",
        "TH" => "THB",
        "PH" => "PHP",
        "VN" => "VND",
        "TW" => "TWD",
        "BR" => "BRL",
        _ => "MYR",
    }
}

fn to_token_response(raw: ShopeeTokenResponse, shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
    if raw.access_token.is_empty() {
        return Err(ProviderError::Decode("Shopee token response has no access_token".into()));
    }
    let shop_id = match shop_id.filter(|s| !s.is_empty()) {
        Some(id) => id.to_string(),
        None => raw
            .shop_id_list
            .first()
            .map(|id| id.to_string())
            .unwrap_or_default(),
    };
    Ok(TokenResponse {
        access_token: raw.access_token,
        refresh_token: raw.refresh_token,
        expires_at: Utc::now() + Duration::seconds(raw.expire_in),
        shop_id,
        shop_name: String::new(),
    })
}

fn parse_shop_id(shop_id: Option<&str>) -> ProviderResult<i64> {
    shop_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::Decode("Shopee requires shop_id".into()))?
        .parse::<i64>()
        .map_err(|_| ProviderError::Decode("Shopee shop_id must be numeric".into()))
}

impl ShopeeClient {
    /// Authorization link for the shop owner. `redirect` is URL-encoded.
    pub fn auth_url_at(&self, timestamp: i64, redirect_url: &str, state: &str) -> String {
        let mut url = format!(
            "{}{}?partner_id={}&timestamp={}&sign={}&redirect={}",
            self.base_url(),
            AUTH_PARTNER_PATH,
            self.partner_id(),
            timestamp,
            self.sign_public(AUTH_PARTNER_PATH, timestamp),
            urlencoding::encode(redirect_url)
        );
        if !state.is_empty() {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(state));
        }
        url
    }

    pub async fn exchange_code(&self, code: &str, shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
        let shop = parse_shop_id(shop_id)?;
        let body = json!({
            "code": code,
            "shop_id": shop,
            "partner_id": self.partner_id(),
        });
        let raw: ShopeeTokenResponse = self
            .call(Method::POST, TOKEN_GET_PATH, None, &[], Some(&body))
            .await?;
        to_token_response(raw, shop_id)
    }

    pub async fn refresh_access_token(&self, refresh_token: &str, shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
        let shop = parse_shop_id(shop_id)?;
        let body = json!({
            "refresh_token": refresh_token,
            "shop_id": shop,
            "partner_id": self.partner_id(),
        });
        let raw: ShopeeTokenResponse = self
            .call(Method::POST, TOKEN_REFRESH_PATH, None, &[], Some(&body))
            .await?;
        to_token_response(raw, shop_id)
    }

    pub async fn shop_info(&self, auth: ShopAuth<'_>) -> ProviderResult<ShopInfo> {
        let raw: ShopeeShopInfoResponse = self
            .call(Method::GET, SHOP_INFO_PATH, Some(auth), &[], None)
            .await?;
        Ok(ShopInfo {
            shop_id: auth.shop_id.to_string(),
            currency: region_currency(&raw.region).to_string(),
            shop_name: raw.shop_name,
            status: raw.status,
            region: raw.region,
            shop_logo: raw.shop_logo,
            description: raw.shop_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::ShopeeConfig;

    fn client() -> ShopeeClient {
        ShopeeClient::new(&ShopeeConfig {
            partner_id: 1000,
            partner_key: "secret".into(),
            redirect_url: String::new(),
            sandbox: false,
        })
    }

    #[test]
    fn test_auth_url() {
        let c = client();
        let url = c.auth_url_at(1_700_000_000, "http://localhost:3000/cb?x=1", "shopee_abc");
        assert!(url.starts_with("https://partner.shopeemobile.com/api/v2/shop/auth_partner?partner_id=1000&timestamp=1700000000&sign="));
        assert!(url.contains(&format!("sign={}", c.sign_public(AUTH_PARTNER_PATH, 1_700_000_000))));
        assert!(url.contains("redirect=http%3A%2F%2Flocalhost%3A3000%2Fcb%3Fx%3D1"));
        assert!(url.ends_with("&state=shopee_abc"));

        let no_state = c.auth_url_at(1_700_000_000, "http://x", "");
        assert!(!no_state.contains("state="));
    }

    #[test]
    fn test_token_response_mapping() {
        let raw: ShopeeTokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expire_in":14400,"shop_id_list":[777],"error":"","message":""}"#,
        )
        .unwrap();
        let before = Utc::now();
        let token = to_token_response(raw, None).unwrap();
        assert_eq!(token.shop_id, "777");
        assert_eq!(token.refresh_token, "r");
        assert!(token.expires_at >= before + Duration::seconds(14400));

        let raw: ShopeeTokenResponse = serde_json::from_str(r#"{"access_token":"a","expire_in":10}"#).unwrap();
        assert_eq!(to_token_response(raw, Some("55")).unwrap().shop_id, "55");

        let empty: ShopeeTokenResponse = serde_json::from_str(r#"{"expire_in":10}"#).unwrap();
        assert!(to_token_response(empty, Some("55")).is_err());
    }

    #[test]
    fn test_parse_shop_id() {
        assert_eq!(parse_shop_id(Some("123")).unwrap(), 123);
        assert!(parse_shop_id(None).is_err());
        assert!(parse_shop_id(Some("")).is_err());
        assert!(parse_shop_id(Some("12a")).is_err());
    }

    #[test]
    fn test_region_currency() {
        assert_eq!(region_currency("my"), "MYR");
        assert_eq!(region_currency("SG"), "SGD");
        assert_eq!(region_currency(""), "MYR");
    }
}
