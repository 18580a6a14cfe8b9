use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize};

use crate::shared::config::ShopeeConfig;
use crate::shared::crypto;
use crate::shared::marketplaces::error::{ProviderError, ProviderResult};

pub const BASE_URL: &str = "https://partner.shopeemobile.com";
pub const SANDBOX_BASE_URL: &str = "https://partner.test-stable.shopeemobile.com";

/// Общая часть всех ответов Shopee Open API v2
#[derive(Debug, Default, Deserialize)]
pub struct BaseResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub warning: String,
    #[serde(default)]
    pub request_id: String,
}

impl BaseResponse {
    pub fn has_error(&self) -> bool {
        !self.error.is_empty() && self.error != "success"
    }

    pub fn error_message(&self) -> String {
        if self.message.is_empty() {
            self.error.clone()
        } else {
            self.message.clone()
        }
    }
}

/// Credentials of the shop a request is made for.
#[derive(Debug, Clone, Copy)]
pub struct ShopAuth<'a> {
    pub access_token: &'a str,
    pub shop_id: i64,
}

impl<'a> ShopAuth<'a> {
    pub fn new(access_token: &'a str, shop_id: &str) -> ProviderResult<Self> {
        let shop_id = shop_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ProviderError::Decode(format!("Shopee shop_id must be numeric, got '{}'", shop_id)))?;
        Ok(Self { access_token, shop_id })
    }
}

/// HTTP-клиент Shopee Open API v2 с HMAC-подписью запросов
#[derive(Clone)]
pub struct ShopeeClient {
    http: reqwest::Client,
    base_url: String,
    partner_id: i64,
    partner_key: String,
}

impl ShopeeClient {
    pub fn new(config: &ShopeeConfig) -> Self {
        let base_url = if config.sandbox { SANDBOX_BASE_URL } else { BASE_URL };
        Self::with_base_url(config, base_url)
    }

    pub fn with_base_url(config: &ShopeeConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            partner_id: config.partner_id,
            partner_key: config.partner_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn partner_id(&self) -> i64 {
        self.partner_id
    }

    pub fn partner_key(&self) -> &str {
        &self.partner_key
    }

    /// Signature for public (non shop-level) calls: `partner_id + path + timestamp`
    pub fn sign_public(&self, path: &str, timestamp: i64) -> String {
        let base = format!("{}{}{}", self.partner_id, path, timestamp);
        crypto::sign_hex(self.partner_key.as_bytes(), base.as_bytes())
    }

    /// Shop-level signature: `partner_id + path + timestamp + access_token + shop_id`
    pub fn sign_shop(&self, path: &str, timestamp: i64, access_token: &str, shop_id: i64) -> String {
        let base = format!("{}{}{}{}{}", self.partner_id, path, timestamp, access_token, shop_id);
        crypto::sign_hex(self.partner_key.as_bytes(), base.as_bytes())
    }

    /// Builds the signed query string, sorted by key.
    pub fn signed_query(
        &self,
        path: &str,
        timestamp: i64,
        auth: Option<ShopAuth<'_>>,
        extra: &[(&str, String)],
    ) -> String {
        let mut params: Vec<(String, String)> = vec![
            ("partner_id".into(), self.partner_id.to_string()),
            ("timestamp".into(), timestamp.to_string()),
        ];
        let sign = match auth {
            Some(a) => {
                params.push(("access_token".into(), a.access_token.to_string()));
                params.push(("shop_id".into(), a.shop_id.to_string()));
                self.sign_shop(path, timestamp, a.access_token, a.shop_id)
            }
            None => self.sign_public(path, timestamp),
        };
        params.push(("sign".into(), sign));
        for (k, v) in extra {
            params.push((k.to_string(), v.clone()));
        }
        params.sort();
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Signed call; the body is decoded into `T` after the envelope check.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        auth: Option<ShopAuth<'_>>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<T> {
        let timestamp = chrono::Utc::now().timestamp();
        let url = format!(
            "{}{}?{}",
            self.base_url,
            path,
            self.signed_query(path, timestamp, auth, query)
        );
        tracing::debug!("Shopee {} {}", method, path);

        let mut request = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let base: BaseResponse = serde_json::from_str(&text).unwrap_or_default();
        if !status.is_success() {
            tracing::error!("Shopee API {} failed with status {}: {}", path, status, text);
            let code = if base.error.is_empty() {
                status.as_u16().to_string()
            } else {
                base.error.clone()
            };
            let message = if base.has_error() { base.error_message() } else { text };
            return Err(ProviderError::api(code, message, status.as_u16()));
        }
        if base.has_error() {
            tracing::warn!("Shopee API {} returned error {}: {}", path, base.error, base.message);
            return Err(ProviderError::api(base.error.clone(), base.error_message(), status.as_u16()));
        }
        if !base.warning.is_empty() {
            tracing::warn!("Shopee API {} warning: {}", path, base.warning);
        }

        serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::error!("Failed to parse Shopee response for {}: {}", path, e);
            ProviderError::Decode(format!("{}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ShopeeClient {
        ShopeeClient::new(&ShopeeConfig {
            partner_id: 2001887,
            partner_key: "test-partner-key".into(),
            redirect_url: "http://localhost/cb".into(),
            sandbox: true,
        })
    }

    #[test]
    fn test_sandbox_base_url() {
        assert_eq!(client().base_url(), SANDBOX_BASE_URL);
        let prod = ShopeeClient::new(&ShopeeConfig {
            partner_id: 1,
            partner_key: "k".into(),
            redirect_url: String::new(),
            sandbox: false,
        });
        assert_eq!(prod.base_url(), BASE_URL);
    }

    #[test]
    fn test_sign_public_and_shop() {
        let c = client();
        let path = "/api/v2/shop/get_shop_info";
        let public = c.sign_public(path, 1_700_000_000);
        assert_eq!(
            public,
            crypto::sign_hex(b"test-partner-key", b"2001887/api/v2/shop/get_shop_info1700000000")
        );
        let shop = c.sign_shop(path, 1_700_000_000, "tok", 42);
        assert_eq!(
            shop,
            crypto::sign_hex(
                b"test-partner-key",
                b"2001887/api/v2/shop/get_shop_info1700000000tok42"
            )
        );
        assert_ne!(public, shop);
        assert_eq!(public.len(), 64);
    }

    #[test]
    fn test_signed_query_is_sorted() {
        let c = client();
        let path = "/api/v2/product/get_item_base_info";
        let auth = ShopAuth::new("tok", "42").unwrap();
        let query = c.signed_query(path, 1_700_000_000, Some(auth), &[("item_id_list", "1,2".to_string())]);
        let keys: Vec<&str> = query
            .split('&')
            .map(|kv| kv.split('=').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            vec!["access_token", "item_id_list", "partner_id", "shop_id", "sign", "timestamp"]
        );
        assert!(query.contains("item_id_list=1%2C2"));
        assert!(query.contains(&format!("sign={}", c.sign_shop(path, 1_700_000_000, "tok", 42))));
    }

    #[test]
    fn test_shop_auth_requires_numeric_id() {
        assert_eq!(ShopAuth::new("t", " 123 ").unwrap().shop_id, 123);
        assert!(ShopAuth::new("t", "abc").is_err());
    }

    #[test]
    fn test_envelope_error_detection() {
        let ok: BaseResponse = serde_json::from_str(r#"{"error":"","message":""}"#).unwrap();
        assert!(!ok.has_error());
        let success: BaseResponse = serde_json::from_str(r#"{"error":"success"}"#).unwrap();
        assert!(!success.has_error());
        let err: BaseResponse =
            serde_json::from_str(r#"{"error":"error_auth","message":"Invalid access_token."}"#).unwrap();
        assert!(err.has_error());
        assert_eq!(err.error_message(), "Invalid access_token.");
        let bare: BaseResponse = serde_json::from_str(r#"{"error":"error_param"}"#).unwrap();
        assert_eq!(bare.error_message(), "error_param");
    }
}
