use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::BTreeMap;

use crate::shared::config::TikTokConfig;
use crate::shared::crypto;
use crate::shared::marketplaces::error::{ProviderError, ProviderResult};

pub const BASE_URL: &str = "https://open-api.tiktokglobalshop.com";

/// Конверт ответа TikTok Shop API
#[derive(Debug, Deserialize)]
pub struct TikTokResponse<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
    pub data: Option<T>,
}

impl<T> TikTokResponse<T> {
    pub fn has_error(&self) -> bool {
        self.code != 0
    }
}

#[derive(Debug, Deserialize)]
struct BareResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// HTTP-клиент TikTok Shop Open API
#[derive(Clone)]
pub struct TikTokClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
}

impl TikTokClient {
    pub fn new(config: &TikTokConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    pub fn with_base_url(config: &TikTokConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
        }
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    /// `hex(HMAC(secret, secret + path + Σ(key + value) + secret))` over the
    /// sorted params, `sign` and `access_token` excluded.
    pub fn sign(&self, path: &str, params: &BTreeMap<String, String>) -> String {
        let mut base = String::with_capacity(256);
        base.push_str(&self.app_secret);
        base.push_str(path);
        for (k, v) in params {
            if k == "sign" || k == "access_token" {
                continue;
            }
            base.push_str(k);
            base.push_str(v);
        }
        base.push_str(&self.app_secret);
        crypto::sign_hex(self.app_secret.as_bytes(), base.as_bytes())
    }

    /// Full signed query for a call.
    pub fn signed_params(
        &self,
        path: &str,
        timestamp: i64,
        access_token: Option<&str>,
        shop_id: Option<&str>,
        query: &[(&str, String)],
    ) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("app_key".to_string(), self.app_key.clone());
        params.insert("timestamp".to_string(), timestamp.to_string());
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            params.insert("access_token".to_string(), token.to_string());
        }
        if let Some(shop) = shop_id.filter(|s| !s.is_empty()) {
            params.insert("shop_id".to_string(), shop.to_string());
        }
        for (k, v) in query {
            params.insert(k.to_string(), v.clone());
        }
        let sign = self.sign(path, &params);
        params.insert("sign".to_string(), sign);
        params
    }

    /// Signed call returning the `data` of the envelope.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
        shop_id: Option<&str>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<Option<T>> {
        let timestamp = chrono::Utc::now().timestamp();
        let params = self.signed_params(path, timestamp, access_token, shop_id, query);
        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}{}?{}", self.base_url, path, query_string);
        tracing::debug!("TikTok {} {}", method, path);

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

        if !status.is_success() {
            tracing::error!("TikTok API {} failed with status {}: {}", path, status, text);
            let (code, message) = match serde_json::from_str::<BareResponse>(&text) {
                Ok(b) if b.code != 0 => (b.code.to_string(), b.message),
                _ => (status.as_u16().to_string(), text),
            };
            return Err(ProviderError::api(code, message, status.as_u16()));
        }

        let parsed: TikTokResponse<T> = serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse TikTok response for {}: {}", path, e);
            ProviderError::Decode(format!("{}: {}", path, e))
        })?;
        if parsed.has_error() {
            tracing::warn!(
                "TikTok API {} returned code {}: {} (request_id {})",
                path,
                parsed.code,
                parsed.message,
                parsed.request_id
            );
            return Err(ProviderError::api(parsed.code.to_string(), parsed.message, status.as_u16()));
        }
        Ok(parsed.data)
    }

    /// Same as [`call`](Self::call) but a missing `data` is a decode error.
    pub async fn call_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
        shop_id: Option<&str>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<T> {
        self.call(method, path, access_token, shop_id, query, body)
            .await?
            .ok_or_else(|| ProviderError::Decode(format!("{}: data is missing", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TikTokClient {
        TikTokClient::new(&TikTokConfig {
            app_key: "appkey".into(),
            app_secret: "secret".into(),
            redirect_url: String::new(),
        })
    }

    #[test]
    fn test_sign_string_composition() {
        let c = client();
        let mut params = BTreeMap::new();
        params.insert("timestamp".to_string(), "1700000000".to_string());
        params.insert("app_key".to_string(), "appkey".to_string());
        params.insert("shop_id".to_string(), "7001".to_string());
        params.insert("access_token".to_string(), "tok".to_string());
        params.insert("sign".to_string(), "old".to_string());

        let expected = crypto::sign_hex(
            b"secret",
            b"secret/api/products/searchapp_keyappkeyshop_id7001timestamp1700000000secret",
        );
        assert_eq!(c.sign("/api/products/search", &params), expected);
    }

    #[test]
    fn test_signed_params() {
        let c = client();
        let params = c.signed_params(
            "/api/orders/search",
            1_700_000_000,
            Some("tok"),
            Some("7001"),
            &[("page_size", "20".to_string())],
        );
        assert_eq!(params.get("app_key").map(String::as_str), Some("appkey"));
        assert_eq!(params.get("access_token").map(String::as_str), Some("tok"));
        assert_eq!(params.get("shop_id").map(String::as_str), Some("7001"));

        let mut unsigned = params.clone();
        let sign = unsigned.remove("sign").unwrap();
        assert_eq!(sign, c.sign("/api/orders/search", &unsigned));
        // access_token does not affect the signature
        unsigned.insert("access_token".into(), "other".into());
        assert_eq!(sign, c.sign("/api/orders/search", &unsigned));

        let public = c.signed_params("/api/v2/token/get", 1, None, Some(""), &[]);
        assert!(!public.contains_key("access_token"));
        assert!(!public.contains_key("shop_id"));
    }

    #[test]
    fn test_envelope_error() {
        let ok: TikTokResponse<serde_json::Value> =
            serde_json::from_str(r#"{"code":0,"message":"Success","data":{"x":1}}"#).unwrap();
        assert!(!ok.has_error());
        let err: TikTokResponse<serde_json::Value> =
            serde_json::from_str(r#"{"code":36009004,"message":"invalid sign"}"#).unwrap();
        assert!(err.has_error());
        assert!(err.data.is_none());
    }
}
