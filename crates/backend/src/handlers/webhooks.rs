use axum::{
    body::Bytes,
    extract::Query,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use contracts::domain::a007_webhook_event::aggregate::WebhookEventFilter;
use serde_json::{json, Value};

use super::{api_error, error_response, ApiError, ApiResult};
use crate::usecases::u106_process_webhook::{self as u106, WebhookError, WebhookReply};

const TIKTOK_SIGNATURE_HEADER: &str = "x-tts-signature";

fn header(headers: &HeaderMap, name: impl axum::http::header::AsHeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn reply(result: Result<WebhookReply, WebhookError>) -> ApiResult<Json<Value>> {
    match result {
        Ok(WebhookReply::Verification(code)) => Ok(Json(json!({ "push_verification_code": code }))),
        Ok(WebhookReply::Received) => Ok(Json(json!({ "status": "received" }))),
        Err(e) => Err(webhook_error(e)),
    }
}

fn webhook_error(e: WebhookError) -> ApiError {
    match e {
        WebhookError::InvalidSignature => error_response(StatusCode::UNAUTHORIZED, e.to_string()),
        WebhookError::InvalidPayload(_) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        WebhookError::NotConfigured(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        WebhookError::Storage(inner) => api_error(inner),
    }
}

/// POST /api/v1/webhooks/shopee
pub async fn shopee(headers: HeaderMap, body: Bytes) -> ApiResult<Json<Value>> {
    let signature = header(&headers, AUTHORIZATION);
    reply(u106::receive_shopee(&body, &signature).await)
}

/// POST /api/v1/webhooks/tiktok
pub async fn tiktok(headers: HeaderMap, body: Bytes) -> ApiResult<Json<Value>> {
    let signature = header(&headers, TIKTOK_SIGNATURE_HEADER);
    reply(u106::receive_tiktok(&body, &signature).await)
}

/// GET /webhook-events
pub async fn list_events(Query(filter): Query<WebhookEventFilter>) -> ApiResult<Json<Value>> {
    let page = u106::list_events(&filter).await.map_err(api_error)?;
    Ok(Json(json!({
        "events": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shopee_verification_is_echoed() {
        let body = Bytes::from_static(br#"{"push_verification_code":"abc123"}"#);
        let Json(value) = shopee(HeaderMap::new(), body).await.unwrap();
        assert_eq!(value, json!({ "push_verification_code": "abc123" }));
    }

    #[tokio::test]
    async fn test_shopee_unreadable_body_is_acknowledged() {
        let Json(value) = shopee(HeaderMap::new(), Bytes::from_static(b"not json"))
            .await
            .unwrap();
        assert_eq!(value, json!({ "status": "received" }));
    }

    #[test]
    fn test_webhook_error_statuses() {
        assert_eq!(webhook_error(WebhookError::InvalidSignature).0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            webhook_error(WebhookError::InvalidPayload("x".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            webhook_error(WebhookError::NotConfigured(contracts::enums::Platform::TikTok)).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Tts-Signature", "abcdef".parse().unwrap());
        assert_eq!(header(&headers, TIKTOK_SIGNATURE_HEADER), "abcdef");
        assert_eq!(header(&headers, AUTHORIZATION), "");
    }
}
