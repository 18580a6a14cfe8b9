use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_connection::aggregate::{AuthUrlResponse, ConnectionId, ConnectionResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{api_error, error_response, parse_uuid, ApiResult};
use crate::usecases::u101_connect_marketplace as u101;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub shop_id: Option<String>,
}

/// GET /connections
pub async fn list_all() -> ApiResult<Json<Vec<ConnectionResponse>>> {
    u101::list_connections()
        .await
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

/// GET /connections/active
pub async fn list_active() -> ApiResult<Json<Vec<ConnectionResponse>>> {
    u101::list_active()
        .await
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

/// GET /connections/:id
pub async fn get_by_id(Path(id): Path<String>) -> ApiResult<Json<ConnectionResponse>> {
    let id = ConnectionId::new(parse_uuid(&id)?);
    u101::get_connection(id)
        .await
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

/// DELETE /connections/:id
pub async fn disconnect(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = ConnectionId::new(parse_uuid(&id)?);
    u101::disconnect(id).await.map_err(|e| api_error(e.into()))?;
    Ok(Json(json!({ "message": "Connection deactivated" })))
}

/// POST /connections/:id/refresh
pub async fn refresh_token(Path(id): Path<String>) -> ApiResult<Json<ConnectionResponse>> {
    let id = ConnectionId::new(parse_uuid(&id)?);
    u101::refresh_token(id)
        .await
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

fn auth_url(platform: &str) -> ApiResult<Json<AuthUrlResponse>> {
    u101::auth_url(platform)
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

/// GET /shopee/auth-url
pub async fn shopee_auth_url() -> ApiResult<Json<AuthUrlResponse>> {
    auth_url("shopee")
}

/// GET /tiktok/auth-url
pub async fn tiktok_auth_url() -> ApiResult<Json<AuthUrlResponse>> {
    auth_url("tiktok")
}

/// GET /shopee/callback?code&shop_id
pub async fn shopee_callback(Query(query): Query<CallbackQuery>) -> ApiResult<Json<ConnectionResponse>> {
    let code = required_code(&query)?;
    let shop_id = query.shop_id.as_deref().map(str::trim).unwrap_or_default();
    if shop_id.parse::<i64>().is_err() {
        return Err(error_response(StatusCode::BAD_REQUEST, "shop_id must be numeric"));
    }
    u101::handle_shopee_callback(code, shop_id)
        .await
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

/// GET /tiktok/callback?code
pub async fn tiktok_callback(Query(query): Query<CallbackQuery>) -> ApiResult<Json<ConnectionResponse>> {
    let code = required_code(&query)?;
    u101::handle_tiktok_callback(code)
        .await
        .map(Json)
        .map_err(|e| api_error(e.into()))
}

fn required_code(query: &CallbackQuery) -> ApiResult<&str> {
    match query.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(error_response(StatusCode::BAD_REQUEST, "code is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shopee_callback_rejects_bad_shop_id() {
        let query = CallbackQuery {
            code: Some("abc".into()),
            shop_id: Some("shop-1".into()),
        };
        let (status, _) = shopee_callback(Query(query)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_requires_code() {
        let query = CallbackQuery {
            code: Some("  ".into()),
            shop_id: Some("123".into()),
        };
        let (status, Json(body)) = shopee_callback(Query(query)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "code is required");

        let query = CallbackQuery {
            code: None,
            shop_id: None,
        };
        let (status, _) = tiktok_callback(Query(query)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_url_unknown_platform() {
        let (status, _) = auth_url("ebay").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_by_id_rejects_bad_uuid() {
        let (status, _) = get_by_id(Path("42".to_string())).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
