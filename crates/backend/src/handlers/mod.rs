pub mod categories;
pub mod connections;
pub mod events;
pub mod inventory;
pub mod jobs;
pub mod orders;
pub mod products;
pub mod webhooks;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::shared::marketplaces::error::ProviderError;
use crate::usecases::u101_connect_marketplace::ConnectionError;
use crate::usecases::u105_category_sync::CategoryMappingError;
use crate::usecases::{InvalidRequest, NotFound};

/// Ошибка HTTP обработчика: статус и тело `{"error": "..."}`
pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Maps a use case error to the HTTP status by its concrete type.
pub fn api_error(e: anyhow::Error) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        tracing::error!("Request failed: {:#}", e);
    }
    error_response(status, e.to_string())
}

fn status_for(e: &anyhow::Error) -> StatusCode {
    if let Some(err) = e.downcast_ref::<ConnectionError>() {
        return err.status_code();
    }
    if e.downcast_ref::<InvalidRequest>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    if e.downcast_ref::<NotFound>().is_some() {
        return StatusCode::NOT_FOUND;
    }
    if let Some(err) = e.downcast_ref::<CategoryMappingError>() {
        return match err {
            CategoryMappingError::Invalid(_) => StatusCode::BAD_REQUEST,
            CategoryMappingError::Conflict(_) => StatusCode::CONFLICT,
            CategoryMappingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }
    if e.downcast_ref::<ProviderError>().is_some() {
        return StatusCode::BAD_GATEWAY;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

pub fn parse_uuid(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid id: {}", id)))
}

pub fn not_found(what: &str) -> ApiError {
    error_response(StatusCode::NOT_FOUND, format!("{} not found", what))
}
