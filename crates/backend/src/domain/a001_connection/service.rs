use super::repository;
use chrono::Duration;
use contracts::domain::a001_connection::aggregate::{Connection, ConnectionId};
use contracts::enums::Platform;

/// Сохранение подключения после OAuth: новая запись или обновление
/// существующей по `(platform, shop_id)`
pub async fn save_authorized(mut connection: Connection) -> anyhow::Result<Connection> {
    connection
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    connection.is_active = true;
    connection.before_write();

    repository::upsert_by_shop(&connection).await
}

pub async fn update(mut connection: Connection) -> anyhow::Result<()> {
    connection
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    connection.before_write();
    repository::update(&connection).await
}

pub async fn get_by_id(id: ConnectionId) -> anyhow::Result<Option<Connection>> {
    repository::get_by_id(id).await
}

pub async fn find_active(platform: Platform, shop_id: &str) -> anyhow::Result<Option<Connection>> {
    Ok(repository::get_by_platform_and_shop_id(platform, shop_id)
        .await?
        .filter(|c| c.is_active))
}

pub async fn list_all() -> anyhow::Result<Vec<Connection>> {
    repository::list_all().await
}

pub async fn list_active() -> anyhow::Result<Vec<Connection>> {
    repository::list_active().await
}

/// Активные подключения, чей токен истекает в течение `window_minutes`
pub async fn list_needing_refresh(window_minutes: i64) -> anyhow::Result<Vec<Connection>> {
    repository::list_needing_refresh(Duration::minutes(window_minutes)).await
}

pub async fn deactivate(id: ConnectionId) -> anyhow::Result<bool> {
    repository::deactivate(id).await
}
