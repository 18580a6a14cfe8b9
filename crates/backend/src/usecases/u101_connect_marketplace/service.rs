use std::sync::Arc;

use contracts::domain::a001_connection::aggregate::{
    AuthUrlResponse, Connection, ConnectionId, ConnectionResponse,
};
use contracts::domain::common::SellerStatus;
use contracts::enums::Platform;

use super::error::ConnectionError;
use crate::domain::a001_connection::{repository, service as connection_service};
use crate::shared::crypto;
use crate::shared::marketplaces::types::{ShopInfo, TokenResponse};
use crate::shared::marketplaces::{self, MarketplaceProvider};

const DEFAULT_SHOPEE_SHOP_NAME: &str = "Shopee Shop";

pub type Result<T> = std::result::Result<T, ConnectionError>;

pub fn parse_platform(code: &str) -> Result<Platform> {
    Platform::from_code(code).ok_or_else(|| ConnectionError::InvalidPlatform(code.to_string()))
}

fn provider_for(platform: Platform) -> Result<Arc<dyn MarketplaceProvider>> {
    marketplaces::provider(platform)
        .ok_or_else(|| ConnectionError::PlatformNotConfigured(platform.code().to_string()))
}

/// Ссылка на страницу авторизации магазина и значение `state`
pub fn auth_url(platform_code: &str) -> Result<AuthUrlResponse> {
    let platform = parse_platform(platform_code)?;
    let provider = provider_for(platform)?;
    let state = crypto::generate_state(platform.code());
    Ok(AuthUrlResponse {
        auth_url: provider.auth_url(&state),
        state,
    })
}

/// Settings stored with the connection, taken from the shop profile.
fn shop_settings(info: &ShopInfo) -> serde_json::Value {
    serde_json::json!({
        "seller_status": SellerStatus::from_shop_status(&info.status).as_str(),
        "region": info.region,
        "currency": info.currency,
    })
}

async fn store_tokens(
    platform: Platform,
    tokens: TokenResponse,
    shop_name: String,
    settings: serde_json::Value,
) -> Result<ConnectionResponse> {
    let mut connection = Connection::new_for_insert(
        platform,
        tokens.shop_id,
        shop_name,
        crypto::seal_token(&tokens.access_token)?,
        crypto::seal_token(&tokens.refresh_token)?,
        Some(tokens.expires_at),
    );
    connection.settings = settings;

    let saved = connection_service::save_authorized(connection).await?;
    tracing::info!(
        "Connected {} shop {} ({}) as connection {}",
        platform,
        saved.shop_id,
        saved.shop_name,
        saved.id
    );
    Ok(ConnectionResponse::from(saved))
}

pub async fn handle_shopee_callback(code: &str, shop_id: &str) -> Result<ConnectionResponse> {
    let provider = provider_for(Platform::Shopee)?;
    let mut tokens = provider.exchange_code(code, Some(shop_id)).await?;
    if tokens.shop_id.is_empty() {
        tokens.shop_id = shop_id.to_string();
    }

    let (shop_name, settings) = match provider.shop_info(&tokens.access_token, &tokens.shop_id).await {
        Ok(info) => {
            let name = if info.shop_name.is_empty() {
                DEFAULT_SHOPEE_SHOP_NAME.to_string()
            } else {
                info.shop_name.clone()
            };
            (name, shop_settings(&info))
        }
        Err(e) => {
            tracing::warn!("Failed to load Shopee shop info for {}: {}", tokens.shop_id, e);
            (DEFAULT_SHOPEE_SHOP_NAME.to_string(), serde_json::json!({}))
        }
    };

    store_tokens(Platform::Shopee, tokens, shop_name, settings).await
}

pub async fn handle_tiktok_callback(code: &str) -> Result<ConnectionResponse> {
    let provider = provider_for(Platform::TikTok)?;
    let tokens = provider.exchange_code(code, None).await?;
    let shop_name = tokens.shop_name.clone();
    store_tokens(Platform::TikTok, tokens, shop_name, serde_json::json!({})).await
}

pub async fn list_connections() -> Result<Vec<ConnectionResponse>> {
    Ok(connection_service::list_all()
        .await?
        .into_iter()
        .map(ConnectionResponse::from)
        .collect())
}

pub async fn list_active() -> Result<Vec<ConnectionResponse>> {
    Ok(connection_service::list_active()
        .await?
        .into_iter()
        .map(ConnectionResponse::from)
        .collect())
}

pub async fn get_connection(id: ConnectionId) -> Result<ConnectionResponse> {
    connection_service::get_by_id(id)
        .await?
        .map(ConnectionResponse::from)
        .ok_or(ConnectionError::NotFound)
}

/// Подключение, пригодное для работы с маркетплейсом
pub async fn load_active(id: ConnectionId) -> Result<Connection> {
    let connection = connection_service::get_by_id(id)
        .await?
        .ok_or(ConnectionError::NotFound)?;
    if !connection.is_active {
        return Err(ConnectionError::Inactive);
    }
    Ok(connection)
}

pub async fn disconnect(id: ConnectionId) -> Result<()> {
    if !connection_service::deactivate(id).await? {
        return Err(ConnectionError::NotFound);
    }
    tracing::info!("Connection {} deactivated", id);
    Ok(())
}

pub async fn refresh_token(id: ConnectionId) -> Result<ConnectionResponse> {
    let mut connection = load_active(id).await?;
    let provider = provider_for(connection.platform)?;

    let refresh = crypto::open_token(&connection.refresh_token)?;
    let tokens = provider
        .refresh_token(&refresh, Some(&connection.shop_id))
        .await?;

    let access_token = crypto::seal_token(&tokens.access_token)?;
    let refresh_token = if tokens.refresh_token.is_empty() {
        connection.refresh_token.clone()
    } else {
        crypto::seal_token(&tokens.refresh_token)?
    };
    repository::update_tokens(id, &access_token, &refresh_token, Some(tokens.expires_at)).await?;

    connection.access_token = access_token;
    connection.refresh_token = refresh_token;
    connection.token_expires_at = Some(tokens.expires_at);
    tracing::info!(
        "Refreshed {} token for connection {}, expires at {}",
        connection.platform,
        id,
        tokens.expires_at
    );
    Ok(ConnectionResponse::from(connection))
}

/// Adapter of the connection's platform and the decrypted access token.
pub fn access_for(connection: &Connection) -> Result<(Arc<dyn MarketplaceProvider>, String)> {
    let provider = provider_for(connection.platform)?;
    let token = crypto::open_token(&connection.access_token)?;
    Ok((provider, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::marketplaces::types::ShopInfo;

    #[test]
    fn test_parse_platform() {
        assert_eq!(parse_platform("Shopee").unwrap(), Platform::Shopee);
        assert_eq!(parse_platform("tiktok").unwrap(), Platform::TikTok);
        assert!(matches!(
            parse_platform("lazada"),
            Err(ConnectionError::InvalidPlatform(p)) if p == "lazada"
        ));
    }

    #[test]
    fn test_auth_url_rejects_unknown_platform() {
        assert!(matches!(auth_url("ebay"), Err(ConnectionError::InvalidPlatform(_))));
    }

    #[test]
    fn test_shop_settings() {
        let info = ShopInfo {
            shop_id: "1".into(),
            shop_name: "Demo".into(),
            status: "NORMAL".into(),
            region: "MY".into(),
            currency: "MYR".into(),
            ..Default::default()
        };
        let settings = shop_settings(&info);
        assert_eq!(settings["seller_status"], "active");
        assert_eq!(settings["region"], "MY");
        assert_eq!(settings["currency"], "MYR");

        let banned = ShopInfo {
            status: "BANNED".into(),
            ..info
        };
        assert_eq!(shop_settings(&banned)["seller_status"], "suspended");
    }
}
