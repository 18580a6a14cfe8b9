use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Platform;

crate::uuid_id!(
    /// Уникальный идентификатор подключения к магазину маркетплейса
    ConnectionId
);

/// Подключение к магазину маркетплейса (OAuth)
///
/// Токены хранятся в зашифрованном виде и никогда не отдаются наружу:
/// для API используется [`ConnectionResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub platform: Platform,
    pub shop_id: String,
    pub shop_name: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn new_for_insert(
        platform: Platform,
        shop_id: String,
        shop_name: String,
        access_token: String,
        refresh_token: String,
        token_expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new_v4(),
            platform,
            shop_id,
            shop_name,
            access_token,
            refresh_token,
            token_expires_at,
            is_active: true,
            settings: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    /// Token without an expiry is treated as never expiring.
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.token_expires_at
            .map(|exp| exp <= now + window)
            .unwrap_or(false)
    }

    pub fn before_write(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.shop_id.trim().is_empty() {
            return Err("shop_id must not be empty".into());
        }
        if self.access_token.is_empty() {
            return Err("access_token must not be empty".into());
        }
        Ok(())
    }
}

/// Представление подключения для API (без токенов)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub id: ConnectionId,
    pub platform: Platform,
    pub shop_id: String,
    pub shop_name: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub token_expired: bool,
    pub is_active: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Connection> for ConnectionResponse {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id,
            platform: c.platform,
            shop_id: c.shop_id.clone(),
            shop_name: c.shop_name.clone(),
            token_expires_at: c.token_expires_at,
            token_expired: c.is_token_expired(Utc::now()),
            is_active: c.is_active,
            settings: c.settings.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<Connection> for ConnectionResponse {
    fn from(c: Connection) -> Self {
        Self::from(&c)
    }
}

/// Ответ на запрос ссылки авторизации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(expires_in: Option<Duration>) -> Connection {
        Connection::new_for_insert(
            Platform::Shopee,
            "12345".into(),
            "Shop".into(),
            "secret-access".into(),
            "secret-refresh".into(),
            expires_in.map(|d| Utc::now() + d),
        )
    }

    #[test]
    fn test_tokens_are_not_serialized() {
        let json = serde_json::to_string(&connection(None)).unwrap();
        assert!(!json.contains("secret-access"));
        assert!(!json.contains("secret-refresh"));
        let response = ConnectionResponse::from(connection(None));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("access_token").is_none());
        assert_eq!(json["token_expired"], false);
    }

    #[test]
    fn test_expiry_and_refresh_window() {
        let now = Utc::now();
        let c = connection(Some(Duration::minutes(10)));
        assert!(!c.is_token_expired(now));
        assert!(c.needs_refresh(now, Duration::minutes(30)));
        assert!(!c.needs_refresh(now, Duration::minutes(5)));

        let expired = connection(Some(Duration::minutes(-1)));
        assert!(expired.is_token_expired(now));

        let never = connection(None);
        assert!(!never.is_token_expired(now));
        assert!(!never.needs_refresh(now, Duration::days(365)));
    }

    #[test]
    fn test_validate() {
        let mut c = connection(None);
        assert!(c.validate().is_ok());
        c.shop_id = " ".into();
        assert!(c.validate().is_err());
    }
}
