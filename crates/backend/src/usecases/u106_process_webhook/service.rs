use contracts::domain::a007_webhook_event::aggregate::{
    WebhookEvent, WebhookEventFilter, WebhookEventId,
};
use contracts::domain::common::Paged;
use contracts::enums::Platform;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use crate::domain::a007_webhook_event::repository;
use crate::shared::crypto;
use crate::shared::marketplaces::types::WebhookPayload;
use crate::shared::marketplaces::{self, shopee, tiktok};
use crate::usecases::u104_order_sync;

/// Ответ на входящий webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReply {
    /// Shopee push URL validation: the code is echoed back
    Verification(String),
    Received,
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error("Platform {0} is not configured")]
    NotConfigured(Platform),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Shopee push. A bad signature or an unreadable body is logged and still
/// acknowledged so Shopee does not keep re-sending it.
pub async fn receive_shopee(body: &[u8], signature: &str) -> Result<WebhookReply, WebhookError> {
    if let Some(code) = shopee::webhook::push_verification_code(body) {
        tracing::info!("Shopee push URL verification request");
        return Ok(WebhookReply::Verification(code));
    }

    match marketplaces::provider(Platform::Shopee) {
        Some(provider) if !provider.verify_webhook(body, signature) => {
            tracing::warn!("Shopee webhook signature mismatch, processing anyway");
        }
        Some(_) => {}
        None => tracing::warn!("Shopee is not configured, webhook signature not checked"),
    }

    let payload = match shopee::webhook::parse_push(body) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Cannot parse Shopee webhook: {}", e);
            return Ok(WebhookReply::Received);
        }
    };

    accept(Platform::Shopee, body, signature, payload).await?;
    Ok(WebhookReply::Received)
}

pub async fn receive_tiktok(body: &[u8], signature: &str) -> Result<WebhookReply, WebhookError> {
    let provider =
        marketplaces::provider(Platform::TikTok).ok_or(WebhookError::NotConfigured(Platform::TikTok))?;
    if !provider.verify_webhook(body, signature) {
        tracing::warn!("Rejected TikTok webhook with invalid signature");
        return Err(WebhookError::InvalidSignature);
    }

    let payload = tiktok::webhook::parse_push(body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
    accept(Platform::TikTok, body, signature, payload).await?;
    Ok(WebhookReply::Received)
}

/// Serializes the duplicate check with the insert
static ACCEPT_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Stores the event and, for order events, starts order handling in the
/// background. A body already processed or still in flight is ignored.
pub(crate) async fn accept(
    platform: Platform,
    body: &[u8],
    signature: &str,
    payload: WebhookPayload,
) -> anyhow::Result<Option<WebhookEventId>> {
    let payload_hash = crypto::sha256_hex(body);
    let event = {
        let _guard = ACCEPT_LOCK.lock().await;
        if repository::find_delivered_by_hash(platform, &payload_hash)
            .await?
            .is_some()
        {
            tracing::info!("Duplicate {} webhook {} ignored", platform, payload.event_type);
            return Ok(None);
        }

        let event = WebhookEvent::new_for_insert(
            platform,
            &payload.event_type,
            payload.raw.clone(),
            signature.to_string(),
            payload_hash,
        );
        repository::create(&event).await?;
        event
    };
    tracing::info!(
        "Stored {} webhook {} for shop {} ({})",
        platform,
        event.event_type,
        payload.shop_id,
        event.id
    );

    match payload.order_id {
        Some(order_id) => {
            let event_id = event.id;
            let shop_id = payload.shop_id.clone();
            tokio::spawn(async move {
                process_order_event(event_id, platform, &shop_id, &order_id).await;
            });
        }
        None => {
            repository::mark_processed(event.id).await?;
        }
    }
    Ok(Some(event.id))
}

async fn process_order_event(event_id: WebhookEventId, platform: Platform, shop_id: &str, order_id: &str) {
    let result = u104_order_sync::handle_order_event(platform, shop_id, order_id).await;
    let stored = match &result {
        Ok(order) => {
            tracing::info!(
                "Webhook {} handled: {} order {} is {}",
                event_id,
                platform,
                order_id,
                order.status
            );
            repository::mark_processed(event_id).await
        }
        Err(e) => {
            tracing::error!("Webhook {} ({} order {}) failed: {}", event_id, platform, order_id, e);
            repository::mark_failed(event_id, &e.to_string()).await
        }
    };
    if let Err(e) = stored {
        tracing::error!("Cannot update webhook event {}: {}", event_id, e);
    }
}

pub async fn list_events(filter: &WebhookEventFilter) -> anyhow::Result<Paged<WebhookEvent>> {
    let (items, total) = repository::list(filter).await?;
    Ok(Paged::new(items, total, filter.page_request()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shopee_verification_is_echoed() {
        let body = br#"{"push_verification_code":"abc123"}"#;
        let reply = receive_shopee(body, "").await.unwrap();
        assert_eq!(reply, WebhookReply::Verification("abc123".into()));
    }

    #[tokio::test]
    async fn test_shopee_unparseable_body_is_acknowledged() {
        let reply = receive_shopee(b"not json", "sig").await.unwrap();
        assert_eq!(reply, WebhookReply::Received);
    }
}
