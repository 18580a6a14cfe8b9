//! In-process event bus between the sync services.

use chrono::Utc;
use contracts::domain::a001_connection::aggregate::Connection;
use contracts::events::{
    MarketplaceEvent, StockChangedEvent, SyncCompletedEvent, SyncFailedEvent, SyncKind,
};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 1024;

static BUS: Lazy<EventBus> = Lazy::new(|| EventBus::new(CHANNEL_CAPACITY));

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MarketplaceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketplaceEvent> {
        self.tx.subscribe()
    }

    /// Never fails: an event with no subscribers is dropped with a debug log.
    pub fn publish(&self, event: MarketplaceEvent) {
        let subject = event.subject();
        match self.tx.send(event) {
            Ok(n) => tracing::debug!("Published {} to {} subscriber(s)", subject, n),
            Err(_) => tracing::debug!("No subscribers for {}, event dropped", subject),
        }
    }

    pub fn publish_stock_changed(&self, event: StockChangedEvent) {
        self.publish(MarketplaceEvent::StockChanged(event));
    }

    pub fn publish_sync_completed(&self, connection: &Connection, product_id: Option<Uuid>, kind: SyncKind) {
        self.publish(MarketplaceEvent::SyncCompleted(SyncCompletedEvent {
            connection_id: connection.id,
            platform: connection.platform,
            product_id,
            sync_type: kind,
            timestamp: Utc::now(),
        }));
    }

    pub fn publish_sync_failed(
        &self,
        connection: &Connection,
        product_id: Option<Uuid>,
        kind: SyncKind,
        error: impl ToString,
    ) {
        self.publish(MarketplaceEvent::SyncFailed(SyncFailedEvent {
            connection_id: connection.id,
            platform: connection.platform,
            product_id,
            sync_type: kind,
            error: error.to_string(),
            timestamp: Utc::now(),
        }));
    }
}

/// Process-wide bus
pub fn event_bus() -> &'static EventBus {
    &BUS
}

/// Forwards stock-changed events into inventory sync until the bus closes.
pub fn spawn_stock_listener() -> tokio::task::JoinHandle<()> {
    let mut rx = event_bus().subscribe();
    tokio::spawn(async move {
        tracing::info!("Stock change listener started");
        loop {
            match rx.recv().await {
                Ok(MarketplaceEvent::StockChanged(event)) => {
                    let product_id = event.product_id;
                    if let Err(e) = crate::usecases::u103_inventory_sync::handle_stock_changed(event).await {
                        tracing::error!("Failed to handle stock change for product {}: {}", product_id, e);
                    }
                }
                Ok(MarketplaceEvent::SyncCompleted(e)) => {
                    tracing::info!(
                        "Sync completed: {:?} on {} (connection {})",
                        e.sync_type,
                        e.platform,
                        e.connection_id
                    );
                }
                Ok(MarketplaceEvent::SyncFailed(e)) => {
                    tracing::warn!(
                        "Sync failed: {:?} on {} (connection {}): {}",
                        e.sync_type,
                        e.platform,
                        e.connection_id,
                        e.error
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Stock change listener lagged, {} event(s) skipped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("Stock change listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::enums::Platform;

    fn connection() -> Connection {
        Connection::new_for_insert(
            Platform::TikTok,
            "7001".into(),
            "Kedai".into(),
            "a".into(),
            "r".into(),
            None,
        )
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        let bus = EventBus::new(4);
        bus.publish_sync_completed(&connection(), None, SyncKind::Order);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let conn = connection();
        let product = Uuid::new_v4();

        bus.publish_sync_failed(&conn, Some(product), SyncKind::Inventory, "boom");
        match rx.recv().await.unwrap() {
            MarketplaceEvent::SyncFailed(e) => {
                assert_eq!(e.connection_id, conn.id);
                assert_eq!(e.product_id, Some(product));
                assert_eq!(e.sync_type, SyncKind::Inventory);
                assert_eq!(e.error, "boom");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
