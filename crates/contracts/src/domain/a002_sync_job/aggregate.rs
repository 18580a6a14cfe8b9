use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::a001_connection::aggregate::ConnectionId;

crate::uuid_id!(
    /// Уникальный идентификатор задания синхронизации
    SyncJobId
);

pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Тип задания синхронизации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobType {
    ProductPush,
    ProductUpdate,
    InventorySync,
    OrderSync,
    TokenRefresh,
}

impl SyncJobType {
    pub fn all() -> [SyncJobType; 5] {
        [
            Self::ProductPush,
            Self::ProductUpdate,
            Self::InventorySync,
            Self::OrderSync,
            Self::TokenRefresh,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductPush => "product_push",
            Self::ProductUpdate => "product_update",
            Self::InventorySync => "inventory_sync",
            Self::OrderSync => "order_sync",
            Self::TokenRefresh => "token_refresh",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for SyncJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Статус задания синхронизации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SyncJobStatus {
    pub fn all() -> [SyncJobStatus; 4] {
        [Self::Pending, Self::Processing, Self::Completed, Self::Failed]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|st| st.as_str() == s)
    }
}

impl fmt::Display for SyncJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Задание синхронизации (строка очереди)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: SyncJobId,
    pub connection_id: ConnectionId,
    pub job_type: SyncJobType,
    pub payload: serde_json::Value,
    pub status: SyncJobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub error_message: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SyncJob {
    /// Новое задание в статусе `pending`, готовое к немедленному выполнению
    pub fn new(
        connection_id: ConnectionId,
        job_type: SyncJobType,
        payload: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SyncJobId::new_v4(),
            connection_id,
            job_type,
            payload,
            status: SyncJobStatus::Pending,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            error_message: None,
            scheduled_at: now,
            started_at: None,
            completed_at: None,
            created_at: now,
        }
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = at;
        self
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn is_terminal(&self) -> bool {
        match self.status {
            SyncJobStatus::Completed => true,
            SyncJobStatus::Failed => !self.can_retry(),
            SyncJobStatus::Pending | SyncJobStatus::Processing => false,
        }
    }

    /// Matches the poller's selection rule.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == SyncJobStatus::Pending && self.scheduled_at <= now && self.can_retry()
    }

    /// Decodes the JSON payload into the typed payload of this job type.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| format!("invalid {} payload: {}", self.job_type, e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductPushPayload {
    pub internal_product_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_mapping_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventorySyncPayload {
    pub internal_product_id: Uuid,
    pub new_quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
}

/// Действие для задания `order_sync`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSyncAction {
    Import,
    UpdateStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSyncPayload {
    pub external_order_id: String,
    pub action: OrderSyncAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenRefreshPayload {}

/// Фильтр списка заданий
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncJobFilter {
    pub status: Option<SyncJobStatus>,
    pub job_type: Option<SyncJobType>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Количество заданий по статусам
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncJobCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}
