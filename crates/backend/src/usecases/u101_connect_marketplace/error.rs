use axum::http::StatusCode;

use crate::shared::marketplaces::ProviderError;

/// Ошибки сценариев подключения магазина
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("Platform {0} is not configured")]
    PlatformNotConfigured(String),
    #[error("Connection not found")]
    NotFound,
    #[error("Connection is inactive")]
    Inactive,
    #[error("Marketplace error: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ConnectionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPlatform(_) => StatusCode::BAD_REQUEST,
            Self::PlatformNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Inactive => StatusCode::CONFLICT,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ConnectionError::InvalidPlatform("ebay".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ConnectionError::PlatformNotConfigured("tiktok".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ConnectionError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ConnectionError::Inactive.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ConnectionError::from(ProviderError::Decode("bad".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ConnectionError::from(anyhow::anyhow!("db down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ConnectionError::InvalidPlatform("ebay".into()).to_string(),
            "Invalid platform: ebay"
        );
        assert_eq!(ConnectionError::Storage(anyhow::anyhow!("db down")).to_string(), "db down");
    }
}
