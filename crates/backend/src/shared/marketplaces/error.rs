use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Ошибка обращения к API маркетплейса
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("marketplace API error {code}: {message}")]
    Api {
        code: String,
        message: String,
        status_code: u16,
        retryable: bool,
    },

    #[error("failed to decode marketplace response: {0}")]
    Decode(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl ProviderError {
    /// Builds an API error, deriving `retryable` from the HTTP status.
    pub fn api(code: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
            status_code,
            retryable: status_code == 429 || status_code >= 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Decode(_) | Self::NotConfigured(_) | Self::Unsupported(_) => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
