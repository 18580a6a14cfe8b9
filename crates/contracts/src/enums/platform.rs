use serde::{Deserialize, Serialize};
use std::fmt;

/// Поддерживаемые маркетплейсы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopee,
    #[serde(rename = "tiktok")]
    TikTok,
}

impl Platform {
    /// Код платформы, как он хранится в БД и приходит в URL
    pub fn code(&self) -> &'static str {
        match self {
            Platform::Shopee => "shopee",
            Platform::TikTok => "tiktok",
        }
    }

    /// Человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Shopee => "Shopee",
            Platform::TikTok => "TikTok Shop",
        }
    }

    pub fn all() -> Vec<Platform> {
        vec![Platform::Shopee, Platform::TikTok]
    }

    /// Парсинг из строки (регистр не важен)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "shopee" => Some(Platform::Shopee),
            "tiktok" => Some(Platform::TikTok),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
