use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Статус карточки товара на маркетплейсе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Draft,
    Pending,
    Active,
    Paused,
    Rejected,
    SoldOut,
}

impl ListingStatus {
    pub fn all() -> [ListingStatus; 6] {
        [
            Self::Draft,
            Self::Pending,
            Self::Active,
            Self::Paused,
            Self::Rejected,
            Self::SoldOut,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Rejected => "rejected",
            Self::SoldOut => "sold_out",
        }
    }

    /// Виден покупателям
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_purchasable(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn can_be_edited(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Pending | Self::Paused | Self::Rejected
        )
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        Self::all()
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid listing status: {}", s))
    }

    /// Maps raw marketplace item states (Shopee `NORMAL`, TikTok `LIVE`, ...)
    /// onto the local listing status.
    pub fn from_marketplace(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "NORMAL" | "LIVE" | "ACTIVATE" | "ACTIVE" => Self::Active,
            "UNLIST" | "SELLER_DEACTIVATED" | "PLATFORM_DEACTIVATED" | "FREEZE" => Self::Paused,
            "BANNED" | "FAILED" | "REJECTED" => Self::Rejected,
            "REVIEWING" | "PENDING" => Self::Pending,
            "SOLD_OUT" => Self::SoldOut,
            _ => Self::Draft,
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_is_visible_and_purchasable() {
        for status in ListingStatus::all() {
            let active = status == ListingStatus::Active;
            assert_eq!(status.is_visible(), active);
            assert_eq!(status.is_purchasable(), active);
        }
    }

    #[test]
    fn test_can_be_edited() {
        assert!(ListingStatus::Draft.can_be_edited());
        assert!(ListingStatus::Pending.can_be_edited());
        assert!(ListingStatus::Rejected.can_be_edited());
        assert!(!ListingStatus::Active.can_be_edited());
        assert!(!ListingStatus::SoldOut.can_be_edited());
    }

    #[test]
    fn test_parse() {
        assert_eq!(ListingStatus::parse("sold_out"), Ok(ListingStatus::SoldOut));
        assert!(ListingStatus::parse("SOLD_OUT").is_err());
        assert!("archived".parse::<ListingStatus>().is_err());
    }

    #[test]
    fn test_from_marketplace() {
        assert_eq!(ListingStatus::from_marketplace("NORMAL"), ListingStatus::Active);
        assert_eq!(ListingStatus::from_marketplace("unlist"), ListingStatus::Paused);
        assert_eq!(ListingStatus::from_marketplace("BANNED"), ListingStatus::Rejected);
        assert_eq!(ListingStatus::from_marketplace("???"), ListingStatus::Draft);
    }
}
