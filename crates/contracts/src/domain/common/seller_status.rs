use serde::{Deserialize, Serialize};
use std::fmt;

/// Статус продавца (магазина) на маркетплейсе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SellerStatus {
    #[default]
    Pending,
    Approved,
    Active,
    Suspended,
    Rejected,
}

impl SellerStatus {
    pub fn all() -> [SellerStatus; 5] {
        [
            Self::Pending,
            Self::Approved,
            Self::Active,
            Self::Suspended,
            Self::Rejected,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
        }
    }

    pub fn can_sell(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn can_receive_payments(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved | Self::Active)
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        Self::all()
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid seller status: {}", s))
    }

    /// Shop states reported by the marketplaces: Shopee `NORMAL`/`BANNED`/`FROZEN`,
    /// TikTok `active`/`inactive`.
    pub fn from_shop_status(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "normal" | "active" => Self::Active,
            "banned" | "frozen" | "inactive" => Self::Suspended,
            other => Self::parse(other).unwrap_or_default(),
        }
    }
}

impl fmt::Display for SellerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions() {
        assert!(SellerStatus::Active.can_sell());
        assert!(!SellerStatus::Approved.can_sell());
        assert!(!SellerStatus::Approved.can_receive_payments());
        assert!(SellerStatus::Approved.is_approved());
        assert!(SellerStatus::Active.is_approved());
        assert!(!SellerStatus::Suspended.is_approved());
    }

    #[test]
    fn test_parse_and_shop_status() {
        assert_eq!(SellerStatus::parse("suspended"), Ok(SellerStatus::Suspended));
        assert!(SellerStatus::parse("Active").is_err());
        assert_eq!(SellerStatus::from_shop_status("NORMAL"), SellerStatus::Active);
        assert_eq!(SellerStatus::from_shop_status("inactive"), SellerStatus::Suspended);
        assert_eq!(SellerStatus::from_shop_status("weird"), SellerStatus::Pending);
    }
}
