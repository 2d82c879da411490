// Change type value objects
// Closed sets of mutation kinds accepted by the ledger and the sale service

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    ManualEdit,
    Delete,
    InventoryAdjustment,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::ManualEdit => "manual_edit",
            ChangeType::Delete => "delete",
            ChangeType::InventoryAdjustment => "inventory_adjustment",
        }
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual_edit" => Ok(ChangeType::ManualEdit),
            "delete" => Ok(ChangeType::Delete),
            "inventory_adjustment" => Ok(ChangeType::InventoryAdjustment),
            other => Err(format!("invalid change_type '{}'", other)),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleChangeType {
    Sale,
    MarketplaceSale,
}

impl SaleChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleChangeType::Sale => "sale",
            SaleChangeType::MarketplaceSale => "marketplace_sale",
        }
    }

    /// Sales pushed by a marketplace sync job rather than entered by the seller.
    pub fn is_integration(&self) -> bool {
        matches!(self, SaleChangeType::MarketplaceSale)
    }
}

impl FromStr for SaleChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sale" => Ok(SaleChangeType::Sale),
            "marketplace_sale" => Ok(SaleChangeType::MarketplaceSale),
            other => Err(format!(
                "invalid change_type '{}', expected 'sale' or 'marketplace_sale'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_parses_known_values_case_insensitively() {
        assert_eq!("manual_edit".parse::<ChangeType>(), Ok(ChangeType::ManualEdit));
        assert_eq!(" DELETE ".parse::<ChangeType>(), Ok(ChangeType::Delete));
        assert_eq!(
            "inventory_adjustment".parse::<ChangeType>(),
            Ok(ChangeType::InventoryAdjustment)
        );
    }

    #[test]
    fn change_type_rejects_unknown_values() {
        let err = "sale".parse::<ChangeType>().expect_err("sale is not a ledger change");
        assert!(err.contains("change_type"));
    }

    #[test]
    fn sale_change_type_only_accepts_sales() {
        assert_eq!("sale".parse::<SaleChangeType>(), Ok(SaleChangeType::Sale));
        assert!("marketplace_sale".parse::<SaleChangeType>().unwrap().is_integration());
        assert!("manual_edit".parse::<SaleChangeType>().is_err());
    }
}
