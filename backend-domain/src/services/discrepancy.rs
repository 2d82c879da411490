// Marketplace discrepancy evaluation

use crate::entities::{DiscrepancyCheck, MarketplaceListing};
use crate::utils::same_marketplace;

/// Marketplaces still listing the stock, minus `excluding`, deduplicated in listing order.
pub fn other_marketplaces(listings: &[MarketplaceListing], excluding: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for listing in listings {
        let id = listing.marketplace_id.trim();
        if id.is_empty() {
            continue;
        }
        if excluding.map(|ex| same_marketplace(ex, id)).unwrap_or(false) {
            continue;
        }
        if out.iter().any(|seen| same_marketplace(seen, id)) {
            continue;
        }
        out.push(id.to_string());
    }
    out
}

pub fn evaluate_discrepancy(
    listings: &[MarketplaceListing],
    excluding: Option<&str>,
) -> DiscrepancyCheck {
    let other_marketplaces = other_marketplaces(listings, excluding);
    DiscrepancyCheck {
        discrepancy: !other_marketplaces.is_empty(),
        other_marketplaces,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn listings(stock_id: Uuid, names: &[&str]) -> Vec<MarketplaceListing> {
        names
            .iter()
            .map(|name| MarketplaceListing {
                stock_id,
                marketplace_id: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn excluding_the_only_listing_is_consistent() {
        let rows = listings(Uuid::new_v4(), &["tcgplayer"]);
        let check = evaluate_discrepancy(&rows, Some("TCGplayer"));
        assert!(!check.discrepancy);
        assert!(check.other_marketplaces.is_empty());
    }

    #[test]
    fn any_other_listing_is_a_discrepancy() {
        let rows = listings(Uuid::new_v4(), &["tcgplayer", "cardmarket", "Cardmarket"]);
        let check = evaluate_discrepancy(&rows, Some("tcgplayer"));
        assert!(check.discrepancy);
        assert_eq!(check.other_marketplaces, vec!["cardmarket".to_string()]);
    }

    #[test]
    fn no_exclusion_reports_every_listing() {
        let rows = listings(Uuid::new_v4(), &["tcgplayer", "cardmarket"]);
        assert_eq!(other_marketplaces(&rows, None).len(), 2);
        assert!(!evaluate_discrepancy(&[], None).discrepancy);
    }
}
