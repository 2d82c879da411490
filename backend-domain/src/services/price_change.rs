// Price change detection

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::entities::{PriceQuote, PriceRecord};
use crate::value_objects::PriceDirection;

/// Percentage change from `old` to `new`.
///
/// A missing or zero old price against a different new price counts as a 100% move,
/// so a card gaining its first price is alertable. Two missing prices carry no signal.
pub fn price_delta(old: Option<f64>, new: Option<f64>) -> Option<f64> {
    match (old, new) {
        (None, None) => None,
        (Some(old), Some(new)) if old != 0.0 => Some((new - old) / old * 100.0),
        (old, new) => {
            if old == new {
                Some(0.0)
            } else {
                Some(100.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFieldChange {
    pub old: Option<Decimal>,
    pub new: Option<Decimal>,
    pub percent: Option<f64>,
}

impl PriceFieldChange {
    pub fn between(old: Option<Decimal>, new: Option<Decimal>) -> Self {
        Self {
            old,
            new,
            percent: price_delta(old.and_then(|v| v.to_f64()), new.and_then(|v| v.to_f64())),
        }
    }

    pub fn changed(&self) -> bool {
        self.old != self.new
    }

    pub fn reaches(&self, threshold_percent: f64) -> bool {
        self.changed()
            && self
                .percent
                .map(|pct| pct.abs() >= threshold_percent)
                .unwrap_or(false)
    }

    pub fn direction(&self) -> PriceDirection {
        match (self.old, self.new) {
            (Some(old), Some(new)) if new < old => PriceDirection::Decreased,
            (Some(_), None) => PriceDirection::Decreased,
            _ => PriceDirection::Increased,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMove {
    pub tcgplayer: PriceFieldChange,
    pub cardmarket: PriceFieldChange,
}

impl PriceMove {
    pub fn evaluate(existing: Option<&PriceRecord>, quote: &PriceQuote) -> Self {
        Self {
            tcgplayer: PriceFieldChange::between(
                existing.and_then(|r| r.tcgplayer_price),
                quote.tcgplayer_price,
            ),
            cardmarket: PriceFieldChange::between(
                existing.and_then(|r| r.cardmarket_price),
                quote.cardmarket_price,
            ),
        }
    }

    pub fn any_changed(&self) -> bool {
        self.tcgplayer.changed() || self.cardmarket.changed()
    }

    /// The field that drives the alert: TCGplayer first, then Cardmarket.
    pub fn alert_field(&self, threshold_percent: f64) -> Option<(&'static str, &PriceFieldChange)> {
        if self.tcgplayer.reaches(threshold_percent) {
            Some(("tcgplayer", &self.tcgplayer))
        } else if self.cardmarket.reaches(threshold_percent) {
            Some(("cardmarket", &self.cardmarket))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn delta_between_present_prices() {
        assert_eq!(price_delta(Some(10.0), Some(12.0)), Some(20.0));
        assert_eq!(price_delta(Some(10.0), Some(5.0)), Some(-50.0));
        assert_eq!(price_delta(Some(10.0), Some(10.0)), Some(0.0));
    }

    #[test]
    fn delta_treats_zero_and_null_transitions_as_full_moves() {
        assert_eq!(price_delta(None, Some(3.5)), Some(100.0));
        assert_eq!(price_delta(Some(3.5), None), Some(100.0));
        assert_eq!(price_delta(Some(0.0), Some(2.0)), Some(100.0));
        assert_eq!(price_delta(Some(0.0), Some(0.0)), Some(0.0));
        assert_eq!(price_delta(None, None), None);
    }

    #[test]
    fn delta_round_trips_for_nonzero_old_prices() {
        let olds = [0.01, 0.25, 1.0, 9.99, 10.0, 123.45, 5_000.0];
        let news = [0.0, 0.02, 1.5, 9.99, 12.0, 99.0, 10_000.0];
        for old in olds {
            for new in news {
                let pct = price_delta(Some(old), Some(new)).expect("percent");
                let rebuilt = old * (1.0 + pct / 100.0);
                assert!(
                    (rebuilt - new).abs() <= 1e-9 * new.abs().max(1.0),
                    "old={old} new={new} rebuilt={rebuilt}"
                );
            }
        }
    }

    #[test]
    fn unchanged_prices_do_not_alert() {
        let existing = PriceRecord {
            core_card_id: uuid::Uuid::nil(),
            tcgplayer_price: Some(dec!(10.00)),
            cardmarket_price: Some(dec!(10.00)),
            updated_at: chrono::Utc::now(),
        };
        let quote = PriceQuote {
            tcgplayer_price: Some(dec!(10.00)),
            cardmarket_price: Some(dec!(10.00)),
        };
        let movement = PriceMove::evaluate(Some(&existing), &quote);
        assert!(!movement.any_changed());
        assert!(movement.alert_field(0.0).is_none());
    }

    #[test]
    fn increase_alerts_with_direction() {
        let existing = PriceRecord {
            core_card_id: uuid::Uuid::nil(),
            tcgplayer_price: Some(dec!(10.00)),
            cardmarket_price: Some(dec!(10.00)),
            updated_at: chrono::Utc::now(),
        };
        let quote = PriceQuote {
            tcgplayer_price: Some(dec!(12.00)),
            cardmarket_price: Some(dec!(12.00)),
        };
        let movement = PriceMove::evaluate(Some(&existing), &quote);
        let (field, change) = movement.alert_field(5.0).expect("alert");
        assert_eq!(field, "tcgplayer");
        assert_eq!(change.direction(), PriceDirection::Increased);
        assert_eq!(change.percent, Some(20.0));
    }

    #[test]
    fn small_moves_stay_below_threshold() {
        let change = PriceFieldChange::between(Some(dec!(10.00)), Some(dec!(10.20)));
        assert!(change.changed());
        assert!(!change.reaches(5.0));
        assert!(change.reaches(1.0));
        assert_eq!(
            PriceFieldChange::between(Some(dec!(4)), None).direction(),
            PriceDirection::Decreased
        );
    }

    #[test]
    fn zero_threshold_alerts_on_any_change_only() {
        let existing = PriceRecord {
            core_card_id: uuid::Uuid::new_v4(),
            tcgplayer_price: Some(dec!(10.00)),
            cardmarket_price: Some(dec!(10.00)),
            updated_at: chrono::Utc::now(),
        };
        let flat = PriceQuote {
            tcgplayer_price: Some(dec!(10.00)),
            cardmarket_price: Some(dec!(10.00)),
        };
        assert!(PriceMove::evaluate(Some(&existing), &flat)
            .alert_field(0.0)
            .is_none());

        let nudged = PriceQuote {
            tcgplayer_price: Some(dec!(10.00)),
            cardmarket_price: Some(dec!(9.90)),
        };
        let movement = PriceMove::evaluate(Some(&existing), &nudged);
        let (field, change) = movement.alert_field(0.0).expect("alert");
        assert_eq!(field, "cardmarket");
        assert_eq!(change.direction(), PriceDirection::Decreased);
    }
}
