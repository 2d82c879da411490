use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::value_objects::NotificationType;

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn normalize_marketplace(value: Option<String>) -> Option<String> {
    normalize_optional_text(value).map(|item| item.to_lowercase())
}

pub fn same_marketplace(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Key shared by notifications that describe the same event on the same day.
pub fn notification_dedupe_key(
    kind: NotificationType,
    user_id: &str,
    subject: Uuid,
    marketplace: Option<&str>,
    day: NaiveDate,
) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        kind.as_str(),
        user_id,
        subject,
        marketplace.map(|m| m.trim().to_lowercase()).unwrap_or_default(),
        day.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_normalizes_to_none() {
        assert_eq!(normalize_optional_text(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional_text(Some(" clerk ".to_string())),
            Some("clerk".to_string())
        );
    }

    #[test]
    fn marketplaces_compare_case_insensitively() {
        assert!(same_marketplace("TCGplayer", "tcgplayer "));
        assert!(!same_marketplace("tcgplayer", "cardmarket"));
        assert_eq!(
            normalize_marketplace(Some(" CardMarket ".to_string())),
            Some("cardmarket".to_string())
        );
    }

    #[test]
    fn dedupe_key_is_stable_per_day_and_marketplace() {
        let stock = Uuid::nil();
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let a = notification_dedupe_key(
            NotificationType::DiscrepancyStock,
            "user-1",
            stock,
            Some("Cardmarket"),
            day,
        );
        let b = notification_dedupe_key(
            NotificationType::DiscrepancyStock,
            "user-1",
            stock,
            Some("cardmarket"),
            day,
        );
        assert_eq!(a, b);
        let next_day = day.succ_opt().unwrap();
        assert_ne!(
            a,
            notification_dedupe_key(
                NotificationType::DiscrepancyStock,
                "user-1",
                stock,
                Some("cardmarket"),
                next_day,
            )
        );
    }
}
