// Quantity arithmetic for ledger mutations

use crate::entities::QuantityChange;
use crate::value_objects::ChangeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityPlan {
    pub before: i32,
    pub after: i32,
    /// The requested change would have gone below zero and was held at zero.
    pub clamped: bool,
    pub deactivate: bool,
}

/// An absolute quantity wins over a delta when a caller sends both.
pub fn resolve_quantity_change(delta: Option<i32>, absolute: Option<i32>) -> QuantityChange {
    match (absolute, delta) {
        (Some(value), _) => QuantityChange::Absolute(value),
        (None, Some(value)) => QuantityChange::Delta(value),
        (None, None) => QuantityChange::Unchanged,
    }
}

pub fn plan_quantity(before: i32, change_type: ChangeType, change: QuantityChange) -> QuantityPlan {
    if change_type == ChangeType::Delete {
        return QuantityPlan {
            before,
            after: 0,
            clamped: false,
            deactivate: true,
        };
    }
    let raw = match change {
        QuantityChange::Delta(delta) => i64::from(before) + i64::from(delta),
        QuantityChange::Absolute(value) => i64::from(value),
        QuantityChange::Unchanged => i64::from(before),
    };
    let clamped = raw < 0;
    let after = raw.clamp(0, i64::from(i32::MAX)) as i32;
    QuantityPlan {
        before,
        after,
        clamped,
        deactivate: false,
    }
}

/// A sale line removes `quantity` units.
pub fn plan_reduction(before: i32, quantity: i32) -> QuantityPlan {
    plan_quantity(
        before,
        ChangeType::InventoryAdjustment,
        QuantityChange::Delta(quantity.saturating_neg()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_wins_over_delta() {
        assert_eq!(
            resolve_quantity_change(Some(-3), Some(7)),
            QuantityChange::Absolute(7)
        );
        assert_eq!(resolve_quantity_change(Some(-3), None), QuantityChange::Delta(-3));
        assert_eq!(resolve_quantity_change(None, None), QuantityChange::Unchanged);
    }

    #[test]
    fn quantity_never_goes_negative() {
        let befores = [0, 1, 3, 5, 1_000, i32::MAX];
        let deltas = [i32::MIN, -1_000_000, -6, -5, -1, 0, 1, 7, i32::MAX];
        for before in befores {
            for delta in deltas {
                let plan = plan_quantity(
                    before,
                    ChangeType::InventoryAdjustment,
                    QuantityChange::Delta(delta),
                );
                assert!(plan.after >= 0, "before={before} delta={delta}");
                assert_eq!(plan.clamped, i64::from(before) + i64::from(delta) < 0);
            }
        }
    }

    #[test]
    fn negative_absolute_is_clamped() {
        let plan = plan_quantity(4, ChangeType::ManualEdit, QuantityChange::Absolute(-2));
        assert_eq!(plan.after, 0);
        assert!(plan.clamped);
    }

    #[test]
    fn delete_zeroes_and_deactivates() {
        let plan = plan_quantity(9, ChangeType::Delete, QuantityChange::Delta(4));
        assert_eq!(plan.after, 0);
        assert!(plan.deactivate);
        assert!(!plan.clamped);
    }

    #[test]
    fn oversold_reduction_clamps_to_zero() {
        let plan = plan_reduction(3, 5);
        assert_eq!(plan.before, 3);
        assert_eq!(plan.after, 0);
        assert!(plan.clamped);

        let exact = plan_reduction(5, 5);
        assert_eq!(exact.after, 0);
        assert!(!exact.clamped);
    }
}
