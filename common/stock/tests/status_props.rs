use common_stock::{in_stock, StockStatus};
use proptest::prelude::*;

proptest! {
    // The evaluator must be total: any integer triple maps to exactly one status.
    #[test]
    fn classification_is_total(current in any::<i32>(), minimum in any::<i32>(), maximum in any::<i32>()) {
        let status = StockStatus::evaluate(current, minimum, maximum);
        prop_assert!(matches!(
            status,
            StockStatus::OutOfStock | StockStatus::LowStock | StockStatus::Overstock | StockStatus::InStock
        ));
    }

    // Pure function: same inputs, same answer.
    #[test]
    fn classification_is_deterministic(current in any::<i32>(), minimum in any::<i32>(), maximum in any::<i32>()) {
        prop_assert_eq!(
            StockStatus::evaluate(current, minimum, maximum),
            StockStatus::evaluate(current, minimum, maximum)
        );
    }

    // The availability flag and the out-of-stock status agree everywhere.
    #[test]
    fn availability_agrees_with_status(current in any::<i32>(), minimum in any::<i32>(), maximum in any::<i32>()) {
        let status = StockStatus::evaluate(current, minimum, maximum);
        prop_assert_eq!(in_stock(current), status != StockStatus::OutOfStock);
    }

    // Any positive quantity at or below the minimum is low stock, regardless of
    // where the maximum sits (the minimum rule runs first).
    #[test]
    fn minimum_rule_precedes_maximum_rule(current in 1i32..=1000, minimum in 1i32..=1000, maximum in 0i32..=1000) {
        prop_assume!(current <= minimum);
        prop_assert_eq!(StockStatus::evaluate(current, minimum, maximum), StockStatus::LowStock);
    }

    // The boundary tie pins the observed behavior: min == max == current reads low.
    #[test]
    fn shared_boundary_tie_is_low_stock(level in 1i32..=10_000) {
        prop_assert_eq!(StockStatus::evaluate(level, level, level), StockStatus::LowStock);
    }
}
