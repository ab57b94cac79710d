use serde::{Deserialize, Serialize};

/// Derived classification of a product's inventory level. Never persisted;
/// recomputed from the three stock quantities on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Overstock,
    InStock,
}

impl StockStatus {
    /// Classify a stock level. First match wins; the minimum check runs
    /// before the maximum check, so a quantity sitting on a shared
    /// minimum/maximum boundary reads as low stock, not overstock.
    pub fn evaluate(current: i32, minimum: i32, maximum: i32) -> StockStatus {
        if current <= 0 {
            StockStatus::OutOfStock
        } else if current <= minimum {
            StockStatus::LowStock
        } else if current >= maximum {
            StockStatus::Overstock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "OUT_OF_STOCK",
            StockStatus::LowStock => "LOW_STOCK",
            StockStatus::Overstock => "OVERSTOCK",
            StockStatus::InStock => "IN_STOCK",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability flag shown next to the status: anything on hand counts.
pub fn in_stock(current: i32) -> bool {
    current > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_out_of_stock() {
        assert_eq!(StockStatus::evaluate(0, 5, 10), StockStatus::OutOfStock);
    }

    #[test]
    fn at_minimum_is_low_stock() {
        assert_eq!(StockStatus::evaluate(5, 5, 10), StockStatus::LowStock);
    }

    #[test]
    fn at_maximum_is_overstock() {
        assert_eq!(StockStatus::evaluate(10, 5, 10), StockStatus::Overstock);
    }

    #[test]
    fn between_thresholds_is_in_stock() {
        assert_eq!(StockStatus::evaluate(7, 5, 10), StockStatus::InStock);
    }

    #[test]
    fn shared_boundary_reads_low_stock() {
        // minimum == maximum == current: the low-stock rule wins.
        assert_eq!(StockStatus::evaluate(5, 5, 5), StockStatus::LowStock);
    }

    #[test]
    fn negative_stock_is_out_of_stock() {
        assert_eq!(StockStatus::evaluate(-3, 5, 10), StockStatus::OutOfStock);
        assert!(!in_stock(-3));
    }

    #[test]
    fn availability_tracks_quantity_on_hand() {
        assert!(!in_stock(0));
        assert!(in_stock(1));
    }

    #[test]
    fn serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&StockStatus::OutOfStock).unwrap(),
            "\"OUT_OF_STOCK\""
        );
        assert_eq!(
            serde_json::to_string(&StockStatus::InStock).unwrap(),
            "\"IN_STOCK\""
        );
        let status: StockStatus = serde_json::from_str("\"LOW_STOCK\"").unwrap();
        assert_eq!(status, StockStatus::LowStock);
    }
}
