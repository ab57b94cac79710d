use common_http_errors::ApiError;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Bidirectional translation between the frontend contract's field names and
/// the relational schema's column names. One table, validated at startup;
/// anything dynamic (the `ordering` query parameter) must go through it
/// instead of renaming keys ad hoc in handlers.
pub struct FieldMap {
    pairs: &'static [(&'static str, &'static str)],
}

/// (contract name, column name) pairs for the products resource. Fields the
/// contract and the schema agree on are listed too, so the table is the full
/// sortable surface, not just the renames.
pub const PRODUCT_FIELDS: FieldMap = FieldMap {
    pairs: &[
        ("id", "id"),
        ("name", "name"),
        ("description", "description"),
        ("category", "category_id"),
        ("sku", "sku"),
        ("price", "price"),
        ("discount_price", "discounted_price"),
        ("current_stock", "stock_current"),
        ("minimum_stock", "stock_minimum"),
        ("maximum_stock", "stock_maximum"),
        ("active", "active"),
        ("created_at", "created_at"),
        ("updated_at", "updated_at"),
    ],
};

#[derive(Debug, Error)]
pub enum FieldMapError {
    #[error("duplicate contract field name: {0}")]
    DuplicateContract(&'static str),
    #[error("duplicate column name: {0}")]
    DuplicateColumn(&'static str),
}

impl FieldMap {
    /// Storage column for a contract field name.
    pub fn column(&self, contract: &str) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(c, _)| *c == contract)
            .map(|(_, col)| *col)
    }

    /// Contract field name for a storage column.
    pub fn contract(&self, column: &str) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(_, col)| *col == column)
            .map(|(c, _)| *c)
    }

    pub fn contract_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(contract, _)| *contract)
    }

    /// Startup check: the mapping must be a bijection or lookups are ambiguous.
    pub fn validate(&self) -> Result<(), FieldMapError> {
        let mut contracts = HashSet::new();
        let mut columns = HashSet::new();
        for (contract, column) in self.pairs {
            if !contracts.insert(*contract) {
                return Err(FieldMapError::DuplicateContract(contract));
            }
            if !columns.insert(*column) {
                return Err(FieldMapError::DuplicateColumn(column));
            }
        }
        Ok(())
    }

    /// Translate an `ordering` query parameter (contract field name, optional
    /// leading `-` for descending) into a SQL ORDER BY clause. Unknown fields
    /// are rejected rather than silently ignored.
    pub fn order_clause(
        &self,
        param: Option<&str>,
        trace_id: Option<Uuid>,
    ) -> Result<String, ApiError> {
        let Some(raw) = param else {
            return Ok("id ASC".to_string());
        };
        let (field, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, "DESC"),
            None => (raw, "ASC"),
        };
        let column = self.column(field).ok_or_else(|| {
            ApiError::validation(format!("unknown ordering field \"{field}\""), trace_id)
        })?;
        Ok(format!("{column} {direction}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_map_is_valid() {
        PRODUCT_FIELDS.validate().unwrap();
    }

    #[test]
    fn round_trip_is_identity() {
        for (contract, _) in PRODUCT_FIELDS.pairs {
            let column = PRODUCT_FIELDS.column(contract).unwrap();
            assert_eq!(PRODUCT_FIELDS.contract(column), Some(*contract));
        }
    }

    #[test]
    fn renamed_fields_translate_both_ways() {
        assert_eq!(PRODUCT_FIELDS.column("current_stock"), Some("stock_current"));
        assert_eq!(PRODUCT_FIELDS.column("discount_price"), Some("discounted_price"));
        assert_eq!(PRODUCT_FIELDS.contract("stock_minimum"), Some("minimum_stock"));
        assert_eq!(PRODUCT_FIELDS.contract("category_id"), Some("category"));
    }

    #[test]
    fn duplicate_contract_is_rejected() {
        let map = FieldMap { pairs: &[("name", "name"), ("name", "title")] };
        assert!(matches!(
            map.validate(),
            Err(FieldMapError::DuplicateContract("name"))
        ));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let map = FieldMap { pairs: &[("name", "name"), ("title", "name")] };
        assert!(matches!(
            map.validate(),
            Err(FieldMapError::DuplicateColumn("name"))
        ));
    }

    #[test]
    fn ordering_translates_contract_names() {
        assert_eq!(
            PRODUCT_FIELDS.order_clause(Some("current_stock"), None).unwrap(),
            "stock_current ASC"
        );
        assert_eq!(
            PRODUCT_FIELDS.order_clause(Some("-price"), None).unwrap(),
            "price DESC"
        );
        assert_eq!(PRODUCT_FIELDS.order_clause(None, None).unwrap(), "id ASC");
    }

    #[test]
    fn ordering_rejects_unknown_fields() {
        let err = PRODUCT_FIELDS.order_clause(Some("stock_current"), None);
        assert!(err.is_err(), "storage names are not part of the contract");
        assert!(PRODUCT_FIELDS.order_clause(Some("evil; DROP TABLE"), None).is_err());
    }
}
