//! Sync rules and their resolution.
//!
//! A rule ties one source table (`database.table`) to the column type
//! metadata used to coerce its snapshot rows. The active rule set is loaded
//! before a bootstrap run and stays read-only while it runs.

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for rule operations.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Two rules share the same `database.table` key
    #[error("Duplicate rule for {0}")]
    DuplicateRule(String),

    /// Column names and column types disagree in length
    #[error("Rule {key} declares {names} column names but {types} column types")]
    ColumnMismatch {
        key: String,
        names: usize,
        types: usize,
    },
}

/// Build the lookup key for a source table.
pub fn rule_key(database: &str, table: &str) -> String {
    format!("{database}.{table}")
}

/// Sync rule for one source table.
///
/// # TOML Format
///
/// ```toml
/// [[rule]]
/// schema = "shop"
/// table = "orders"
/// columns = ["number", "float", "other"]
/// column_names = ["id", "total", "note"]
/// ```
///
/// `columns` may be omitted; the CLI then discovers it from MySQL before
/// the bootstrap starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRule {
    /// Source database (MySQL schema)
    #[serde(rename = "schema")]
    pub database: String,

    /// Source table
    pub table: String,

    /// Column types in table column order
    #[serde(default)]
    pub columns: Vec<ColumnType>,

    /// Optional column names, same order as `columns`
    #[serde(default)]
    pub column_names: Vec<String>,
}

impl SyncRule {
    /// Create a new rule without column names.
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<ColumnType>,
    ) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            columns,
            column_names: Vec::new(),
        }
    }

    /// The `database.table` key of this rule.
    pub fn key(&self) -> String {
        rule_key(&self.database, &self.table)
    }

    /// Column type at position `index`, if declared.
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.columns.get(index).copied()
    }

    /// Whether column metadata still has to be discovered.
    pub fn needs_columns(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The active rule set, keyed by `database.table`.
///
/// Resolution is a pure lookup; a `RuleSet` is never mutated while a
/// bootstrap is running.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<SyncRule>,
    rule_map: HashMap<String, usize>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate keys.
    pub fn new(rules: Vec<SyncRule>) -> Result<Self, RuleError> {
        let mut rule_map = HashMap::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            if !rule.column_names.is_empty() && rule.column_names.len() != rule.columns.len() {
                return Err(RuleError::ColumnMismatch {
                    key: rule.key(),
                    names: rule.column_names.len(),
                    types: rule.columns.len(),
                });
            }
            if rule_map.insert(rule.key(), idx).is_some() {
                return Err(RuleError::DuplicateRule(rule.key()));
            }
        }
        Ok(Self { rules, rule_map })
    }

    /// Resolve the rule for a source table.
    pub fn resolve(&self, database: &str, table: &str) -> Option<&SyncRule> {
        self.rule_map
            .get(&rule_key(database, table))
            .map(|idx| &self.rules[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        let mut orders = SyncRule::new(
            "shop",
            "orders",
            vec![ColumnType::Number, ColumnType::Float, ColumnType::Other],
        );
        orders.column_names = vec!["id".into(), "total".into(), "note".into()];
        RuleSet::new(vec![orders, SyncRule::new("shop", "customers", Vec::new())]).unwrap()
    }

    #[test]
    fn test_resolve() {
        let rules = rules();
        assert_eq!(rules.len(), 2);

        let orders = rules.resolve("shop", "orders").unwrap();
        assert_eq!(orders.key(), "shop.orders");
        assert_eq!(orders.column_type(1), Some(ColumnType::Float));
        assert_eq!(orders.column_type(3), None);

        let customers = rules.resolve("shop", "customers").unwrap();
        assert!(customers.needs_columns());
    }

    #[test]
    fn test_resolve_unknown_table() {
        let rules = rules();
        assert!(rules.resolve("shop", "invoices").is_none());
        assert!(rules.resolve("crm", "orders").is_none());
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let result = RuleSet::new(vec![
            SyncRule::new("shop", "orders", vec![ColumnType::Number]),
            SyncRule::new("shop", "orders", vec![ColumnType::Other]),
        ]);
        assert!(matches!(result, Err(RuleError::DuplicateRule(key)) if key == "shop.orders"));
    }

    #[test]
    fn test_column_name_mismatch_rejected() {
        let mut rule = SyncRule::new("shop", "orders", vec![ColumnType::Number]);
        rule.column_names = vec!["id".into(), "total".into()];
        assert!(matches!(
            RuleSet::new(vec![rule]),
            Err(RuleError::ColumnMismatch { names: 2, types: 1, .. })
        ));
    }

    #[test]
    fn test_rule_deserialize() {
        let rule: SyncRule =
            serde_json::from_str(r#"{"schema": "shop", "table": "orders", "columns": ["number"]}"#)
                .unwrap();
        assert_eq!(rule, SyncRule::new("shop", "orders", vec![ColumnType::Number]));
        assert!(rule.column_names.is_empty());

        let unknown = r#"{"schema": "shop", "table": "orders", "columns": ["decimal"]}"#;
        assert!(serde_json::from_str::<SyncRule>(unknown).is_err());
    }
}
