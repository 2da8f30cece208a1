//! Snapshot scope selection.

use std::collections::BTreeSet;
use sync_core::RuleSet;

/// What the snapshot producer is asked to dump.
///
/// mysqldump can select tables within one database, or whole databases, but
/// not tables from several databases in one run. Rules spanning several
/// databases therefore fall back to dumping every table of each referenced
/// database; rows of untracked tables are discarded during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotScope {
    /// Dump exactly `tables` of `database`
    ByTable {
        database: String,
        tables: BTreeSet<String>,
    },
    /// Dump every table of each database
    ByDatabase { databases: BTreeSet<String> },
}

impl SnapshotScope {
    /// Build the tightest scope covering every rule.
    ///
    /// Returns `None` for an empty rule set.
    pub fn from_rules(rules: &RuleSet) -> Option<Self> {
        let databases: BTreeSet<String> = rules.iter().map(|r| r.database.clone()).collect();

        match databases.len() {
            0 => None,
            1 => {
                let database = databases.into_iter().next()?;
                let tables = rules.iter().map(|r| r.table.clone()).collect();
                Some(SnapshotScope::ByTable { database, tables })
            }
            _ => Some(SnapshotScope::ByDatabase { databases }),
        }
    }

    /// Databases touched by this scope.
    pub fn databases(&self) -> Vec<&str> {
        match self {
            SnapshotScope::ByTable { database, .. } => vec![database.as_str()],
            SnapshotScope::ByDatabase { databases } => {
                databases.iter().map(String::as_str).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{ColumnType, SyncRule};

    fn rules(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::new(
            pairs
                .iter()
                .map(|(db, table)| SyncRule::new(*db, *table, vec![ColumnType::Number]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_database_scopes_by_table() {
        let scope = SnapshotScope::from_rules(&rules(&[
            ("shop", "orders"),
            ("shop", "customers"),
            ("shop", "items"),
        ]))
        .unwrap();

        assert_eq!(
            scope,
            SnapshotScope::ByTable {
                database: "shop".to_string(),
                tables: ["customers", "items", "orders"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }
        );
        assert_eq!(scope.databases(), vec!["shop"]);
    }

    #[test]
    fn test_multiple_databases_scope_by_database() {
        let scope =
            SnapshotScope::from_rules(&rules(&[("shop", "orders"), ("crm", "contacts")])).unwrap();

        assert_eq!(
            scope,
            SnapshotScope::ByDatabase {
                databases: ["crm", "shop"].into_iter().map(String::from).collect(),
            }
        );
    }

    #[test]
    fn test_multiple_databases_ignores_table_count() {
        let scope = SnapshotScope::from_rules(&rules(&[
            ("shop", "orders"),
            ("shop", "customers"),
            ("shop", "items"),
            ("crm", "contacts"),
        ]))
        .unwrap();

        assert!(matches!(scope, SnapshotScope::ByDatabase { ref databases } if databases.len() == 2));
    }

    #[test]
    fn test_empty_rules_have_no_scope() {
        assert_eq!(SnapshotScope::from_rules(&RuleSet::default()), None);
    }
}
