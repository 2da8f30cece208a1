//! Snapshot row coercion.
//!
//! Turns the raw SQL literals of one snapshot row into typed values using the
//! column types of the row's rule, then forwards the row to the document
//! sink. A row is forwarded whole or not at all.

use async_trait::async_trait;
use document_sink::{DocumentSink, SyncAction};
use sync_core::{CoercedRow, CoercedValue, ColumnType, RuleSet, SyncRule};
use tracing::{debug, error, warn};

use crate::parser::{RowHandler, RowOutcome};

/// Why a row could not be coerced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    #[error("row has {actual} fields but the rule declares {expected} columns")]
    FieldCount { expected: usize, actual: usize },

    #[error("column {index}: cannot parse '{value}' as {column_type}")]
    InvalidLiteral {
        index: usize,
        value: String,
        column_type: ColumnType,
    },

    #[error("column {index}: unquoted literal '{value}' in a column of type {column_type}")]
    UnsupportedLiteral {
        index: usize,
        value: String,
        column_type: ColumnType,
    },

    #[error("column {index}: value is not valid UTF-8")]
    InvalidUtf8 { index: usize },
}

/// Coerce one row of raw literals according to `rule`.
///
/// - `NULL` becomes [`CoercedValue::Null`] whatever the column type.
/// - A quoted literal becomes a string, with MySQL escapes decoded, whatever
///   the column type.
/// - A bare literal is parsed as `i64` for `Number` and `f64` for `Float`
///   columns; anything else fails the whole row.
/// - A field whose bytes are not UTF-8 fails the whole row.
pub fn coerce_row<V: AsRef<[u8]>>(
    rule: &SyncRule,
    values: &[V],
) -> Result<CoercedRow, CoerceError> {
    if values.len() != rule.columns.len() {
        return Err(CoerceError::FieldCount {
            expected: rule.columns.len(),
            actual: values.len(),
        });
    }

    values
        .iter()
        .zip(&rule.columns)
        .enumerate()
        .map(|(index, (value, column_type))| {
            let value = std::str::from_utf8(value.as_ref())
                .map_err(|_| CoerceError::InvalidUtf8 { index })?;
            coerce_field(index, value, *column_type)
        })
        .collect()
}

fn coerce_field(
    index: usize,
    value: &str,
    column_type: ColumnType,
) -> Result<CoercedValue, CoerceError> {
    if value == "NULL" {
        return Ok(CoercedValue::Null);
    }

    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return Ok(CoercedValue::String(unescape(&value[1..value.len() - 1])));
    }

    let invalid = || CoerceError::InvalidLiteral {
        index,
        value: value.to_string(),
        column_type,
    };

    match column_type {
        ColumnType::Number => value
            .parse::<i64>()
            .map(CoercedValue::Int64)
            .map_err(|_| invalid()),
        ColumnType::Float => value
            .parse::<f64>()
            .map(CoercedValue::Float64)
            .map_err(|_| invalid()),
        ColumnType::Other => Err(CoerceError::UnsupportedLiteral {
            index,
            value: value.to_string(),
            column_type,
        }),
    }
}

/// Decode the backslash escapes mysqldump writes inside string literals.
fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('0') => out.push('\0'),
                Some('b') => out.push('\x08'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('Z') => out.push('\x1a'),
                // LIKE wildcards keep their backslash
                Some(c @ ('%' | '_')) => {
                    out.push('\\');
                    out.push(c);
                }
                Some(c) => out.push(c),
                None => out.push('\\'),
            },
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            c => out.push(c),
        }
    }

    out
}

/// Row accounting for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoerceStats {
    /// Rows the sink accepted
    pub rows_synced: u64,
    /// Rows dropped because a field could not be coerced
    pub rows_discarded: u64,
    /// Rows dropped because no rule covers their table
    pub unknown_tables: u64,
    /// Rows the sink rejected
    pub sync_failures: u64,
}

/// Row handler that coerces snapshot rows and forwards them to a sink.
///
/// Each accepted row is sent as its own one-row insert batch before the next
/// row is read, so sink calls follow snapshot order.
pub struct RowCoercer<'a, S: DocumentSink + ?Sized> {
    rules: &'a RuleSet,
    sink: &'a S,
    stats: CoerceStats,
}

impl<'a, S: DocumentSink + ?Sized> RowCoercer<'a, S> {
    pub fn new(rules: &'a RuleSet, sink: &'a S) -> Self {
        Self {
            rules,
            sink,
            stats: CoerceStats::default(),
        }
    }

    pub fn stats(&self) -> CoerceStats {
        self.stats
    }
}

#[async_trait]
impl<'a, S: DocumentSink + ?Sized> RowHandler for RowCoercer<'a, S> {
    async fn handle_row(
        &mut self,
        database: &str,
        table: &str,
        values: Vec<Vec<u8>>,
    ) -> RowOutcome {
        let Some(rule) = self.rules.resolve(database, table) else {
            warn!("no rule for {database}.{table}, skip row");
            self.stats.unknown_tables += 1;
            return RowOutcome::Continue;
        };

        let row = match coerce_row(rule, &values) {
            Ok(row) => row,
            Err(e) => {
                let shown: Vec<_> = values.iter().map(|v| String::from_utf8_lossy(v)).collect();
                warn!("parse row {:?} of {} error: {e}, skip", shown, rule.key());
                self.stats.rows_discarded += 1;
                return RowOutcome::SkipRow;
            }
        };

        debug!("dump: sync {} row {:?}", rule.key(), row);
        match self
            .sink
            .sync_rows(rule, SyncAction::Insert, std::slice::from_ref(&row), false)
            .await
        {
            Ok(()) => self.stats.rows_synced += 1,
            Err(e) => {
                error!("dump: sync {:?} of {} error: {e:#}", row, rule.key());
                self.stats.sync_failures += 1;
            }
        }

        RowOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use sync_core::SyncRule;

    fn rule(columns: Vec<ColumnType>) -> SyncRule {
        SyncRule::new("shop", "orders", columns)
    }

    fn raw(values: &[&str]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_null_ignores_column_type() {
        for column_type in [ColumnType::Number, ColumnType::Float, ColumnType::Other] {
            let row = coerce_row(&rule(vec![column_type]), &raw(&["NULL"])).unwrap();
            assert_eq!(row, vec![CoercedValue::Null]);
        }
    }

    #[test]
    fn test_quoted_literal_overrides_number_type() {
        let row = coerce_row(&rule(vec![ColumnType::Number]), &raw(&["'abc'"])).unwrap();
        assert_eq!(row, vec![CoercedValue::String("abc".to_string())]);

        let row = coerce_row(&rule(vec![ColumnType::Number]), &raw(&["'123'"])).unwrap();
        assert_eq!(row, vec![CoercedValue::String("123".to_string())]);
    }

    #[test]
    fn test_bare_number_and_float() {
        let row = coerce_row(
            &rule(vec![ColumnType::Number, ColumnType::Float, ColumnType::Number]),
            &raw(&["123", "1.5", "-9223372036854775808"]),
        )
        .unwrap();
        assert_eq!(
            row,
            vec![
                CoercedValue::Int64(123),
                CoercedValue::Float64(1.5),
                CoercedValue::Int64(i64::MIN),
            ]
        );
    }

    #[test]
    fn test_unparseable_number_fails_row() {
        let err = coerce_row(
            &rule(vec![ColumnType::Number, ColumnType::Number]),
            &raw(&["1", "abc"]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoerceError::InvalidLiteral {
                index: 1,
                value: "abc".to_string(),
                column_type: ColumnType::Number,
            }
        );
    }

    #[test]
    fn test_float_literal_in_number_column_fails_row() {
        assert!(coerce_row(&rule(vec![ColumnType::Number]), &raw(&["1.5"])).is_err());
        assert!(coerce_row(&rule(vec![ColumnType::Float]), &raw(&["x1"])).is_err());
    }

    #[test]
    fn test_bare_literal_in_other_column_fails_row() {
        let err = coerce_row(&rule(vec![ColumnType::Other]), &raw(&["b'1'"])).unwrap_err();
        assert!(matches!(err, CoerceError::UnsupportedLiteral { index: 0, .. }));
    }

    #[test]
    fn test_field_count_mismatch_fails_row() {
        let err = coerce_row(&rule(vec![ColumnType::Number]), &raw(&["1", "2"])).unwrap_err();
        assert_eq!(
            err,
            CoerceError::FieldCount {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_lone_quote_is_not_a_string() {
        assert!(coerce_row(&rule(vec![ColumnType::Other]), &raw(&["'"])).is_err());
        let row = coerce_row(&rule(vec![ColumnType::Other]), &raw(&["''"])).unwrap();
        assert_eq!(row, vec![CoercedValue::String(String::new())]);
    }

    #[test]
    fn test_non_utf8_field_fails_row() {
        let values = vec![b"1".to_vec(), b"'caf\xe9'".to_vec()];
        let err = coerce_row(&rule(vec![ColumnType::Number, ColumnType::Other]), &values)
            .unwrap_err();
        assert_eq!(err, CoerceError::InvalidUtf8 { index: 1 });
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"it\'s"), "it's");
        assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(unescape(r"back\\slash"), r"back\slash");
        assert_eq!(unescape(r"100\%"), r"100\%");
        assert_eq!(unescape("a''b"), "a'b");
        assert_eq!(unescape(r"trailing\"), r"trailing\");
    }

    /// Sink that records calls and fails for rows whose first value is 99.
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, SyncAction, Vec<CoercedRow>)>>,
    }

    #[async_trait]
    impl DocumentSink for RecordingSink {
        async fn sync_rows(
            &self,
            rule: &SyncRule,
            action: SyncAction,
            rows: &[CoercedRow],
            _refresh: bool,
        ) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((rule.key(), action, rows.to_vec()));
            if rows[0][0] == CoercedValue::Int64(99) {
                anyhow::bail!("index rejected document");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_coercer_forwards_single_row_inserts() {
        let rules = RuleSet::new(vec![rule(vec![ColumnType::Number, ColumnType::Other])]).unwrap();
        let sink = RecordingSink::default();
        let mut coercer = RowCoercer::new(&rules, &sink);

        let outcome = coercer
            .handle_row("shop", "orders", raw(&["1", "'one'"]))
            .await;
        assert!(matches!(outcome, RowOutcome::Continue));

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "shop.orders");
        assert_eq!(calls[0].1, SyncAction::Insert);
        assert_eq!(
            calls[0].2,
            vec![vec![
                CoercedValue::Int64(1),
                CoercedValue::String("one".to_string())
            ]]
        );
        assert_eq!(coercer.stats().rows_synced, 1);
    }

    #[tokio::test]
    async fn test_coercer_skips_malformed_row_without_sync() {
        let rules = RuleSet::new(vec![rule(vec![ColumnType::Number])]).unwrap();
        let sink = RecordingSink::default();
        let mut coercer = RowCoercer::new(&rules, &sink);

        let outcome = coercer.handle_row("shop", "orders", raw(&["abc"])).await;
        assert!(matches!(outcome, RowOutcome::SkipRow));
        assert!(sink.calls.lock().unwrap().is_empty());
        assert_eq!(coercer.stats().rows_discarded, 1);
    }

    #[tokio::test]
    async fn test_coercer_discards_non_utf8_row() {
        let rules = RuleSet::new(vec![rule(vec![ColumnType::Number, ColumnType::Other])]).unwrap();
        let sink = RecordingSink::default();
        let mut coercer = RowCoercer::new(&rules, &sink);

        let outcome = coercer
            .handle_row("shop", "orders", vec![b"1".to_vec(), b"'caf\xe9'".to_vec()])
            .await;
        assert!(matches!(outcome, RowOutcome::SkipRow));
        assert!(sink.calls.lock().unwrap().is_empty());
        assert_eq!(coercer.stats().rows_discarded, 1);
    }

    #[tokio::test]
    async fn test_coercer_ignores_unknown_table() {
        let rules = RuleSet::new(vec![rule(vec![ColumnType::Number])]).unwrap();
        let sink = RecordingSink::default();
        let mut coercer = RowCoercer::new(&rules, &sink);

        let outcome = coercer.handle_row("shop", "audit", raw(&["1"])).await;
        assert!(matches!(outcome, RowOutcome::Continue));
        assert!(sink.calls.lock().unwrap().is_empty());
        assert_eq!(coercer.stats().unknown_tables, 1);
    }

    #[tokio::test]
    async fn test_coercer_absorbs_sink_failure() {
        let rules = RuleSet::new(vec![rule(vec![ColumnType::Number])]).unwrap();
        let sink = RecordingSink::default();
        let mut coercer = RowCoercer::new(&rules, &sink);

        let outcome = coercer.handle_row("shop", "orders", raw(&["99"])).await;
        assert!(matches!(outcome, RowOutcome::Continue));
        let outcome = coercer.handle_row("shop", "orders", raw(&["100"])).await;
        assert!(matches!(outcome, RowOutcome::Continue));

        assert_eq!(
            coercer.stats(),
            CoerceStats {
                rows_synced: 1,
                rows_discarded: 0,
                unknown_tables: 0,
                sync_failures: 1,
            }
        );
    }
}
