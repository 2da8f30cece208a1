//! MySQL column metadata discovery
//!
//! Rules may leave out their column types; they are filled in from
//! `INFORMATION_SCHEMA.COLUMNS` before the bootstrap starts.

use anyhow::Context;
use mysql_async::prelude::*;
use sync_core::{ColumnType, SyncRule};
use tracing::{debug, info};

/// Map a MySQL `DATA_TYPE` to the column type used for snapshot coercion.
pub fn mysql_column_type(data_type: &str) -> ColumnType {
    match data_type.to_lowercase().as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
            ColumnType::Number
        }
        "float" | "double" | "real" | "decimal" | "numeric" => ColumnType::Float,
        _ => ColumnType::Other,
    }
}

/// Fill in column types and names for every rule that declares none.
///
/// Columns are listed in table order (`ORDINAL_POSITION`), which is the field
/// order of the snapshot's `INSERT` rows.
pub async fn collect_rule_columns(
    conn: &mut mysql_async::Conn,
    rules: &mut [SyncRule],
) -> anyhow::Result<()> {
    let query = "
        SELECT COLUMN_NAME, DATA_TYPE
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION";

    for rule in rules.iter_mut().filter(|r| r.needs_columns()) {
        let columns: Vec<(String, String)> = conn
            .exec(query, (rule.database.as_str(), rule.table.as_str()))
            .await
            .with_context(|| format!("Failed to read columns of {}", rule.key()))?;

        if columns.is_empty() {
            anyhow::bail!("Table {} not found in MySQL", rule.key());
        }

        let (names, types): (Vec<String>, Vec<ColumnType>) = columns
            .into_iter()
            .map(|(name, data_type)| {
                let column_type = mysql_column_type(&data_type);
                debug!("{}.{name}: {data_type} -> {column_type}", rule.key());
                (name, column_type)
            })
            .unzip();

        info!("Discovered {} columns for {}", types.len(), rule.key());
        rule.columns = types;
        rule.column_names = names;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_types_are_numbers() {
        for data_type in ["tinyint", "SMALLINT", "mediumint", "int", "bigint", "year"] {
            assert_eq!(mysql_column_type(data_type), ColumnType::Number, "{data_type}");
        }
    }

    #[test]
    fn test_fractional_types_are_floats() {
        for data_type in ["float", "double", "decimal", "DECIMAL"] {
            assert_eq!(mysql_column_type(data_type), ColumnType::Float, "{data_type}");
        }
    }

    #[test]
    fn test_other_types() {
        for data_type in ["varchar", "text", "datetime", "json", "blob", "enum", "bit"] {
            assert_eq!(mysql_column_type(data_type), ColumnType::Other, "{data_type}");
        }
    }
}
