//! Streaming parser for mysqldump output.
//!
//! The parser understands the handful of line shapes a
//! `--compact --no-create-info --master-data` dump consists of:
//!
//! ```text
//! CHANGE MASTER TO MASTER_LOG_FILE='mysql-bin.000003', MASTER_LOG_POS=154;
//! USE `shop`;
//! INSERT INTO `orders` VALUES (1,'first',NULL);
//! INSERT INTO `orders` VALUES (2,'second',1.5),(3,'third',NULL);
//! ```
//!
//! Every other line is ignored. Rows are handed to a [`RowHandler`] one at a
//! time and in order; the parser does not read ahead while the handler works.

use async_trait::async_trait;
use regex::bytes::Regex;
use std::sync::LazyLock;
use sync_core::BinlogPosition;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

static BINLOG_EXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)^(?:-- )?CHANGE (?:MASTER|REPLICATION SOURCE) TO (?:MASTER|SOURCE)_LOG_FILE='([^']+)', (?:MASTER|SOURCE)_LOG_POS=(\d+);",
    )
    .expect("valid binlog regex")
});

static USE_EXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^USE `(.+)`;").expect("valid USE regex"));

// Byte-oriented (`-u`) so names and fields outside UTF-8 still match.
static INSERT_EXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s-u)^INSERT INTO `(.+?)` VALUES (.+);$").expect("valid INSERT regex")
});

/// What the parser should do after a row was handled.
#[derive(Debug)]
pub enum RowOutcome {
    /// Row accepted (or deliberately ignored); keep going
    Continue,
    /// Row could not be used; count it and keep going
    SkipRow,
    /// Abort the parse
    Fatal(anyhow::Error),
}

/// Receives snapshot rows from [`parse_dump`].
#[async_trait]
pub trait RowHandler: Send {
    /// Handle one row of `database.table`. Fields are the raw bytes of SQL
    /// literals: `NULL`, a quoted string with its quotes, or a bare literal.
    /// They are passed on as dumped, so they need not be valid UTF-8.
    async fn handle_row(&mut self, database: &str, table: &str, values: Vec<Vec<u8>>)
        -> RowOutcome;
}

/// Everything the parser learned from one pass over a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    /// Binlog position from the last `CHANGE MASTER TO` line
    pub position: Option<BinlogPosition>,
    /// Rows handed to the handler
    pub rows_seen: u64,
    /// Rows the handler asked to skip
    pub rows_skipped: u64,
}

/// Fatal parse failures. A skipped row is not one of these.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot at line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("Row handler failed at line {line}: {source}")]
    Handler {
        line: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// Parse a snapshot, invoking `handler` for every row.
pub async fn parse_dump<R, H>(mut reader: R, handler: &mut H) -> Result<DumpSummary, ParseError>
where
    R: AsyncBufRead + Unpin,
    H: RowHandler + ?Sized,
{
    let mut summary = DumpSummary::default();
    let mut database = String::new();
    let mut buf = Vec::new();
    let mut line_no: u64 = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let malformed = |reason: String| ParseError::Malformed {
            line: line_no,
            reason,
        };

        if let Some(caps) = BINLOG_EXP.captures(line) {
            let name = identifier(&caps[1]).map_err(malformed)?;
            let offset = identifier(&caps[2])
                .map_err(malformed)?
                .parse::<u64>()
                .map_err(|e| malformed(format!("bad binlog offset: {e}")))?;
            summary.position = Some(BinlogPosition::new(name, offset));
            continue;
        }

        if let Some(caps) = USE_EXP.captures(line) {
            database = identifier(&caps[1]).map_err(malformed)?.to_string();
            continue;
        }

        let Some(caps) = INSERT_EXP.captures(line) else {
            continue;
        };
        let table = identifier(&caps[1]).map_err(malformed)?.to_string();
        let rows = parse_tuples(&caps[2]).map_err(malformed)?;

        for values in rows {
            summary.rows_seen += 1;
            match handler.handle_row(&database, &table, values).await {
                RowOutcome::Continue => {}
                RowOutcome::SkipRow => summary.rows_skipped += 1,
                RowOutcome::Fatal(source) => {
                    return Err(ParseError::Handler {
                        line: line_no,
                        source,
                    })
                }
            }
        }
    }

    Ok(summary)
}

/// Database, table and binlog names must be UTF-8; only field values may not be.
fn identifier(raw: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(raw).map_err(|e| format!("identifier is not valid UTF-8: {e}"))
}

/// Split `(a,'b,c'),(d,NULL)` into rows of raw field literals.
///
/// Quoted fields keep their quotes and escapes; splitting honours backslash
/// escapes and doubled quotes inside them. Delimiters are ASCII, so bytes of
/// any character set pass through unchanged.
fn parse_tuples(body: &[u8]) -> Result<Vec<Vec<Vec<u8>>>, String> {
    let mut rows = Vec::new();
    let mut bytes = body.iter().copied().enumerate().peekable();

    loop {
        match bytes.next() {
            Some((_, b'(')) => {}
            other => {
                return Err(format!(
                    "expected '(' but found {:?}",
                    other.map(|(_, b)| b as char)
                ))
            }
        }
        if let Some(&(_, b')')) = bytes.peek() {
            return Err("empty row".to_string());
        }

        let mut fields = Vec::new();
        loop {
            let start = match bytes.peek() {
                Some(&(i, _)) => i,
                None => return Err("unterminated row".to_string()),
            };
            let end;

            if let Some(&(_, b'\'')) = bytes.peek() {
                bytes.next();
                loop {
                    match bytes.next() {
                        Some((_, b'\\')) => {
                            if bytes.next().is_none() {
                                return Err("unterminated string literal".to_string());
                            }
                        }
                        Some((i, b'\'')) => {
                            if let Some(&(_, b'\'')) = bytes.peek() {
                                bytes.next();
                                continue;
                            }
                            end = i + 1;
                            break;
                        }
                        Some(_) => {}
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
            } else {
                loop {
                    match bytes.peek() {
                        Some(&(i, b',')) | Some(&(i, b')')) => {
                            end = i;
                            break;
                        }
                        Some(_) => {
                            bytes.next();
                        }
                        None => return Err("unterminated row".to_string()),
                    }
                }
            }

            fields.push(body[start..end].trim_ascii().to_vec());

            match bytes.next() {
                Some((_, b',')) => {}
                Some((_, b')')) => break,
                Some((_, b)) => return Err(format!("unexpected '{}' after field", b as char)),
                None => return Err("unterminated row".to_string()),
            }
        }
        rows.push(fields);

        match bytes.next() {
            None => return Ok(rows),
            Some((_, b',')) => {}
            Some((_, b)) => return Err(format!("unexpected '{}' between rows", b as char)),
        }
    }
}
