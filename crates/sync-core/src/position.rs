//! Binlog coordinates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A position in the MySQL binary log: the log file name plus a byte offset.
///
/// Offsets only grow within a single log file, so two positions are ordered
/// only when they name the same file. [`BinlogPosition::has_reached`] also
/// understands file rotation within one binlog sequence
/// (`mysql-bin.000003` follows `mysql-bin.000002`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinlogPosition {
    /// Binlog file name, e.g. `mysql-bin.000003`
    pub name: String,
    /// Byte offset within the file
    pub offset: u64,
}

impl BinlogPosition {
    pub fn new(name: impl Into<String>, offset: u64) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }

    /// Whether this position can be used to resume replication.
    ///
    /// A freshly initialised position has an empty name and a zero offset.
    pub fn is_resumable(&self) -> bool {
        !self.name.is_empty() && self.offset > 0
    }

    /// Whether a consumer sitting at `self` has applied everything up to `target`.
    pub fn has_reached(&self, target: &BinlogPosition) -> bool {
        if self.name == target.name {
            return self.offset >= target.offset;
        }
        match (split_sequence(&self.name), split_sequence(&target.name)) {
            (Some((base, seq)), Some((target_base, target_seq))) => {
                base == target_base && seq > target_seq
            }
            _ => false,
        }
    }
}

/// Split `mysql-bin.000042` into `("mysql-bin", 42)`.
fn split_sequence(name: &str) -> Option<(&str, u64)> {
    let (base, suffix) = name.rsplit_once('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, suffix.parse().ok()?))
}

impl PartialOrd for BinlogPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.name != other.name {
            return None;
        }
        Some(self.offset.cmp(&other.offset))
    }
}

impl fmt::Display for BinlogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.name, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_resumable() {
        assert!(BinlogPosition::new("mysql-bin.000001", 154).is_resumable());
        assert!(!BinlogPosition::new("", 154).is_resumable());
        assert!(!BinlogPosition::new("mysql-bin.000001", 0).is_resumable());
    }

    #[test]
    fn test_ordering_requires_same_file() {
        let a = BinlogPosition::new("mysql-bin.000001", 100);
        let b = BinlogPosition::new("mysql-bin.000001", 200);
        let c = BinlogPosition::new("mysql-bin.000002", 4);

        assert!(a < b);
        assert_eq!(a.partial_cmp(&c), None);
    }

    #[test]
    fn test_has_reached_same_file() {
        let target = BinlogPosition::new("mysql-bin.000001", 500);
        assert!(BinlogPosition::new("mysql-bin.000001", 500).has_reached(&target));
        assert!(BinlogPosition::new("mysql-bin.000001", 501).has_reached(&target));
        assert!(!BinlogPosition::new("mysql-bin.000001", 499).has_reached(&target));
    }

    #[test]
    fn test_has_reached_after_rotation() {
        let target = BinlogPosition::new("mysql-bin.000009", 500);
        assert!(BinlogPosition::new("mysql-bin.000010", 4).has_reached(&target));
        assert!(!BinlogPosition::new("mysql-bin.000008", 9000).has_reached(&target));
        assert!(!BinlogPosition::new("other-bin.000010", 4).has_reached(&target));
        assert!(!BinlogPosition::new("relay", 9000).has_reached(&target));
    }

    #[test]
    fn test_display() {
        let pos = BinlogPosition::new("mysql-bin.000003", 154);
        assert_eq!(pos.to_string(), "(mysql-bin.000003, 154)");
    }
}
