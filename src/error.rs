//! Error types for sharewalk
//!
//! - `NavigationError`: a walker could not enter or leave a directory
//! - `EngineError`: a traversal run had to stop
//! - `SnapshotError`: a previously written dump could not be rebuilt
//!
//! Skipped children, truncated listings and pruned recursions are not errors;
//! they are logged and counted in `WalkStats`.

use thiserror::Error;

/// Failure reported by a `Walker` while moving around the remote tree.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// The named child could not be entered; the walker stays where it was.
    #[error("cannot enter '{name}': {reason}")]
    Child { name: String, reason: String },

    /// The walker could not go back up.
    #[error("cannot return to the parent directory: {0}")]
    Parent(String),

    /// I/O error from the underlying backend
    #[error("walker I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a traversal run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Going up failed, so the walker and the engine no longer agree on
    /// where they are.
    #[error("lost position below '{path}': {source}")]
    FatalNavigation {
        path: String,
        #[source]
        source: NavigationError,
    },

    /// Writing output failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected `IdTable` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdTableError {
    #[error("id 0 is reserved")]
    ReservedKey,

    #[error("id {0} is already present")]
    DuplicateKey(u32),

    #[error("table cannot grow beyond 2^{0} slots")]
    Capacity(u32),
}

/// Malformed wire-format line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("empty line")]
    Empty,

    #[error("unknown line type '{0}'")]
    UnknownKind(String),

    #[error("missing {0} field")]
    Missing(&'static str),

    #[error("invalid {field} '{value}'")]
    Invalid { field: &'static str, value: String },
}

/// Errors while rebuilding a tree from a dump.
///
/// No partial tree is ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: LineError,
    },

    #[error("line {line}: {source}")]
    Table {
        line: usize,
        #[source]
        source: IdTableError,
    },

    #[error("line {line}: directory {id} was never declared")]
    UnknownDirectory { line: usize, id: u32 },

    #[error("{0} declared directories were never linked into the tree")]
    Unlinked(usize),

    #[error("snapshot has no root entry")]
    MissingRoot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_navigation_keeps_source() {
        let err = EngineError::FatalNavigation {
            path: "share/a".to_string(),
            source: NavigationError::Parent("connection reset".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("share/a"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_error_mentions_line() {
        let err = SnapshotError::Parse {
            line: 7,
            source: LineError::Missing("size"),
        };
        assert_eq!(err.to_string(), "line 7: missing size field");
    }
}
