//! Sharewalk - walks shared directory trees and emits replayable dumps
//!
//! The engine reads a tree through a `Walker`, aggregates directory sizes
//! bottom-up and hands every node to an output policy: a path listing, a
//! streaming reverse dump, or a patch against a previous dump.

pub mod entry;
pub mod error;
pub mod fingerprint;
pub mod idtable;
pub mod logging;
pub mod output;
pub mod snapshot;
pub mod stats;
pub mod tree;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use entry::{Entry, EntryKind, IdCounter};
pub use error::{EngineError, IdTableError, LineError, NavigationError, SnapshotError};
pub use fingerprint::{Digest, Fingerprint};
pub use idtable::IdTable;
pub use output::{
    build_tree, dump_diff, dump_full, dump_reverse, print_json, print_listing, release, replay,
};
pub use snapshot::{Snapshot, load_previous};
pub use stats::{WalkStats, print_stats, print_stats_json};
pub use tree::{Cursor, Go, Limits, LocalConfig, LocalWalker, OutputPolicy, Walker, probe, walk};
pub use wire::{LineCounts, Marker, WireWriter};
