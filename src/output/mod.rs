//! Output policies and the entry points that run them
//!
//! - `full` - two-pass build and path listing
//! - `reverse` - streaming reverse dump
//! - `diff` - patch against a snapshot plus a fresh dump
//! - `replay` - reverse dump of a tree held in memory
//! - `free` - iterative release of a tree held in memory
//! - `json` - JSON rendering of a tree held in memory

mod diff;
mod emit;
mod free;
mod full;
mod json;
mod replay;
mod reverse;

use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use tracing::debug;

use crate::entry::{Entry, IdCounter};
use crate::error::EngineError;
use crate::fingerprint;
use crate::snapshot::Snapshot;
use crate::stats::WalkStats;
use crate::tree::{Cursor, Limits, Traversal, Walker, walk};
use crate::wire::{LineCounts, WireWriter};

pub use diff::DiffPolicy;
pub use free::{FreePolicy, release};
pub use full::{FullPolicy, ListingPolicy};
pub use json::print_json;
pub use replay::ReplayPolicy;
pub use reverse::ReversePolicy;

/// Read the whole share below `root` into memory.
pub fn build_tree(
    walker: &mut dyn Walker,
    root: Entry,
    limits: Limits,
) -> Result<(Entry, WalkStats), EngineError> {
    let mut cx = Cursor::new(root);
    let mut policy = FullPolicy::new(Traversal::new(walker, limits));
    walk(&mut policy, &mut cx)?;
    Ok((cx.into_root(), policy.into_traversal().into_stats()))
}

/// Print a retained tree as `path[/] size` lines, consuming it.
pub fn print_listing<W: Write>(root: Entry, out: &mut W) -> Result<(), EngineError> {
    let mut cx = Cursor::new(root);
    walk(&mut ListingPolicy::new(out), &mut cx)
}

/// Full mode: build the tree, then list it.
pub fn dump_full<W: Write>(
    walker: &mut dyn Walker,
    root: Entry,
    limits: Limits,
    out: &mut W,
) -> Result<WalkStats, EngineError> {
    let (tree, stats) = build_tree(walker, root, limits)?;
    print_listing(tree, out)?;
    Ok(stats)
}

/// Streaming reverse dump of the share below `root`.
pub fn dump_reverse<W: Write>(
    walker: &mut dyn Walker,
    root: Entry,
    limits: Limits,
    out: &mut W,
) -> Result<WalkStats, EngineError> {
    let mut writer = WireWriter::new(out);
    let mut cx = Cursor::new(root);
    let mut policy = ReversePolicy::new(Traversal::new(walker, limits), &mut writer);
    walk(&mut policy, &mut cx)?;
    Ok(policy.into_traversal().into_stats())
}

/// Diff the share below `root` against `previous`.
///
/// Writes the `* <digest>` header naming the previous snapshot (the digest
/// of empty input when there is none), the patch records, and then a plain
/// reverse dump of the live tree, so the whole output can serve as the next
/// run's snapshot. Directories keep their old ids; new ones are numbered
/// above the old maximum.
pub fn dump_diff<W: Write>(
    walker: &mut dyn Walker,
    root: Entry,
    previous: Option<Snapshot>,
    limits: Limits,
    out: &mut W,
) -> Result<WalkStats, EngineError> {
    let (old_root, max_id, digest) = match previous {
        Some(s) => (Some(s.root), s.max_id, s.digest),
        None => (None, 0, fingerprint::digest(b"")),
    };

    let mut patch = WireWriter::new(out);
    patch.header(&digest)?;

    let mut dump = WireWriter::new(BufWriter::new(tempfile::tempfile()?));
    let live = Traversal::with_ids(walker, limits, IdCounter::starting_after(max_id));
    let mut cx = Cursor::new(root);
    let mut policy = DiffPolicy::new(live, old_root, &mut patch, &mut dump);
    walk(&mut policy, &mut cx)?;

    let mut stats = policy.into_traversal().into_stats();
    stats.patch = Some(patch.counts());
    debug!(lines = dump.counts().plain, "appending live dump");

    let mut spool = dump
        .into_inner()
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    spool.seek(SeekFrom::Start(0))?;
    io::copy(&mut spool, patch.get_mut())?;
    Ok(stats)
}

/// Write a retained tree as a plain reverse dump, consuming it.
pub fn replay<W: Write>(root: Entry, out: &mut W) -> Result<LineCounts, EngineError> {
    let mut writer = WireWriter::new(out);
    let mut cx = Cursor::new(root);
    walk(&mut ReplayPolicy::new(&mut writer, None), &mut cx)?;
    Ok(writer.counts())
}
