//! Rebuilding a tree from a reverse dump
//!
//! A `0` line creates an empty placeholder for a directory id. Entry lines
//! for files are appended to their parent's placeholder; an entry line for
//! a directory takes that directory's placeholder out of the table, fills
//! it in and appends it to its own parent. The root's entry line (parent 0)
//! fills its placeholder in place, so after a complete dump exactly one
//! placeholder, the root, remains.
//!
//! Marked lines (`+`, `-`, `*`) are skipped, which makes a diff output a
//! valid snapshot as well.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::entry::{Entry, EntryKind};
use crate::error::{LineError, SnapshotError};
use crate::fingerprint::{Digest, Fingerprint};
use crate::idtable::IdTable;
use crate::wire::{self, Line, Record};

/// A tree read back from a dump.
#[derive(Debug)]
pub struct Snapshot {
    pub root: Entry,
    /// Highest directory id in the dump.
    pub max_id: u32,
    /// Fingerprint of the raw dump bytes.
    pub digest: Digest,
}

impl Snapshot {
    pub fn read<R: BufRead>(mut reader: R) -> Result<Self, SnapshotError> {
        let mut table: IdTable<Entry> = IdTable::new();
        let mut fp = Fingerprint::new();
        let mut max_id = 0u32;
        let mut root_id = None;
        let mut raw = Vec::new();
        let mut line_no = 0usize;

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            line_no += 1;
            fp.update(&raw);

            let text = std::str::from_utf8(&raw).map_err(|_| SnapshotError::Parse {
                line: line_no,
                source: LineError::Invalid {
                    field: "line",
                    value: String::from_utf8_lossy(&raw).trim_end().to_string(),
                },
            })?;
            let text = text.strip_suffix('\n').unwrap_or(text);
            if wire::marker_of(text).is_some() {
                continue;
            }

            let line = Line::parse(text).map_err(|source| SnapshotError::Parse {
                line: line_no,
                source,
            })?;

            match line.record {
                Record::Directory { id, .. } => {
                    table
                        .insert(id, Entry::directory(""))
                        .map_err(|source| SnapshotError::Table {
                            line: line_no,
                            source,
                        })?;
                    max_id = max_id.max(id);
                }
                Record::Entry {
                    parent,
                    fid,
                    size,
                    dir_id,
                    items,
                    name,
                } if dir_id != 0 => {
                    max_id = max_id.max(dir_id);
                    if parent == 0 {
                        if root_id.is_some() {
                            return Err(SnapshotError::Parse {
                                line: line_no,
                                source: LineError::Invalid {
                                    field: "parent",
                                    value: "0".to_string(),
                                },
                            });
                        }
                        let root = table.get_mut(dir_id).ok_or(SnapshotError::UnknownDirectory {
                            line: line_no,
                            id: dir_id,
                        })?;
                        fill(root, name, fid, size, dir_id, items);
                        root_id = Some(dir_id);
                    } else {
                        let mut dir = table.remove(dir_id).ok_or(SnapshotError::UnknownDirectory {
                            line: line_no,
                            id: dir_id,
                        })?;
                        fill(&mut dir, name, fid, size, dir_id, items);
                        table
                            .get_mut(parent)
                            .ok_or(SnapshotError::UnknownDirectory {
                                line: line_no,
                                id: parent,
                            })?
                            .dirs
                            .push(dir);
                    }
                }
                Record::Entry {
                    parent,
                    fid,
                    size,
                    name,
                    ..
                } => {
                    let file = Entry {
                        fid,
                        ..Entry::file(name, size)
                    };
                    table
                        .get_mut(parent)
                        .ok_or(SnapshotError::UnknownDirectory {
                            line: line_no,
                            id: parent,
                        })?
                        .files
                        .push(file);
                }
            }
        }

        let root_id = root_id.ok_or(SnapshotError::MissingRoot)?;
        if table.len() > 1 {
            return Err(SnapshotError::Unlinked(table.len() - 1));
        }
        let root = table.remove(root_id).ok_or(SnapshotError::MissingRoot)?;

        debug!(lines = line_no, max_id, "snapshot read");
        Ok(Self {
            root,
            max_id,
            digest: fp.finish(),
        })
    }

    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        Self::read(BufReader::new(File::open(path)?))
    }
}

/// Complete a directory placeholder from its entry line.
fn fill(dir: &mut Entry, name: &str, fid: u32, size: u64, id: u32, items: u32) {
    dir.name = name.to_string();
    dir.kind = EntryKind::Directory;
    dir.fid = fid;
    dir.size = size;
    dir.id = id;
    dir.items = items;
    dir.dirs.sort_by(|a, b| a.name.cmp(&b.name));
    dir.files.sort_by(|a, b| a.name.cmp(&b.name));
}

/// The snapshot at `path`, or `None` when the file is missing or empty.
pub fn load_previous(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => {
            info!(path = %path.display(), "previous snapshot is empty");
            Ok(None)
        }
        Ok(_) => Snapshot::open(path).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no previous snapshot");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
