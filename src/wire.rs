//! Line-oriented dump format
//!
//! ```text
//! 0 <id> <full-path>
//! 1 <parentDirId> <fid> <size> <dirIdOrZero> <itemCountOrZero> <name>
//! ```
//!
//! Either form may be prefixed by a diff marker (`+ `, `- `, `* `). A bare
//! `* <hex>` line heads every diff output and carries the digest of the
//! snapshot it was computed against.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde::Serialize;

use crate::entry::Entry;
use crate::error::LineError;
use crate::fingerprint::Digest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Added,
    Removed,
    Changed,
}

impl Marker {
    pub fn symbol(self) -> char {
        match self {
            Marker::Added => '+',
            Marker::Removed => '-',
            Marker::Changed => '*',
        }
    }
}

/// The diff marker a line starts with, if any.
pub fn marker_of(text: &str) -> Option<Marker> {
    let mut chars = text.chars();
    let marker = match chars.next()? {
        '+' => Marker::Added,
        '-' => Marker::Removed,
        '*' => Marker::Changed,
        _ => return None,
    };
    (chars.next() == Some(' ')).then_some(marker)
}

/// Full path of `child` below a directory at `parent_path` named `parent_name`.
///
/// Ancestors are joined with `/`, except that no separator follows a parent
/// with an empty name.
pub fn child_path(parent_path: &str, parent_name: &str, child: &str) -> String {
    if parent_name.is_empty() {
        format!("{}{}", parent_path, child)
    } else {
        format!("{}/{}", parent_path, child)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<'a> {
    Directory {
        id: u32,
        path: &'a str,
    },
    Entry {
        parent: u32,
        fid: u32,
        size: u64,
        dir_id: u32,
        items: u32,
        name: &'a str,
    },
}

/// One parsed line, without its terminating newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub marker: Option<Marker>,
    pub record: Record<'a>,
}

impl<'a> Line<'a> {
    pub fn parse(text: &'a str) -> Result<Self, LineError> {
        if text.is_empty() {
            return Err(LineError::Empty);
        }

        let marker = marker_of(text);
        let body = if marker.is_some() { &text[2..] } else { text };

        let kind = body.split(' ').next().unwrap_or_default();
        let record = match kind {
            "0" => {
                let mut fields = body.splitn(3, ' ').skip(1);
                let id = field(fields.next(), "id")?;
                let path = fields.next().unwrap_or_default();
                Record::Directory { id, path }
            }
            "1" => {
                let mut fields = body.splitn(7, ' ').skip(1);
                let parent = field(fields.next(), "parent")?;
                let fid = field(fields.next(), "fid")?;
                let size = field(fields.next(), "size")?;
                let dir_id = field(fields.next(), "dir id")?;
                let items = field(fields.next(), "items")?;
                let name = fields.next().ok_or(LineError::Missing("name"))?;
                Record::Entry {
                    parent,
                    fid,
                    size,
                    dir_id,
                    items,
                    name,
                }
            }
            other => return Err(LineError::UnknownKind(other.to_string())),
        };

        Ok(Self { marker, record })
    }
}

fn field<T: FromStr>(raw: Option<&str>, name: &'static str) -> Result<T, LineError> {
    let raw = raw.ok_or(LineError::Missing(name))?;
    raw.parse().map_err(|_| LineError::Invalid {
        field: name,
        value: raw.to_string(),
    })
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(marker) = self.marker {
            write!(f, "{} ", marker.symbol())?;
        }
        match self.record {
            Record::Directory { id, path } => write!(f, "0 {} {}", id, path),
            Record::Entry {
                parent,
                fid,
                size,
                dir_id,
                items,
                name,
            } => write!(
                f,
                "1 {} {} {} {} {} {}",
                parent, fid, size, dir_id, items, name
            ),
        }
    }
}

/// Lines written so far, by marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub plain: u64,
    pub added: u64,
    pub removed: u64,
    pub changed: u64,
}

impl LineCounts {
    fn record(&mut self, marker: Option<Marker>) {
        match marker {
            None => self.plain += 1,
            Some(Marker::Added) => self.added += 1,
            Some(Marker::Removed) => self.removed += 1,
            Some(Marker::Changed) => self.changed += 1,
        }
    }

    /// Marked records only.
    pub fn patch_records(&self) -> u64 {
        self.added + self.removed + self.changed
    }
}

/// Writes dump lines and keeps per-marker counts.
pub struct WireWriter<W: Write> {
    out: W,
    counts: LineCounts,
}

impl<W: Write> WireWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            counts: LineCounts::default(),
        }
    }

    pub fn directory(&mut self, marker: Option<Marker>, id: u32, path: &str) -> io::Result<()> {
        let line = Line {
            marker,
            record: Record::Directory { id, path },
        };
        self.write_line(&line)
    }

    /// Entry line for `entry` inside the directory `parent`.
    pub fn entry(&mut self, marker: Option<Marker>, parent: u32, entry: &Entry) -> io::Result<()> {
        let line = Line {
            marker,
            record: Record::Entry {
                parent,
                fid: entry.fid,
                size: entry.size,
                dir_id: entry.id,
                items: entry.items,
                name: &entry.name,
            },
        };
        self.write_line(&line)
    }

    /// Diff header naming the snapshot the patch applies to.
    pub fn header(&mut self, digest: &Digest) -> io::Result<()> {
        writeln!(self.out, "{} {}", Marker::Changed.symbol(), digest)
    }

    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.counts.record(line.marker);
        Ok(())
    }

    pub fn counts(&self) -> LineCounts {
        self.counts
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
