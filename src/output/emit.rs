//! Reverse dump emission shared by the streaming, replay and diff policies
//!
//! A directory is declared (`0` line) when its parent is entered, its files
//! are written when it is entered itself, and its own entry line follows
//! once its parent is left. A reader therefore always sees a directory's
//! declaration before anything that refers to it.

use std::io::{self, Write};

use crate::tree::Cursor;
use crate::wire::{Marker, WireWriter};

/// Declare the walk root.
pub fn declare_root<W: Write>(
    out: &mut WireWriter<W>,
    marker: Option<Marker>,
    cx: &Cursor,
) -> io::Result<()> {
    out.directory(marker, cx.current().id, cx.path())
}

/// Declare every directory child of the current directory.
pub fn declare_dirs<W: Write>(
    out: &mut WireWriter<W>,
    marker: Option<Marker>,
    cx: &Cursor,
) -> io::Result<()> {
    for dir in &cx.current().dirs {
        out.directory(marker, dir.id, &cx.child_path(&dir.name))?;
    }
    Ok(())
}

/// Write and drop the file children of the current directory.
pub fn emit_files<W: Write>(
    out: &mut WireWriter<W>,
    marker: Option<Marker>,
    cx: &mut Cursor,
) -> io::Result<()> {
    let d = cx.current_mut();
    for file in d.files.drain(..) {
        out.entry(marker, d.id, &file)?;
    }
    Ok(())
}

/// Write and drop the directory children of the current directory.
pub fn emit_dirs<W: Write>(
    out: &mut WireWriter<W>,
    marker: Option<Marker>,
    cx: &mut Cursor,
) -> io::Result<()> {
    let d = cx.current_mut();
    for dir in d.dirs.drain(..) {
        out.entry(marker, d.id, &dir)?;
    }
    Ok(())
}

/// Entry line of the walk root itself.
pub fn emit_root<W: Write>(
    out: &mut WireWriter<W>,
    marker: Option<Marker>,
    cx: &Cursor,
) -> io::Result<()> {
    out.entry(marker, cx.root_parent(), cx.current())
}
