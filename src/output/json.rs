//! JSON output formatting

use std::io::{self, Write};

use crate::entry::Entry;

/// Write a retained tree as pretty-printed JSON.
pub fn print_json<W: Write>(root: &Entry, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, root)?;
    writeln!(out)
}
