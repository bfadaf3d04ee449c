//! Reverse dump of a tree already in memory
//!
//! Emits exactly what the streaming policy would have written for the same
//! tree, optionally with every line marked. The tree is consumed.

use std::io::Write;

use crate::error::EngineError;
use crate::tree::{Cursor, OutputPolicy};
use crate::wire::{Marker, WireWriter};

use super::emit;

pub struct ReplayPolicy<'a, W: Write> {
    out: &'a mut WireWriter<W>,
    marker: Option<Marker>,
}

impl<'a, W: Write> ReplayPolicy<'a, W> {
    pub fn new(out: &'a mut WireWriter<W>, marker: Option<Marker>) -> Self {
        Self { out, marker }
    }

    fn enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        emit::declare_dirs(self.out, self.marker, cx)?;
        emit::emit_files(self.out, self.marker, cx)?;
        Ok(())
    }
}

impl<W: Write> OutputPolicy for ReplayPolicy<'_, W> {
    fn on_enter_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        emit::declare_root(self.out, self.marker, cx)?;
        self.enter(cx)
    }

    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.enter(cx)
    }

    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        emit::emit_dirs(self.out, self.marker, cx)?;
        Ok(())
    }

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        emit::emit_dirs(self.out, self.marker, cx)?;
        emit::emit_root(self.out, self.marker, cx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::tree::walk;

    #[test]
    fn test_removed_subtree_lines() {
        let mut old = Entry {
            id: 5,
            fid: 1,
            size: 3,
            items: 1,
            ..Entry::directory("gone")
        };
        old.files.push(Entry::file("f", 3));

        let mut out = WireWriter::new(Vec::new());
        let mut cx = Cursor::with_path(old, "share/gone".to_string(), 1);
        walk(&mut ReplayPolicy::new(&mut out, Some(Marker::Removed)), &mut cx).unwrap();

        assert_eq!(out.counts().removed, 3);
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(
            text,
            "- 0 5 share/gone\n- 1 5 0 3 0 0 f\n- 1 1 1 3 5 1 gone\n"
        );
    }
}
