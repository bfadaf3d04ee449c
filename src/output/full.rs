//! Two-pass full listing
//!
//! The first pass reads the whole share into memory; the second walks the
//! retained tree and prints one `path size` line per node, directories with
//! a trailing `/`, dropping nodes as they are printed.

use std::io::Write;

use crate::error::EngineError;
use crate::tree::{Cursor, OutputPolicy, Traversal};

/// Pass 1: build and keep the complete tree.
pub struct FullPolicy<'w> {
    live: Traversal<'w>,
}

impl<'w> FullPolicy<'w> {
    pub fn new(live: Traversal<'w>) -> Self {
        Self { live }
    }

    pub fn into_traversal(self) -> Traversal<'w> {
        self.live
    }
}

impl OutputPolicy for FullPolicy<'_> {
    fn on_enter_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.read_dir(cx);
        Ok(())
    }

    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.read_dir(cx);
        Ok(())
    }

    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.aggregate(cx);
        Ok(())
    }

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.aggregate(cx);
        Ok(())
    }

    fn go_child(&mut self, cx: &mut Cursor) -> Result<bool, EngineError> {
        Ok(self.live.go_child(cx))
    }

    fn go_sibling_or_parent(&mut self, cx: &mut Cursor) -> Result<bool, EngineError> {
        self.live.go_parent(cx)?;
        Ok(self.live.go_child(cx))
    }
}

/// Pass 2: print the retained tree.
pub struct ListingPolicy<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> ListingPolicy<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }

    /// Directory children with a trailing `/`, then files; files are
    /// dropped right away.
    fn print_children(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        for dir in &cx.current().dirs {
            writeln!(self.out, "{}/ {}", cx.child_path(&dir.name), dir.size)?;
        }
        for file in &cx.current().files {
            writeln!(self.out, "{} {}", cx.child_path(&file.name), file.size)?;
        }
        cx.current_mut().files.clear();
        Ok(())
    }
}

impl<W: Write> OutputPolicy for ListingPolicy<'_, W> {
    fn on_enter_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        writeln!(self.out, "{} {}", cx.path(), cx.current().size)?;
        self.print_children(cx)
    }

    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.print_children(cx)
    }

    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        cx.current_mut().dirs.clear();
        Ok(())
    }

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        cx.current_mut().dirs.clear();
        Ok(())
    }
}
