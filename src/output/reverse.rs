//! Streaming reverse dump of a live walk
//!
//! Memory stays proportional to the depth of the walk times the width of
//! the directories on the current path: files are written and dropped as
//! soon as their directory is read, subdirectories as soon as their parent
//! is left.

use std::io::Write;

use crate::error::EngineError;
use crate::tree::{Cursor, OutputPolicy, Traversal};
use crate::wire::WireWriter;

use super::emit;

pub struct ReversePolicy<'a, 'w, W: Write> {
    live: Traversal<'w>,
    out: &'a mut WireWriter<W>,
}

impl<'a, 'w, W: Write> ReversePolicy<'a, 'w, W> {
    pub fn new(live: Traversal<'w>, out: &'a mut WireWriter<W>) -> Self {
        Self { live, out }
    }

    pub fn into_traversal(self) -> Traversal<'w> {
        self.live
    }

    fn enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.read_dir(cx);
        emit::declare_dirs(self.out, None, cx)?;
        emit::emit_files(self.out, None, cx)?;
        Ok(())
    }

    fn leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.aggregate(cx);
        emit::emit_dirs(self.out, None, cx)?;
        Ok(())
    }
}

impl<W: Write> OutputPolicy for ReversePolicy<'_, '_, W> {
    fn on_enter_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        emit::declare_root(self.out, None, cx)?;
        self.enter(cx)
    }

    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.enter(cx)
    }

    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.leave(cx)
    }

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.leave(cx)?;
        emit::emit_root(self.out, None, cx)?;
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
