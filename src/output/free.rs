//! Iterative release of a retained tree
//!
//! Dropping a deep `Entry` directly recurses once per level. Walking it and
//! emptying each directory on the way out keeps the stack flat instead.

use crate::entry::Entry;
use crate::error::EngineError;
use crate::tree::{Cursor, OutputPolicy, walk};

/// Walks a retained tree and emits nothing.
pub struct FreePolicy;

impl OutputPolicy for FreePolicy {
    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        cx.current_mut().files.clear();
        Ok(())
    }

    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        cx.current_mut().dirs.clear();
        Ok(())
    }

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        let d = cx.current_mut();
        d.dirs.clear();
        d.files.clear();
        Ok(())
    }
}

/// Drop `root` and everything below it without deep recursion.
pub fn release(root: Entry) {
    let mut cx = Cursor::new(root);
    // the hooks only clear vectors
    let _ = walk(&mut FreePolicy, &mut cx);
}
