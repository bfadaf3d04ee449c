//! The depth-first loop every output policy runs through.

use crate::error::EngineError;

use super::cursor::Cursor;

/// Per-node behaviour plugged into `walk`.
///
/// The navigation hooks default to walking a tree that is already in
/// memory; policies driving a live `Walker` override them.
pub trait OutputPolicy {
    fn on_enter_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        let _ = cx;
        Ok(())
    }

    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError>;

    /// Called once every directory child of the current directory has been
    /// left, before moving up.
    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError>;

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        let _ = cx;
        Ok(())
    }

    /// Enter the next directory child, if there is one left.
    fn go_child(&mut self, cx: &mut Cursor) -> Result<bool, EngineError> {
        match cx.next_unvisited() {
            Some(index) => {
                cx.descend(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Leave the current directory and enter its next sibling. Returns false
    /// when the parent has no children left, with the parent current.
    fn go_sibling_or_parent(&mut self, cx: &mut Cursor) -> Result<bool, EngineError> {
        cx.ascend();
        self.go_child(cx)
    }
}

/// Run `policy` over the tree below the cursor's root.
///
/// Enter hooks fire in pre-order, leave hooks in post-order. The walk ends
/// when the root has no directory children left.
pub fn walk<P: OutputPolicy + ?Sized>(policy: &mut P, cx: &mut Cursor) -> Result<(), EngineError> {
    policy.on_enter_root(cx)?;

    let mut entered = policy.go_child(cx)?;
    loop {
        if entered {
            policy.on_enter(cx)?;
            entered = policy.go_child(cx)?;
            continue;
        }
        if cx.at_root() {
            break;
        }
        policy.on_leave(cx)?;
        entered = policy.go_sibling_or_parent(cx)?;
    }

    policy.on_leave_root(cx)
}
