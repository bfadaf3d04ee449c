//! The navigation contract between the engine and a share backend

use crate::entry::Entry;
use crate::error::NavigationError;

/// Direction of a `Walker::go` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Go<'a> {
    Parent,
    Child(&'a str),
}

/// A cursor over a remote tree, positioned in one directory at a time.
///
/// The engine promises to only ask for `Go::Child` with a name the last
/// `readdir` of the current directory returned as a directory, and never to
/// ask for `Go::Parent` at the root. A failed child move leaves the walker
/// where it was.
pub trait Walker {
    /// Next entry of the current directory, `None` once the listing is
    /// exhausted or could not be read. Only `name`, `kind` and `size` are
    /// looked at.
    fn readdir(&mut self) -> Option<Entry>;

    fn go(&mut self, to: Go<'_>) -> Result<(), NavigationError>;
}

/// Whether anything at all can be listed at the walker's position.
pub fn probe(walker: &mut dyn Walker) -> bool {
    walker.readdir().is_some()
}
