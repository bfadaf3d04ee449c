//! Configuration types for the walk engine

/// Caps applied while building a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Highest directory id, counted from the root, whose listing is read;
    /// directories numbered after it are left empty.
    pub max_dirs: u64,
    /// Entries kept per directory listing.
    pub max_items_in_dir: usize,
    /// Summed child count a repeating ancestor chain must reach before it
    /// is treated as recursion.
    pub recursion_threshold: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dirs: 1 << 20,
            max_items_in_dir: 1 << 18,
            recursion_threshold: 5,
        }
    }
}
