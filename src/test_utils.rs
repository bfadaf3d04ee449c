//! In-memory walkers for tests and benchmarks.
//!
//! This module is only compiled for tests and with the `test-utils` feature.

use std::collections::HashMap;

use crate::entry::Entry;
use crate::error::NavigationError;
use crate::tree::{Go, Walker};

/// A node of an in-memory share.
#[derive(Debug, Clone)]
pub enum MemNode {
    Dir {
        name: String,
        children: Vec<MemNode>,
        /// `go(Child)` into this directory fails
        refuse_enter: bool,
        /// `go(Parent)` out of this directory fails
        refuse_leave: bool,
    },
    File {
        name: String,
        size: u64,
    },
}

pub fn dir(name: &str, children: Vec<MemNode>) -> MemNode {
    MemNode::Dir {
        name: name.to_string(),
        children,
        refuse_enter: false,
        refuse_leave: false,
    }
}

pub fn file(name: &str, size: u64) -> MemNode {
    MemNode::File {
        name: name.to_string(),
        size,
    }
}

impl MemNode {
    pub fn name(&self) -> &str {
        match self {
            MemNode::Dir { name, .. } | MemNode::File { name, .. } => name,
        }
    }

    /// Make entering this directory fail.
    pub fn refusing_enter(mut self) -> Self {
        if let MemNode::Dir { refuse_enter, .. } = &mut self {
            *refuse_enter = true;
        }
        self
    }

    /// Make leaving this directory fail.
    pub fn refusing_leave(mut self) -> Self {
        if let MemNode::Dir { refuse_leave, .. } = &mut self {
            *refuse_leave = true;
        }
        self
    }

    fn children(&self) -> &[MemNode] {
        match self {
            MemNode::Dir { children, .. } => children,
            MemNode::File { .. } => &[],
        }
    }

    fn to_entry(&self) -> Entry {
        match self {
            MemNode::Dir { name, .. } => Entry::directory(name.as_str()),
            MemNode::File { name, size } => Entry::file(name.as_str(), *size),
        }
    }

    /// Number of files below this node.
    pub fn file_count(&self) -> usize {
        match self {
            MemNode::File { .. } => 1,
            MemNode::Dir { children, .. } => children.iter().map(MemNode::file_count).sum(),
        }
    }

    /// Number of directories below this node, itself included.
    pub fn dir_count(&self) -> usize {
        match self {
            MemNode::File { .. } => 0,
            MemNode::Dir { children, .. } => {
                1 + children.iter().map(MemNode::dir_count).sum::<usize>()
            }
        }
    }

    /// Sum of all file sizes below this node.
    pub fn total_size(&self) -> u64 {
        match self {
            MemNode::File { size, .. } => *size,
            MemNode::Dir { children, .. } => children.iter().map(MemNode::total_size).sum(),
        }
    }
}

/// `Walker` over a `MemNode` tree that records how it was driven.
pub struct MemWalker {
    root: MemNode,
    /// Child indices from the root to the current directory.
    position: Vec<usize>,
    listing: Option<std::vec::IntoIter<Entry>>,
    readdirs: HashMap<String, usize>,
}

impl MemWalker {
    pub fn new(root: MemNode) -> Self {
        Self {
            root,
            position: Vec::new(),
            listing: None,
            readdirs: HashMap::new(),
        }
    }

    /// Root entry to start a walk with.
    pub fn root_entry(&self) -> Entry {
        Entry::root(self.root.name())
    }

    fn current(&self) -> &MemNode {
        self.position
            .iter()
            .fold(&self.root, |node, &i| &node.children()[i])
    }

    fn current_path(&self) -> String {
        let mut node = &self.root;
        let mut parts = vec![node.name()];
        for &i in &self.position {
            node = &node.children()[i];
            parts.push(node.name());
        }
        parts.join("/")
    }

    /// How often the listing of `path` (names joined by `/`, root first)
    /// was started.
    pub fn readdir_count(&self, path: &str) -> usize {
        self.readdirs.get(path).copied().unwrap_or(0)
    }

    pub fn max_readdir_count(&self) -> usize {
        self.readdirs.values().copied().max().unwrap_or(0)
    }

    /// Number of distinct directories listed.
    pub fn listed_dirs(&self) -> usize {
        self.readdirs.len()
    }

    pub fn depth(&self) -> usize {
        self.position.len()
    }
}

impl Walker for MemWalker {
    fn readdir(&mut self) -> Option<Entry> {
        if self.listing.is_none() {
            let path = self.current_path();
            *self.readdirs.entry(path).or_insert(0) += 1;
            let entries: Vec<Entry> = self
                .current()
                .children()
                .iter()
                .map(MemNode::to_entry)
                .collect();
            self.listing = Some(entries.into_iter());
        }
        self.listing.as_mut()?.next()
    }

    fn go(&mut self, to: Go<'_>) -> Result<(), NavigationError> {
        match to {
            Go::Child(name) => {
                let found = self
                    .current()
                    .children()
                    .iter()
                    .enumerate()
                    .find(|(_, c)| matches!(c, MemNode::Dir { .. }) && c.name() == name)
                    .map(|(i, c)| (i, matches!(c, MemNode::Dir { refuse_enter: true, .. })));
                match found {
                    Some((_, true)) => {
                        return Err(NavigationError::Child {
                            name: name.to_string(),
                            reason: "permission denied".to_string(),
                        });
                    }
                    Some((i, false)) => self.position.push(i),
                    None => {
                        return Err(NavigationError::Child {
                            name: name.to_string(),
                            reason: "no such directory".to_string(),
                        });
                    }
                }
            }
            Go::Parent => {
                if let MemNode::Dir {
                    refuse_leave: true, ..
                } = self.current()
                {
                    return Err(NavigationError::Parent("connection lost".to_string()));
                }
                if self.position.pop().is_none() {
                    return Err(NavigationError::Parent("already at root".to_string()));
                }
            }
        }
        self.listing = None;
        Ok(())
    }
}

/// A share whose every directory contains itself: one subdirectory named
/// `again` and one file, forever.
#[derive(Default)]
pub struct LoopWalker {
    depth: usize,
    max_depth: usize,
    served: usize,
}

impl LoopWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deepest level the engine descended to.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Walker for LoopWalker {
    fn readdir(&mut self) -> Option<Entry> {
        let entry = match self.served {
            0 => Entry::directory("again"),
            1 => Entry::file("data", 1),
            _ => return None,
        };
        self.served += 1;
        Some(entry)
    }

    fn go(&mut self, to: Go<'_>) -> Result<(), NavigationError> {
        match to {
            Go::Child(_) => {
                self.depth += 1;
                self.max_depth = self.max_depth.max(self.depth);
            }
            Go::Parent => {
                if self.depth == 0 {
                    return Err(NavigationError::Parent("already at root".to_string()));
                }
                self.depth -= 1;
            }
        }
        self.served = 0;
        Ok(())
    }
}
