//! Position of a walk inside the tree being built or replayed
//!
//! The cursor owns the directories on the path from the walk root to the
//! current directory. Descending moves a child out of its parent's `dirs`
//! into a new frame; ascending puts it back into the same slot, so the
//! parent chain never needs back pointers.

use std::mem;

use crate::entry::Entry;
use crate::wire;

pub struct Frame {
    entry: Entry,
    path: String,
    /// Index of this entry in the parent's `dirs`.
    slot: usize,
    /// Next directory child to try.
    next: usize,
}

impl Frame {
    fn new(entry: Entry, path: String, slot: usize) -> Self {
        Self {
            entry,
            path,
            slot,
            next: 0,
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

pub struct Cursor {
    root: Frame,
    stack: Vec<Frame>,
    root_parent: u32,
}

impl Cursor {
    /// Cursor over a whole tree; the root's path is its own name.
    pub fn new(root: Entry) -> Self {
        let path = root.name.clone();
        Self::with_path(root, path, 0)
    }

    /// Cursor over a subtree whose root sits at `path` inside the directory
    /// with id `root_parent`.
    pub fn with_path(root: Entry, path: String, root_parent: u32) -> Self {
        Self {
            root: Frame::new(root, path, 0),
            stack: Vec::new(),
            root_parent,
        }
    }

    fn top(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn at_root(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn current(&self) -> &Entry {
        &self.top().entry
    }

    pub fn current_mut(&mut self) -> &mut Entry {
        &mut self.top_mut().entry
    }

    pub fn path(&self) -> &str {
        &self.top().path
    }

    pub fn child_path(&self, name: &str) -> String {
        let top = self.top();
        wire::child_path(&top.path, &top.entry.name, name)
    }

    /// Id of the directory containing the walk root.
    pub fn root_parent(&self) -> u32 {
        self.root_parent
    }

    /// Id of the directory containing the current one.
    pub fn parent_id(&self) -> u32 {
        match self.stack.len() {
            0 => self.root_parent,
            1 => self.root.entry.id,
            n => self.stack[n - 2].entry.id,
        }
    }

    /// Slot of the current directory in its parent's `dirs`.
    pub fn slot(&self) -> usize {
        self.top().slot
    }

    /// Frames from the walk root down to the current directory.
    pub fn chain(&self) -> impl DoubleEndedIterator<Item = &Frame> {
        std::iter::once(&self.root).chain(self.stack.iter())
    }

    /// Index of the next directory child not yet tried.
    pub fn next_unvisited(&self) -> Option<usize> {
        let top = self.top();
        (top.next < top.entry.dirs.len()).then_some(top.next)
    }

    /// Give up on the child `next_unvisited` returned.
    pub fn skip(&mut self) {
        self.top_mut().next += 1;
    }

    /// Make the directory child at `index` current.
    pub fn descend(&mut self, index: usize) {
        let path = self.child_path(&self.current().dirs[index].name);
        let parent = self.top_mut();
        parent.next = index + 1;
        let entry = mem::take(&mut parent.entry.dirs[index]);
        self.stack.push(Frame::new(entry, path, index));
    }

    /// Return the current directory to its parent. False at the walk root.
    pub fn ascend(&mut self) -> bool {
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        if let Some(slot) = self.top_mut().entry.dirs.get_mut(frame.slot) {
            *slot = frame.entry;
        }
        true
    }

    /// Unwind to the root and hand back the whole tree.
    pub fn into_root(mut self) -> Entry {
        while self.ascend() {}
        self.root.entry
    }
}
