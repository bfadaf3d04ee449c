//! Tree node model shared by the walk engine, the policies and the snapshot reader

use serde::Serialize;

use crate::fingerprint::{Digest, Fingerprint};

/// Id of the root directory in every tree.
pub const ROOT_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    #[default]
    File,
}

/// A directory or a file.
///
/// Directory `size` and `items` only hold their final values once the
/// directory has been left by the walk. Children are kept in two partitions,
/// each sorted by name: `dirs` take fids `0..dirs.len()`, `files` continue
/// after them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub id: u32,
    pub fid: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub items: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<Entry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Entry>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            ..Default::default()
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            ..Default::default()
        }
    }

    /// The root of a walk: id 1, fid 0.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: ROOT_ID,
            ..Self::directory(name)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Sort both partitions by name and number them.
    ///
    /// Directory children take fresh ids from `ids` in name order. `items`
    /// becomes the number of direct children.
    pub fn order_children(&mut self, ids: &mut IdCounter) {
        self.dirs.sort_by(|a, b| a.name.cmp(&b.name));
        self.files.sort_by(|a, b| a.name.cmp(&b.name));

        for (fid, dir) in self.dirs.iter_mut().enumerate() {
            dir.fid = fid as u32;
            dir.id = ids.take();
        }
        let offset = self.dirs.len();
        for (i, file) in self.files.iter_mut().enumerate() {
            file.fid = (offset + i) as u32;
        }
        self.items = (self.dirs.len() + self.files.len()) as u32;
    }

    /// Fingerprint of the sorted (name, size) child sequence, directories first.
    pub fn child_digest(&self) -> Digest {
        let mut fp = Fingerprint::new();
        for child in self.dirs.iter().chain(&self.files) {
            fp.update_child(&child.name, child.size);
        }
        fp.finish()
    }
}

/// Source of directory ids for one walk.
///
/// Ids are handed out in pre-order; `rewind` gives back everything taken
/// since a saved position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCounter {
    next: u32,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdCounter {
    /// Counter for a fresh walk; the root already holds id 1.
    pub fn new() -> Self {
        Self { next: ROOT_ID + 1 }
    }

    /// Counter whose ids never collide with `0..=max`.
    pub fn starting_after(max: u32) -> Self {
        Self {
            next: max.max(ROOT_ID) + 1,
        }
    }

    pub fn take(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn rewind(&mut self, to: u32) {
        debug_assert!(to <= self.next);
        self.next = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Entry {
        let mut root = Entry::root("share");
        root.files.push(Entry::file("b.txt", 10));
        root.dirs.push(Entry::directory("zeta"));
        root.files.push(Entry::file("a.txt", 5));
        root.dirs.push(Entry::directory("alpha"));
        root
    }

    #[test]
    fn test_order_children_assigns_fids_and_ids() {
        let mut root = listing();
        let mut ids = IdCounter::new();
        root.order_children(&mut ids);

        let dirs: Vec<_> = root.dirs.iter().map(|d| (d.name.as_str(), d.fid, d.id)).collect();
        assert_eq!(dirs, vec![("alpha", 0, 2), ("zeta", 1, 3)]);

        let files: Vec<_> = root.files.iter().map(|f| (f.name.as_str(), f.fid, f.id)).collect();
        assert_eq!(files, vec![("a.txt", 2, 0), ("b.txt", 3, 0)]);

        assert_eq!(root.items, 4);
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn test_names_sort_bytewise() {
        let mut root = Entry::root("");
        root.files.push(Entry::file("b", 0));
        root.files.push(Entry::file("B", 0));
        root.files.push(Entry::file("a", 0));
        root.order_children(&mut IdCounter::new());
        let names: Vec<_> = root.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_child_digest_depends_on_sizes() {
        let mut a = listing();
        let mut b = listing();
        a.order_children(&mut IdCounter::new());
        b.order_children(&mut IdCounter::new());
        assert_eq!(a.child_digest(), b.child_digest());

        b.files[0].size += 1;
        assert_ne!(a.child_digest(), b.child_digest());
    }

    #[test]
    fn test_id_counter_rewind() {
        let mut ids = IdCounter::starting_after(41);
        let mark = ids.peek();
        assert_eq!(ids.take(), 42);
        assert_eq!(ids.take(), 43);
        ids.rewind(mark);
        assert_eq!(ids.take(), 42);
        assert_eq!(IdCounter::starting_after(0).peek(), 2);
    }
}
