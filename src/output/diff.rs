//! Live walk compared against a previous snapshot
//!
//! Children of every directory are merged by name with the children of its
//! old counterpart, one partition at a time:
//!
//! - present in both with the same size: nothing is written, the old id is
//!   kept
//! - present in both with a different size: `*` entry line
//! - only in the snapshot: `-` lines for the whole old subtree
//! - only in the live tree: `+` lines for the whole new subtree
//!
//! Directory entries are compared once their aggregated size is known, when
//! their parent is left. Before the first record under a directory that
//! existed before, the directory and every ancestor not yet announced are
//! announced with `* 0 <id> <path>` lines, outermost first.
//!
//! Alongside the patch, the policy writes a plain reverse dump of the live
//! tree to a second writer, with the carried ids.

use std::cmp::Ordering;
use std::io::Write;

use crate::entry::Entry;
use crate::error::EngineError;
use crate::tree::{Cursor, OutputPolicy, Traversal, walk};
use crate::wire::{self, Marker, WireWriter};

use super::emit;
use super::replay::ReplayPolicy;

/// Diff state of one directory on the walk path.
struct OldFrame {
    /// Old counterpart, until its children have been merged.
    old: Option<Entry>,
    announced: bool,
    /// Per live directory child: the old counterpart, until it is entered.
    subtrees: Vec<Option<Entry>>,
    /// Per live directory child: its old size, `None` if new.
    old_sizes: Vec<Option<u64>>,
}

impl OldFrame {
    fn new(old: Option<Entry>) -> Self {
        Self {
            announced: old.is_none(),
            old,
            subtrees: Vec::new(),
            old_sizes: Vec::new(),
        }
    }
}

enum Pair {
    Both(usize, Entry),
    Live(usize),
    Old(Entry),
}

/// Merge a sorted live partition with the matching old partition.
fn pair_by_name(live: &[Entry], old: Vec<Entry>) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(live.len().max(old.len()));
    let mut old = old.into_iter().peekable();
    let mut i = 0;

    loop {
        let order = match (live.get(i), old.peek()) {
            (Some(l), Some(o)) => l.name.cmp(&o.name),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => {
                pairs.push(Pair::Live(i));
                i += 1;
            }
            Ordering::Greater => pairs.extend(old.next().map(Pair::Old)),
            Ordering::Equal => {
                pairs.extend(old.next().map(|o| Pair::Both(i, o)));
                i += 1;
            }
        }
    }
    pairs
}

/// Announce every directory on the walk path that has not been announced
/// yet, outermost first.
///
/// Announced frames always form a prefix of `frames`.
fn announce_path<W: Write>(
    patch: &mut WireWriter<W>,
    frames: &mut [OldFrame],
    cx: &Cursor,
) -> Result<(), EngineError> {
    let start = frames.iter().rposition(|f| f.announced).map_or(0, |i| i + 1);
    for (frame, at) in frames.iter_mut().zip(cx.chain()).skip(start) {
        frame.announced = true;
        patch.directory(Some(Marker::Changed), at.entry().id, at.path())?;
    }
    Ok(())
}

fn announce<W: Write>(
    patch: &mut WireWriter<W>,
    announced: &mut bool,
    id: u32,
    path: &str,
) -> Result<(), EngineError> {
    if !*announced {
        *announced = true;
        patch.directory(Some(Marker::Changed), id, path)?;
    }
    Ok(())
}

/// `-` lines for an old subtree at `path` inside directory `parent`.
fn remove_subtree<W: Write>(
    patch: &mut WireWriter<W>,
    old: Entry,
    path: String,
    parent: u32,
) -> Result<(), EngineError> {
    let mut cx = Cursor::with_path(old, path, parent);
    walk(&mut ReplayPolicy::new(patch, Some(Marker::Removed)), &mut cx)
}

pub struct DiffPolicy<'a, 'w, P: Write, D: Write> {
    live: Traversal<'w>,
    patch: &'a mut WireWriter<P>,
    dump: &'a mut WireWriter<D>,
    old_root: Option<Entry>,
    root_size: Option<u64>,
    frames: Vec<OldFrame>,
}

impl<'a, 'w, P: Write, D: Write> DiffPolicy<'a, 'w, P, D> {
    /// `old_root` is the previous snapshot's tree, `None` when there is none
    /// and everything counts as new.
    pub fn new(
        live: Traversal<'w>,
        old_root: Option<Entry>,
        patch: &'a mut WireWriter<P>,
        dump: &'a mut WireWriter<D>,
    ) -> Self {
        Self {
            live,
            patch,
            dump,
            root_size: old_root.as_ref().map(|r| r.size),
            old_root,
            frames: Vec::new(),
        }
    }

    pub fn into_traversal(self) -> Traversal<'w> {
        self.live
    }

    /// Merge the freshly read children of the current directory with its
    /// old counterpart.
    fn merge(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        let dirs = cx.current().dirs.len();
        frame.subtrees = std::iter::repeat_with(|| None).take(dirs).collect();
        frame.old_sizes = vec![None; dirs];

        let d_id = cx.current().id;
        let Some(mut old) = frame.old.take() else {
            for dir in &cx.current().dirs {
                let path = cx.child_path(&dir.name);
                self.patch.directory(Some(Marker::Added), dir.id, &path)?;
            }
            for file in &cx.current().files {
                self.patch.entry(Some(Marker::Added), d_id, file)?;
            }
            return Ok(());
        };

        let mut carried = vec![false; dirs];
        let mut changes = Vec::new();
        for pair in pair_by_name(&cx.current().dirs, std::mem::take(&mut old.dirs)) {
            match pair {
                Pair::Both(i, o) => {
                    carried[i] = true;
                    cx.current_mut().dirs[i].id = o.id;
                    frame.old_sizes[i] = Some(o.size);
                    frame.subtrees[i] = Some(o);
                }
                other => changes.push(other),
            }
        }
        self.live.reassign_ids(cx.current_mut(), &carried);

        for change in changes {
            announce_path(self.patch, &mut self.frames, cx)?;
            match change {
                Pair::Live(i) => {
                    let dir = &cx.current().dirs[i];
                    let path = cx.child_path(&dir.name);
                    self.patch.directory(Some(Marker::Added), dir.id, &path)?;
                }
                Pair::Old(o) => {
                    let path = cx.child_path(&o.name);
                    remove_subtree(self.patch, o, path, d_id)?;
                }
                Pair::Both(..) => {}
            }
        }

        let d = cx.current();
        for pair in pair_by_name(&d.files, std::mem::take(&mut old.files)) {
            let (marker, entry) = match &pair {
                Pair::Both(i, o) if o.size != d.files[*i].size => {
                    (Marker::Changed, &d.files[*i])
                }
                Pair::Both(..) => continue,
                Pair::Live(i) => (Marker::Added, &d.files[*i]),
                Pair::Old(o) => (Marker::Removed, o),
            };
            announce_path(self.patch, &mut self.frames, cx)?;
            self.patch.entry(Some(marker), d_id, entry)?;
        }
        Ok(())
    }

    /// Compare the directory children of the current directory, now that
    /// their sizes are final.
    fn compare_children(&mut self, cx: &Cursor) -> Result<(), EngineError> {
        let d = cx.current();

        for (i, child) in d.dirs.iter().enumerate() {
            let (unentered, old_size) = match self.frames.last_mut() {
                Some(frame) => (
                    frame.subtrees.get_mut(i).and_then(Option::take),
                    frame.old_sizes.get(i).copied().flatten(),
                ),
                None => return Ok(()),
            };

            if let Some(old) = unentered {
                // never entered: the live tree has none of its old contents
                if !old.dirs.is_empty() || !old.files.is_empty() {
                    announce_path(self.patch, &mut self.frames, cx)?;
                }
                remove_contents(self.patch, old, child.id, &cx.child_path(&child.name))?;
            }

            let marker = match old_size {
                None => Marker::Added,
                Some(size) if size != child.size => Marker::Changed,
                Some(_) => continue,
            };
            announce_path(self.patch, &mut self.frames, cx)?;
            self.patch.entry(Some(marker), d.id, child)?;
        }
        Ok(())
    }
}

/// `-` lines for everything an old directory at `path` contained.
fn remove_contents<W: Write>(
    patch: &mut WireWriter<W>,
    old: Entry,
    id: u32,
    path: &str,
) -> Result<(), EngineError> {
    let mut announced = false;
    let Entry {
        name, dirs, files, ..
    } = old;

    for dir in dirs {
        announce(patch, &mut announced, id, path)?;
        let child = wire::child_path(path, &name, &dir.name);
        remove_subtree(patch, dir, child, id)?;
    }
    for file in &files {
        announce(patch, &mut announced, id, path)?;
        patch.entry(Some(Marker::Removed), id, file)?;
    }
    Ok(())
}

impl<P: Write, D: Write> OutputPolicy for DiffPolicy<'_, '_, P, D> {
    fn on_enter_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.read_dir(cx);

        let old = self.old_root.take();
        if old.is_none() {
            self.patch
                .directory(Some(Marker::Added), cx.current().id, cx.path())?;
        }
        self.frames.push(OldFrame::new(old));
        self.merge(cx)?;

        emit::declare_root(self.dump, None, cx)?;
        emit::declare_dirs(self.dump, None, cx)?;
        emit::emit_files(self.dump, None, cx)?;
        Ok(())
    }

    fn on_enter(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.read_dir(cx);
        self.merge(cx)?;
        emit::declare_dirs(self.dump, None, cx)?;
        emit::emit_files(self.dump, None, cx)?;
        Ok(())
    }

    fn on_leave(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.aggregate(cx);
        self.compare_children(cx)?;
        emit::emit_dirs(self.dump, None, cx)?;
        Ok(())
    }

    fn on_leave_root(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        self.live.aggregate(cx);
        self.compare_children(cx)?;

        let root = cx.current();
        let marker = match self.root_size {
            None => Some(Marker::Added),
            Some(size) if size != root.size => Some(Marker::Changed),
            Some(_) => None,
        };
        if let Some(marker) = marker {
            self.patch.entry(Some(marker), cx.root_parent(), root)?;
        }

        emit::emit_dirs(self.dump, None, cx)?;
        emit::emit_root(self.dump, None, cx)?;
        self.frames.clear();
        Ok(())
    }

    fn go_child(&mut self, cx: &mut Cursor) -> Result<bool, EngineError> {
        if !self.live.go_child(cx) {
            return Ok(false);
        }
        let slot = cx.slot();
        let old = self
            .frames
            .last_mut()
            .and_then(|parent| parent.subtrees.get_mut(slot))
            .and_then(Option::take);
        self.frames.push(OldFrame::new(old));
        Ok(true)
    }

    fn go_sibling_or_parent(&mut self, cx: &mut Cursor) -> Result<bool, EngineError> {
        self.live.go_parent(cx)?;
        self.frames.pop();
        self.go_child(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: &[Pair]) -> Vec<String> {
        pairs
            .iter()
            .map(|p| match p {
                Pair::Both(i, o) => format!("={}:{}", i, o.name),
                Pair::Live(i) => format!("+{}", i),
                Pair::Old(o) => format!("-{}", o.name),
            })
            .collect()
    }

    #[test]
    fn test_pair_by_name() {
        let live = vec![Entry::file("b", 0), Entry::file("c", 0), Entry::file("e", 0)];
        let old = vec![Entry::file("a", 0), Entry::file("c", 0), Entry::file("d", 0)];
        let pairs = pair_by_name(&live, old);
        assert_eq!(names(&pairs), vec!["-a", "+0", "=1:c", "-d", "+2"]);
    }

    #[test]
    fn test_pair_by_name_one_side_empty() {
        let live = vec![Entry::file("x", 0)];
        assert_eq!(names(&pair_by_name(&live, Vec::new())), vec!["+0"]);
        assert_eq!(names(&pair_by_name(&[], live)), vec!["-x"]);
    }
}
