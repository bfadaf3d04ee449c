//! Live traversal state shared by every policy that drives a `Walker`.
//!
//! `Traversal` owns the id counter and the statistics of one walk, reads
//! listings into the current directory, and keeps the walker's position in
//! step with the cursor.

use tracing::{debug, error, warn};

use crate::entry::{Entry, EntryKind, IdCounter, ROOT_ID};
use crate::error::EngineError;
use crate::stats::WalkStats;

use super::config::Limits;
use super::cursor::Cursor;
use super::recursion;
use super::walker::{Go, Walker};

pub struct Traversal<'w> {
    walker: &'w mut dyn Walker,
    limits: Limits,
    ids: IdCounter,
    /// First id handed out by the last `read_dir`.
    batch_start: u32,
    /// First id this walk hands out; ids below it were carried in.
    first_fresh: u32,
    stats: WalkStats,
}

impl<'w> Traversal<'w> {
    pub fn new(walker: &'w mut dyn Walker, limits: Limits) -> Self {
        Self::with_ids(walker, limits, IdCounter::new())
    }

    pub fn with_ids(walker: &'w mut dyn Walker, limits: Limits, ids: IdCounter) -> Self {
        let batch_start = ids.peek();
        Self {
            walker,
            limits,
            ids,
            batch_start,
            first_fresh: batch_start,
            stats: WalkStats::default(),
        }
    }

    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    pub fn into_stats(self) -> WalkStats {
        self.stats
    }

    /// Position of directory `id` in this walk's numbering, the root being 1.
    ///
    /// Fresh ids count from the first one handed out; carried ids already
    /// lie within the run that assigned them.
    fn ordinal(&self, id: u32) -> u32 {
        if id >= self.first_fresh {
            id - self.first_fresh + ROOT_ID + 1
        } else {
            id
        }
    }

    /// Read the listing of the current directory.
    ///
    /// Children are sorted, numbered and fingerprinted; the directory's size
    /// starts out as the sum of its files. A listing that repeats its
    /// ancestors is dropped again and its ids are given back. Directories
    /// numbered beyond `max_dirs` are left unread.
    pub fn read_dir(&mut self, cx: &mut Cursor) {
        self.batch_start = self.ids.peek();
        let id = cx.current().id;
        if u64::from(self.ordinal(id)) > self.limits.max_dirs {
            error!(
                path = cx.path(),
                id,
                max_dirs = self.limits.max_dirs,
                "directory limit reached, not reading"
            );
            self.stats.truncated += 1;
            return;
        }

        let max_items = self.limits.max_items_in_dir;
        let d = cx.current_mut();
        let mut count = 0usize;

        while let Some(mut entry) = self.walker.readdir() {
            if count >= max_items {
                error!(
                    name = %entry.name,
                    max_items,
                    "too many entries in directory, truncating listing"
                );
                self.stats.truncated += 1;
                break;
            }
            count += 1;

            entry.id = 0;
            entry.items = 0;
            match entry.kind {
                EntryKind::Directory => {
                    entry.size = 0;
                    d.dirs.push(entry);
                }
                EntryKind::File => d.files.push(entry),
            }
        }

        d.order_children(&mut self.ids);
        d.digest = Some(d.child_digest());
        d.size = d.files.iter().map(|f| f.size).sum();

        if let Some(ancestor) = recursion::detect(cx, self.limits.recursion_threshold) {
            let repeated = cx
                .chain()
                .nth(ancestor)
                .map(|f| f.path().to_string())
                .unwrap_or_default();
            warn!(path = cx.path(), repeats = %repeated, "recursion detected, pruning");

            let d = cx.current_mut();
            d.dirs.clear();
            d.files.clear();
            d.items = 0;
            d.size = 0;
            self.ids.rewind(self.batch_start);
            self.stats.pruned += 1;
        }

        let d = cx.current();
        self.stats.directories += 1;
        self.stats.files += d.files.len() as u64;
        self.stats.bytes += d.size;
        debug!(
            path = cx.path(),
            dirs = d.dirs.len(),
            files = d.files.len(),
            "read directory"
        );
    }

    /// Enter the next directory child the walker accepts.
    ///
    /// Children the walker refuses are skipped and stay empty in the tree.
    pub fn go_child(&mut self, cx: &mut Cursor) -> bool {
        while let Some(index) = cx.next_unvisited() {
            let result = self.walker.go(Go::Child(&cx.current().dirs[index].name));
            match result {
                Ok(()) => {
                    cx.descend(index);
                    return true;
                }
                Err(e) => {
                    warn!(
                        path = %cx.child_path(&cx.current().dirs[index].name),
                        error = %e,
                        "skipping directory"
                    );
                    self.stats.skipped += 1;
                    cx.skip();
                }
            }
        }
        false
    }

    /// Move the walker and the cursor up one level.
    pub fn go_parent(&mut self, cx: &mut Cursor) -> Result<(), EngineError> {
        if let Err(source) = self.walker.go(Go::Parent) {
            error!(path = cx.path(), error = %source, "cannot return to parent directory");
            return Err(EngineError::FatalNavigation {
                path: cx.path().to_string(),
                source,
            });
        }
        cx.ascend();
        Ok(())
    }

    /// Add the final sizes of the directory children to the current size.
    pub fn aggregate(&self, cx: &mut Cursor) {
        let d = cx.current_mut();
        d.size += d.dirs.iter().map(|c| c.size).sum::<u64>();
    }

    /// Give fresh ids to the directory children not marked in `carried`.
    ///
    /// Undoes the numbering of the last `read_dir` first, so fresh ids stay
    /// contiguous when some children keep ids from elsewhere.
    pub fn reassign_ids(&mut self, d: &mut Entry, carried: &[bool]) {
        self.ids.rewind(self.batch_start);
        for (dir, keep) in d.dirs.iter_mut().zip(carried) {
            if !keep {
                dir.id = self.ids.take();
            }
        }
    }
}
