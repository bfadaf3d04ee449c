//! Cuckoo hash map from directory id to value
//!
//! Used by the snapshot reader, where entry lines refer to directories that
//! were declared earlier but are not yet attached to the tree.
//!
//! Two tables of `2^log` slots each, indexed by multiplicative hashes with
//! random odd multipliers. Every key lives in exactly one of its two slots,
//! so lookups probe two slots at most.

use tracing::{debug, error};

use crate::error::IdTableError;

const MIN_LOG: u32 = 2;
const MAX_LOG: u32 = 30;
/// Failed rebuilds at one size before the tables are doubled.
const REBUILD_ATTEMPTS: u32 = 8;

type Slot<V> = Option<(u32, V)>;

pub struct IdTable<V> {
    tables: [Vec<Slot<V>>; 2],
    mul: [u32; 2],
    log: u32,
    len: usize,
}

impl<V> Default for IdTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IdTable<V> {
    pub fn new() -> Self {
        Self::with_log(MIN_LOG)
    }

    fn with_log(log: u32) -> Self {
        Self {
            tables: [empty_table(log), empty_table(log)],
            mul: [random_multiplier(), random_multiplier()],
            log,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots per table.
    pub fn capacity(&self) -> usize {
        1 << self.log
    }

    fn index(&self, table: usize, key: u32) -> usize {
        (self.mul[table].wrapping_mul(key) >> (32 - self.log)) as usize
    }

    fn find(&self, key: u32) -> Option<(usize, usize)> {
        (0..2)
            .map(|t| (t, self.index(t, key)))
            .find(|&(t, i)| matches!(self.tables[t][i], Some((k, _)) if k == key))
    }

    pub fn contains(&self, key: u32) -> bool {
        key != 0 && self.find(key).is_some()
    }

    pub fn get(&self, key: u32) -> Option<&V> {
        if key == 0 {
            return None;
        }
        let (t, i) = self.find(key)?;
        self.tables[t][i].as_ref().map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: u32) -> Option<&mut V> {
        if key == 0 {
            return None;
        }
        let (t, i) = self.find(key)?;
        self.tables[t][i].as_mut().map(|(_, v)| v)
    }

    /// Insert a new key. Key 0 and keys already present are rejected.
    pub fn insert(&mut self, key: u32, value: V) -> Result<(), IdTableError> {
        if key == 0 {
            return Err(IdTableError::ReservedKey);
        }
        if self.find(key).is_some() {
            return Err(IdTableError::DuplicateKey(key));
        }

        if self.len + 1 >= self.capacity() {
            self.rebuild(self.log + 1, None)?;
        }

        if let Some(homeless) = self.place(key, value) {
            self.rebuild(self.log, Some(homeless))?;
        }
        self.len += 1;
        Ok(())
    }

    /// Remove a key, halving the tables once they drop under a quarter load.
    ///
    /// Halving leaves the tables half full, so a following insert does not
    /// grow them straight back.
    pub fn remove(&mut self, key: u32) -> Option<V> {
        if key == 0 {
            return None;
        }
        let (t, i) = self.find(key)?;
        let (_, value) = self.tables[t][i].take()?;
        self.len -= 1;

        if self.log > MIN_LOG && self.len < 1 << (self.log - 2) {
            if let Err(e) = self.rebuild(self.log - 1, None) {
                error!(error = %e, "id table shrink failed");
            }
        }
        Some(value)
    }

    /// Drain every entry in no particular order.
    pub fn drain(&mut self) -> Vec<(u32, V)> {
        self.len = 0;
        self.tables
            .iter_mut()
            .flat_map(|t| t.iter_mut().filter_map(Option::take))
            .collect()
    }

    /// Cuckoo placement. Returns the entry left without a slot when the
    /// eviction chain runs too long.
    fn place(&mut self, key: u32, value: V) -> Option<(u32, V)> {
        let mut current = (key, value);
        let rounds = (3 * self.log).max(1);

        for _ in 0..rounds {
            for t in 0..2 {
                let i = self.index(t, current.0);
                match self.tables[t][i].replace(current) {
                    None => return None,
                    Some(evicted) => current = evicted,
                }
            }
        }
        Some(current)
    }

    /// Re-place every entry (plus `extra`) into fresh tables of `2^log` slots.
    fn rebuild(&mut self, mut log: u32, extra: Option<(u32, V)>) -> Result<(), IdTableError> {
        let len = self.len;
        let mut pending = self.drain();
        pending.extend(extra);

        let mut attempts = 0;
        loop {
            if log > MAX_LOG {
                return Err(IdTableError::Capacity(MAX_LOG));
            }
            *self = Self::with_log(log);

            let mut homeless = None;
            while let Some((k, v)) = pending.pop() {
                if let Some(h) = self.place(k, v) {
                    homeless = Some(h);
                    break;
                }
            }

            match homeless {
                None => {
                    self.len = len;
                    debug!(log, len, attempts, "id table rebuilt");
                    return Ok(());
                }
                Some(h) => {
                    pending.push(h);
                    pending.extend(self.drain());
                    attempts += 1;
                    if attempts % REBUILD_ATTEMPTS == 0 {
                        log += 1;
                    }
                }
            }
        }
    }
}

fn empty_table<V>(log: u32) -> Vec<Slot<V>> {
    std::iter::repeat_with(|| None).take(1 << log).collect()
}

fn random_multiplier() -> u32 {
    rand::random::<u32>() | 1
}
