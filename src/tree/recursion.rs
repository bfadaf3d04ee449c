//! Detection of shares that loop back into themselves
//!
//! Servers with looping links or mount points present the same listing
//! again and again under ever deeper paths. A freshly read directory is
//! compared against each ancestor: both chains are walked upwards in
//! lockstep, comparing child digests pairwise, and if every pair matches
//! until the directory side has accumulated `threshold` children, the walk
//! is considered to be going round in circles.

use crate::entry::Entry;

use super::cursor::{Cursor, Frame};

/// Depth of the ancestor the current directory repeats, if any.
///
/// Depth 0 is the walk root. Directories without a digest never match.
pub fn detect(cx: &Cursor, threshold: u32) -> Option<usize> {
    let chain: Vec<&Entry> = cx.chain().map(Frame::entry).collect();
    let current = chain.len().checked_sub(1)?;
    (0..current)
        .rev()
        .find(|&ancestor| repeats(&chain[..=current], &chain[..=ancestor], threshold))
}

fn repeats(near: &[&Entry], far: &[&Entry], threshold: u32) -> bool {
    let mut items = 0u64;
    for (a, b) in near.iter().rev().zip(far.iter().rev()) {
        match (a.digest, b.digest) {
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
        items += u64::from(a.items);
        if items >= u64::from(threshold) {
            return true;
        }
    }
    false
}
