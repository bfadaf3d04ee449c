//! Property tests over randomly shaped shares

use std::collections::BTreeMap;

use proptest::prelude::*;
use sharewalk::test_utils::{MemNode, MemWalker, dir, file};
use sharewalk::{
    Entry, Limits, Snapshot, build_tree, dump_diff, dump_reverse, print_listing, replay,
};

#[derive(Debug, Clone)]
enum Shape {
    File(u64),
    Dir(BTreeMap<String, Shape>),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        3 => (0u64..1000).prop_map(Shape::File),
        1 => Just(Shape::Dir(BTreeMap::new())),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop::collection::btree_map("[a-e]{1,3}", inner, 0..5).prop_map(Shape::Dir)
    })
}

fn arb_share() -> impl Strategy<Value = MemNode> {
    prop::collection::btree_map("[a-e]{1,3}", arb_shape(), 0..6)
        .prop_map(|children| to_node("root", &Shape::Dir(children)))
}

fn to_node(name: &str, shape: &Shape) -> MemNode {
    match shape {
        Shape::File(size) => file(name, *size),
        Shape::Dir(children) => dir(name, children.iter().map(|(n, s)| to_node(n, s)).collect()),
    }
}

/// Random shares never repeat their parent's listing often enough to look
/// like a loop, but keep detection out of the way anyway.
fn limits() -> Limits {
    Limits {
        recursion_threshold: 1_000_000,
        ..Limits::default()
    }
}

fn reverse(tree: &MemNode) -> String {
    let mut walker = MemWalker::new(tree.clone());
    let root = walker.root_entry();
    let mut out = Vec::new();
    dump_reverse(&mut walker, root, limits(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn listing(root: Entry) -> String {
    let mut out = Vec::new();
    print_listing(root, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn ids(entry: &Entry, out: &mut Vec<u32>) {
    out.push(entry.id);
    entry.dirs.iter().for_each(|d| ids(d, out));
}

proptest! {
    /// The reader rebuilds exactly the tree the two-pass build sees, and
    /// replaying it reproduces the dump byte for byte.
    #[test]
    fn prop_reverse_round_trip(tree in arb_share()) {
        let dump = reverse(&tree);
        let read = Snapshot::read(dump.as_bytes()).unwrap();

        let mut walker = MemWalker::new(tree.clone());
        let root = walker.root_entry();
        let (built, _) = build_tree(&mut walker, root, limits()).unwrap();
        prop_assert_eq!(built.size, tree.total_size());
        prop_assert_eq!(listing(built), listing(read.root.clone()));

        let mut out = Vec::new();
        replay(read.root, &mut out).unwrap();
        prop_assert_eq!(String::from_utf8(out).unwrap(), dump);
    }

    /// Directory ids cover `1..=n` without gaps and every listing is read
    /// exactly once.
    #[test]
    fn prop_ids_contiguous(tree in arb_share()) {
        let mut walker = MemWalker::new(tree.clone());
        let root = walker.root_entry();
        let (built, stats) = build_tree(&mut walker, root, limits()).unwrap();

        let mut seen = Vec::new();
        ids(&built, &mut seen);
        seen.sort_unstable();
        let n = tree.dir_count() as u32;
        prop_assert_eq!(seen, (1..=n).collect::<Vec<u32>>());
        prop_assert_eq!(walker.max_readdir_count(), 1);
        prop_assert_eq!(stats.files, tree.file_count() as u64);
    }

    /// Diffing a share against its own dump writes no patch records.
    #[test]
    fn prop_self_diff_empty(tree in arb_share()) {
        let dump = reverse(&tree);
        let previous = Snapshot::read(dump.as_bytes()).unwrap();

        let mut walker = MemWalker::new(tree);
        let root = walker.root_entry();
        let mut out = Vec::new();
        let stats = dump_diff(&mut walker, root, Some(previous), limits(), &mut out).unwrap();

        prop_assert_eq!(stats.patch.map(|c| c.patch_records()), Some(0));
        let output = String::from_utf8(out).unwrap();
        prop_assert!(output.ends_with(&dump));
    }

    /// The output of a diff between two unrelated shares reads back as the
    /// newer share.
    #[test]
    fn prop_diff_output_is_snapshot(old in arb_share(), new in arb_share()) {
        let previous = Snapshot::read(reverse(&old).as_bytes()).unwrap();
        let old_max = previous.max_id;

        let mut walker = MemWalker::new(new.clone());
        let root = walker.root_entry();
        let mut out = Vec::new();
        dump_diff(&mut walker, root, Some(previous), limits(), &mut out).unwrap();

        let next = Snapshot::read(out.as_slice()).unwrap();
        prop_assert!(next.max_id <= old_max.max(1) + new.dir_count() as u32);

        let mut seen = Vec::new();
        ids(&next.root, &mut seen);
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), total, "directory ids must stay unique");

        let mut walker = MemWalker::new(new);
        let root = walker.root_entry();
        let (fresh, _) = build_tree(&mut walker, root, limits()).unwrap();
        prop_assert_eq!(listing(next.root), listing(fresh));
    }
}
