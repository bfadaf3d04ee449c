//! Performance benchmarks for sharewalk

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sharewalk::test_utils::{MemNode, MemWalker, dir, file};
use sharewalk::{Fingerprint, IdTable, Limits, Snapshot, dump_reverse};

/// A share `depth` levels deep with `width` subdirectories and files per
/// level. File sizes vary by level so no directory repeats its parent.
fn wide_share(name: &str, depth: usize, width: usize) -> MemNode {
    let mut children: Vec<MemNode> = (0..width)
        .map(|i| file(&format!("file{i}.dat"), (i as u64 + 1) * 512 + depth as u64))
        .collect();
    if depth > 0 {
        children.extend((0..width).map(|i| wide_share(&format!("dir{i}"), depth - 1, width)));
    }
    dir(name, children)
}

fn bench_fingerprint(c: &mut Criterion) {
    let names: Vec<String> = (0..1000).map(|i| format!("entry-{i:05}.bin")).collect();
    let mut group = c.benchmark_group("fingerprint");

    group.bench_function("1000_children", |b| {
        b.iter(|| {
            let mut fp = Fingerprint::new();
            for (i, name) in names.iter().enumerate() {
                fp.update_child(name, i as u64);
            }
            black_box(fp.finish())
        })
    });

    let block = vec![0xa5u8; 64 * 1024];
    group.bench_function("64k_bytes", |b| {
        b.iter(|| black_box(sharewalk::fingerprint::digest(black_box(&block))))
    });

    group.finish();
}

fn bench_id_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_table");

    for count in [1_000u32, 100_000] {
        group.bench_with_input(BenchmarkId::new("insert_remove", count), &count, |b, &n| {
            b.iter(|| {
                let mut table = IdTable::new();
                for id in 1..=n {
                    table.insert(id, id).unwrap();
                }
                for id in 1..=n {
                    black_box(table.remove(id));
                }
            })
        });
    }

    group.finish();
}

fn bench_reverse_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("reverse_dump");
    let share = wide_share("share", 3, 8);

    group.bench_function("dump_585_dirs", |b| {
        b.iter(|| {
            let mut walker = MemWalker::new(share.clone());
            let root = walker.root_entry();
            let mut out = Vec::with_capacity(1 << 20);
            dump_reverse(&mut walker, root, Limits::default(), &mut out).unwrap();
            black_box(out.len())
        })
    });

    let mut walker = MemWalker::new(share.clone());
    let root = walker.root_entry();
    let mut dump = Vec::new();
    dump_reverse(&mut walker, root, Limits::default(), &mut dump).unwrap();

    group.bench_function("read_snapshot", |b| {
        b.iter(|| black_box(Snapshot::read(dump.as_slice()).unwrap().max_id))
    });

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_id_table, bench_reverse_dump);
criterion_main!(benches);
