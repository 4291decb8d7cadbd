use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use termscroll_core::{Cell, Color, Rendition, Store, StoreKind};

/// An 80-column line with a prompt-like format split: a colored prefix, a
/// bold command, and plain output.
fn prompt_line() -> Vec<Cell> {
    (0..80)
        .map(|column| {
            let mut cell = Cell::new((b'a' + (column % 26) as u8) as u16);
            if column < 12 {
                cell.fg = Color::Indexed(2);
            } else if column < 30 {
                cell.rendition = Rendition::BOLD;
            }
            cell
        })
        .collect()
}

fn fill(store: &mut Store, line: &[Cell], count: usize) {
    for i in 0..count {
        store.append_cells(line);
        store.end_line(i % 7 == 0);
    }
}

fn bench_append(c: &mut Criterion) {
    let line = prompt_line();
    let mut group = c.benchmark_group("append");
    group.throughput(Throughput::Elements(1000));

    for (id, kind) in [
        ("file", StoreKind::File),
        ("compact", StoreKind::Compact { max_lines: 10_000 }),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(id), &kind, |b, &kind| {
            b.iter(|| {
                let mut store = kind.create(None);
                fill(&mut store, &line, 1000);
                black_box(store.lines())
            });
        });
    }
    group.finish();
}

fn bench_scrollback_read(c: &mut Criterion) {
    let line = prompt_line();
    let mut group = c.benchmark_group("read_1000_lines");
    group.throughput(Throughput::Elements(1000));

    for (id, kind) in [
        ("file", StoreKind::File),
        ("compact", StoreKind::Compact { max_lines: 10_000 }),
    ] {
        let mut store = kind.create(None);
        fill(&mut store, &line, 1000);

        group.bench_function(BenchmarkId::from_parameter(id), |b| {
            let mut buf = vec![Cell::default(); 80];
            b.iter(|| {
                for row in 0..1000 {
                    store.read_cells(row, 0, 80, &mut buf);
                }
                black_box(buf[79])
            });
        });
    }
    group.finish();
}

fn bench_migration(c: &mut Criterion) {
    let line = prompt_line();
    c.bench_function("migrate_file_to_compact_1000", |b| {
        b.iter_batched(
            || {
                let mut store = StoreKind::File.create(None);
                fill(&mut store, &line, 1000);
                store
            },
            |store| {
                let kind = StoreKind::Compact { max_lines: 1000 };
                black_box(kind.create(Some(store)).lines())
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_append, bench_scrollback_read, bench_migration);
criterion_main!(benches);
