use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fuzzbound::{ArchiveMode, Harness, Limits};
use std::hint::black_box;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Generate an archive with `entries` files of `size` bytes each
fn generate_archive(entries: usize, size: usize) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let contents: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

    for i in 0..entries {
        zip.start_file(format!("dir/file_{}.bin", i), options)
            .unwrap();
        zip.write_all(&contents).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Generate a document with `elements` attributed elements
fn generate_document(elements: usize) -> Vec<u8> {
    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n");
    for i in 0..elements {
        doc.push_str(&format!(
            "  <item id=\"{}\" x=\"{}.5\"><value>{}</value><!-- c --></item>\n",
            i,
            i % 100,
            i * 3
        ));
    }
    doc.push_str("</root>\n");
    doc.into_bytes()
}

fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive");
    let harness = Harness::default();

    // The last case exceeds the unit cap
    for &(entries, size) in &[(1, 1024), (50, 4096), (200, 256)] {
        let data = generate_archive(entries, size);
        group.throughput(Throughput::Bytes(data.len() as u64));

        for mode in ArchiveMode::ALL {
            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), format!("{}e_{}b", entries, size)),
                &data,
                |b, data| {
                    b.iter(|| black_box(harness.run_archive(data, mode)));
                },
            );
        }
    }

    group.finish();
}

fn bench_markup(c: &mut Criterion) {
    let mut group = c.benchmark_group("markup");
    let harness = Harness::default();

    for &elements in &[100, 1000, 10000] {
        let data = generate_document(elements);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("elements", elements), &data, |b, data| {
            b.iter(|| black_box(harness.run_markup(data)));
        });
    }

    group.finish();
}

fn bench_chunk_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_size");
    let data = generate_document(1000);

    for &chunk in &[16, 512, 64 * 1024] {
        let harness = Harness::new(Limits::new().with_max_chunk(chunk));
        group.bench_with_input(BenchmarkId::new("markup", chunk), &data, |b, data| {
            b.iter(|| black_box(harness.run_markup(data)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_archive, bench_markup, bench_chunk_size);
criterion_main!(benches);
