//! Performance benchmarks for FastPeakMap
//!
//! Run with: cargo bench
//!
//! Uses a synthetic annotation so no reference files are needed.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fast_peakmap::core::{AnnotationIndex, AnnotationLoader, PeakLocator, Strand};
use fast_peakmap::formats::{parse_peak_line, Peak};
use std::fmt::Write;

const GENES_PER_CHROM: u64 = 2_000;
const GENE_STRIDE: u64 = 10_000;

/// Three chromosomes, alternating strands, two transcripts of four elements per gene
fn synthetic_gtf() -> String {
    let kinds = ["five_prime_utr", "CDS", "stop_codon", "three_prime_utr"];
    let mut gtf = String::new();
    for chrom in 1..=3 {
        for g in 0..GENES_PER_CHROM {
            let strand = if g % 2 == 0 { '+' } else { '-' };
            let base = g * GENE_STRIDE + 1;
            for t in 0..2u64 {
                let mut pos = base + t * 100;
                for kind in kinds {
                    let end = pos + 999;
                    writeln!(
                        gtf,
                        "chr{}\tbench\t{}\t{}\t{}\t.\t{}\t.\tgene_id \"G{}{:05}\"; transcript_id \"T{}{:05}{}\";",
                        chrom, kind, pos, end, strand, chrom, g, chrom, g, t
                    )
                    .unwrap();
                    pos = end + 200;
                }
            }
        }
    }
    gtf
}

fn synthetic_peaks(n: u64) -> Vec<Peak> {
    (0..n)
        .map(|i| {
            let start = (i * 7_919) % (GENES_PER_CHROM * GENE_STRIDE);
            let strand = if i % 2 == 0 { '+' } else { '-' };
            let line = format!("chr{}\t{}\t{}\tpeak{}\t0\t{}", i % 3 + 1, start, start + 200, i, strand);
            parse_peak_line(&line, i as usize + 1).unwrap()
        })
        .collect()
}

fn load(gtf: &str) -> AnnotationIndex {
    AnnotationLoader::default().load_reader(gtf.as_bytes()).unwrap()
}

/// Benchmark single-pass annotation loading
fn bench_annotation_loading(c: &mut Criterion) {
    let gtf = synthetic_gtf();
    let mut group = c.benchmark_group("annotation_load");
    group.throughput(Throughput::Bytes(gtf.len() as u64));
    group.sample_size(20);
    group.bench_function("synthetic_gtf", |b| b.iter(|| black_box(load(black_box(&gtf)))));
    group.finish();
}

/// Benchmark gene-level point queries
fn bench_point_query(c: &mut Criterion) {
    let index = load(&synthetic_gtf());

    c.bench_function("query_single_point", |b| {
        b.iter(|| {
            let hits = index.query(black_box("chr2"), black_box(Strand::Plus), black_box(5_000_500));
            black_box(hits.len())
        })
    });
}

/// Benchmark full peak locating at several thread counts
fn bench_locate_batch(c: &mut Criterion) {
    let gtf = synthetic_gtf();
    let loader = AnnotationLoader::default();
    let index = loader.load_reader(gtf.as_bytes()).unwrap();
    let locator = PeakLocator::new(&index, loader.priorities());
    let peaks = synthetic_peaks(50_000);

    let mut group = c.benchmark_group("locate_batch");
    group.throughput(Throughput::Elements(peaks.len() as u64));
    for threads in [1, 2, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let (hits, _) = locator.locate_all(black_box(&peaks), threads).unwrap();
                black_box(hits)
            })
        });
    }
    group.finish();
}

/// Benchmark BED peak line parsing
fn bench_peak_parsing(c: &mut Criterion) {
    let bed6 = "chr1\t1000000\t1000200\tpeak1\t35\t+";
    let bed12 = "chr1\t1000000\t1003000\tpeak2\t0\t-\t1000000\t1003000\t0\t3\t100,200,100,\t0,1500,2900,";

    c.bench_function("parse_peak_bed6", |b| {
        b.iter(|| black_box(parse_peak_line(black_box(bed6), 1).unwrap()))
    });
    c.bench_function("parse_peak_bed12", |b| {
        b.iter(|| black_box(parse_peak_line(black_box(bed12), 1).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_annotation_loading,
    bench_point_query,
    bench_locate_batch,
    bench_peak_parsing,
);
criterion_main!(benches);
