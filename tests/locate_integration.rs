//! End-to-end locate tests
//!
//! Writes a compressed annotation and a peak file to disk, then runs both the
//! library pipeline and the `fast-peakmap` binary over them.

use fast_peakmap::core::{dedup_hits, write_hits, AnnotationLoader, LoadError, PeakLocator};
use fast_peakmap::formats::read_peaks_path;
use fast_peakmap::Strand;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const GTF: &str = "\
#!genome-build test
chr1\thavana\tgene\t100\t2000\t.\t+\t.\tgene_id \"GA1\";
chr1\thavana\tfive_prime_utr\t100\t199\t.\t+\t.\tgene_id \"GA1\"; transcript_id \"TA1\";
chr1\thavana\tCDS\t200\t899\t.\t+\t0\tgene_id \"GA1\"; transcript_id \"TA1\";
chr1\thavana\tstop_codon\t900\t902\t.\t+\t0\tgene_id \"GA1\"; transcript_id \"TA1\";
chr1\thavana\tthree_prime_utr\t903\t2000\t.\t+\t.\tgene_id \"GA1\"; transcript_id \"TA1\";
chr1\thavana\tCDS\t5000\t5999\t.\t-\t0\tgene_id \"GB1\"; transcript_id \"TB1\";
chr2\thavana\tCDS\t300\t400\t.\t+\t0\tgene_id \"GC1\"; transcript_id \"TC1\";
chr2\thavana\tthree_prime_utr\t401\t600\t.\t+\t.\tgene_id \"GC1\"; transcript_id \"TC1\";
";

const BED: &str = "\
track name=peaks
chr1\t300\t400\tp1\t10\t+
chr1\t890\t912\tp2\t10\t+
chr1\t5400\t5500\tp3\t10\t-
chr1\t5400\t5500\tp4\t10\t+
chr2\t380\t440\tp5\t10\t.
chr3\t1\t100\tp6\t10\t+
chr2\t0\t700\tp7\t0\t+\t0\t700\t0\t2\t50,50,\t350,550,
";

fn write_gz(path: &Path, content: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_gz(&dir.path().join("annotation.gtf.gz"), GTF);
    std::fs::write(dir.path().join("peaks.bed"), BED).unwrap();
    dir
}

#[test]
fn test_locate_pipeline_from_files() {
    let dir = setup();
    let loader = AnnotationLoader::default();
    let index = loader.load_path(dir.path().join("annotation.gtf.gz")).unwrap();

    let summary = index.summary();
    assert_eq!(summary.chromosomes, 2);
    assert_eq!(summary.genes, 3);
    assert_eq!(summary.elements, 7);

    let peaks = read_peaks_path(dir.path().join("peaks.bed")).unwrap();
    assert_eq!(peaks.len(), 7);
    // split peak: 100 covered bases, 51st one is the first base of block two
    assert_eq!(peaks[6].length, 100);
    assert_eq!(peaks[6].center, 551);

    let locator = PeakLocator::new(&index, loader.priorities());
    let (hits, stats) = locator.locate_all(&peaks, 2).unwrap();
    assert_eq!(stats.peaks, 7);
    assert_eq!(stats.located, 5);

    let described: Vec<(&str, &str, Strand)> = hits
        .iter()
        .map(|h| (h.gene_id.as_str(), h.element.as_str(), h.strand))
        .collect();
    assert_eq!(
        described,
        vec![
            ("GA1", "CDS", Strand::Plus),
            ("GA1", "stop_codon", Strand::Plus),
            ("GB1", "CDS", Strand::Minus),
            ("GC1", "three_prime_utr", Strand::Plus),
            ("GC1", "three_prime_utr", Strand::Plus),
        ]
    );
    assert_eq!(hits[1].priority, 1);
    assert_eq!((hits[1].element_start, hits[1].element_end), (900, 902));
}

#[test]
fn test_dedup_and_write() {
    let dir = setup();
    let loader = AnnotationLoader::default();
    let index = loader.load_path(dir.path().join("annotation.gtf.gz")).unwrap();
    let peaks = read_peaks_path(dir.path().join("peaks.bed")).unwrap();
    let locator = PeakLocator::new(&index, loader.priorities());

    let mut hits: Vec<_> = peaks.iter().flat_map(|p| locator.locate(p)).collect();
    hits.extend(locator.locate(&peaks[0]));
    let unique = dedup_hits(hits);
    assert_eq!(unique.len(), 5);

    let out_path = dir.path().join("hits.tsv");
    let mut out = std::fs::File::create(&out_path).unwrap();
    write_hits(&mut out, &unique).unwrap();
    drop(out);

    let text = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("chr\tstrand\tstart"));
    assert_eq!(lines.count(), 5);
}

#[test]
fn test_missing_annotation_file() {
    let dir = TempDir::new().unwrap();
    let err = AnnotationLoader::default()
        .load_path(dir.path().join("absent.gtf"))
        .unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound(_)));
}

#[test]
fn test_cli_locate_unique() {
    let dir = setup();
    let output = dir.path().join("out.tsv");

    let status = Command::new(env!("CARGO_BIN_EXE_fast-peakmap"))
        .arg("locate")
        .arg(dir.path().join("annotation.gtf.gz"))
        .arg(dir.path().join("peaks.bed"))
        .arg(&output)
        .args(["--threads", "2", "--unique"])
        .status()
        .unwrap();
    assert!(status.success());

    let text = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<Vec<&str>> = text.lines().skip(1).map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.len() == 11));
    // sorted by chromosome first
    assert_eq!(rows[0][0], "chr1");
    assert_eq!(rows[4][0], "chr2");
}

#[test]
fn test_cli_query_with_custom_elements() {
    let dir = setup();
    let output = Command::new(env!("CARGO_BIN_EXE_fast-peakmap"))
        .arg("query")
        .arg(dir.path().join("annotation.gtf.gz"))
        .args(["chr1", "+", "150", "--element", "five_prime_utr=7"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<&str> = stdout.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains("GA1\tTA1\tfive_prime_utr\t100\t199\t7"));
}

#[test]
fn test_cli_reports_bad_annotation() {
    let dir = TempDir::new().unwrap();
    let gtf = dir.path().join("bad.gtf");
    std::fs::write(&gtf, "chr1\tsrc\tCDS\tten\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n")
        .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_fast-peakmap"))
        .arg("stats")
        .arg(&gtf)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 1"));
}
