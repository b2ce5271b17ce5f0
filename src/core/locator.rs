//! Peak locating
//!
//! Resolves each peak center against the annotation index: gene tree on the
//! peak's strand, then the transcript tree of every matching gene, then the
//! element tree of every matching transcript. Each element that contains the
//! center becomes one [`PeakHit`].

use crate::core::index::{AnnotationIndex, Strand};
use crate::core::loader::ElementPriority;
use crate::formats::peak::Peak;
use rayon::prelude::*;
use std::io::{self, Write};

/// Chunk size for parallel processing
const CHUNK_SIZE: usize = 1024;

/// Priority used for element kinds missing from the priority table
pub const UNRANKED: u32 = u32::MAX;

/// Column header written by [`write_hits`]
pub const HIT_HEADER: &str =
    "chr\tstrand\tstart\tend\tcenter\tgene_id\ttranscript_id\telement\telement_start\telement_end\tpriority";

/// One peak center falling inside one annotated element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakHit {
    pub chrom: String,
    pub strand: Strand,
    pub peak_start: u64,
    pub peak_end: u64,
    pub center: u64,
    pub gene_id: String,
    pub transcript_id: String,
    pub element: String,
    pub element_start: u64,
    pub element_end: u64,
    /// Smaller is preferred
    pub priority: u32,
}

impl PeakHit {
    /// Format as a TSV line (without newline)
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.strand,
            self.peak_start,
            self.peak_end,
            self.center,
            self.gene_id,
            self.transcript_id,
            self.element,
            self.element_start,
            self.element_end,
            self.priority
        )
    }
}

/// Counters for a batch of located peaks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateStats {
    pub peaks: usize,
    /// Peaks with at least one hit
    pub located: usize,
    pub hits: usize,
}

/// Read-only view over an index and the priorities used to rank hits
#[derive(Debug, Clone, Copy)]
pub struct PeakLocator<'a> {
    index: &'a AnnotationIndex,
    priorities: &'a ElementPriority,
}

impl<'a> PeakLocator<'a> {
    pub fn new(index: &'a AnnotationIndex, priorities: &'a ElementPriority) -> Self {
        Self { index, priorities }
    }

    /// All elements containing the peak center, in search order
    pub fn locate(&self, peak: &Peak) -> Vec<PeakHit> {
        let point = peak.center;
        let mut hits = Vec::new();
        for gene in self.index.query(&peak.chrom, peak.strand, point) {
            let Some(transcripts) = gene.composition() else {
                continue;
            };
            for transcript in transcripts.search(point) {
                let Some(elements) = transcript.composition() else {
                    continue;
                };
                for element in elements.search(point) {
                    hits.push(PeakHit {
                        chrom: peak.chrom.clone(),
                        strand: peak.strand,
                        peak_start: peak.start,
                        peak_end: peak.end,
                        center: point,
                        gene_id: gene.identity().to_string(),
                        transcript_id: transcript.identity().to_string(),
                        element: element.identity().to_string(),
                        element_start: element.start(),
                        element_end: element.end(),
                        priority: self.priorities.get(element.identity()).unwrap_or(UNRANKED),
                    });
                }
            }
        }
        hits
    }

    /// Locate a batch of peaks on a rayon pool
    ///
    /// Hits are returned grouped by peak, in input order.
    pub fn locate_all(&self, peaks: &[Peak], threads: usize) -> io::Result<(Vec<PeakHit>, LocateStats)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to create thread pool: {}", e)))?;

        let chunks: Vec<(Vec<PeakHit>, usize)> = pool.install(|| {
            peaks
                .par_chunks(CHUNK_SIZE)
                .map(|chunk| {
                    let mut hits = Vec::new();
                    let mut located = 0;
                    for peak in chunk {
                        let peak_hits = self.locate(peak);
                        if !peak_hits.is_empty() {
                            located += 1;
                        }
                        hits.extend(peak_hits);
                    }
                    (hits, located)
                })
                .collect()
        });

        let mut stats = LocateStats {
            peaks: peaks.len(),
            ..Default::default()
        };
        let mut hits = Vec::with_capacity(chunks.iter().map(|(h, _)| h.len()).sum());
        for (chunk_hits, located) in chunks {
            stats.located += located;
            hits.extend(chunk_hits);
        }
        stats.hits = hits.len();
        Ok((hits, stats))
    }
}

/// Keep one hit per peak and priority
///
/// Hits are sorted by chromosome, strand, peak start, peak end and priority;
/// the first hit of each such key is kept.
pub fn dedup_hits(mut hits: Vec<PeakHit>) -> Vec<PeakHit> {
    // stable sort so ties keep search order
    hits.sort_by(|a, b| {
        (&a.chrom, a.strand, a.peak_start, a.peak_end, a.priority)
            .cmp(&(&b.chrom, b.strand, b.peak_start, b.peak_end, b.priority))
    });
    hits.dedup_by(|later, first| {
        later.chrom == first.chrom
            && later.strand == first.strand
            && later.peak_start == first.peak_start
            && later.peak_end == first.peak_end
            && later.priority == first.priority
    });
    hits
}

/// Write hits as TSV with a header line
pub fn write_hits<W: Write>(writer: &mut W, hits: &[PeakHit]) -> io::Result<()> {
    writeln!(writer, "{}", HIT_HEADER)?;
    for hit in hits {
        writeln!(writer, "{}", hit.to_tsv())?;
    }
    Ok(())
}
