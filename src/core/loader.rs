//! Streaming GTF loader
//!
//! Builds an [`AnnotationIndex`] in a single forward pass. Records are staged
//! per transcript; whenever the transcript, gene or chromosome id changes the
//! staged nodes of the level that just ended are folded into an
//! [`IntervalTree`] and wrapped in a node of the next level up:
//!
//! ```text
//! elements    --(transcript boundary)-->  transcript node (composition = element tree)
//! transcripts --(gene boundary)-------->  gene node       (composition = transcript tree)
//! genes       --(chromosome boundary)-->  strand slots written to the index
//! ```
//!
//! A chromosome change also closes the current gene and transcript, and a gene
//! change closes the current transcript. End of input closes everything.
//!
//! # Input order
//!
//! The input must be grouped by chromosome, then gene, then transcript. This
//! is not checked unless [`AnnotationLoader::with_order_validation`] is on; a
//! group that shows up again later is otherwise indexed a second time (and a
//! repeated chromosome replaces its earlier entry).

use crate::core::error::{GroupLevel, LoadError, LoadResult};
use crate::core::index::{AnnotationIndex, ChromosomeEntry, StrandSlot, Strand};
use crate::core::interval::Interval;
use crate::core::io::{open_text, LineIterator};
use crate::core::tree::{IntervalNode, IntervalTree};
use crate::formats::gtf::{AttributeParser, GtfRecordView};
use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

/// Feature kinds worth indexing, with their priority (smaller is preferred)
///
/// Only the key set matters to the loader; the priorities are used when
/// ranking and deduplicating peak hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPriority {
    priorities: HashMap<String, u32>,
}

impl Default for ElementPriority {
    /// stop_codon=1, three_prime_utr=2, CDS=3, five_prime_utr=4
    fn default() -> Self {
        Self::from_pairs([
            ("stop_codon", 1),
            ("three_prime_utr", 2),
            ("CDS", 3),
            ("five_prime_utr", 4),
        ])
    }
}

impl ElementPriority {
    /// An empty set; nothing is indexed until kinds are added
    pub fn empty() -> Self {
        Self {
            priorities: HashMap::new(),
        }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            priorities: pairs.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }

    pub fn insert(&mut self, kind: impl Into<String>, priority: u32) {
        self.priorities.insert(kind.into(), priority);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.priorities.contains_key(kind)
    }

    pub fn get(&self, kind: &str) -> Option<u32> {
        self.priorities.get(kind).copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.priorities.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }
}

/// A `kind=priority` pair as given on the command line, e.g. `CDS=3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityPair {
    pub kind: String,
    pub priority: u32,
}

impl FromStr for PriorityPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, priority) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected KIND=PRIORITY, got '{}'", s))?;
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(format!("Empty feature kind in '{}'", s));
        }
        let priority = priority
            .trim()
            .parse()
            .map_err(|_| format!("Invalid priority '{}' for {}", priority.trim(), kind))?;
        Ok(Self {
            kind: kind.to_string(),
            priority,
        })
    }
}

impl FromIterator<PriorityPair> for ElementPriority {
    fn from_iter<I: IntoIterator<Item = PriorityPair>>(pairs: I) -> Self {
        Self::from_pairs(pairs.into_iter().map(|p| (p.kind, p.priority)))
    }
}

/// Counters collected during a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub lines: usize,
    pub comments: usize,
    /// Records of an indexed feature kind
    pub records: usize,
    /// Records of any other kind
    pub skipped: usize,
    pub chromosomes: usize,
    /// Chromosome blocks that replaced an earlier block of the same name
    pub replaced_chromosomes: usize,
    pub genes: usize,
    pub transcripts: usize,
}

/// Identifiers of the last indexed record
#[derive(Debug, Clone)]
struct PrevRow {
    chrom: String,
    gene: String,
    transcript: String,
    strand: Option<Strand>,
}

/// Ids of groups that have been folded; only kept when validating order
#[derive(Debug, Default)]
struct ClosedGroups {
    chroms: HashSet<String>,
    genes: HashSet<String>,
    transcripts: HashSet<String>,
}

/// Nodes waiting for their group to end
#[derive(Debug, Default)]
struct Staging {
    elements: Vec<IntervalNode>,
    transcripts: Vec<IntervalNode>,
    plus_genes: Vec<IntervalNode>,
    minus_genes: Vec<IntervalNode>,
    closed: Option<ClosedGroups>,
}

impl Staging {
    fn fold_transcript(&mut self, prev: &PrevRow, stats: &mut LoadStats) {
        let Some(span) = Interval::spanning(self.elements.iter().map(|e| e.interval())) else {
            return;
        };
        let elements = IntervalTree::from_nodes(self.elements.drain(..));
        trace!(
            "transcript {} [{}] with {} elements",
            prev.transcript,
            span,
            elements.len()
        );
        self.transcripts
            .push(IntervalNode::transcript(span, prev.transcript.clone(), elements));
        stats.transcripts += 1;
        if let Some(closed) = self.closed.as_mut() {
            closed.transcripts.insert(prev.transcript.clone());
        }
    }

    fn fold_gene(&mut self, prev: &PrevRow, stats: &mut LoadStats) {
        let Some(span) = Interval::spanning(self.transcripts.iter().map(|t| t.interval())) else {
            return;
        };
        let transcripts = IntervalTree::from_nodes(self.transcripts.drain(..));
        trace!(
            "gene {} [{}] with {} transcripts",
            prev.gene,
            span,
            transcripts.len()
        );
        let gene = IntervalNode::gene(span, prev.gene.clone(), transcripts);
        match prev.strand {
            Some(Strand::Plus) => self.plus_genes.push(gene),
            Some(Strand::Minus) => self.minus_genes.push(gene),
            None => {
                debug!("gene {} is unstranded, indexing it on the - strand", prev.gene);
                self.minus_genes.push(gene);
            }
        }
        stats.genes += 1;
        if let Some(closed) = self.closed.as_mut() {
            closed.genes.insert(prev.gene.clone());
        }
    }

    fn fold_chromosome(&mut self, prev: &PrevRow, index: &mut AnnotationIndex, stats: &mut LoadStats) {
        let entry = ChromosomeEntry {
            plus: StrandSlot::from_genes(std::mem::take(&mut self.plus_genes)),
            minus: StrandSlot::from_genes(std::mem::take(&mut self.minus_genes)),
        };
        info!(
            "Indexed {}: {} genes on +, {} genes on -",
            prev.chrom,
            entry.plus.gene_tree().len(),
            entry.minus.gene_tree().len()
        );
        if index.contains_exact(&prev.chrom) {
            stats.replaced_chromosomes += 1;
            warn!(
                "Chromosome {} appears in more than one block; keeping the last block only",
                prev.chrom
            );
        }
        index.insert(prev.chrom.clone(), entry);
        stats.chromosomes += 1;
        if let Some(closed) = self.closed.as_mut() {
            closed.chroms.insert(prev.chrom.clone());
        }
    }

    /// Fail if a newly started group was already closed
    fn check_reopened(
        &self,
        line: usize,
        row: &PrevRow,
        chrom_changed: bool,
        gene_changed: bool,
        transcript_changed: bool,
    ) -> LoadResult<()> {
        let Some(closed) = self.closed.as_ref() else {
            return Ok(());
        };
        let reopened = if chrom_changed && closed.chroms.contains(&row.chrom) {
            Some((GroupLevel::Chromosome, &row.chrom))
        } else if gene_changed && closed.genes.contains(&row.gene) {
            Some((GroupLevel::Gene, &row.gene))
        } else if transcript_changed && closed.transcripts.contains(&row.transcript) {
            Some((GroupLevel::Transcript, &row.transcript))
        } else {
            None
        };
        match reopened {
            Some((level, id)) => Err(LoadError::UnsortedInput {
                line,
                level,
                id: id.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Single-pass GTF loader
#[derive(Debug, Clone)]
pub struct AnnotationLoader {
    priorities: ElementPriority,
    attributes: AttributeParser,
    validate_order: bool,
}

impl Default for AnnotationLoader {
    fn default() -> Self {
        Self::new(ElementPriority::default())
    }
}

impl AnnotationLoader {
    pub fn new(priorities: ElementPriority) -> Self {
        Self {
            priorities,
            attributes: AttributeParser::new(),
            validate_order: false,
        }
    }

    /// Reject inputs where a closed chromosome, gene or transcript reappears
    pub fn with_order_validation(mut self, validate: bool) -> Self {
        self.validate_order = validate;
        self
    }

    pub fn priorities(&self) -> &ElementPriority {
        &self.priorities
    }

    /// Load a GTF file (plain, gzip or bzip2)
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> LoadResult<AnnotationIndex> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::FileNotFound(path.to_path_buf()));
        }
        info!("Loading annotation: {}", path.display());
        self.load_reader(open_text(path)?)
    }

    /// Load from any buffered reader
    pub fn load_reader<R: BufRead>(&self, reader: R) -> LoadResult<AnnotationIndex> {
        let mut index = AnnotationIndex::new();
        let stats = self.load_into(reader, &mut index)?;
        info!(
            "Loaded {} chromosomes, {} genes, {} transcripts, {} elements",
            stats.chromosomes, stats.genes, stats.transcripts, stats.records
        );
        Ok(index)
    }

    /// Load into a caller-owned index
    ///
    /// On error the index keeps every chromosome finalized before the
    /// failing line; the group that was in progress is dropped.
    pub fn load_into<R: BufRead>(
        &self,
        reader: R,
        index: &mut AnnotationIndex,
    ) -> LoadResult<LoadStats> {
        let mut lines = LineIterator::new(reader);
        let mut stats = LoadStats::default();
        let mut staging = Staging {
            closed: self.validate_order.then(ClosedGroups::default),
            ..Default::default()
        };
        let mut prev: Option<PrevRow> = None;

        while let Some(line) = lines.next_line() {
            let line = line?;
            stats.lines += 1;
            let line_number = stats.lines;

            if line.starts_with('#') {
                stats.comments += 1;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            let parse_err = |source| LoadError::Parse {
                line: line_number,
                source,
            };
            let view = GtfRecordView::parse(line.as_bytes()).map_err(parse_err)?;
            if !self.priorities.contains(view.feature) {
                stats.skipped += 1;
                continue;
            }

            let transcript = self.attributes.transcript_id(view.attributes).map_err(parse_err)?;
            let gene = self.attributes.gene_id(view.attributes).map_err(parse_err)?;
            let interval = view.interval().map_err(|source| LoadError::Structure {
                line: line_number,
                source,
            })?;

            let row = PrevRow {
                chrom: view.seqname.to_string(),
                gene: gene.to_string(),
                transcript: transcript.to_string(),
                strand: view.strand,
            };

            if let Some(prev) = prev.as_ref() {
                let chrom_changed = prev.chrom != row.chrom;
                let gene_changed = chrom_changed || prev.gene != row.gene;
                let transcript_changed = gene_changed || prev.transcript != row.transcript;

                if transcript_changed {
                    staging.fold_transcript(prev, &mut stats);
                }
                if gene_changed {
                    staging.fold_gene(prev, &mut stats);
                }
                if chrom_changed {
                    staging.fold_chromosome(prev, index, &mut stats);
                }
                staging.check_reopened(
                    line_number,
                    &row,
                    chrom_changed,
                    gene_changed,
                    transcript_changed,
                )?;
            }

            staging
                .elements
                .push(IntervalNode::element(interval, view.feature));
            stats.records += 1;
            prev = Some(row);
        }

        if let Some(prev) = prev.as_ref() {
            staging.fold_transcript(prev, &mut stats);
            staging.fold_gene(prev, &mut stats);
            staging.fold_chromosome(prev, index, &mut stats);
        }

        debug!(
            "{} lines read, {} comments, {} records of other kinds skipped",
            stats.lines, stats.comments, stats.skipped
        );
        Ok(stats)
    }
}
