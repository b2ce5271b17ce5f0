//! Annotation index
//!
//! Chromosome -> strand -> gene tree. Each gene node owns a transcript tree
//! and each transcript node owns an element tree, so a point query resolves
//! the strand slot here and then descends through the compositions.

use crate::core::interval::Interval;
use crate::core::tree::{IntervalNode, IntervalTree};
use std::collections::HashMap;

/// Strand orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    /// Parse strand from char
    ///
    /// # Examples
    /// ```
    /// use fast_peakmap::core::Strand;
    /// assert_eq!(Strand::from_char('+'), Some(Strand::Plus));
    /// assert_eq!(Strand::from_char('-'), Some(Strand::Minus));
    /// assert_eq!(Strand::from_char('.'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl std::str::FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            _ => Err(format!("Invalid strand '{}', expected '+' or '-'", s)),
        }
    }
}

/// Genes of one strand of one chromosome
#[derive(Debug, Clone, Default)]
pub struct StrandSlot {
    /// `(min start, max end)` over the genes; `None` when the strand has none
    spanning_interval: Option<Interval>,
    gene_tree: IntervalTree,
}

impl StrandSlot {
    /// Fold gene nodes into a tree, in the given order
    pub fn from_genes(genes: Vec<IntervalNode>) -> Self {
        let spanning_interval = Interval::spanning(genes.iter().map(|g| g.interval()));
        Self {
            spanning_interval,
            gene_tree: IntervalTree::from_nodes(genes),
        }
    }

    pub fn spanning_interval(&self) -> Option<Interval> {
        self.spanning_interval
    }

    pub fn gene_tree(&self) -> &IntervalTree {
        &self.gene_tree
    }

    /// Gene nodes containing `point`
    ///
    /// Points outside the spanning interval return without touching the tree.
    pub fn search(&self, point: u64) -> Vec<&IntervalNode> {
        match self.spanning_interval {
            Some(span) if span.contains(point) => self.gene_tree.search(point),
            _ => Vec::new(),
        }
    }
}

/// Both strand slots of a chromosome
#[derive(Debug, Clone, Default)]
pub struct ChromosomeEntry {
    pub plus: StrandSlot,
    pub minus: StrandSlot,
}

impl ChromosomeEntry {
    pub fn strand(&self, strand: Strand) -> &StrandSlot {
        match strand {
            Strand::Plus => &self.plus,
            Strand::Minus => &self.minus,
        }
    }
}

/// Node counts per annotation level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub chromosomes: usize,
    pub genes: usize,
    pub transcripts: usize,
    pub elements: usize,
}

/// Chromosome -> strand -> gene tree
///
/// Entries are written once per chromosome by the loader and never updated
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    chroms: HashMap<String, ChromosomeEntry>,
    /// Normalized chromosome name mapping (lowercase, no "chr" -> original)
    chrom_aliases: HashMap<String, String>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a finalized chromosome, replacing any previous entry
    pub fn insert(&mut self, chrom: impl Into<String>, entry: ChromosomeEntry) {
        let chrom = chrom.into();
        self.chrom_aliases.insert(normalize_chrom_key(&chrom), chrom.clone());
        self.chroms.insert(chrom, entry);
    }

    /// Look up a chromosome, accepting "chr1" / "1" / "CHR1" style variants
    pub fn get(&self, chrom: &str) -> Option<&ChromosomeEntry> {
        if let Some(entry) = self.chroms.get(chrom) {
            return Some(entry);
        }
        self.chrom_aliases
            .get(&normalize_chrom_key(chrom))
            .and_then(|original| self.chroms.get(original))
    }

    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.get(chrom).is_some()
    }

    /// Exact-name membership, without the alias fallback of [`Self::get`]
    pub fn contains_exact(&self, chrom: &str) -> bool {
        self.chroms.contains_key(chrom)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chroms.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }

    /// Gene nodes on `chrom`/`strand` whose interval contains `point`
    ///
    /// Unknown chromosomes yield an empty result.
    pub fn query(&self, chrom: &str, strand: Strand, point: u64) -> Vec<&IntervalNode> {
        match self.get(chrom) {
            Some(entry) => entry.strand(strand).search(point),
            None => Vec::new(),
        }
    }

    /// Count nodes at every level
    pub fn summary(&self) -> IndexSummary {
        let mut summary = IndexSummary {
            chromosomes: self.chroms.len(),
            ..Default::default()
        };
        let slots = self.chroms.values().flat_map(|e| [&e.plus, &e.minus]);
        for gene in slots.flat_map(|slot| slot.gene_tree.nodes()) {
            summary.genes += 1;
            let transcripts = gene.composition().into_iter().flat_map(|t| t.nodes());
            for transcript in transcripts {
                summary.transcripts += 1;
                summary.elements += transcript.composition().map_or(0, |t| t.len());
            }
        }
        summary
    }
}

/// Normalize chromosome name for flexible matching
///
/// Converts to lowercase and removes the "chr" prefix.
fn normalize_chrom_key(chrom: &str) -> String {
    let lower = chrom.to_lowercase();
    match lower.strip_prefix("chr") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}
