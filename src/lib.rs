//! FastPeakMap - Locate peaks on gene structure
//!
//! Builds a nested interval index (gene -> transcript -> element) from a GTF
//! annotation in one streaming pass and resolves peak centers against it.
//!
//! # Features
//!
//! - Single-pass GTF loading with hierarchical boundary detection
//! - Arena-backed interval trees, one per gene / transcript / strand
//! - Zero-copy GTF field splitting
//! - Parallel peak locating with rayon
//! - Support for compressed inputs (gzip, bzip2)
//!
//! # Example
//!
//! ```no_run
//! use fast_peakmap::{AnnotationLoader, PeakLocator};
//! use fast_peakmap::formats::read_peaks_path;
//!
//! # fn main() -> fast_peakmap::Result<()> {
//! let loader = AnnotationLoader::default();
//! let index = loader.load_path("gencode.gtf.gz")?;
//!
//! let peaks = read_peaks_path("peaks.bed")?;
//! let locator = PeakLocator::new(&index, loader.priorities());
//! for peak in &peaks {
//!     for hit in locator.locate(peak) {
//!         println!("{}", hit.to_tsv());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use crate::core::{
    dedup_hits, overlaps, write_hits, AnnotationIndex, AnnotationLoader, ElementPriority,
    Interval, IntervalNode, IntervalTree, LoadError, NodeKind, PeakHit, PeakLocator,
    PeakMapError, Result, Strand,
};
pub use crate::formats::{gtf, peak, Peak};
