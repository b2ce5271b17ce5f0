//! Core annotation indexing functionality
//!
//! This module contains the interval tree, the streaming GTF loader, the
//! chromosome/strand index and the peak locator.

mod error;
mod index;
mod interval;
pub mod io;
pub mod loader;
pub mod locator;
pub mod tree;

pub use error::{
    GroupLevel, GtfParseError, IntervalError, LoadError, LoadResult, PeakMapError,
    PeakParseError, PeakResult, Result,
};
pub use index::{AnnotationIndex, ChromosomeEntry, IndexSummary, Strand, StrandSlot};
pub use interval::{overlaps, Interval};
pub use io::{
    detect_compression, open_text, CompressionFormat, LineIterator, MappedReader, PlainReader,
    DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use loader::{AnnotationLoader, ElementPriority, LoadStats, PriorityPair};
pub use locator::{dedup_hits, write_hits, LocateStats, PeakHit, PeakLocator};
pub use tree::{Color, InOrder, IntervalNode, IntervalTree, NodeId, NodeKind};
