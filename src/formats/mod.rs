//! File format adapters
//!
//! Readers for the two inputs of a run: GTF annotations and BED peak calls.

pub mod gtf;
pub mod peak;

pub use gtf::{AttributeParser, GtfRecordView, GTF_FIELDS};
pub use peak::{parse_peak_line, read_peaks, read_peaks_path, Peak};
