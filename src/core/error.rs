//! Error types for FastPeakMap
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FastPeakMap operations
#[derive(Debug, Error)]
pub enum PeakMapError {
    /// Annotation loading errors
    #[error("Annotation load error: {0}")]
    Load(#[from] LoadError),

    /// Peak file parsing errors
    #[error("Peak parse error: {0}")]
    Peak(#[from] PeakParseError),

    /// Interval construction errors
    #[error("Interval error: {0}")]
    Interval(#[from] IntervalError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural violations raised when building intervals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// Interval start lies after its end
    #[error("Invalid interval: start ({start}) > end ({end})")]
    InvalidRange { start: u64, end: u64 },
}

/// Errors raised while parsing a single GTF record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GtfParseError {
    #[error("Empty line")]
    EmptyLine,

    #[error("Too few fields: expected {expected}, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("Invalid UTF-8 in field: {0}")]
    InvalidUtf8(&'static str),

    #[error("Invalid number in field {0}: {1}")]
    InvalidNumber(&'static str, String),

    #[error("Invalid strand: {0}")]
    InvalidStrand(String),

    /// `gene_id` or `transcript_id` missing, or not of the form `[A-Z]+[0-9]+`
    #[error("Missing or malformed {0} attribute")]
    MissingAttribute(&'static str),
}

/// Grouping level of the annotation hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupLevel {
    Chromosome,
    Gene,
    Transcript,
}

impl std::fmt::Display for GroupLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupLevel::Chromosome => write!(f, "chromosome"),
            GroupLevel::Gene => write!(f, "gene"),
            GroupLevel::Transcript => write!(f, "transcript"),
        }
    }
}

/// Errors that abort an annotation load
///
/// Chromosome groups finalized before the failing line stay in the index.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Malformed record
    #[error("Parse error at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: GtfParseError,
    },

    /// Record whose interval has start > end
    #[error("Structural violation at line {line}: {source}")]
    Structure {
        line: usize,
        #[source]
        source: IntervalError,
    },

    /// A group id reappeared after its group was closed (order validation only)
    #[error("Unsorted input at line {line}: {level} '{id}' appears after its group was closed")]
    UnsortedInput {
        line: usize,
        level: GroupLevel,
        id: String,
    },

    /// Annotation file not found
    #[error("Annotation file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error during loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Line number the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Parse { line, .. }
            | LoadError::Structure { line, .. }
            | LoadError::UnsortedInput { line, .. } => Some(*line),
            LoadError::FileNotFound(_) | LoadError::Io(_) => None,
        }
    }
}

/// Errors that can occur while reading peak (BED) files
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeakParseError {
    #[error("Too few fields at line {line}: expected at least {expected}, found {found}")]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid {field} value '{value}' at line {line}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Invalid block layout at line {line}: {message}")]
    InvalidBlocks { line: usize, message: String },

    #[error("Invalid peak range at line {line}: start ({start}) > end ({end})")]
    InvalidRange { line: usize, start: u64, end: u64 },
}

/// Result type alias for FastPeakMap operations
pub type Result<T> = std::result::Result<T, PeakMapError>;

/// Result type alias for annotation loading
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Result type alias for peak parsing
pub type PeakResult<T> = std::result::Result<T, PeakParseError>;
