//! GTF record parsing
//!
//! Zero-copy splitting of the nine tab-separated GTF columns plus extraction
//! of the `gene_id` / `transcript_id` attributes. GTF coordinates are 1-based
//! and inclusive, which is also what the interval index uses, so no
//! conversion happens here.

use crate::core::{GtfParseError, IntervalError};
use crate::core::{Interval, Strand};
use memchr::memchr;
use regex::Regex;

/// Number of mandatory GTF columns
pub const GTF_FIELDS: usize = 9;

/// Zero-copy GTF record view
///
/// seqname, source, feature, start, end, score, strand, frame, attributes
pub struct GtfRecordView<'a> {
    /// Sequence name (chromosome)
    pub seqname: &'a str,
    pub source: &'a str,
    /// Feature kind (exon, CDS, stop_codon, ...)
    pub feature: &'a str,
    /// Start position (1-based)
    pub start: u64,
    /// End position (1-based, inclusive)
    pub end: u64,
    pub score: &'a str,
    /// `None` for unstranded (`.`) records
    pub strand: Option<Strand>,
    pub frame: &'a str,
    pub attributes: &'a str,
}

impl<'a> GtfRecordView<'a> {
    /// Parse a GTF line with minimal allocation
    ///
    /// Columns past the ninth are ignored.
    pub fn parse(line: &'a [u8]) -> Result<Self, GtfParseError> {
        if line.is_empty() {
            return Err(GtfParseError::EmptyLine);
        }

        let mut field_bounds = Vec::with_capacity(GTF_FIELDS);
        let mut start_pos = 0;
        while field_bounds.len() < GTF_FIELDS {
            match memchr(b'\t', &line[start_pos..]) {
                Some(tab_pos) => {
                    let end_pos = start_pos + tab_pos;
                    field_bounds.push((start_pos, end_pos));
                    start_pos = end_pos + 1;
                }
                None => {
                    field_bounds.push((start_pos, line.len()));
                    break;
                }
            }
        }

        if field_bounds.len() < GTF_FIELDS {
            return Err(GtfParseError::TooFewFields {
                expected: GTF_FIELDS,
                found: field_bounds.len(),
            });
        }

        let get_field = |idx: usize, name: &'static str| -> Result<&'a str, GtfParseError> {
            let (start, end) = field_bounds[idx];
            std::str::from_utf8(&line[start..end]).map_err(|_| GtfParseError::InvalidUtf8(name))
        };
        let get_number = |idx: usize, name: &'static str| -> Result<u64, GtfParseError> {
            let raw = get_field(idx, name)?;
            raw.trim()
                .parse()
                .map_err(|_| GtfParseError::InvalidNumber(name, raw.to_string()))
        };

        let strand_char = get_field(6, "strand")?;
        let strand = match strand_char {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            "." => None,
            _ => return Err(GtfParseError::InvalidStrand(strand_char.to_string())),
        };

        // Everything up to the end of the line belongs to the attribute column
        let (attr_start, _) = field_bounds[8];
        let attributes = std::str::from_utf8(&line[attr_start..])
            .map_err(|_| GtfParseError::InvalidUtf8("attributes"))?;

        Ok(Self {
            seqname: get_field(0, "seqname")?,
            source: get_field(1, "source")?,
            feature: get_field(2, "feature")?,
            start: get_number(3, "start")?,
            end: get_number(4, "end")?,
            score: get_field(5, "score")?,
            strand,
            frame: get_field(7, "frame")?,
            attributes,
        })
    }

    /// Closed interval of this record
    pub fn interval(&self) -> Result<Interval, IntervalError> {
        Interval::new(self.start, self.end)
    }
}

/// Extracts `gene_id` and `transcript_id` values from GTF attribute strings
///
/// Identifiers must be an uppercase prefix followed by digits, as in
/// `ENSG00000223972`; versioned ids such as `ENSG00000223972.5` are rejected.
#[derive(Debug, Clone)]
pub struct AttributeParser {
    gene_pattern: Regex,
    transcript_pattern: Regex,
}

impl Default for AttributeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeParser {
    pub fn new() -> Self {
        Self {
            gene_pattern: Regex::new(r#"gene_id "([A-Z]+[0-9]+)""#)
                .expect("gene_id pattern is a valid regex"),
            transcript_pattern: Regex::new(r#"transcript_id "([A-Z]+[0-9]+)""#)
                .expect("transcript_id pattern is a valid regex"),
        }
    }

    /// First `gene_id "<ID>"` value in `attributes`
    pub fn gene_id<'a>(&self, attributes: &'a str) -> Result<&'a str, GtfParseError> {
        Self::capture(&self.gene_pattern, attributes, "gene_id")
    }

    /// First `transcript_id "<ID>"` value in `attributes`
    pub fn transcript_id<'a>(&self, attributes: &'a str) -> Result<&'a str, GtfParseError> {
        Self::capture(&self.transcript_pattern, attributes, "transcript_id")
    }

    fn capture<'a>(
        pattern: &Regex,
        attributes: &'a str,
        name: &'static str,
    ) -> Result<&'a str, GtfParseError> {
        pattern
            .captures(attributes)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or(GtfParseError::MissingAttribute(name))
    }
}
