//! Peak file reader
//!
//! Reads BED-style peak calls (MACS, MeTPeak, exomePeak, ...) and reduces each
//! record to the values needed to query the annotation index: chromosome,
//! strand, a single center position and the peak length.
//!
//! BED coordinates are 0-based half-open; the center is reported 1-based so
//! it can be compared directly with GTF coordinates.
//!
//! Split peaks (BED12 with `blockCount > 1`) are measured over their blocks
//! only: the length is the sum of the block sizes, and the center is the
//! `length / 2 + 1`-th covered base counted from `chromStart` through the
//! blocks, skipping the gaps between them.

use crate::core::{PeakMapError, PeakParseError, PeakResult};
use crate::core::io::open_text;
use crate::core::Strand;
use memchr::memchr;
use std::io::BufRead;
use std::path::Path;

/// Minimum number of BED columns
const MIN_FIELDS: usize = 3;

/// Columns required before block fields are used
const BED12_FIELDS: usize = 12;

/// A peak reduced to its query position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peak {
    pub chrom: String,
    /// 0-based start as written in the file
    pub start: u64,
    /// Exclusive end as written in the file
    pub end: u64,
    pub strand: Strand,
    /// 1-based center position
    pub center: u64,
    /// Covered bases
    pub length: u64,
}

/// Split a line on tabs using memchr
fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(BED12_FIELDS);
    let mut start_pos = 0;
    while let Some(tab_pos) = memchr(b'\t', &bytes[start_pos..]) {
        fields.push(&line[start_pos..start_pos + tab_pos]);
        start_pos += tab_pos + 1;
    }
    fields.push(&line[start_pos..]);
    fields
}

fn parse_u64(value: &str, field: &'static str, line: usize) -> PeakResult<u64> {
    value.trim().parse().map_err(|_| PeakParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

/// Comma separated list, tolerating the trailing comma UCSC tools write
fn parse_list(value: &str, field: &'static str, line: usize) -> PeakResult<Vec<u64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_u64(s, field, line))
        .collect()
}

/// Center of a split peak; `sizes` and `starts` hold one entry per block
fn block_center(start: u64, sizes: &[u64], starts: &[u64]) -> u64 {
    let length: u64 = sizes.iter().sum();
    let target = length / 2 + 1;
    let mut covered = 0;
    for (size, offset) in sizes.iter().zip(starts) {
        if target <= covered + size {
            return start + offset + (target - covered);
        }
        covered += size;
    }
    // only reached when no block covers any base
    match (sizes.last(), starts.last()) {
        (Some(size), Some(offset)) => start + offset + size,
        _ => start + target,
    }
}

/// Parse one BED line into a [`Peak`]
///
/// Lines with fewer than twelve columns, or with `blockCount <= 1`, are
/// treated as a single block. A missing or `.` strand is taken as `+`.
pub fn parse_peak_line(line: &str, line_number: usize) -> PeakResult<Peak> {
    let fields = split_fields(line);
    if fields.len() < MIN_FIELDS {
        return Err(PeakParseError::TooFewFields {
            line: line_number,
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let chrom = fields[0].to_string();
    let start = parse_u64(fields[1], "start", line_number)?;
    let end = parse_u64(fields[2], "end", line_number)?;
    if start > end {
        return Err(PeakParseError::InvalidRange {
            line: line_number,
            start,
            end,
        });
    }

    let strand = fields
        .get(5)
        .and_then(|s| s.trim().chars().next())
        .and_then(Strand::from_char)
        .unwrap_or(Strand::Plus);

    let (center, length) = if fields.len() >= BED12_FIELDS {
        let count = parse_u64(fields[9], "blockCount", line_number)? as usize;
        let sizes = parse_list(fields[10], "blockSizes", line_number)?;
        let starts = parse_list(fields[11], "blockStarts", line_number)?;
        if count > 1 {
            if sizes.len() < count || starts.len() < count {
                return Err(PeakParseError::InvalidBlocks {
                    line: line_number,
                    message: format!(
                        "blockCount is {} but found {} sizes and {} starts",
                        count,
                        sizes.len(),
                        starts.len()
                    ),
                });
            }
            let sizes = &sizes[..count];
            let length: u64 = sizes.iter().sum();
            (block_center(start, sizes, &starts[..count]), length)
        } else {
            let length = sizes.first().copied().unwrap_or(end - start);
            (start + length / 2 + 1, length)
        }
    } else {
        let length = end - start;
        (start + length / 2 + 1, length)
    };

    Ok(Peak {
        chrom,
        start,
        end,
        strand,
        center,
        length,
    })
}

/// Read all peaks from a reader
///
/// Blank, `#`, `track` and `browser` lines are skipped.
pub fn read_peaks<R: BufRead>(reader: R) -> Result<Vec<Peak>, PeakMapError> {
    let mut peaks = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim_end();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("track")
            || trimmed.starts_with("browser")
        {
            continue;
        }
        peaks.push(parse_peak_line(trimmed, idx + 1)?);
    }
    Ok(peaks)
}

/// Read all peaks from a file (plain, gzip or bzip2)
pub fn read_peaks_path<P: AsRef<Path>>(path: P) -> Result<Vec<Peak>, PeakMapError> {
    read_peaks(open_text(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed3_peak() {
        let peak = parse_peak_line("chr1\t100\t200", 1).unwrap();
        assert_eq!(peak.chrom, "chr1");
        assert_eq!(peak.start, 100);
        assert_eq!(peak.end, 200);
        assert_eq!(peak.strand, Strand::Plus);
        assert_eq!(peak.length, 100);
        assert_eq!(peak.center, 151);
    }

    #[test]
    fn test_bed6_strand() {
        let peak = parse_peak_line("chr1\t100\t200\tpeak1\t0\t-", 1).unwrap();
        assert_eq!(peak.strand, Strand::Minus);

        let peak = parse_peak_line("chr1\t100\t200\tpeak1\t0\t.", 1).unwrap();
        assert_eq!(peak.strand, Strand::Plus);
    }

    #[test]
    fn test_bed12_single_block() {
        let line = "chr2\t1000\t1100\tp\t0\t+\t1000\t1100\t0\t1\t100,\t0,";
        let peak = parse_peak_line(line, 1).unwrap();
        assert_eq!(peak.length, 100);
        assert_eq!(peak.center, 1051);
    }

    #[test]
    fn test_bed12_center_in_first_block() {
        // 60 + 40 bases, target base 51 falls inside the first block
        let line = "chr2\t1000\t1200\tp\t0\t+\t1000\t1200\t0\t2\t60,40,\t0,160,";
        let peak = parse_peak_line(line, 1).unwrap();
        assert_eq!(peak.length, 100);
        assert_eq!(peak.center, 1051);
    }

    #[test]
    fn test_bed12_center_skips_gap() {
        // 30 + 70 bases, target base 51 is the 21st base of the second block
        let line = "chr2\t1000\t1300\tp\t0\t-\t1000\t1300\t0\t2\t30,70,\t0,230,";
        let peak = parse_peak_line(line, 1).unwrap();
        assert_eq!(peak.length, 100);
        assert_eq!(peak.center, 1000 + 230 + 21);
        assert_eq!(peak.strand, Strand::Minus);
    }

    #[test]
    fn test_bed12_center_on_block_end() {
        // 3 + 2 bases, target base 3 is the last base of the first block
        let line = "chr1\t100\t112\tp\t0\t+\t100\t112\t0\t2\t3,2,\t0,10,";
        let peak = parse_peak_line(line, 1).unwrap();
        assert_eq!(peak.length, 5);
        assert_eq!(peak.center, 103);

        // 50 + 50 bases, target base 51 is the first base of the second block
        assert_eq!(block_center(0, &[50, 50], &[0, 100]), 101);
        // 2 + 2 bases, target base 3 is the first base of the second block
        assert_eq!(block_center(0, &[2, 2], &[0, 10]), 11);
        // 4 + 1 bases, target base 3 stays inside the first block
        assert_eq!(block_center(0, &[4, 1], &[0, 10]), 3);
    }

    #[test]
    fn test_block_center_short_peak() {
        assert_eq!(block_center(10, &[1], &[0]), 11);
        assert_eq!(block_center(10, &[], &[]), 11);
    }

    #[test]
    fn test_bed12_missing_blocks() {
        let line = "chr2\t1000\t1300\tp\t0\t+\t1000\t1300\t0\t3\t30,70,\t0,230,";
        assert!(matches!(
            parse_peak_line(line, 4),
            Err(PeakParseError::InvalidBlocks { line: 4, .. })
        ));
    }

    #[test]
    fn test_invalid_lines() {
        assert!(matches!(
            parse_peak_line("chr1\t100", 2),
            Err(PeakParseError::TooFewFields { line: 2, found: 2, .. })
        ));
        assert!(matches!(
            parse_peak_line("chr1\tabc\t200", 3),
            Err(PeakParseError::InvalidNumber { field: "start", .. })
        ));
        assert!(matches!(
            parse_peak_line("chr1\t300\t200", 5),
            Err(PeakParseError::InvalidRange { start: 300, end: 200, .. })
        ));
    }

    #[test]
    fn test_read_peaks_skips_headers() {
        let data = b"track name=peaks\n# comment\n\nchr1\t0\t10\nchr2\t20\t40\t.\t0\t-\n";
        let peaks = read_peaks(&data[..]).unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[1].chrom, "chr2");
        assert_eq!(peaks[1].center, 31);
    }

    #[test]
    fn test_read_peaks_reports_line() {
        let data = b"chr1\t0\t10\nchr1\tx\t10\n";
        match read_peaks(&data[..]) {
            Err(PeakMapError::Peak(PeakParseError::InvalidNumber { line, .. })) => {
                assert_eq!(line, 2)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
