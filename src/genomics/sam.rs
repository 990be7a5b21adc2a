//! Line-oriented SAM text reader.
//!
//! Only the fields needed for clip detection are interpreted: RNAME (3),
//! POS (4), CIGAR (6) and SEQ (10). Header lines are skipped, unplaced
//! records are reported as such, and structural problems fail with the
//! offending line number.

use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;

use crate::genomics::AlignmentRecord;

const MIN_FIELDS: usize = 10;
const RNAME: usize = 2;
const POS: usize = 3;
const CIGAR: usize = 5;
const SEQ: usize = 9;
/// Largest POS the SAM format allows (2^31 - 1).
const MAX_POSITION: i64 = (1 << 31) - 1;

/// Errors produced while reading alignment records.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Underlying read failure.
    #[error("failed to read line {line}: {source}")]
    Io {
        /// 1-based line number.
        line: usize,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Record line with fewer tab-separated fields than SAM requires.
    #[error("line {line}: expected at least 10 tab-separated fields, found {found}")]
    TooFewFields {
        /// 1-based line number.
        line: usize,
        /// Number of fields present.
        found: usize,
    },

    /// Field value that could not be interpreted.
    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidField {
        /// 1-based line number.
        line: usize,
        /// Field name (e.g. `POS`).
        field: &'static str,
        /// Raw field content.
        value: String,
    },

    /// Failure reported by htslib.
    #[error("record {record}: {source}")]
    Hts {
        /// 1-based record index.
        record: usize,
        /// htslib error.
        #[source]
        source: rust_htslib::errors::Error,
    },
}

/// One interpreted input line or record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamLine {
    /// `@XX` header line.
    Header,
    /// Record with no placement (RNAME `*`, POS `0`, CIGAR `*` or unmapped flag).
    Unplaced {
        /// 1-based line (or record) number.
        line: usize,
    },
    /// Placed alignment.
    Alignment {
        /// 1-based line (or record) number.
        line: usize,
        /// Record content.
        record: AlignmentRecord,
    },
}

/// Whether `field` is a SAM header tag: `@` followed by two uppercase letters.
pub fn is_header_tag(field: &str) -> bool {
    let bytes = field.as_bytes();
    bytes.len() == 3 && bytes[0] == b'@' && bytes[1..].iter().all(u8::is_ascii_uppercase)
}

/// Interpret a single SAM line (without its line terminator).
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_sam_line(text: &str, line: usize) -> Result<Option<SamLine>, ReaderError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = text.split('\t').collect();
    if is_header_tag(fields[0]) {
        return Ok(Some(SamLine::Header));
    }
    if fields.len() < MIN_FIELDS {
        return Err(ReaderError::TooFewFields {
            line,
            found: fields.len(),
        });
    }

    let reference_start: i64 = fields[POS].parse().map_err(|_| ReaderError::InvalidField {
        line,
        field: "POS",
        value: fields[POS].to_string(),
    })?;
    if !(0..=MAX_POSITION).contains(&reference_start) {
        return Err(ReaderError::InvalidField {
            line,
            field: "POS",
            value: fields[POS].to_string(),
        });
    }

    let reference_name = fields[RNAME];
    let operations = fields[CIGAR];
    if reference_name == "*" || reference_start == 0 || operations == "*" {
        return Ok(Some(SamLine::Unplaced { line }));
    }

    let sequence = fields[SEQ];
    let sequence_length = if sequence == "*" {
        None
    } else {
        Some(u32::try_from(sequence.len()).map_err(|_| ReaderError::InvalidField {
            line,
            field: "SEQ",
            value: format!("<{} bases>", sequence.len()),
        })?)
    };

    Ok(Some(SamLine::Alignment {
        line,
        record: AlignmentRecord::new(
            Arc::<str>::from(reference_name),
            reference_start,
            operations,
            sequence_length,
        ),
    }))
}

/// Iterator over the lines of a SAM text stream.
#[derive(Debug)]
pub struct SamReader<R> {
    inner: R,
    buffer: String,
    line: usize,
}

impl<R: BufRead> SamReader<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: String::new(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for SamReader<R> {
    type Item = Result<SamLine, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            self.line += 1;
            match self.inner.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(ReaderError::Io {
                        line: self.line,
                        source,
                    }))
                }
            }

            let text = self.buffer.trim_end_matches(['\n', '\r']);
            match parse_sam_line(text, self.line) {
                Ok(None) => continue,
                Ok(Some(parsed)) => return Some(Ok(parsed)),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sam_record(rname: &str, pos: &str, cigar: &str, seq: &str) -> String {
        format!("read1\t0\t{rname}\t{pos}\t60\t{cigar}\t*\t0\t0\t{seq}\tIIIIIIII")
    }

    #[test]
    fn header_tags_are_recognised() {
        assert!(is_header_tag("@HD"));
        assert!(is_header_tag("@SQ"));
        assert!(is_header_tag("@PG"));
        assert!(!is_header_tag("@hd"));
        assert!(!is_header_tag("@H"));
        assert!(!is_header_tag("@HDX"));
        assert!(!is_header_tag("read@HD"));
    }

    #[test]
    fn parses_alignment_fields() {
        let line = sam_record("chr1", "100", "5M3S", "ACGTACGT");
        let parsed = parse_sam_line(&line, 7).unwrap().unwrap();
        assert_eq!(
            parsed,
            SamLine::Alignment {
                line: 7,
                record: AlignmentRecord::new("chr1", 100, "5M3S", Some(8)),
            }
        );
    }

    #[test]
    fn missing_sequence_has_no_length() {
        let line = sam_record("chr1", "100", "5H5M3S", "*");
        match parse_sam_line(&line, 1).unwrap().unwrap() {
            SamLine::Alignment { record, .. } => assert_eq!(record.sequence_length, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unplaced_records_are_flagged() {
        for line in [
            sam_record("*", "0", "*", "ACGT"),
            sam_record("chr1", "0", "4M", "ACGT"),
            sam_record("chr1", "10", "*", "ACGT"),
        ] {
            assert_eq!(
                parse_sam_line(&line, 3).unwrap(),
                Some(SamLine::Unplaced { line: 3 })
            );
        }
    }

    #[test]
    fn short_record_is_an_error() {
        let err = parse_sam_line("read1\t0\tchr1\t100\t60\t5M3S", 12).unwrap_err();
        assert!(matches!(err, ReaderError::TooFewFields { line: 12, found: 6 }));
    }

    #[test]
    fn non_numeric_position_is_an_error() {
        let line = sam_record("chr1", "abc", "5M", "ACGTA");
        let err = parse_sam_line(&line, 2).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidField { line: 2, field: "POS", .. }));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn position_beyond_sam_range_is_an_error() {
        let largest = sam_record("chr1", "2147483647", "5M3S", "ACGTACGT");
        assert!(matches!(
            parse_sam_line(&largest, 1).unwrap(),
            Some(SamLine::Alignment { .. })
        ));

        for pos in ["2147483648", "9223372036854775807", "-5"] {
            let line = sam_record("chr1", pos, "5M3S", "ACGTACGT");
            let err = parse_sam_line(&line, 4).unwrap_err();
            assert!(matches!(err, ReaderError::InvalidField { line: 4, field: "POS", .. }));
        }
    }

    #[test]
    fn reader_skips_blank_lines_and_tracks_line_numbers() {
        let text = format!(
            "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n\n{}\r\n{}\n",
            sam_record("chr1", "100", "5M3S", "ACGTACGT"),
            sam_record("*", "0", "*", "ACGT"),
        );
        let lines: Vec<_> = SamReader::new(Cursor::new(text))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], SamLine::Header);
        assert_eq!(lines[1], SamLine::Header);
        assert!(matches!(&lines[2], SamLine::Alignment { line: 4, .. }));
        assert_eq!(lines[3], SamLine::Unplaced { line: 5 });
    }
}
