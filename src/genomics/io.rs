use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use rust_htslib::bam::{self, Read as _};

use super::{AlignmentRecord, ReaderError, SamLine};

/// Binary (BAM/CRAM) alignment reader backed by htslib.
///
/// Yields the same [`SamLine`] items as the text reader so both feed the
/// caller identically. Record numbers stand in for line numbers.
pub struct HtsReader {
    reader: bam::Reader,
    names: Vec<Arc<str>>,
    record: bam::Record,
    index: usize,
}

impl std::fmt::Debug for HtsReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtsReader")
            .field("references", &self.names.len())
            .field("index", &self.index)
            .finish()
    }
}

impl HtsReader {
    /// Open a BAM, CRAM or SAM file through htslib.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, rust_htslib::errors::Error> {
        let reader = bam::Reader::from_path(path)?;
        let names = reader
            .header()
            .target_names()
            .into_iter()
            .map(|name| Arc::from(String::from_utf8_lossy(name).as_ref()))
            .collect();
        Ok(Self {
            reader,
            names,
            record: bam::Record::new(),
            index: 0,
        })
    }

    fn convert(&self) -> SamLine {
        let line = self.index;
        let record = &self.record;
        let tid = record.tid();
        if record.is_unmapped() || tid < 0 || record.cigar_len() == 0 {
            return SamLine::Unplaced { line };
        }
        let Some(reference_name) = self.names.get(tid as usize) else {
            return SamLine::Unplaced { line };
        };

        let mut operations = String::new();
        for op in record.cigar().iter() {
            // Writing into a String cannot fail.
            let _ = write!(operations, "{}{}", op.len(), op.char());
        }

        let sequence_length = match record.seq_len() {
            0 => None,
            len => u32::try_from(len).ok(),
        };

        SamLine::Alignment {
            line,
            record: AlignmentRecord::new(
                Arc::clone(reference_name),
                record.pos() + 1,
                operations,
                sequence_length,
            ),
        }
    }
}

impl Iterator for HtsReader {
    type Item = Result<SamLine, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let outcome = self.reader.read(&mut self.record)?;
        self.index += 1;
        Some(
            outcome
                .map(|()| self.convert())
                .map_err(|source| ReaderError::Hts {
                    record: self.index,
                    source,
                }),
        )
    }
}
