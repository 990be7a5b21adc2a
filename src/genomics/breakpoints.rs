//! Soft-clip breakpoint extraction for a single alignment record.

use std::sync::Arc;

use crate::genomics::{Cigar, CigarOp};

/// Read end at which a soft clip was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ClipSide {
    /// Clip before the first aligned base.
    Leading,
    /// Clip after the last aligned base.
    Trailing,
}

impl ClipSide {
    /// Lowercase label used in text output.
    pub fn as_str(self) -> &'static str {
        match self {
            ClipSide::Leading => "leading",
            ClipSide::Trailing => "trailing",
        }
    }
}

/// Candidate breakpoint implied by one soft-clipped read end.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Breakpoint {
    /// Chromosome of the owning record.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_chrom"))]
    pub chrom: Arc<str>,
    /// Reference coordinate of the breakpoint (1-based).
    pub position: i64,
    /// Which read end produced it.
    pub side: ClipSide,
}

#[cfg(feature = "serde")]
fn serialize_chrom<S: serde::Serializer>(chrom: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(chrom)
}

/// Coordinates of the leading and trailing clip breakpoints of one read.
///
/// `ops` must already exclude hard clips (see [`Cigar::aligned_ops`]). Only
/// the first and last operations are inspected; a lone soft clip satisfies
/// both checks. A trailing coordinate that does not fit in `i64` is dropped.
pub fn clip_positions(
    ops: &[CigarOp],
    reference_start: i64,
    sequence_length: u64,
) -> (Option<i64>, Option<i64>) {
    let leading = ops
        .first()
        .filter(|op| op.is_soft_clip())
        .map(|_| reference_start);

    let trailing = ops
        .last()
        .filter(|op| op.is_soft_clip())
        .and_then(|op| {
            i64::try_from(sequence_length)
                .ok()
                .and_then(|len| reference_start.checked_add(len))
                .and_then(|end| end.checked_sub(i64::from(op.len)))
        });

    (leading, trailing)
}

/// Breakpoints for one decoded record, tagged with its chromosome.
///
/// When `sequence_length` is `None` (SEQ not stored) the read length implied
/// by the CIGAR is used instead.
pub fn extract_breakpoints(
    chrom: &Arc<str>,
    reference_start: i64,
    cigar: &Cigar,
    sequence_length: Option<u32>,
) -> Vec<Breakpoint> {
    let sequence_length = sequence_length.map_or_else(|| cigar.query_len(), u64::from);
    let (leading, trailing) = clip_positions(cigar.aligned_ops(), reference_start, sequence_length);

    [(leading, ClipSide::Leading), (trailing, ClipSide::Trailing)]
        .into_iter()
        .filter_map(|(position, side)| {
            position.map(|position| Breakpoint {
                chrom: Arc::clone(chrom),
                position,
                side,
            })
        })
        .collect()
}
