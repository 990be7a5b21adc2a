use std::fmt;
use std::sync::Arc;

/// CIGAR operation kinds describing how a read aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CigarOpKind {
    /// Alignment match or mismatch (`M`).
    Match,
    /// Insertion relative to the reference (`I`).
    Insertion,
    /// Deletion from the reference (`D`).
    Deletion,
    /// Skipped reference region, e.g. an intron (`N`).
    Skip,
    /// Soft clipping: sequence present in the read only (`S`).
    SoftClip,
    /// Hard clipping: trimmed sequence not present in the read (`H`).
    HardClip,
    /// Silent deletion from a padded reference (`P`).
    Padding,
    /// Sequence match (`=`).
    SequenceMatch,
    /// Sequence mismatch (`X`).
    SequenceMismatch,
}

impl CigarOpKind {
    /// Decode an operation code letter.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'M' => Some(Self::Match),
            b'I' => Some(Self::Insertion),
            b'D' => Some(Self::Deletion),
            b'N' => Some(Self::Skip),
            b'S' => Some(Self::SoftClip),
            b'H' => Some(Self::HardClip),
            b'P' => Some(Self::Padding),
            b'=' => Some(Self::SequenceMatch),
            b'X' => Some(Self::SequenceMismatch),
            _ => None,
        }
    }

    /// Operation code letter as written in a CIGAR string.
    pub fn code(self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::Skip => 'N',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Padding => 'P',
            Self::SequenceMatch => '=',
            Self::SequenceMismatch => 'X',
        }
    }

    /// Whether the operation consumes bases of the stored read sequence.
    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Insertion
                | Self::SoftClip
                | Self::SequenceMatch
                | Self::SequenceMismatch
        )
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }

    /// Whether this operation is a soft clip.
    pub fn is_soft_clip(&self) -> bool {
        self.kind == CigarOpKind::SoftClip
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.code())
    }
}

/// Decoded CIGAR: the ordered operations of one alignment record.
///
/// Hard clips are retained so the string re-encodes losslessly; coordinate
/// arithmetic goes through [`Cigar::aligned_ops`], which leaves them out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar {
    ops: Vec<CigarOp>,
}

impl Cigar {
    /// Wrap an already decoded list of operations.
    pub fn from_ops(ops: Vec<CigarOp>) -> Self {
        Self { ops }
    }

    /// All operations in order, hard clips included.
    pub fn ops(&self) -> &[CigarOp] {
        &self.ops
    }

    /// Operations describing the stored read, with hard clips removed.
    ///
    /// Hard clips only ever sit at the outermost edges, so trimming them from
    /// both ends is equivalent to filtering them out.
    pub fn aligned_ops(&self) -> &[CigarOp] {
        let is_hard = |op: &CigarOp| op.kind == CigarOpKind::HardClip;
        let start = self.ops.iter().take_while(|op| is_hard(op)).count();
        let end = self.ops.len() - self.ops[start..].iter().rev().take_while(|op| is_hard(op)).count();
        &self.ops[start..end]
    }

    /// Number of read bases implied by the operations (M, I, S, =, X).
    ///
    /// Summed as `u64` so that any list of `u32` lengths fits.
    pub fn query_len(&self) -> u64 {
        self.ops
            .iter()
            .filter(|op| op.kind.consumes_query())
            .map(|op| u64::from(op.len))
            .sum()
    }

    /// Number of operations, hard clips included.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the CIGAR has no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

/// One placed alignment record as read from SAM/BAM input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    /// Reference contig/chromosome name (RNAME).
    pub reference_name: Arc<str>,
    /// 1-based leftmost reference coordinate (POS).
    pub reference_start: i64,
    /// Run-length encoded CIGAR string, still undecoded.
    pub operations: String,
    /// Length of the stored read sequence; `None` when SEQ is `*`.
    pub sequence_length: Option<u32>,
}

impl AlignmentRecord {
    /// Construct a new alignment record.
    pub fn new(
        reference_name: impl Into<Arc<str>>,
        reference_start: i64,
        operations: impl Into<String>,
        sequence_length: Option<u32>,
    ) -> Self {
        Self {
            reference_name: reference_name.into(),
            reference_start,
            operations: operations.into(),
            sequence_length,
        }
    }
}
