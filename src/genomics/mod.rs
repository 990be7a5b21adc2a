//! Alignment interpretation and breakpoint classification.
//!
//! Records flow through this module leaf-first: CIGAR decoding
//! ([`parse_cigar`]), clip breakpoint extraction ([`extract_breakpoints`]),
//! per-chromosome tallies ([`BreakpointAggregator`]) and sliding-window
//! classification ([`WindowClassifier`]). Readers and the tabular writer sit
//! at either end.

mod bed;
mod breakpoints;
mod cigar;
mod counts;
mod io;
mod sam;
mod types;
mod window;

pub use bed::{render_bed, write_bed_line, BedPair, BedSide, BedWriteError, DigestWriter};
pub use breakpoints::{clip_positions, extract_breakpoints, Breakpoint, ClipSide};
pub use cigar::{parse_cigar, CigarParseError};
pub use counts::{BreakpointAggregator, BreakpointCounts, ChromosomeCounts};
pub use io::HtsReader;
pub use sam::{is_header_tag, parse_sam_line, ReaderError, SamLine, SamReader};
pub use types::{AlignmentRecord, Cigar, CigarOp, CigarOpKind};
pub use window::{ClassifiedBreakpoint, ClassifierError, WindowClassifier};
