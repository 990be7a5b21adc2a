//! # Soft-clip breakpoint calling
//!
//! Finds candidate structural-variant junctions from alignment records by
//! counting where reads are soft-clipped and keeping only positions whose
//! neighbourhood carries enough support.
//!
//! ## Pipeline
//!
//! 1. **Decode**: each record's CIGAR string becomes a list of operations
//! 2. **Extract**: a leading soft clip marks a breakpoint at the alignment
//!    start; a trailing one at `start + read_length - clip_length`
//! 3. **Aggregate**: breakpoints are tallied per chromosome and position
//! 4. **Classify**: once input is exhausted, every observed position is
//!    accepted or rejected on the mean count of a window centred on it
//!
//! ## Usage Example
//!
//! ```no_run
//! use clipcall::{BreakpointCaller, CallerConfig};
//!
//! let config = CallerConfig::default().with_window(5).with_threshold(4);
//! let caller = BreakpointCaller::new(config)?;
//! let summary = caller.run("sample.sam", "sample_softclips")?;
//! println!("{} hits, {} rejects", summary.hits, summary.rejects);
//! # Ok::<(), clipcall::CallerError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics;
/// Python bindings for exposing the caller to external runtimes.
#[cfg(feature = "python-bindings")]
pub mod python_bindings;

pub use genomics::{
    AlignmentRecord, Breakpoint, BreakpointAggregator, BreakpointCounts, ClassifiedBreakpoint,
    WindowClassifier,
};

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use genomics::{
    extract_breakpoints, parse_cigar, BedPair, BedSide, BedWriteError, CigarParseError,
    ClassifierError, DigestWriter, HtsReader, ReaderError, SamLine, SamReader,
};

/// Default sliding-window width.
pub const DEFAULT_WINDOW: usize = 3;
/// Default acceptance threshold for the windowed average.
pub const DEFAULT_THRESHOLD: i64 = 3;

/// What to do with a record whose CIGAR cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MalformedPolicy {
    /// Log a warning, count the record and carry on.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

/// Input encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// Pick from the file extension (`.bam`/`.cram` use htslib).
    #[default]
    Auto,
    /// Tab-separated SAM text.
    Sam,
    /// BAM or CRAM decoded by htslib.
    Hts,
}

impl InputFormat {
    /// Resolve `Auto` against a concrete path.
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            InputFormat::Auto => {
                let extension = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(str::to_ascii_lowercase);
                match extension.as_deref() {
                    Some("bam") | Some("cram") => InputFormat::Hts,
                    _ => InputFormat::Sam,
                }
            }
            other => other,
        }
    }
}

/// Configuration parameters for a calling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerConfig {
    /// Sliding-window width (must be odd).
    pub window: usize,
    /// Minimum windowed average for a position to be a hit; zero or below
    /// accepts every observed position.
    pub threshold: i64,
    /// Handling of undecodable CIGAR strings.
    pub malformed: MalformedPolicy,
    /// Input encoding.
    pub format: InputFormat,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            threshold: DEFAULT_THRESHOLD,
            malformed: MalformedPolicy::default(),
            format: InputFormat::default(),
        }
    }
}

impl CallerConfig {
    /// Set the window width.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the acceptance threshold.
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the malformed-record policy.
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }

    /// Set the input format.
    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = format;
        self
    }

    /// Check the configuration and build the classifier it describes.
    pub fn validate(&self) -> Result<WindowClassifier, ClassifierError> {
        WindowClassifier::new(self.window, self.threshold)
    }
}

/// Errors that can occur during a calling run.
#[derive(Error, Debug)]
pub enum CallerError {
    /// Window size is even or zero.
    #[error(transparent)]
    InvalidWindowSize(#[from] ClassifierError),

    /// CIGAR string could not be decoded (under [`MalformedPolicy::Abort`]).
    #[error("line {line}: {source}")]
    MalformedOperationString {
        /// 1-based line (or record) number.
        line: usize,
        /// Decoding failure.
        #[source]
        source: CigarParseError,
    },

    /// Input stream was structurally invalid.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Input file could not be opened.
    #[error("cannot open input {}: {source}", .path.display())]
    InputAccess {
        /// Offending path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Input file was opened but reading it failed.
    #[error("{}: {source}", .path.display())]
    Input {
        /// Offending path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<CallerError>,
    },

    /// Output file could not be created or written.
    #[error("cannot write output {}: {source}", .path.display())]
    OutputAccess {
        /// Offending path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Counters collected while consuming input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IngestStats {
    /// Header lines skipped.
    pub headers: usize,
    /// Placed alignment records examined.
    pub records: usize,
    /// Records without placement.
    pub unplaced: usize,
    /// Records skipped because their CIGAR could not be decoded.
    pub malformed: usize,
    /// Breakpoints found.
    pub breakpoints: usize,
}

/// Outcome of [`BreakpointCaller::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunSummary {
    /// Input counters.
    pub ingest: IngestStats,
    /// Chromosomes with at least one breakpoint.
    pub chromosomes: usize,
    /// Distinct `(chromosome, position)` pairs.
    pub positions: usize,
    /// Lines written to the hits file.
    pub hits: usize,
    /// Lines written to the rejects file.
    pub rejects: usize,
    /// Hits file path.
    pub hits_path: PathBuf,
    /// Rejects file path.
    pub rejects_path: PathBuf,
    /// blake3 digest of the hits file.
    pub hits_digest: String,
    /// blake3 digest of the rejects file.
    pub rejects_digest: String,
}

/// Classified breakpoints of one chromosome.
pub type ChromosomeCalls = (Arc<str>, Vec<ClassifiedBreakpoint>);

/// Boxed stream of interpreted input lines.
pub type SamLines = Box<dyn Iterator<Item = Result<SamLine, ReaderError>>>;

/// `<prefix>_hits.bed` and `<prefix>_rejects.bed`.
pub fn output_paths(prefix: impl AsRef<Path>) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(prefix.as_ref().as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix("_hits.bed"), with_suffix("_rejects.bed"))
}

/// Open an alignment file in the given format.
pub fn open_alignments(path: &Path, format: InputFormat) -> Result<SamLines, CallerError> {
    let input_error = |source: Box<dyn std::error::Error + Send + Sync>| CallerError::InputAccess {
        path: path.to_path_buf(),
        source,
    };
    match format.resolve(path) {
        InputFormat::Hts => {
            let reader = HtsReader::from_path(path).map_err(|err| input_error(Box::new(err)))?;
            Ok(Box::new(reader))
        }
        _ => {
            let file = File::open(path).map_err(|err| input_error(Box::new(err)))?;
            Ok(Box::new(SamReader::new(BufReader::new(file))))
        }
    }
}

/// Route every chromosome's calls through `writers` and flush them, naming
/// the file that failed on error.
fn write_calls<H: Write, R: Write>(
    mut writers: BedPair<H, R>,
    calls: &[ChromosomeCalls],
    hits_path: &Path,
    rejects_path: &Path,
) -> Result<(usize, usize, H, R), CallerError> {
    let output_error = |err: BedWriteError| {
        let path = match err.side {
            BedSide::Hits => hits_path,
            BedSide::Rejects => rejects_path,
        };
        CallerError::OutputAccess {
            path: path.to_path_buf(),
            source: err.source,
        }
    };

    for (chrom, chrom_calls) in calls {
        writers
            .write_chromosome(chrom, chrom_calls)
            .map_err(output_error)?;
    }
    let (hits, rejects) = (writers.hit_lines(), writers.reject_lines());
    let (hits_writer, rejects_writer) = writers.finish().map_err(output_error)?;
    Ok((hits, rejects, hits_writer, rejects_writer))
}

/// Aggregate-then-classify breakpoint caller.
#[derive(Debug, Clone)]
pub struct BreakpointCaller {
    config: CallerConfig,
    classifier: WindowClassifier,
}

impl BreakpointCaller {
    /// Create a caller, rejecting an even or zero window up front.
    pub fn new(config: CallerConfig) -> Result<Self, CallerError> {
        let classifier = config.validate()?;
        Ok(Self { config, classifier })
    }

    /// Active configuration.
    pub fn config(&self) -> &CallerConfig {
        &self.config
    }

    /// Window classifier derived from the configuration.
    pub fn classifier(&self) -> &WindowClassifier {
        &self.classifier
    }

    /// Walk input lines and hand every breakpoint to `sink` with its line
    /// number, applying the malformed-record policy uniformly.
    pub fn for_each_breakpoint<I, F>(&self, lines: I, mut sink: F) -> Result<IngestStats, CallerError>
    where
        I: IntoIterator<Item = Result<SamLine, ReaderError>>,
        F: FnMut(usize, Breakpoint) -> Result<(), CallerError>,
    {
        let mut stats = IngestStats::default();

        for entry in lines {
            let (line, record) = match entry? {
                SamLine::Header => {
                    stats.headers += 1;
                    continue;
                }
                SamLine::Unplaced { .. } => {
                    stats.unplaced += 1;
                    continue;
                }
                SamLine::Alignment { line, record } => (line, record),
            };
            stats.records += 1;

            let cigar = match parse_cigar(&record.operations) {
                Ok(cigar) => cigar,
                Err(source) => match self.config.malformed {
                    MalformedPolicy::Abort => {
                        return Err(CallerError::MalformedOperationString { line, source })
                    }
                    MalformedPolicy::Skip => {
                        warn!(line, error = %source, "skipping record with malformed CIGAR");
                        stats.malformed += 1;
                        continue;
                    }
                },
            };

            for breakpoint in extract_breakpoints(
                &record.reference_name,
                record.reference_start,
                &cigar,
                record.sequence_length,
            ) {
                stats.breakpoints += 1;
                sink(line, breakpoint)?;
            }
        }

        Ok(stats)
    }

    /// Consume all input and return the frozen breakpoint tallies.
    pub fn aggregate<I>(&self, lines: I) -> Result<(BreakpointCounts, IngestStats), CallerError>
    where
        I: IntoIterator<Item = Result<SamLine, ReaderError>>,
    {
        let mut aggregator = BreakpointAggregator::new();
        let stats = self.for_each_breakpoint(lines, |_, breakpoint| {
            aggregator.record(&breakpoint.chrom, breakpoint.position);
            Ok(())
        })?;
        Ok((aggregator.freeze(), stats))
    }

    /// Classify every chromosome of a frozen tally, in first-seen order.
    pub fn classify(&self, counts: &BreakpointCounts) -> Vec<ChromosomeCalls> {
        counts
            .iter()
            .map(|(chrom, table)| {
                let calls = self.classifier.classify(table);
                debug!(
                    chrom = %chrom,
                    positions = calls.len(),
                    accepted = calls.iter().filter(|call| call.accepted).count(),
                    "classified chromosome"
                );
                (Arc::clone(chrom), calls)
            })
            .collect()
    }

    /// Run the full pipeline: read `input`, then write
    /// `<output_prefix>_hits.bed` and `<output_prefix>_rejects.bed`.
    ///
    /// Output files are created only after all input has been consumed.
    pub fn run(
        &self,
        input: impl AsRef<Path>,
        output_prefix: impl AsRef<Path>,
    ) -> Result<RunSummary, CallerError> {
        let input = input.as_ref();
        info!(
            input = %input.display(),
            window = self.classifier.window(),
            threshold = self.classifier.threshold(),
            "calling soft-clip breakpoints"
        );

        let lines = open_alignments(input, self.config.format)?;
        let (counts, ingest) = self.aggregate(lines).map_err(|err| match err {
            CallerError::Reader(_) | CallerError::MalformedOperationString { .. } => {
                CallerError::Input {
                    path: input.to_path_buf(),
                    source: Box::new(err),
                }
            }
            other => other,
        })?;
        info!(
            records = ingest.records,
            headers = ingest.headers,
            unplaced = ingest.unplaced,
            malformed = ingest.malformed,
            breakpoints = ingest.breakpoints,
            "input consumed"
        );

        let calls = self.classify(&counts);

        let (hits_path, rejects_path) = output_paths(output_prefix);
        let create = |path: &Path| {
            File::create(path)
                .map(|file| DigestWriter::new(BufWriter::new(file)))
                .map_err(|source| CallerError::OutputAccess {
                    path: path.to_path_buf(),
                    source,
                })
        };
        let writers = BedPair::new(create(&hits_path)?, create(&rejects_path)?);
        let (hits, rejects, hits_writer, rejects_writer) =
            write_calls(writers, &calls, &hits_path, &rejects_path)?;

        let summary = RunSummary {
            ingest,
            chromosomes: counts.num_chromosomes(),
            positions: counts.num_positions(),
            hits,
            rejects,
            hits_digest: hits_writer.hex_digest(),
            rejects_digest: rejects_writer.hex_digest(),
            hits_path,
            rejects_path,
        };
        info!(
            hits = summary.hits,
            rejects = summary.rejects,
            hits_digest = %summary.hits_digest,
            rejects_digest = %summary.rejects_digest,
            "breakpoints written"
        );
        Ok(summary)
    }
}
