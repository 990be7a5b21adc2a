use std::io::{self, Write};

use thiserror::Error;

use super::ClassifiedBreakpoint;

const FEATURE_NAME: &str = "softclip";

/// Write one breakpoint as a BED-like line.
pub fn write_bed_line<W: Write>(
    writer: &mut W,
    chrom: &str,
    breakpoint: &ClassifiedBreakpoint,
) -> io::Result<()> {
    writeln!(
        writer,
        "{chrom}\t{start}\t{end}\t{FEATURE_NAME}\t{count}",
        start = breakpoint.position,
        end = breakpoint.position.saturating_add(1),
        count = breakpoint.count,
    )
}

/// One of the two destinations of a [`BedPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedSide {
    /// Accepted breakpoints.
    Hits,
    /// Rejected breakpoints.
    Rejects,
}

/// Write or flush failure tagged with the destination it happened on.
#[derive(Debug, Error)]
#[error("failed to write {side:?} output: {source}")]
pub struct BedWriteError {
    /// Destination that failed.
    pub side: BedSide,
    /// I/O error.
    #[source]
    pub source: io::Error,
}

fn on(side: BedSide) -> impl FnOnce(io::Error) -> BedWriteError {
    move |source| BedWriteError { side, source }
}

/// Writers for accepted and rejected breakpoints.
#[derive(Debug)]
pub struct BedPair<H, R> {
    hits: H,
    rejects: R,
    hit_lines: usize,
    reject_lines: usize,
}

impl<H: Write, R: Write> BedPair<H, R> {
    /// Wrap the two destinations.
    pub fn new(hits: H, rejects: R) -> Self {
        Self {
            hits,
            rejects,
            hit_lines: 0,
            reject_lines: 0,
        }
    }

    /// Route a chromosome's classified breakpoints (already ascending) to
    /// the hits or rejects destination.
    pub fn write_chromosome(
        &mut self,
        chrom: &str,
        breakpoints: &[ClassifiedBreakpoint],
    ) -> Result<(), BedWriteError> {
        for breakpoint in breakpoints {
            if breakpoint.accepted {
                write_bed_line(&mut self.hits, chrom, breakpoint).map_err(on(BedSide::Hits))?;
                self.hit_lines += 1;
            } else {
                write_bed_line(&mut self.rejects, chrom, breakpoint)
                    .map_err(on(BedSide::Rejects))?;
                self.reject_lines += 1;
            }
        }
        Ok(())
    }

    /// Lines written to the hits destination so far.
    pub fn hit_lines(&self) -> usize {
        self.hit_lines
    }

    /// Lines written to the rejects destination so far.
    pub fn reject_lines(&self) -> usize {
        self.reject_lines
    }

    /// Flush both destinations and hand them back.
    pub fn finish(mut self) -> Result<(H, R), BedWriteError> {
        self.hits.flush().map_err(on(BedSide::Hits))?;
        self.rejects.flush().map_err(on(BedSide::Rejects))?;
        Ok((self.hits, self.rejects))
    }
}

/// Writer adapter that fingerprints everything passing through it.
#[derive(Debug)]
pub struct DigestWriter<W> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W: Write> DigestWriter<W> {
    /// Wrap a destination.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    /// Hex blake3 digest of the bytes written so far.
    pub fn hex_digest(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }

    /// Unwrap the destination.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Render classified breakpoints for several chromosomes into hit and reject
/// strings (useful for tests and snapshots).
pub fn render_bed<'a, I>(chromosomes: I) -> (String, String)
where
    I: IntoIterator<Item = (&'a str, &'a [ClassifiedBreakpoint])>,
{
    let mut pair = BedPair::new(Vec::new(), Vec::new());
    for (chrom, breakpoints) in chromosomes {
        // Vec<u8> writers never fail.
        let _ = pair.write_chromosome(chrom, breakpoints);
    }
    let (hits, rejects) = (pair.hits, pair.rejects);
    (
        String::from_utf8_lossy(&hits).into_owned(),
        String::from_utf8_lossy(&rejects).into_owned(),
    )
}
