use thiserror::Error;

use crate::genomics::ChromosomeCounts;

/// Breakpoint position after smoothing and thresholding.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassifiedBreakpoint {
    /// Reference coordinate (1-based).
    pub position: i64,
    /// Raw occurrence count at this exact position.
    pub count: u32,
    /// Whether the windowed average reached the threshold.
    pub accepted: bool,
}

/// Errors raised when configuring the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// Window is even or zero, so it cannot be centred on a position.
    #[error("invalid window size {0}: window must be a positive odd number")]
    InvalidWindowSize(usize),
}

/// Sliding-window smoother separating noisy clip positions from real signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowClassifier {
    window: usize,
    threshold: i64,
}

impl WindowClassifier {
    /// Create a classifier; `window` must be odd.
    ///
    /// Averages are never negative, so a threshold of zero or below accepts
    /// every observed position.
    pub fn new(window: usize, threshold: i64) -> Result<Self, ClassifierError> {
        if window % 2 == 0 {
            return Err(ClassifierError::InvalidWindowSize(window));
        }
        Ok(Self { window, threshold })
    }

    /// Window width in positions.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Minimum windowed average for acceptance.
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    fn half_width(&self) -> i64 {
        i64::try_from(self.window / 2).unwrap_or(i64::MAX)
    }

    /// Mean count over the window centred on `position`.
    ///
    /// Unobserved positions inside the window count as zero. Window edges
    /// clamp at the ends of the `i64` coordinate range.
    pub fn local_average(&self, table: &ChromosomeCounts, position: i64) -> f64 {
        let half = self.half_width();
        let sum = table.sum_range(position.saturating_sub(half), position.saturating_add(half));
        sum as f64 / self.window as f64
    }

    /// Classify every observed position of one chromosome, ascending.
    pub fn classify(&self, table: &ChromosomeCounts) -> Vec<ClassifiedBreakpoint> {
        let threshold = self.threshold as f64;
        table
            .iter()
            .map(|(position, count)| ClassifiedBreakpoint {
                position,
                count,
                accepted: self.local_average(table, position) >= threshold,
            })
            .collect()
    }
}
