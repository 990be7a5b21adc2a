//! Python bindings that expose CIGAR clip extraction and window
//! classification via PyO3.
use pyo3::{exceptions::PyValueError, prelude::*, types::PyModule};

use crate::genomics::{clip_positions, parse_cigar, ChromosomeCounts, WindowClassifier};

/// Python-facing window classifier.
#[pyclass]
#[derive(Debug)]
pub struct PyWindowClassifier {
    inner: WindowClassifier,
}

#[pymethods]
impl PyWindowClassifier {
    #[new]
    /// Create a classifier; raises `ValueError` for an even window.
    pub fn new(window: usize, threshold: i64) -> PyResult<Self> {
        let inner = WindowClassifier::new(window, threshold)
            .map_err(|err| PyValueError::new_err(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Classify `(position, count)` pairs of one chromosome.
    ///
    /// Returns:
    ///     List of `(position, count, accepted)` tuples, ascending by position.
    pub fn classify(&self, counts: Vec<(i64, u32)>) -> Vec<(i64, u32, bool)> {
        let table = ChromosomeCounts::from_pairs(counts);
        self.inner
            .classify(&table)
            .into_iter()
            .map(|call| (call.position, call.count, call.accepted))
            .collect()
    }
}

/// Leading and trailing clip breakpoints for one record.
///
/// Returns:
///     `(leading, trailing)`, each `None` when that end is not soft-clipped.
#[pyfunction]
pub fn clip_breakpoints(
    cigar: &str,
    reference_start: i64,
    sequence_length: u32,
) -> PyResult<(Option<i64>, Option<i64>)> {
    let cigar = parse_cigar(cigar).map_err(|err| PyValueError::new_err(err.to_string()))?;
    Ok(clip_positions(
        cigar.aligned_ops(),
        reference_start,
        u64::from(sequence_length),
    ))
}

/// Create Python module.
#[pymodule]
pub fn clipcall_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyWindowClassifier>()?;
    m.add_function(wrap_pyfunction!(clip_breakpoints, m)?)?;
    Ok(())
}
