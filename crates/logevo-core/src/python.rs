//! Python bindings for the evolution engine (`python` feature).
//!
//! Repository walking and reporting stay on the Python side; these entry
//! points take source text in and hand plain dicts back.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::config::{DetectorConfig, DEFAULT_SIMILARITY_THRESHOLD};
use crate::detector::LogChangeDetector;
use crate::extract::calls;
use crate::extract::canonical;
use crate::models::ChangeRecord;

fn record_to_pydict<'py>(py: Python<'py>, record: &ChangeRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("file_path", &record.file_path)?;
    dict.set_item("embed_method", &record.method)?;
    dict.set_item("change_type", record.kind.as_str())?;
    dict.set_item("content", record.content())?;
    dict.set_item("before", record.before.as_deref())?;
    dict.set_item("after", record.after.as_deref())?;
    dict.set_item("verbosity", &record.verbosity)?;
    dict.set_item("verbosity_type", record.verbosity_class.map(|c| c.as_str()))?;
    dict.set_item("argument_type", record.argument_type.map(|t| t.as_str()))?;
    dict.set_item("caller_change", record.caller_change.map(|c| c.as_str()))?;
    dict.set_item("argument_change", record.argument_change.map(|c| c.as_str()))?;
    dict.set_item("update_type", record.update_type())?;
    dict.set_item("is_consistent_update", record.is_consistent_update)?;
    Ok(dict)
}

/// Diff two versions of a Java file. Pass `None` for the missing side of an
/// added or deleted file.
#[pyfunction]
#[pyo3(signature = (path, old_source=None, new_source=None, unified_diff=None, similarity_threshold=DEFAULT_SIMILARITY_THRESHOLD))]
pub fn detect_java_changes(
    py: Python<'_>,
    path: &str,
    old_source: Option<&str>,
    new_source: Option<&str>,
    unified_diff: Option<&str>,
    similarity_threshold: f64,
) -> PyResult<PyObject> {
    let detector = LogChangeDetector::new(DetectorConfig::with_threshold(similarity_threshold)?)?;
    let report = py.allow_threads(|| {
        detector.diff_java_sources(path, old_source, new_source, unified_diff)
    })?;

    let records = PyList::empty(py);
    for record in &report.records {
        records.append(record_to_pydict(py, record)?)?;
    }

    let result = PyDict::new(py);
    result.set_item("path", &report.path)?;
    result.set_item("records", records)?;
    result.set_item("added", report.added)?;
    result.set_item("deleted", report.deleted)?;
    result.set_item("updated", report.updated)?;
    result.set_item("added_methods", &report.added_methods)?;
    result.set_item("deleted_methods", &report.deleted_methods)?;
    Ok(result.into())
}

/// Whether a call with this name and argument count is a logging call.
#[pyfunction]
pub fn is_logging_call(name: &str, argument_count: usize) -> bool {
    calls::is_logging_call(name, argument_count > 0)
}

/// Similarity of two call texts after canonicalization.
#[pyfunction]
pub fn call_similarity(old_call: &str, new_call: &str) -> f64 {
    canonical::similarity_ratio(
        &canonical::canonical_text(old_call),
        &canonical::canonical_text(new_call),
    )
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("DEFAULT_SIMILARITY_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD)?;
    m.add_function(wrap_pyfunction!(detect_java_changes, m)?)?;
    m.add_function(wrap_pyfunction!(is_logging_call, m)?)?;
    m.add_function(wrap_pyfunction!(call_similarity, m)?)?;
    Ok(())
}
