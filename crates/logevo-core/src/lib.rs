//! logevo core library: tracks how logging statements are added, removed and
//! rewritten between two versions of a source file.
//!
//! Source text goes through [`extract`] (tree-sitter Java front end, logging
//! call extraction), then [`detector`] (method matching, call matching,
//! classification, consistency) to produce [`models::ChangeRecord`]s, which
//! [`store`] can persist to SQLite. With the `python` feature the crate also
//! builds as a Python extension module.

pub mod config;
pub mod detector;
pub mod errors;
pub mod extract;
pub mod models;
pub mod store;

#[cfg(feature = "python")]
pub mod python;

pub use config::DetectorConfig;
pub use detector::{CommitSummary, FileDiffInput, FileDiffReport, FileVersion, LogChangeDetector};
pub use errors::{LogEvoError, LogEvoResult};
pub use models::ChangeRecord;

// ---------------------------------------------------------------------------
// Top-level Python module: logevo_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pyo3::pymodule]
fn logevo_core(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    python::register(m)
}
