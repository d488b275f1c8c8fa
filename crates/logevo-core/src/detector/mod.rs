//! Log-statement evolution engine: method matching, call matching,
//! classification and consistency, tied together per file by [`pipeline`].

pub mod calls;
pub mod classify;
pub mod consistency;
pub mod methods;
pub mod pipeline;

pub use pipeline::{CommitSummary, FileDiffInput, FileDiffReport, FileVersion, LogChangeDetector};
