//! Per-file orchestration: method matching, call matching, classification,
//! and the parallel batch over many files.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DetectorConfig;
use crate::detector::calls::match_calls;
use crate::detector::classify::{argument_change, argument_type, caller_change, verbosity_class};
use crate::detector::consistency::{added_lines, is_consistent_update};
use crate::detector::methods::match_methods;
use crate::errors::{LogEvoError, LogEvoResult};
use crate::extract::calls::extract_call_sites;
use crate::extract::java::JavaMethodParser;
use crate::models::{CallSite, ChangeKind, ChangeRecord, MethodFragment};

// ---------------------------------------------------------------------------
// Inputs and reports
// ---------------------------------------------------------------------------

/// One version of a file, already parsed into methods.
#[derive(Clone, Debug)]
pub struct FileVersion {
    pub path: String,
    pub methods: Vec<MethodFragment>,
}

impl FileVersion {
    pub fn new(path: impl Into<String>, methods: Vec<MethodFragment>) -> Self {
        Self {
            path: path.into(),
            methods,
        }
    }
}

/// Parent and head versions of one file. A missing side means the file was
/// added (no `old`) or deleted (no `new`) in the commit.
#[derive(Clone, Debug, Default)]
pub struct FileDiffInput {
    pub old: Option<FileVersion>,
    pub new: Option<FileVersion>,
    /// Unified diff text of the file, used for the consistency check.
    pub unified_diff: Option<String>,
}

/// Change records and logging-LOC counts of one file comparison.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FileDiffReport {
    pub path: String,
    pub records: Vec<ChangeRecord>,
    pub added: usize,
    pub deleted: usize,
    pub updated: usize,
    /// Full signatures of methods present only in the new version.
    pub added_methods: Vec<String>,
    /// Full signatures of methods present only in the old version.
    pub deleted_methods: Vec<String>,
}

impl FileDiffReport {
    fn new(path: String, records: Vec<ChangeRecord>) -> Self {
        let added = records.iter().filter(|r| r.kind.is_added()).count();
        let deleted = records.iter().filter(|r| r.kind.is_deleted()).count();
        let updated = records.iter().filter(|r| r.kind == ChangeKind::Updated).count();
        Self {
            path,
            records,
            added,
            deleted,
            updated,
            added_methods: vec![],
            deleted_methods: vec![],
        }
    }
}

/// Totals over the file reports of one commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub files: usize,
    pub added: usize,
    pub deleted: usize,
    pub updated: usize,
    pub logging_code_churn: usize,
}

impl CommitSummary {
    pub fn from_reports(reports: &[FileDiffReport]) -> Self {
        let mut summary = Self {
            files: reports.len(),
            ..Self::default()
        };
        for report in reports {
            summary.added += report.added;
            summary.deleted += report.deleted;
            summary.updated += report.updated;
        }
        // An update is one deleted and one added line.
        summary.logging_code_churn = summary.added + summary.deleted + 2 * summary.updated;
        summary
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Stateless comparison engine; one instance may serve many files and threads.
#[derive(Clone, Debug)]
pub struct LogChangeDetector {
    config: DetectorConfig,
}

impl LogChangeDetector {
    pub fn new(config: DetectorConfig) -> LogEvoResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Diff the logging call sites of one matched method pair.
    ///
    /// Identical pairs produce nothing. Records come out as deletions, then
    /// additions, then updates, each in document order.
    pub fn compare_call_sites(
        &self,
        old_path: &str,
        new_path: &str,
        method: &str,
        old: &[CallSite],
        new: &[CallSite],
        added: Option<&[&str]>,
    ) -> Vec<ChangeRecord> {
        let matching = match_calls(old, new, self.config.similarity_threshold);
        let mut records = Vec::new();

        for &i in &matching.unmatched_old {
            records.push(site_record(old_path, method, ChangeKind::DeletedInsideMethod, &old[i]));
        }
        for &j in &matching.unmatched_new {
            records.push(site_record(new_path, method, ChangeKind::AddedInsideMethod, &new[j]));
        }
        for pair in matching.updated(old, new) {
            records.push(updated_record(new_path, method, &old[pair.old], &new[pair.new], added));
        }
        records
    }

    /// Diff two versions of the same method.
    pub fn compare_methods(
        &self,
        old_path: &str,
        new_path: &str,
        old: &MethodFragment,
        new: &MethodFragment,
        added: Option<&[&str]>,
    ) -> Vec<ChangeRecord> {
        self.compare_call_sites(
            old_path,
            new_path,
            &new.full_signature(),
            &extract_call_sites(old),
            &extract_call_sites(new),
            added,
        )
    }

    /// Diff one file between its parent and head versions.
    pub fn diff_file(&self, input: &FileDiffInput) -> LogEvoResult<FileDiffReport> {
        let report = match (&input.old, &input.new) {
            (None, None) => {
                return Err(LogEvoError::InvalidInput(
                    "file comparison needs an old or a new version".to_string(),
                ))
            }
            (None, Some(new)) => FileDiffReport::new(
                new.path.clone(),
                whole_records(&new.path, &new.methods, ChangeKind::AddedWithFile),
            ),
            (Some(old), None) => FileDiffReport::new(
                old.path.clone(),
                whole_records(&old.path, &old.methods, ChangeKind::DeletedWithFile),
            ),
            (Some(old), Some(new)) => self.diff_versions(old, new, input.unified_diff.as_deref()),
        };

        debug!(
            "{}: {} added, {} deleted, {} updated logging calls",
            report.path, report.added, report.deleted, report.updated
        );
        Ok(report)
    }

    fn diff_versions(&self, old: &FileVersion, new: &FileVersion, diff: Option<&str>) -> FileDiffReport {
        let added = diff.map(added_lines);
        let matching = match_methods(&old.methods, &new.methods);

        let mut records = Vec::new();
        for pair in &matching.pairs {
            records.extend(self.compare_methods(
                &old.path,
                &new.path,
                pair.old,
                pair.new,
                added.as_deref(),
            ));
        }
        for method in &matching.only_old {
            records.extend(method_records(&old.path, method, ChangeKind::DeletedWithMethod));
        }
        for method in &matching.only_new {
            records.extend(method_records(&new.path, method, ChangeKind::AddedWithMethod));
        }

        let mut report = FileDiffReport::new(new.path.clone(), records);
        report.deleted_methods = matching.only_old.iter().map(|m| m.full_signature()).collect();
        report.added_methods = matching.only_new.iter().map(|m| m.full_signature()).collect();
        report
    }

    /// Parse Java sources and diff them. `None` marks an added or deleted file.
    pub fn diff_java_sources(
        &self,
        path: &str,
        old_source: Option<&str>,
        new_source: Option<&str>,
        unified_diff: Option<&str>,
    ) -> LogEvoResult<FileDiffReport> {
        let mut parser = JavaMethodParser::new()?;
        let old = match old_source {
            Some(src) => Some(FileVersion::new(path, parser.parse_methods(src)?)),
            None => None,
        };
        let new = match new_source {
            Some(src) => Some(FileVersion::new(path, parser.parse_methods(src)?)),
            None => None,
        };
        self.diff_file(&FileDiffInput {
            old,
            new,
            unified_diff: unified_diff.map(str::to_string),
        })
    }

    /// Diff independent files in parallel. Failed entries are logged and
    /// left out; report order follows input order.
    pub fn diff_files(&self, inputs: &[FileDiffInput], workers: usize) -> Vec<FileDiffReport> {
        if inputs.is_empty() {
            return vec![];
        }
        let started = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build();

        let results: Vec<LogEvoResult<FileDiffReport>> = match pool {
            Ok(pool) => pool.install(|| inputs.par_iter().map(|input| self.diff_file(input)).collect()),
            Err(e) => {
                warn!("Failed to build thread pool, diffing sequentially: {e}");
                inputs.iter().map(|input| self.diff_file(input)).collect()
            }
        };

        let reports: Vec<FileDiffReport> = results
            .into_iter()
            .enumerate()
            .filter_map(|(idx, result)| match result {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!("Skipping file diff #{idx}: {e}");
                    None
                }
            })
            .collect();

        debug!(
            "diffed {} of {} files in {} ms",
            reports.len(),
            inputs.len(),
            started.elapsed().as_millis()
        );
        reports
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

fn site_record(path: &str, method: &str, kind: ChangeKind, site: &CallSite) -> ChangeRecord {
    let (before, after) = if kind.is_deleted() {
        (Some(site.text.clone()), None)
    } else {
        (None, Some(site.text.clone()))
    };
    ChangeRecord {
        file_path: path.to_string(),
        method: method.to_string(),
        kind,
        before,
        after,
        verbosity: site.verbosity.clone(),
        verbosity_class: verbosity_class(site),
        argument_type: argument_type(site),
        caller_change: None,
        argument_change: None,
        is_consistent_update: None,
    }
}

fn updated_record(
    path: &str,
    method: &str,
    old: &CallSite,
    new: &CallSite,
    added: Option<&[&str]>,
) -> ChangeRecord {
    let argument_change = argument_change(old, new);
    ChangeRecord {
        file_path: path.to_string(),
        method: method.to_string(),
        kind: ChangeKind::Updated,
        before: Some(old.text.clone()),
        after: Some(new.text.clone()),
        verbosity: new.verbosity.clone(),
        verbosity_class: verbosity_class(new),
        argument_type: argument_type(new),
        caller_change: caller_change(old, new),
        argument_change,
        is_consistent_update: is_consistent_update(
            new,
            argument_change.and_then(|c| c.detail()),
            added,
        ),
    }
}

fn method_records(path: &str, method: &MethodFragment, kind: ChangeKind) -> Vec<ChangeRecord> {
    let signature = method.full_signature();
    extract_call_sites(method)
        .iter()
        .map(|site| site_record(path, &signature, kind, site))
        .collect()
}

fn whole_records(path: &str, methods: &[MethodFragment], kind: ChangeKind) -> Vec<ChangeRecord> {
    methods
        .iter()
        .flat_map(|method| method_records(path, method, kind))
        .collect()
}
