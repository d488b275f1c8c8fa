//! SQLite persistence for analyzed commits and their change records.
//!
//! Each public method opens its own connection so that callers never manage
//! connection lifetime. Records are keyed by a content hash, which makes
//! re-analyzing a commit idempotent.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rusqlite::{params, Connection};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::detector::CommitSummary;
use crate::errors::{LogEvoError, LogEvoResult};
use crate::models::{ChangeKind, ChangeRecord};
use crate::store::schema;

/// Identity of an analyzed commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    pub commit_id: String,
    pub parent_commit_id: Option<String>,
    pub is_merge_commit: bool,
}

/// A change record as read back from the `logs` table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredLog {
    pub file_path: String,
    pub method: String,
    pub kind: ChangeKind,
    pub content: String,
    pub content_update_from: Option<String>,
    pub update_type: Option<String>,
    pub verbosity: Option<String>,
    pub verbosity_class: Option<String>,
    pub argument_type: Option<String>,
    pub is_consistent_update: Option<bool>,
}

/// Stable SHA-256 of a record's identity within a commit.
pub fn record_hash(commit_id: &str, record: &ChangeRecord) -> String {
    let mut hasher = Sha256::new();
    for part in [
        commit_id,
        record.file_path.as_str(),
        record.method.as_str(),
        record.kind.as_str(),
        record.before.as_deref().unwrap_or_default(),
        record.after.as_deref().unwrap_or_default(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    format!("{:x}", hasher.finalize())
}

/// SQLite-backed store of change records.
pub struct LogStore {
    db_path: PathBuf,
}

impl LogStore {
    /// Create a store at `db_path`, creating parent directories as needed.
    /// The schema is not touched until [`LogStore::init_schema`].
    pub fn new(db_path: impl AsRef<Path>) -> LogEvoResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> LogEvoResult<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    // -----------------------------------------------------------------------
    // Schema
    // -----------------------------------------------------------------------

    /// Enable WAL, create tables and indexes, then run pending migrations.
    pub fn init_schema(&self) -> LogEvoResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt)?;
        }
        schema::migrate_schema(&conn)?;
        info!(
            "log store ready at {} (schema v{})",
            self.db_path.display(),
            schema::get_schema_version(&conn)
        );
        Ok(())
    }

    pub fn schema_version(&self) -> LogEvoResult<i32> {
        Ok(schema::get_schema_version(&self.connect()?))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Upsert a commit row together with its logging-LOC totals.
    pub fn record_commit(&self, commit: &CommitInfo, summary: &CommitSummary) -> LogEvoResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO commits (commit_id, parent_commit_id, is_merge_commit, files_compared, \
                                  added_logs, deleted_logs, updated_logs, logging_code_churn) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(commit_id) DO UPDATE SET \
                 parent_commit_id = excluded.parent_commit_id, \
                 is_merge_commit = excluded.is_merge_commit, \
                 files_compared = excluded.files_compared, \
                 added_logs = excluded.added_logs, \
                 deleted_logs = excluded.deleted_logs, \
                 updated_logs = excluded.updated_logs, \
                 logging_code_churn = excluded.logging_code_churn, \
                 analyzed_at = CURRENT_TIMESTAMP;",
            params![
                commit.commit_id,
                commit.parent_commit_id,
                commit.is_merge_commit,
                summary.files as i64,
                summary.added as i64,
                summary.deleted as i64,
                summary.updated as i64,
                summary.logging_code_churn as i64,
            ],
        )?;
        Ok(())
    }

    /// Insert records of a recorded commit in one transaction.
    ///
    /// Records already present (same hash) are skipped; returns how many rows
    /// were actually inserted.
    pub fn insert_records(&self, commit_id: &str, records: &[ChangeRecord]) -> LogEvoResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO logs (record_hash, commit_id, file_path, embed_method, \
                     change_type, content, content_update_from, update_type, verbosity, \
                     verbosity_type, argument_type, is_consistent_update) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            )?;
            for record in records {
                let content_update_from = match record.kind {
                    ChangeKind::Updated => record.before.as_deref(),
                    _ => None,
                };
                inserted += stmt.execute(params![
                    record_hash(commit_id, record),
                    commit_id,
                    record.file_path,
                    record.method,
                    record.kind.as_str(),
                    record.content(),
                    content_update_from,
                    record.update_type(),
                    record.verbosity,
                    record.verbosity_class.map(|c| c.as_str()),
                    record.argument_type.map(|t| t.as_str()),
                    record.is_consistent_update,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Records of one commit in insertion order.
    pub fn records_for_commit(&self, commit_id: &str) -> LogEvoResult<Vec<StoredLog>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT file_path, embed_method, change_type, content, content_update_from, \
                    update_type, verbosity, verbosity_type, argument_type, is_consistent_update \
             FROM logs WHERE commit_id = ?1 ORDER BY id;",
        )?;
        let rows = stmt.query_map(params![commit_id], |row| {
            Ok((
                row.get::<_, String>(2)?,
                StoredLog {
                    file_path: row.get(0)?,
                    method: row.get(1)?,
                    kind: ChangeKind::Updated,
                    content: row.get(3)?,
                    content_update_from: row.get(4)?,
                    update_type: row.get(5)?,
                    verbosity: row.get(6)?,
                    verbosity_class: row.get(7)?,
                    argument_type: row.get(8)?,
                    is_consistent_update: row.get(9)?,
                },
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (label, mut log) = row?;
            log.kind = ChangeKind::parse(&label)
                .ok_or_else(|| LogEvoError::Database(format!("unknown change_type {label:?}")))?;
            out.push(log);
        }
        Ok(out)
    }

    /// Number of records per change kind for one commit; every kind is
    /// present, in canonical order.
    pub fn count_by_kind(&self, commit_id: &str) -> LogEvoResult<IndexMap<ChangeKind, i64>> {
        let mut counts: IndexMap<ChangeKind, i64> =
            ChangeKind::ALL.into_iter().map(|kind| (kind, 0)).collect();

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT change_type, COUNT(*) FROM logs WHERE commit_id = ?1 GROUP BY change_type;",
        )?;
        let rows = stmt.query_map(params![commit_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (label, count) = row?;
            match ChangeKind::parse(&label) {
                Some(kind) => counts[&kind] = count,
                None => warn!("Ignoring unknown change_type {label:?} in {commit_id}"),
            }
        }
        Ok(counts)
    }

    /// Stored totals of a commit, if it was recorded.
    pub fn commit_summary(&self, commit_id: &str) -> LogEvoResult<Option<CommitSummary>> {
        let conn = self.connect()?;
        let result = conn.query_row(
            "SELECT files_compared, added_logs, deleted_logs, updated_logs, logging_code_churn \
             FROM commits WHERE commit_id = ?1;",
            params![commit_id],
            |row| {
                Ok(CommitSummary {
                    files: row.get::<_, i64>(0)? as usize,
                    added: row.get::<_, i64>(1)? as usize,
                    deleted: row.get::<_, i64>(2)? as usize,
                    updated: row.get::<_, i64>(3)? as usize,
                    logging_code_churn: row.get::<_, i64>(4)? as usize,
                })
            },
        );
        match result {
            Ok(summary) => Ok(Some(summary)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArgumentChange, ArgumentType, CallerChange, UpdateDetail, VerbosityClass};

    fn record(kind: ChangeKind, before: Option<&str>, after: Option<&str>) -> ChangeRecord {
        ChangeRecord {
            file_path: "app/Main.java".into(),
            method: "run()".into(),
            kind,
            before: before.map(str::to_string),
            after: after.map(str::to_string),
            verbosity: "d".into(),
            verbosity_class: Some(VerbosityClass::Debug),
            argument_type: Some(ArgumentType::TextOnly),
            caller_change: None,
            argument_change: None,
            is_consistent_update: None,
        }
    }

    fn commit(id: &str) -> CommitInfo {
        CommitInfo {
            commit_id: id.into(),
            parent_commit_id: Some("p0".into()),
            is_merge_commit: false,
        }
    }

    fn open_store() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("nested").join("logs.db")).unwrap();
        store.init_schema().unwrap();
        (dir, store)
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let (_dir, store) = open_store();
        store.init_schema().unwrap();
        assert_eq!(store.schema_version().unwrap(), schema::SCHEMA_VERSION);
        assert!(store.db_path().exists());
    }

    #[test]
    fn test_insert_and_read_back() {
        let (_dir, store) = open_store();
        store.record_commit(&commit("c1"), &CommitSummary::default()).unwrap();

        let mut updated = record(ChangeKind::Updated, Some("Log.d(\"a\")"), Some("Log.e(\"a\")"));
        updated.caller_change = Some(CallerChange::Verbosity);
        updated.argument_change = Some(ArgumentChange::Content(UpdateDetail::Var));
        updated.is_consistent_update = Some(false);
        let records = vec![
            record(ChangeKind::AddedInsideMethod, None, Some("Log.i(\"x\")")),
            updated,
        ];
        assert_eq!(store.insert_records("c1", &records).unwrap(), 2);

        let stored = store.records_for_commit("c1").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].kind, ChangeKind::AddedInsideMethod);
        assert_eq!(stored[0].content, "Log.i(\"x\")");
        assert_eq!(stored[0].content_update_from, None);
        assert_eq!(stored[1].content_update_from.as_deref(), Some("Log.d(\"a\")"));
        assert_eq!(
            stored[1].update_type.as_deref(),
            Some("UPDATED_VERBOSITY+UPDATED_VAR")
        );
        assert_eq!(stored[1].verbosity_class.as_deref(), Some("DEBUG"));
        assert_eq!(stored[1].is_consistent_update, Some(false));
    }

    #[test]
    fn test_reinserting_is_idempotent() {
        let (_dir, store) = open_store();
        store.record_commit(&commit("c1"), &CommitSummary::default()).unwrap();
        let records = vec![record(ChangeKind::DeletedWithFile, Some("Log.w(x)"), None)];
        assert_eq!(store.insert_records("c1", &records).unwrap(), 1);
        assert_eq!(store.insert_records("c1", &records).unwrap(), 0);
        assert_eq!(store.records_for_commit("c1").unwrap().len(), 1);
    }

    #[test]
    fn test_records_need_a_recorded_commit() {
        let (_dir, store) = open_store();
        let records = vec![record(ChangeKind::AddedWithFile, None, Some("Log.d(x)"))];
        assert!(store.insert_records("missing", &records).is_err());
    }

    #[test]
    fn test_count_by_kind_covers_every_kind() {
        let (_dir, store) = open_store();
        store.record_commit(&commit("c1"), &CommitSummary::default()).unwrap();
        let records = vec![
            record(ChangeKind::AddedWithMethod, None, Some("Log.d(a)")),
            record(ChangeKind::AddedWithMethod, None, Some("Log.d(b)")),
            record(ChangeKind::DeletedInsideMethod, Some("Log.d(c)"), None),
        ];
        store.insert_records("c1", &records).unwrap();

        let counts = store.count_by_kind("c1").unwrap();
        assert_eq!(counts.len(), ChangeKind::ALL.len());
        assert_eq!(counts[&ChangeKind::AddedWithMethod], 2);
        assert_eq!(counts[&ChangeKind::DeletedInsideMethod], 1);
        assert_eq!(counts[&ChangeKind::Updated], 0);
        assert_eq!(counts.keys().next(), Some(&ChangeKind::AddedWithFile));
    }

    #[test]
    fn test_commit_summary_round_trip() {
        let (_dir, store) = open_store();
        let summary = CommitSummary {
            files: 3,
            added: 4,
            deleted: 1,
            updated: 2,
            logging_code_churn: 9,
        };
        store.record_commit(&commit("c1"), &summary).unwrap();
        assert_eq!(store.commit_summary("c1").unwrap(), Some(summary));
        assert_eq!(store.commit_summary("nope").unwrap(), None);
    }

    #[test]
    fn test_record_hash_distinguishes_commits_and_content() {
        let a = record(ChangeKind::AddedInsideMethod, None, Some("Log.d(a)"));
        let b = record(ChangeKind::AddedInsideMethod, None, Some("Log.d(b)"));
        assert_eq!(record_hash("c1", &a), record_hash("c1", &a));
        assert_ne!(record_hash("c1", &a), record_hash("c2", &a));
        assert_ne!(record_hash("c1", &a), record_hash("c1", &b));
        assert_eq!(record_hash("c1", &a).len(), 64);
    }
}
