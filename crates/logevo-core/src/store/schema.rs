//! SQLite schema DDL and migration steps for the change-record store.

use rusqlite::Connection;

use crate::errors::LogEvoResult;

/// Current schema version. Migrations run from whatever the DB currently
/// reports up to this value.
pub const SCHEMA_VERSION: i32 = 2;

/// Core DDL statements, safe to replay on an initialised database.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS store_meta (
        key TEXT PRIMARY KEY,
        value TEXT
    );",
    "CREATE TABLE IF NOT EXISTS commits (
        commit_id TEXT PRIMARY KEY,
        parent_commit_id TEXT,
        is_merge_commit INTEGER NOT NULL DEFAULT 0,
        files_compared INTEGER NOT NULL DEFAULT 0,
        added_logs INTEGER NOT NULL DEFAULT 0,
        deleted_logs INTEGER NOT NULL DEFAULT 0,
        updated_logs INTEGER NOT NULL DEFAULT 0,
        logging_code_churn INTEGER NOT NULL DEFAULT 0,
        analyzed_at TEXT DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        record_hash TEXT NOT NULL UNIQUE,
        commit_id TEXT NOT NULL REFERENCES commits(commit_id) ON DELETE CASCADE,
        file_path TEXT NOT NULL,
        embed_method TEXT NOT NULL,
        change_type TEXT NOT NULL,
        content TEXT NOT NULL,
        content_update_from TEXT,
        update_type TEXT,
        verbosity TEXT,
        verbosity_type TEXT,
        argument_type TEXT,
        is_consistent_update INTEGER
    );",
    "CREATE INDEX IF NOT EXISTS idx_logs_commit ON logs(commit_id);",
    "CREATE INDEX IF NOT EXISTS idx_logs_change_type ON logs(change_type);",
];

/// Run pending migrations up to [`SCHEMA_VERSION`]. Each step runs inside a
/// SAVEPOINT so a failure rolls back only that step.
pub fn migrate_schema(conn: &Connection) -> LogEvoResult<()> {
    let mut current_version = get_schema_version(conn);

    while current_version < SCHEMA_VERSION {
        let next_version = current_version + 1;
        conn.execute_batch("SAVEPOINT logevo_migrate_step;")?;

        let step_result = (|| -> LogEvoResult<()> {
            match next_version {
                1 => migrate_to_v1(conn)?,
                2 => migrate_to_v2(conn)?,
                _ => {}
            }
            set_schema_version(conn, next_version)?;
            conn.execute_batch("RELEASE SAVEPOINT logevo_migrate_step;")?;
            Ok(())
        })();

        match step_result {
            Ok(()) => current_version = next_version,
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK TO SAVEPOINT logevo_migrate_step;");
                let _ = conn.execute_batch("RELEASE SAVEPOINT logevo_migrate_step;");
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Stored schema version; 0 when absent or unparseable.
pub fn get_schema_version(conn: &Connection) -> i32 {
    let result: Result<String, _> = conn.query_row(
        "SELECT value FROM store_meta WHERE key = 'schema_version';",
        [],
        |row| row.get(0),
    );
    match result {
        Ok(v) => v.parse::<i32>().unwrap_or(0),
        Err(_) => 0,
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> LogEvoResult<()> {
    conn.execute(
        "INSERT INTO store_meta(key, value) VALUES('schema_version', ?1) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        rusqlite::params![version.to_string()],
    )?;
    Ok(())
}

/// v0 -> v1: baseline created by [`SCHEMA_STATEMENTS`].
fn migrate_to_v1(_conn: &Connection) -> LogEvoResult<()> {
    Ok(())
}

/// v1 -> v2: per-file lookups for the reporting side.
fn migrate_to_v2(conn: &Connection) -> LogEvoResult<()> {
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_logs_file_path ON logs(file_path);")?;
    Ok(())
}
