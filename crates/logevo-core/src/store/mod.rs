pub mod database;
pub mod schema;

pub use database::{record_hash, CommitInfo, LogStore, StoredLog};
