//! Append-only hook log files
//!
//! Each hook kind owns one log file, `<log_dir>/<hook_kind>.json`, holding a
//! JSON array of event records grown by read-modify-write. Concurrent
//! invocations and killed writers can leave the file truncated mid-write;
//! readers treat anything unparseable as an empty array and overwrite it.

use crate::error::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Path of the log file for one hook kind
pub fn log_file_path(log_dir: &Path, hook_kind: &str) -> PathBuf {
    log_dir.join(format!("{hook_kind}.json"))
}

/// Append one record to a hook kind's log file
///
/// The rewrite goes through a temp file and a rename so a killed writer
/// leaves either the old array or the new one, not a torn file.
pub fn append_record(log_dir: &Path, hook_kind: &str, record: Value) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir, hook_kind);

    let mut records = read_records(&path);
    records.push(record);

    let serialized = serde_json::to_string_pretty(&records)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serialized)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// Read a log file's records, treating a missing or corrupt file as empty
pub fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}
