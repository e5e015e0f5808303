//! Table file writing
//!
//! Atomic mode:
//! 1. Write the encoded table to `<path>.tmp`
//! 2. fsync the temp file
//! 3. Rename it over the table
//! 4. fsync the parent directory (best effort)
//!
//! Direct mode truncates and rewrites the table in place, then fsyncs it.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::errors::{StoreError, StoreResult};
use super::table::Table;
use crate::codec::encode_table;
use crate::schema::Schema;

/// Sibling temp file used by atomic writes
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp: OsString = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}

/// Serializes `table` to `path` and returns the file's new mtime.
pub(crate) fn write_table(
    path: &Path,
    schema: &Schema,
    table: &Table,
    pad_columns: bool,
    atomic: bool,
) -> StoreResult<SystemTime> {
    let content = encode_table(schema.fields(), table.rows(), pad_columns);

    if atomic {
        let temp = temp_path_for(path);
        let replaced = write_synced(&temp, content.as_bytes()).and_then(|()| {
            fs::rename(&temp, path)
                .map_err(|e| StoreError::io("failed to rename temp table into place", path, e))
        });
        if let Err(e) = replaced {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    } else {
        write_synced(path, content.as_bytes())?;
    }

    modified_time(path)
}

fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| StoreError::io("failed to open table for writing", path, e))?;

    file.write_all(bytes)
        .map_err(|e| StoreError::io("failed to write table", path, e))?;

    file.sync_all()
        .map_err(|e| StoreError::io("failed to fsync table", path, e))
}

/// Current mtime of `path`
pub(crate) fn modified_time(path: &Path) -> StoreResult<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| StoreError::io("failed to stat table", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> (Schema, Table) {
        let schema = Schema::new(["id", "name"]).unwrap();
        let mut table = Table::new();
        table.insert(vec![json!("1"), json!("a|b")]);
        (schema, table)
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.db");
        let (schema, table) = sample();

        let mtime = write_table(&path, &schema, &table, true, true).unwrap();
        assert_eq!(mtime, fs::metadata(&path).unwrap().modified().unwrap());
        assert!(!temp_path_for(&path).exists());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            " id  | name\n-----+-------\n \"1\" | \"a|b\"\n"
        );
    }

    #[test]
    fn test_direct_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.db");
        fs::write(&path, "stale content that is longer than the table\n".repeat(4)).unwrap();
        let (schema, table) = sample();

        write_table(&path, &schema, &table, false, false).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id|name\n--+----\n\"1\"|\"a|b\"\n"
        );
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("t.db");
        let (schema, table) = sample();

        let err = write_table(&path, &schema, &table, true, true).unwrap_err();
        assert_eq!(err.code(), crate::store::StoreErrorCode::Io);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the table path makes the rename fail
        let path = dir.path().join("t.db");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupant"), "x").unwrap();
        let (schema, table) = sample();

        let err = write_table(&path, &schema, &table, true, true).unwrap_err();
        assert_eq!(err.code(), crate::store::StoreErrorCode::Io);
        assert!(!temp_path_for(&path).exists());
        assert!(path.join("occupant").exists());
    }

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/data/t.db")),
            PathBuf::from("/data/t.db.tmp")
        );
    }
}
