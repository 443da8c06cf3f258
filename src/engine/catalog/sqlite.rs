//! SQLite-backed catalog: one `files` table, WAL mode, connection shared behind a mutex.

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{MetadataCatalog, SCHEMA, SELECT_COLUMNS, WAL_PRAGMAS};
use crate::{FileRecord, SyncStatus};

pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

/// Enable WAL and apply schema to an open connection (idempotent).
fn apply_wal_and_schema(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .context("enable WAL")?;
    conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(())
}

/// Raw column values; decoded outside rusqlite so a bad status or hash is reported per row.
struct RawRow {
    id: String,
    relative_path: String,
    last_modified_ns: i64,
    content_hash: Vec<u8>,
    cache_control: String,
    content_type: String,
    status: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        relative_path: row.get(1)?,
        last_modified_ns: row.get(2)?,
        content_hash: row.get(3)?,
        cache_control: row.get(4)?,
        content_type: row.get(5)?,
        status: row.get(6)?,
    })
}

impl TryFrom<RawRow> for FileRecord {
    type Error = anyhow::Error;

    fn try_from(raw: RawRow) -> Result<Self> {
        let status: SyncStatus = raw.status.parse()?;
        let content_hash: [u8; 32] = raw.content_hash.as_slice().try_into().map_err(|_| {
            anyhow!(
                "content_hash for {} is {} bytes, expected 32",
                raw.relative_path,
                raw.content_hash.len()
            )
        })?;
        Ok(FileRecord {
            id: raw.id,
            relative_path: raw.relative_path,
            last_modified_ns: raw.last_modified_ns,
            content_hash,
            cache_control: raw.cache_control,
            content_type: raw.content_type,
            status,
        })
    }
}

impl SqliteCatalog {
    /// Open or create the catalog DB and ensure schema + WAL.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open catalog {}", path.display()))?;
        apply_wal_and_schema(&conn)?;
        Ok(SqliteCatalog {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory catalog with the same schema (no WAL pragmas needed).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory catalog")?;
        conn.execute_batch(SCHEMA).context("create schema")?;
        Ok(SqliteCatalog {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("catalog connection lock poisoned"))
    }

    /// Number of records in the catalog.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .context("count files")?;
        Ok(n as usize)
    }
}

impl MetadataCatalog for SqliteCatalog {
    fn add(&self, record: &FileRecord) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO files (id, relative_path, last_modified_ns, content_hash, cache_control, content_type, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.relative_path,
                    record.last_modified_ns,
                    record.content_hash.as_slice(),
                    record.cache_control,
                    record.content_type,
                    record.status.as_str(),
                ],
            )
            .with_context(|| format!("add record {}", record.relative_path))?;
        Ok(())
    }

    fn update(&self, record: &FileRecord) -> Result<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE files SET relative_path = ?2, last_modified_ns = ?3, content_hash = ?4, \
                 cache_control = ?5, content_type = ?6, status = ?7 WHERE id = ?1",
                params![
                    record.id,
                    record.relative_path,
                    record.last_modified_ns,
                    record.content_hash.as_slice(),
                    record.cache_control,
                    record.content_type,
                    record.status.as_str(),
                ],
            )
            .with_context(|| format!("update record {}", record.relative_path))?;
        if changed == 0 {
            bail!(
                "update record {}: no record with id {}",
                record.relative_path,
                record.id
            );
        }
        Ok(())
    }

    fn get_by_path(&self, relative_path: &str) -> Result<Option<FileRecord>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM files WHERE relative_path = ?1"),
                [relative_path],
                read_row,
            )
            .optional()
            .with_context(|| format!("get record {relative_path}"))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match FileRecord::try_from(raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // Reported as absent: the scan treats the file as new and the add then fails on
                // the taken path, which names the row to repair on every pass.
                log::warn!("Unreadable catalog row for {}: {}", relative_path, e);
                Ok(None)
            }
        }
    }

    fn list_all(&self) -> Result<Vec<FileRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM files"))?;
        let rows = stmt.query_map([], read_row)?;
        let mut records = Vec::new();
        for row in rows {
            match FileRecord::try_from(row.context("read catalog row")?) {
                Ok(record) => records.push(record),
                // Left in place: its path cannot be published or swept until the row is fixed.
                Err(e) => log::warn!("Skipping unreadable catalog row: {}", e),
            }
        }
        Ok(records)
    }

    fn delete(&self, record: &FileRecord) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM files WHERE id = ?1", [record.id.as_str()])
            .with_context(|| format!("delete record {}", record.relative_path))?;
        Ok(())
    }
}
