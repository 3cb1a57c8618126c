use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::transform::{normalize_key, NormalizedRecord};

/// Open (or create) the store, creating its parent directory first.
pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    // Readers open the file read-only, so keep everything in the main file.
    conn.execute_batch("PRAGMA journal_mode=DELETE;")?;
    Ok(conn)
}

/// Open an existing store without creating anything.
pub fn open_readonly(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open {}", path.display()))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entries (
            key     TEXT PRIMARY KEY,
            word    TEXT,
            meaning TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_entries_word ON entries(word);
        ",
    )?;
    Ok(())
}

/// Insert-or-replace every record in one transaction. Returns the number of
/// upserts, which counts records that replaced an earlier row.
pub fn upsert_entries<'a, I>(conn: &Connection, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR REPLACE INTO entries (key, word, meaning) VALUES (?1, ?2, ?3)")?;
        for r in records {
            stmt.execute(params![r.key, r.word, r.meaning])?;
            count += 1;
        }
    }
    tx.commit().context("Failed to commit entries")?;
    Ok(count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub key: String,
    pub word: String,
    pub meaning: String,
}

/// Find the stored entry for a word in any casing.
pub fn lookup(conn: &Connection, word: &str) -> Result<Option<EntryRow>> {
    let row = conn
        .query_row(
            "SELECT key, word, meaning FROM entries WHERE key = ?1 LIMIT 1",
            params![normalize_key(word)],
            |row| {
                Ok(EntryRow {
                    key: row.get(0)?,
                    word: row.get(1)?,
                    meaning: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn count_entries(conn: &Connection) -> Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(word: &str, meaning: &str) -> NormalizedRecord {
        NormalizedRecord {
            key: normalize_key(word),
            word: word.to_string(),
            meaning: meaning.to_string(),
        }
    }

    fn all_rows(conn: &Connection) -> Vec<EntryRow> {
        let mut stmt = conn
            .prepare("SELECT key, word, meaning FROM entries ORDER BY key")
            .unwrap();
        stmt.query_map([], |row| {
            Ok(EntryRow {
                key: row.get(0)?,
                word: row.get(1)?,
                meaning: row.get(2)?,
            })
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
    }

    #[test]
    fn schema_has_word_index() {
        let conn = memory();
        let idx: String = conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = 'idx_entries_word'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(idx.contains("entries(word)"));
        // Re-running is harmless.
        init_schema(&conn).unwrap();
    }

    #[test]
    fn later_record_wins_for_same_key() {
        let conn = memory();
        let records = [record("Foo", "first"), record("Bar", "bar"), record("FOO", "second")];
        let n = upsert_entries(&conn, &records).unwrap();
        assert_eq!(n, 3);
        assert_eq!(count_entries(&conn).unwrap(), 2);

        let foo = lookup(&conn, "foo").unwrap().unwrap();
        assert_eq!(foo.word, "FOO");
        assert_eq!(foo.meaning, "second");
    }

    #[test]
    fn lookup_normalizes_the_query() {
        let conn = memory();
        upsert_entries(&conn, &[record("Namaste", "a greeting")]).unwrap();
        let hit = lookup(&conn, "  NAMASTE ").unwrap().unwrap();
        assert_eq!(
            hit,
            EntryRow {
                key: "namaste".into(),
                word: "Namaste".into(),
                meaning: "a greeting".into(),
            }
        );
        assert!(lookup(&conn, "unknown").unwrap().is_none());
    }

    #[test]
    fn rerun_leaves_unrelated_rows_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("alar.sqlite");

        let conn = connect(&path).unwrap();
        init_schema(&conn).unwrap();
        upsert_entries(&conn, &[record("Old", "kept"), record("Foo", "v1")]).unwrap();
        drop(conn);

        let conn = connect(&path).unwrap();
        init_schema(&conn).unwrap();
        upsert_entries(&conn, &[record("Foo", "v2")]).unwrap();
        drop(conn);

        let conn = open_readonly(&path).unwrap();
        let rows = all_rows(&conn);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].meaning, "v2");
        assert_eq!(rows[1].meaning, "kept");
    }

    #[test]
    fn readonly_open_of_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_readonly(&dir.path().join("missing.sqlite")).is_err());
    }
}
