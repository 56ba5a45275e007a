//! Embedded SQLite persistence for document chunks.
//!
//! One row per chunk; embeddings are little-endian `f32` BLOBs, metadata is
//! a JSON text column. Replacing a file's chunks is one transaction, so
//! readers never observe a half-replaced file. Multiple store instances may
//! open the same backing file; writers serialize on the engine's own
//! locking (WAL + busy timeout), not on application mutexes.

use super::types::{DocumentChunk, FileMetadata};
use super::{Result, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub(crate) struct ChunkDb {
    conn: Mutex<Connection>,
}

impl ChunkDb {
    /// Open or create the backing database file.
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_file TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                file_hash TEXT NOT NULL,
                indexed_at TEXT NOT NULL,
                UNIQUE(source_file, chunk_index)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source_file
                ON chunks(source_file);

            CREATE TABLE IF NOT EXISTS file_state (
                file_path TEXT PRIMARY KEY,
                hash TEXT NOT NULL,
                size INTEGER NOT NULL,
                last_modified INTEGER,
                last_checked TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    /// Atomically replace all chunks of one source file, optionally
    /// recording its change-detection state in the same transaction.
    pub(crate) fn replace_file(
        &self,
        source_file: &str,
        chunks: &[DocumentChunk],
        state: Option<&FileMetadata>,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM chunks WHERE source_file = ?1",
            params![source_file],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks
                 (source_file, chunk_index, content, embedding, metadata, file_hash, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for chunk in chunks {
                stmt.execute(params![
                    chunk.source_file,
                    chunk.chunk_index as i64,
                    chunk.content,
                    embedding_to_bytes(&chunk.embedding),
                    serde_json::to_string(&chunk.metadata)?,
                    chunk.file_hash,
                    chunk.indexed_at.to_rfc3339(),
                ])?;
            }
        }
        if let Some(state) = state {
            upsert_state(&tx, state)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Drop one file's chunks and its recorded state.
    pub(crate) fn delete_file(&self, source_file: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM chunks WHERE source_file = ?1",
            params![source_file],
        )?;
        tx.execute(
            "DELETE FROM file_state WHERE file_path = ?1",
            params![source_file],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Load candidate chunks, optionally pre-filtered by substring match on
    /// `source_file`. Rows come back in a deterministic order so ranking
    /// ties stay stable.
    pub(crate) fn load_chunks(&self, filters: &[String]) -> Result<Vec<DocumentChunk>> {
        let conn = self.conn()?;

        let mut sql = String::from(
            "SELECT source_file, chunk_index, content, embedding, metadata, file_hash, indexed_at
             FROM chunks",
        );
        if !filters.is_empty() {
            let clauses = vec!["instr(source_file, ?) > 0"; filters.len()].join(" OR ");
            sql.push_str(" WHERE ");
            sql.push_str(&clauses);
        }
        sql.push_str(" ORDER BY source_file, chunk_index");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(filters), |row| {
            let embedding_bytes: Vec<u8> = row.get(3)?;
            let metadata_json: String = row.get(4)?;
            let indexed_at_text: String = row.get(6)?;
            Ok(DocumentChunk {
                source_file: row.get(0)?,
                chunk_index: row.get::<_, i64>(1)? as usize,
                content: row.get(2)?,
                embedding: bytes_to_embedding(&embedding_bytes),
                metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
                file_hash: row.get(5)?,
                indexed_at: parse_timestamp(&indexed_at_text),
            })
        })?;

        let mut chunks = Vec::new();
        for row in rows {
            chunks.push(row?);
        }
        Ok(chunks)
    }

    pub(crate) fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub(crate) fn list_source_files(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT source_file FROM chunks ORDER BY source_file")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }

    /// Stored content hash for a file, read from its chunk rows.
    pub(crate) fn file_hash(&self, source_file: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let hash = conn
            .query_row(
                "SELECT file_hash FROM chunks WHERE source_file = ?1 LIMIT 1",
                params![source_file],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    pub(crate) fn file_state(&self, file_path: &str) -> Result<Option<FileMetadata>> {
        let conn = self.conn()?;
        let state = conn
            .query_row(
                "SELECT file_path, hash, size, last_modified, last_checked
                 FROM file_state WHERE file_path = ?1",
                params![file_path],
                |row| {
                    let last_checked_text: String = row.get(4)?;
                    Ok(FileMetadata {
                        file_path: row.get(0)?,
                        hash: row.get(1)?,
                        size: row.get::<_, i64>(2)? as u64,
                        last_modified: row.get(3)?,
                        last_checked: parse_timestamp(&last_checked_text),
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    pub(crate) fn file_states(
        &self,
        paths: &[String],
    ) -> Result<HashMap<String, FileMetadata>> {
        let mut states = HashMap::new();
        for path in paths {
            if let Some(state) = self.file_state(path)? {
                states.insert(path.clone(), state);
            }
        }
        Ok(states)
    }

    /// Refresh `last_checked` after a skipped (unchanged) reindex.
    pub(crate) fn touch_checked(&self, file_path: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE file_state SET last_checked = ?2 WHERE file_path = ?1",
            params![file_path, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub(crate) fn clear_all(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM file_state", [])?;
        tx.commit()?;
        Ok(())
    }
}

fn upsert_state(tx: &rusqlite::Transaction<'_>, state: &FileMetadata) -> Result<()> {
    tx.execute(
        "INSERT INTO file_state (file_path, hash, size, last_modified, last_checked)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(file_path) DO UPDATE SET
             hash = excluded.hash,
             size = excluded.size,
             last_modified = excluded.last_modified,
             last_checked = excluded.last_checked",
        params![
            state.file_path,
            state.hash,
            state.size as i64,
            state.last_modified,
            state.last_checked.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn parse_timestamp(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn chunk(source: &str, index: usize, hash: &str) -> DocumentChunk {
        let mut metadata = StdHashMap::new();
        metadata.insert(
            "file_name".to_string(),
            serde_json::Value::String(source.to_string()),
        );
        DocumentChunk {
            source_file: source.to_string(),
            chunk_index: index,
            content: format!("{source} chunk {index}"),
            embedding: vec![index as f32, 1.0, -0.5],
            metadata,
            file_hash: hash.to_string(),
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn embedding_bytes_roundtrip() {
        let original = vec![1.0f32, -2.5, 0.0, 3.25];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&original)), original);
    }

    #[test]
    fn replace_then_load_roundtrip() {
        let db = ChunkDb::in_memory().unwrap();
        let chunks = vec![chunk("a.txt", 0, "h1"), chunk("a.txt", 1, "h1")];
        db.replace_file("a.txt", &chunks, None).unwrap();

        let loaded = db.load_chunks(&[]).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chunk_index, 0);
        assert_eq!(loaded[1].chunk_index, 1);
        assert_eq!(loaded[0].embedding, vec![0.0, 1.0, -0.5]);
        assert_eq!(
            loaded[0].metadata["file_name"],
            serde_json::Value::String("a.txt".to_string())
        );
        assert_eq!(db.count().unwrap(), 2);
    }

    #[test]
    fn replace_swaps_the_whole_chunk_set() {
        let db = ChunkDb::in_memory().unwrap();
        db.replace_file(
            "a.txt",
            &[chunk("a.txt", 0, "h1"), chunk("a.txt", 1, "h1")],
            None,
        )
        .unwrap();
        db.replace_file("a.txt", &[chunk("a.txt", 0, "h2")], None)
            .unwrap();

        let loaded = db.load_chunks(&[]).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].file_hash, "h2");
        assert_eq!(db.file_hash("a.txt").unwrap().as_deref(), Some("h2"));
    }

    #[test]
    fn substring_filters_push_down() {
        let db = ChunkDb::in_memory().unwrap();
        db.replace_file("docs/file1.txt", &[chunk("docs/file1.txt", 0, "h")], None)
            .unwrap();
        db.replace_file("docs/file2.txt", &[chunk("docs/file2.txt", 0, "h")], None)
            .unwrap();
        db.replace_file("notes/other.md", &[chunk("notes/other.md", 0, "h")], None)
            .unwrap();

        let only_file1 = db.load_chunks(&["file1".to_string()]).unwrap();
        assert_eq!(only_file1.len(), 1);
        assert_eq!(only_file1[0].source_file, "docs/file1.txt");

        let either = db
            .load_chunks(&["file1".to_string(), "other".to_string()])
            .unwrap();
        assert_eq!(either.len(), 2);

        let none = db.load_chunks(&["missing".to_string()]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn file_state_roundtrip_and_touch() {
        let db = ChunkDb::in_memory().unwrap();
        let state = FileMetadata {
            file_path: "a.txt".to_string(),
            hash: "abc".to_string(),
            size: 42,
            last_modified: Some(1_700_000_000_000),
            last_checked: Utc::now(),
        };
        db.replace_file("a.txt", &[chunk("a.txt", 0, "abc")], Some(&state))
            .unwrap();

        let loaded = db.file_state("a.txt").unwrap().unwrap();
        assert_eq!(loaded.hash, "abc");
        assert_eq!(loaded.size, 42);
        assert_eq!(loaded.last_modified, Some(1_700_000_000_000));

        db.touch_checked("a.txt").unwrap();
        let touched = db.file_state("a.txt").unwrap().unwrap();
        assert!(touched.last_checked >= loaded.last_checked);

        assert!(db.file_state("missing.txt").unwrap().is_none());
    }

    #[test]
    fn delete_file_removes_chunks_and_state() {
        let db = ChunkDb::in_memory().unwrap();
        let state = FileMetadata {
            file_path: "a.txt".to_string(),
            hash: "h".to_string(),
            size: 1,
            last_modified: None,
            last_checked: Utc::now(),
        };
        db.replace_file("a.txt", &[chunk("a.txt", 0, "h")], Some(&state))
            .unwrap();
        db.replace_file("b.txt", &[chunk("b.txt", 0, "h")], None)
            .unwrap();

        db.delete_file("a.txt").unwrap();
        assert_eq!(db.count().unwrap(), 1);
        assert!(db.file_state("a.txt").unwrap().is_none());
        assert_eq!(db.list_source_files().unwrap(), vec!["b.txt".to_string()]);
    }

    #[test]
    fn clear_all_empties_both_tables() {
        let db = ChunkDb::in_memory().unwrap();
        db.replace_file("a.txt", &[chunk("a.txt", 0, "h")], None)
            .unwrap();
        db.clear_all().unwrap();
        assert_eq!(db.count().unwrap(), 0);
        assert!(db.list_source_files().unwrap().is_empty());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let db = ChunkDb::open(&path).unwrap();
            db.replace_file("a.txt", &[chunk("a.txt", 0, "h1")], None)
                .unwrap();
        }

        let reopened = ChunkDb::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(
            reopened.file_hash("a.txt").unwrap().as_deref(),
            Some("h1")
        );
    }
}
