//! SQLite-backed vector store.
//!
//! Embeddings are stored as little-endian `f32` blobs and scored in process.
//! The embedding settings used to build the store are recorded in `meta`;
//! reopening with a different provider, model or dimension count fails.

use super::{cosine_similarity, rank, EmbeddedChunk, VectorStore};
use crate::embeddings::EmbeddingConfig;
use crate::types::{CourseChunk, CourseRecord, SearchFilter};
use lectern_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const EMBEDDING_META_KEY: &str = "embedding";

/// Persistent vector store in a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at `db_path`.
    pub fn open(db_path: &Path, embedding: &EmbeddingConfig) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create vector store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite store: {}", e)))?;
        init_schema(&conn)?;
        check_embedding_meta(&conn, embedding)?;

        tracing::debug!("Opened SQLite vector store at {:?}", db_path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("SQLite store lock poisoned".to_string()))
    }
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS courses (
            title TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            record TEXT NOT NULL,
            title_embedding BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            course_title TEXT NOT NULL,
            lesson_number INTEGER NOT NULL,
            chunk_index INTEGER NOT NULL,
            span_start INTEGER NOT NULL,
            span_end INTEGER NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))
}

fn check_embedding_meta(conn: &Connection, embedding: &EmbeddingConfig) -> AppResult<()> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![EMBEDDING_META_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| AppError::Knowledge(format!("Failed to read store metadata: {}", e)))?;

    match stored {
        Some(json) => {
            let stored: EmbeddingConfig = serde_json::from_str(&json)?;
            stored.validate_consistency(embedding).map_err(|e| {
                AppError::Knowledge(format!(
                    "Vector store was built with different embeddings ({}). Re-ingest with --clear or remove the store file",
                    e
                ))
            })
        }
        None => {
            conn.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                params![EMBEDDING_META_KEY, serde_json::to_string(embedding)?],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to write store metadata: {}", e)))?;
            Ok(())
        }
    }
}

impl VectorStore for SqliteStore {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    fn add_course(
        &self,
        record: &CourseRecord,
        title_embedding: &[f32],
        chunks: &[EmbeddedChunk],
    ) -> AppResult<usize> {
        let record_json = serde_json::to_string(record)?;
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO courses (title, position, record, title_embedding)
                 VALUES (?1, (SELECT COUNT(*) FROM courses), ?2, ?3)",
                params![
                    record.course.title,
                    record_json,
                    embedding_to_bytes(title_embedding)
                ],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to insert course: {}", e)))?;
        if inserted == 0 {
            return Ok(0);
        }

        let mut added = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO chunks
                     (id, course_title, lesson_number, chunk_index, span_start, span_end, content, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

            for (chunk, embedding) in chunks {
                added += stmt
                    .execute(params![
                        chunk.id,
                        chunk.course_title,
                        chunk.lesson_number,
                        chunk.chunk_index,
                        chunk.span.0 as i64,
                        chunk.span.1 as i64,
                        chunk.content,
                        embedding_to_bytes(embedding),
                    ])
                    .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit course: {}", e)))?;
        Ok(added)
    }

    fn has_course(&self, title: &str) -> AppResult<bool> {
        self.conn()?
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM courses WHERE title = ?1)",
                params![title],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to look up course: {}", e)))
    }

    fn course_titles(&self) -> AppResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT title FROM courses ORDER BY position")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;
        let titles = stmt
            .query_map([], |row| row.get(0))
            .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
            .map_err(|e| AppError::Knowledge(format!("Failed to list courses: {}", e)))?;
        Ok(titles)
    }

    fn get_course(&self, title: &str) -> AppResult<Option<CourseRecord>> {
        let json: Option<String> = self
            .conn()?
            .query_row(
                "SELECT record FROM courses WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Knowledge(format!("Failed to load course: {}", e)))?;

        json.map(|j| serde_json::from_str(&j).map_err(AppError::from))
            .transpose()
    }

    fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        k: usize,
    ) -> AppResult<Vec<(CourseChunk, f32)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, course_title, lesson_number, chunk_index, span_start, span_end, content, embedding
                 FROM chunks
                 WHERE (?1 IS NULL OR course_title = ?1) AND (?2 IS NULL OR lesson_number = ?2)",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![filter.course_title, filter.lesson_number], |row| {
                let chunk = CourseChunk {
                    id: row.get(0)?,
                    course_title: row.get(1)?,
                    lesson_number: row.get(2)?,
                    chunk_index: row.get(3)?,
                    span: (
                        row.get::<_, i64>(4)? as usize,
                        row.get::<_, i64>(5)? as usize,
                    ),
                    content: row.get(6)?,
                };
                let bytes: Vec<u8> = row.get(7)?;
                Ok((chunk, bytes))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (chunk, bytes) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;
            let embedding = bytes_to_embedding(&bytes)?;
            let score = cosine_similarity(query_embedding, &embedding);
            scored.push((chunk, score));
        }

        let results = rank(scored, k);
        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), k);
        Ok(results)
    }

    fn title_embeddings(&self) -> AppResult<Vec<(String, Vec<f32>)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT title, title_embedding FROM courses ORDER BY position")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| AppError::Knowledge(format!("Failed to read course titles: {}", e)))?;

        rows.into_iter()
            .map(|(title, bytes)| Ok((title, bytes_to_embedding(&bytes)?)))
            .collect()
    }

    fn chunk_count(&self) -> AppResult<usize> {
        count(&*self.conn()?, "SELECT COUNT(*) FROM chunks")
    }

    fn course_count(&self) -> AppResult<usize> {
        count(&*self.conn()?, "SELECT COUNT(*) FROM courses")
    }

    fn clear(&self) -> AppResult<()> {
        self.conn()?
            .execute_batch("DELETE FROM chunks; DELETE FROM courses;")
            .map_err(|e| AppError::Knowledge(format!("Failed to clear vector store: {}", e)))?;

        tracing::info!("Cleared vector store");
        Ok(())
    }
}

fn count(conn: &Connection, sql: &str) -> AppResult<usize> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|n| n as usize)
        .map_err(|e| AppError::Knowledge(format!("Failed to count rows: {}", e)))
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Course, Lesson};
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(title: &str) -> CourseRecord {
        CourseRecord {
            course: Course {
                title: title.to_string(),
                link: Some("https://example.com".to_string()),
                instructor: Some("Ada".to_string()),
                lessons: vec![Lesson {
                    number: 1,
                    title: "Intro".to_string(),
                    link: None,
                    text: "Hello.".to_string(),
                }],
            },
            ingested_at: Utc::now(),
        }
    }

    fn embedded(course: &str, lesson: u32, index: u32, embedding: Vec<f32>) -> EmbeddedChunk {
        let span = (index as usize * 10, index as usize * 10 + 10);
        (
            CourseChunk::new(course, lesson, index, span, format!("chunk {}", index)),
            embedding,
        )
    }

    fn config(dimensions: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            dimensions,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_search() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("store.sqlite"), &config(2)).unwrap();

        let added = store
            .add_course(
                &record("A"),
                &[1.0, 0.0],
                &[
                    embedded("A", 1, 0, vec![1.0, 0.0]),
                    embedded("A", 2, 1, vec![0.0, 1.0]),
                ],
            )
            .unwrap();
        assert_eq!(added, 2);
        store
            .add_course(&record("B"), &[0.0, 1.0], &[embedded("B", 2, 0, vec![0.0, 1.0])])
            .unwrap();

        let results = store.search(&[1.0, 0.0], &SearchFilter::default(), 5).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.lesson_number, 1);
        assert!((results[0].1 - 1.0).abs() < 0.001);

        let filter = SearchFilter {
            course_title: Some("A".to_string()),
            lesson_number: Some(2),
        };
        let results = store.search(&[1.0, 0.0], &filter, 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.course_title, "A");
        assert_eq!(results[0].0.span, (10, 20));
    }

    #[test]
    fn test_duplicate_chunks_ignored() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("store.sqlite"), &config(2)).unwrap();
        let chunk = embedded("A", 1, 0, vec![1.0, 0.0]);

        assert_eq!(store.add_course(&record("A"), &[1.0, 0.0], &[chunk.clone()]).unwrap(), 1);
        assert_eq!(store.add_course(&record("B"), &[0.0, 1.0], &[chunk]).unwrap(), 0);
        assert_eq!(store.chunk_count().unwrap(), 1);
        assert_eq!(store.course_count().unwrap(), 2);
    }

    #[test]
    fn test_existing_title_adds_nothing() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("store.sqlite"), &config(2)).unwrap();
        store
            .add_course(&record("A"), &[1.0, 0.0], &[embedded("A", 1, 0, vec![1.0, 0.0])])
            .unwrap();

        let added = store
            .add_course(&record("A"), &[1.0, 0.0], &[embedded("A", 1, 1, vec![1.0, 0.0])])
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(store.chunk_count().unwrap(), 1);
    }

    #[test]
    fn test_failed_chunk_write_leaves_no_course() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("store.sqlite"), &config(2)).unwrap();
        store
            .conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_chunks BEFORE INSERT ON chunks
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = store.add_course(
            &record("A"),
            &[1.0, 0.0],
            &[embedded("A", 1, 0, vec![1.0, 0.0])],
        );

        assert!(matches!(result, Err(AppError::Knowledge(_))));
        assert!(!store.has_course("A").unwrap());
        assert_eq!(store.course_count().unwrap(), 0);
        assert_eq!(store.chunk_count().unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("store.sqlite");
        {
            let store = SqliteStore::open(&path, &config(2)).unwrap();
            store.add_course(&record("A"), &[1.0, 0.0], &[]).unwrap();
            store.add_course(&record("B"), &[0.0, 1.0], &[]).unwrap();
        }

        let store = SqliteStore::open(&path, &config(2)).unwrap();
        assert_eq!(store.course_titles().unwrap(), vec!["A", "B"]);
        let loaded = store.get_course("A").unwrap().unwrap();
        assert_eq!(loaded.course.instructor.as_deref(), Some("Ada"));
        assert_eq!(store.title_embeddings().unwrap()[1].1, vec![0.0, 1.0]);
    }

    #[test]
    fn test_rejects_different_embedding_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.sqlite");
        SqliteStore::open(&path, &config(2)).unwrap();

        let result = SqliteStore::open(&path, &config(3));
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("store.sqlite"), &config(2)).unwrap();
        store
            .add_course(&record("A"), &[1.0, 0.0], &[embedded("A", 1, 0, vec![1.0, 0.0])])
            .unwrap();

        store.clear().unwrap();
        assert_eq!(store.course_count().unwrap(), 0);
        assert_eq!(store.chunk_count().unwrap(), 0);
        assert!(!store.has_course("A").unwrap());
    }

    #[test]
    fn test_embedding_bytes() {
        let bytes = embedding_to_bytes(&[1.5, -2.0]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), vec![1.5, -2.0]);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }
}
