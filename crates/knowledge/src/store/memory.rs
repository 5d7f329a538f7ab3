//! In-memory [`VectorStore`] for tests and ephemeral runs.
//!
//! Brute-force cosine similarity over every stored vector.

use super::{cosine_similarity, rank, EmbeddedChunk, VectorStore};
use crate::types::{CourseChunk, CourseRecord, SearchFilter};
use lectern_core::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    courses: Vec<(CourseRecord, Vec<f32>)>,
    chunks: Vec<EmbeddedChunk>,
    chunk_ids: HashSet<String>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| AppError::Knowledge("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| AppError::Knowledge("Memory store lock poisoned".to_string()))
    }
}

impl VectorStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn add_course(
        &self,
        record: &CourseRecord,
        title_embedding: &[f32],
        chunks: &[EmbeddedChunk],
    ) -> AppResult<usize> {
        let mut inner = self.write()?;
        if inner
            .courses
            .iter()
            .any(|(r, _)| r.course.title == record.course.title)
        {
            return Ok(0);
        }

        inner
            .courses
            .push((record.clone(), title_embedding.to_vec()));

        let mut added = 0;
        for (chunk, embedding) in chunks {
            if inner.chunk_ids.insert(chunk.id.clone()) {
                inner.chunks.push((chunk.clone(), embedding.clone()));
                added += 1;
            }
        }
        Ok(added)
    }

    fn has_course(&self, title: &str) -> AppResult<bool> {
        Ok(self
            .read()?
            .courses
            .iter()
            .any(|(r, _)| r.course.title == title))
    }

    fn course_titles(&self) -> AppResult<Vec<String>> {
        Ok(self
            .read()?
            .courses
            .iter()
            .map(|(r, _)| r.course.title.clone())
            .collect())
    }

    fn get_course(&self, title: &str) -> AppResult<Option<CourseRecord>> {
        Ok(self
            .read()?
            .courses
            .iter()
            .find(|(r, _)| r.course.title == title)
            .map(|(r, _)| r.clone()))
    }

    fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        k: usize,
    ) -> AppResult<Vec<(CourseChunk, f32)>> {
        let inner = self.read()?;
        let scored = inner
            .chunks
            .iter()
            .filter(|(chunk, _)| filter.matches(chunk))
            .map(|(chunk, embedding)| (chunk.clone(), cosine_similarity(query_embedding, embedding)))
            .collect();
        Ok(rank(scored, k))
    }

    fn title_embeddings(&self) -> AppResult<Vec<(String, Vec<f32>)>> {
        Ok(self
            .read()?
            .courses
            .iter()
            .map(|(r, e)| (r.course.title.clone(), e.clone()))
            .collect())
    }

    fn chunk_count(&self) -> AppResult<usize> {
        Ok(self.read()?.chunks.len())
    }

    fn course_count(&self) -> AppResult<usize> {
        Ok(self.read()?.courses.len())
    }

    fn clear(&self) -> AppResult<()> {
        *self.write()? = Inner::default();
        Ok(())
    }
}
