//! Vector stores holding chunk embeddings and the course catalogue.
//!
//! Searches only need shared access; writers are serialized by the
//! [`CourseIndex`](crate::index::CourseIndex) ingest lock.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::{CourseChunk, CourseRecord, SearchFilter};
use lectern_core::AppResult;

/// A chunk paired with its embedding, as written to a store.
pub type EmbeddedChunk = (CourseChunk, Vec<f32>);

/// Storage backend for the embedding index.
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs ("memory", "sqlite").
    fn backend_name(&self) -> &str;

    /// Add a catalogue entry, its title embedding and its chunks as one
    /// write. Chunk ids already stored are ignored. A title already in the
    /// catalogue leaves the store unchanged. Returns the number of chunks
    /// added.
    fn add_course(
        &self,
        record: &CourseRecord,
        title_embedding: &[f32],
        chunks: &[EmbeddedChunk],
    ) -> AppResult<usize>;

    fn has_course(&self, title: &str) -> AppResult<bool>;

    /// Catalogue titles in ingestion order.
    fn course_titles(&self) -> AppResult<Vec<String>>;

    fn get_course(&self, title: &str) -> AppResult<Option<CourseRecord>>;

    /// Top `k` chunks matching `filter`, by descending cosine similarity.
    fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        k: usize,
    ) -> AppResult<Vec<(CourseChunk, f32)>>;

    /// Every course title with its embedding.
    fn title_embeddings(&self) -> AppResult<Vec<(String, Vec<f32>)>>;

    fn chunk_count(&self) -> AppResult<usize>;

    fn course_count(&self) -> AppResult<usize>;

    /// Remove all courses and chunks.
    fn clear(&self) -> AppResult<()>;
}

/// Cosine similarity; zero for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by descending score, ties broken by course and chunk order, and keep `k`.
pub(crate) fn rank(mut scored: Vec<(CourseChunk, f32)>, k: usize) -> Vec<(CourseChunk, f32)> {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.course_title.cmp(&b.0.course_title))
            .then_with(|| a.0.chunk_index.cmp(&b.0.chunk_index))
    });
    scored.truncate(k);
    scored
}
