//! The course embedding index: chunk embeddings, catalogue and search.

use crate::embeddings::EmbeddingProvider;
use crate::store::{cosine_similarity, VectorStore};
use crate::types::{Course, CourseAnalytics, CourseChunk, CourseRecord, SearchFilter, SearchResult};
use chrono::Utc;
use lectern_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use unicode_segmentation::UnicodeSegmentation;

/// Texts per embedding request during ingestion.
const EMBED_BATCH_SIZE: usize = 32;

/// Minimum title similarity for a fuzzy course-name match.
const MIN_TITLE_SIMILARITY: f32 = 0.3;

/// Shortest word that counts towards a fuzzy course-name match.
const MIN_MATCH_WORD_CHARS: usize = 3;

/// Semantic index over course chunks.
///
/// Searches go straight to the store. Ingestion holds an async lock across
/// the existence check and the insert, so two documents with the same title
/// never both get indexed.
pub struct CourseIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    ingest_lock: Mutex<()>,
    max_results: usize,
}

impl CourseIndex {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        max_results: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            ingest_lock: Mutex::new(()),
            max_results,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Index a course and its chunks. Returns the number of chunks added,
    /// or 0 when a course with the same title is already indexed.
    pub async fn index(&self, course: &Course, chunks: &[CourseChunk]) -> AppResult<usize> {
        let _guard = self.ingest_lock.lock().await;

        if self.store.has_course(&course.title)? {
            tracing::info!("Course '{}' already indexed, skipping", course.title);
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(CourseChunk::embedding_text).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            embeddings.extend(self.embedder.embed_batch(batch).await?);
        }
        if embeddings.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let title_embedding = self.embedder.embed(&course.title).await?;

        let embedded: Vec<_> = chunks.iter().cloned().zip(embeddings).collect();
        let record = CourseRecord {
            course: course.clone(),
            ingested_at: Utc::now(),
        };
        let added = self.store.add_course(&record, &title_embedding, &embedded)?;

        tracing::info!(
            "Indexed course '{}': {} lessons, {} chunks ({} store)",
            course.title,
            course.lessons.len(),
            added,
            self.store.backend_name()
        );
        Ok(added)
    }

    /// Top `k` chunks for `query` (default `max_results`) that satisfy
    /// `filter`. The course title in the filter must already be resolved.
    pub async fn search(
        &self,
        query: &str,
        filter: &SearchFilter,
        k: Option<usize>,
    ) -> AppResult<Vec<SearchResult>> {
        let k = k.unwrap_or(self.max_results);
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.store.search(&query_embedding, filter, k)?;

        let mut courses: HashMap<String, Option<CourseRecord>> = HashMap::new();
        let mut results = Vec::with_capacity(hits.len());
        for (chunk, score) in hits {
            if !courses.contains_key(&chunk.course_title) {
                let record = self.store.get_course(&chunk.course_title)?;
                courses.insert(chunk.course_title.clone(), record);
            }
            let link = courses
                .get(&chunk.course_title)
                .and_then(|r| r.as_ref())
                .and_then(|r| r.course.lesson(chunk.lesson_number))
                .and_then(|l| l.link.clone());

            results.push(SearchResult { chunk, score, link });
        }

        tracing::debug!(
            "Search for {:?} with {:?} returned {} results",
            query,
            filter,
            results.len()
        );
        Ok(results)
    }

    /// Resolve a possibly partial course name to an indexed title.
    ///
    /// Tries an exact case-insensitive match, then a substring match, then the
    /// most similar title embedding above a minimum similarity. Embedding
    /// candidates must share a word with `name`.
    pub async fn resolve_course(&self, name: &str) -> AppResult<Option<String>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let titles = self.store.course_titles()?;
        if let Some(title) = titles.iter().find(|t| t.to_lowercase() == needle) {
            return Ok(Some(title.clone()));
        }
        if let Some(title) = titles.iter().find(|t| t.to_lowercase().contains(&needle)) {
            return Ok(Some(title.clone()));
        }

        let name_words = match_words(&needle);
        if name_words.is_empty() {
            return Ok(None);
        }

        let name_embedding = self.embedder.embed(name).await?;
        let best = self
            .store
            .title_embeddings()?
            .into_iter()
            .filter(|(title, _)| shares_word(&name_words, &title.to_lowercase()))
            .map(|(title, embedding)| {
                let score = cosine_similarity(&name_embedding, &embedding);
                (title, score)
            })
            .filter(|(_, score)| *score >= MIN_TITLE_SIMILARITY)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((title, score)) => {
                tracing::debug!("Resolved '{}' to '{}' (similarity {:.3})", name, title, score);
                Ok(Some(title))
            }
            None => {
                tracing::debug!("No course matches '{}'", name);
                Ok(None)
            }
        }
    }

    pub fn get_course(&self, title: &str) -> AppResult<Option<Course>> {
        Ok(self.store.get_course(title)?.map(|r| r.course))
    }

    pub fn lesson_link(&self, title: &str, lesson_number: u32) -> AppResult<Option<String>> {
        Ok(self
            .get_course(title)?
            .and_then(|c| c.lesson(lesson_number).and_then(|l| l.link.clone())))
    }

    pub fn course_titles(&self) -> AppResult<Vec<String>> {
        self.store.course_titles()
    }

    pub fn course_count(&self) -> AppResult<usize> {
        self.store.course_count()
    }

    pub fn chunk_count(&self) -> AppResult<usize> {
        self.store.chunk_count()
    }

    pub fn analytics(&self) -> AppResult<CourseAnalytics> {
        let course_titles = self.course_titles()?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    pub async fn clear(&self) -> AppResult<()> {
        let _guard = self.ingest_lock.lock().await;
        self.store.clear()
    }
}

fn match_words(text: &str) -> HashSet<&str> {
    text.unicode_words()
        .filter(|w| w.chars().count() >= MIN_MATCH_WORD_CHARS)
        .collect()
}

/// Whether `title` has a word equal to, or starting with, one of `words`.
fn shares_word(words: &HashSet<&str>, title: &str) -> bool {
    match_words(title)
        .iter()
        .any(|t| words.iter().any(|w| t.starts_with(w) || w.starts_with(t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunker;
    use crate::embeddings::providers::TrigramProvider;
    use crate::store::MemoryStore;

    const TESTING: &str = "Course Title: Intro to Testing
Course Link: https://example.com/testing
Course Instructor: Ada

Lesson 1: Why Test
Lesson Link: https://example.com/testing/1
Automated tests catch regressions before release.

Lesson 2: Fixtures
Lesson Link: https://example.com/testing/2
Fixtures prepare shared state for tests. Temporary directories keep tests isolated.
";

    const COOKING: &str = "Course Title: Pasta Basics
Course Link: https://example.com/pasta
Course Instructor: Marco

Lesson 1: Boiling
Salted water should boil before the pasta goes in.
";

    fn index() -> CourseIndex {
        CourseIndex::new(
            Arc::new(TrigramProvider::new(256)),
            Arc::new(MemoryStore::new()),
            5,
        )
    }

    async fn ingest(index: &CourseIndex, doc: &str) -> usize {
        let (course, chunks) = Chunker::new(800, 100)
            .unwrap()
            .process_document(doc)
            .unwrap();
        index.index(&course, &chunks).await.unwrap()
    }

    #[tokio::test]
    async fn test_reindexing_same_title_is_noop() {
        let index = index();
        assert_eq!(ingest(&index, TESTING).await, 2);
        let before = index.chunk_count().unwrap();

        assert_eq!(ingest(&index, TESTING).await, 0);
        assert_eq!(index.chunk_count().unwrap(), before);
        assert_eq!(index.course_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_course_filter_excludes_other_courses() {
        let index = index();
        ingest(&index, TESTING).await;
        ingest(&index, COOKING).await;

        let filter = SearchFilter {
            course_title: Some("Pasta Basics".to_string()),
            lesson_number: None,
        };
        let results = index.search("tests", &filter, None).await.unwrap();

        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.chunk.course_title == "Pasta Basics"));
    }

    #[tokio::test]
    async fn test_lesson_filter_and_links() {
        let index = index();
        ingest(&index, TESTING).await;

        let filter = SearchFilter {
            course_title: Some("Intro to Testing".to_string()),
            lesson_number: Some(2),
        };
        let results = index.search("fixtures", &filter, None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.lesson_number, 2);
        assert_eq!(results[0].link.as_deref(), Some("https://example.com/testing/2"));
        assert_eq!(results[0].source().text, "Intro to Testing - Lesson 2");
    }

    #[tokio::test]
    async fn test_empty_index_search_is_empty() {
        let results = index()
            .search("anything", &SearchFilter::default(), None)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_course() {
        let index = index();
        ingest(&index, TESTING).await;
        ingest(&index, COOKING).await;

        assert_eq!(
            index.resolve_course("intro to testing").await.unwrap().as_deref(),
            Some("Intro to Testing")
        );
        assert_eq!(
            index.resolve_course("pasta").await.unwrap().as_deref(),
            Some("Pasta Basics")
        );
        assert_eq!(
            index.resolve_course("Testing Intro").await.unwrap().as_deref(),
            Some("Intro to Testing")
        );
        assert_eq!(index.resolve_course("Quantum Chromodynamics").await.unwrap(), None);
        assert_eq!(index.resolve_course("  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_rejects_unrelated_name_with_single_course() {
        let index = index();
        ingest(&index, TESTING).await;

        for name in ["Underwater Basket Weaving", "Cooking", "Marketing Strategy"] {
            assert_eq!(index.resolve_course(name).await.unwrap(), None, "{}", name);
        }
        assert_eq!(
            index.resolve_course("intro testing").await.unwrap().as_deref(),
            Some("Intro to Testing")
        );
    }

    #[test]
    fn test_shares_word() {
        let words = match_words("testing basics");
        assert!(shares_word(&words, "intro to testing"));
        assert!(!shares_word(&words, "pasta cooking"));
        assert!(match_words("to a").is_empty());
    }

    #[tokio::test]
    async fn test_analytics_and_clear() {
        let index = index();
        ingest(&index, TESTING).await;
        ingest(&index, COOKING).await;

        let analytics = index.analytics().unwrap();
        assert_eq!(analytics.total_courses, 2);
        assert_eq!(analytics.course_titles, vec!["Intro to Testing", "Pasta Basics"]);
        assert_eq!(
            index.lesson_link("Intro to Testing", 1).unwrap().as_deref(),
            Some("https://example.com/testing/1")
        );

        index.clear().await.unwrap();
        assert_eq!(index.course_count().unwrap(), 0);
        assert_eq!(index.chunk_count().unwrap(), 0);
    }
}
