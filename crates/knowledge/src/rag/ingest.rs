//! Document ingestion into the course index.

use super::system::RagSystem;
use super::types::DocumentOutcome;
use crate::parser::{self, ContentType};
use crate::types::{Course, CourseChunk, IngestStats};
use lectern_core::AppResult;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

impl RagSystem {
    /// Parse and chunk one document without indexing it.
    pub fn load_document(&self, path: &Path) -> AppResult<(Course, Vec<CourseChunk>)> {
        let text = parser::parse_file(path)?;
        self.chunker.process_document(&text)
    }

    /// Ingest a single course document.
    pub async fn ingest_document(&self, path: &Path) -> AppResult<DocumentOutcome> {
        let (course, chunks) = self.load_document(path)?;
        let course_title = course.title.clone();

        if self.index.get_course(&course_title)?.is_some() {
            tracing::info!("Course '{}' already indexed, skipping {:?}", course_title, path);
            return Ok(DocumentOutcome::AlreadyIndexed { course_title });
        }

        let chunks = self.index.index(&course, &chunks).await?;
        Ok(DocumentOutcome::Added {
            course_title,
            chunks,
        })
    }

    /// Ingest every supported document under `dir`.
    ///
    /// Documents whose course is already indexed are skipped; documents that
    /// fail to parse are logged, counted and skipped. A missing folder is not
    /// an error.
    pub async fn ingest_folder(&self, dir: &Path, clear_existing: bool) -> AppResult<IngestStats> {
        let start = Instant::now();
        let mut stats = IngestStats::default();

        if clear_existing {
            tracing::info!("Clearing existing course data");
            self.index.clear().await?;
        }

        if !dir.is_dir() {
            tracing::warn!("Course folder {:?} does not exist", dir);
            return Ok(stats);
        }

        let mut seen: HashSet<String> = self.index.course_titles()?.into_iter().collect();

        for path in document_paths(dir) {
            let (course, chunks) = match self.load_document(&path) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    stats.failed += 1;
                    continue;
                }
            };

            if !seen.insert(course.title.clone()) {
                tracing::debug!("Course '{}' already indexed, skipping {:?}", course.title, path);
                stats.skipped_existing += 1;
                continue;
            }

            let added = self.index.index(&course, &chunks).await?;
            stats.courses_added += 1;
            stats.chunks_added += added;
        }

        tracing::info!(
            "Ingested {:?}: {} courses, {} chunks, {} skipped, {} failed in {:.2}s",
            dir,
            stats.courses_added,
            stats.chunks_added,
            stats.skipped_existing,
            stats.failed,
            start.elapsed().as_secs_f64()
        );

        Ok(stats)
    }

    /// Ingest the configured docs folder of the workspace.
    pub async fn ingest_docs(&self, clear_existing: bool) -> AppResult<IngestStats> {
        let dir = self.config.docs_dir(&self.workspace);
        self.ingest_folder(&dir, clear_existing).await
    }
}

/// Supported documents under `dir`, in file-name order.
fn document_paths(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| ContentType::from_path(p).is_supported())
        .collect()
}
