//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A course parsed from one document. The title is the catalogue key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    /// Lessons in document order
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Find a lesson by number.
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }
}

/// A numbered lesson and its source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Lesson body as it appeared in the document
    #[serde(default)]
    pub text: String,
}

/// A bounded span of lesson text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// SHA-256 over course title, lesson number and span
    pub id: String,

    pub course_title: String,
    pub lesson_number: u32,

    /// Position of this chunk within its course
    pub chunk_index: u32,

    /// Character offsets `[start, end)` within the lesson text
    pub span: (usize, usize),

    /// Exact lesson text covered by `span`
    pub content: String,
}

impl CourseChunk {
    pub fn new(
        course_title: &str,
        lesson_number: u32,
        chunk_index: u32,
        span: (usize, usize),
        content: String,
    ) -> Self {
        Self {
            id: chunk_id(course_title, lesson_number, span),
            course_title: course_title.to_string(),
            lesson_number,
            chunk_index,
            span,
            content,
        }
    }

    /// Text sent to the embedding provider: course and lesson context
    /// followed by the trimmed chunk content.
    pub fn embedding_text(&self) -> String {
        format!(
            "Course {} Lesson {} content: {}",
            self.course_title,
            self.lesson_number,
            self.content.trim()
        )
    }

    /// Attribution label, e.g. "Intro to Testing - Lesson 2".
    pub fn label(&self) -> String {
        format!("{} - Lesson {}", self.course_title, self.lesson_number)
    }
}

fn chunk_id(course_title: &str, lesson_number: u32, span: (usize, usize)) -> String {
    let mut hasher = Sha256::new();
    hasher.update(course_title.as_bytes());
    hasher.update(b"|");
    hasher.update(lesson_number.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(span.0.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(span.1.to_string().as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Search restriction. Fields combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Exact, already-resolved course title
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl SearchFilter {
    pub fn matches(&self, chunk: &CourseChunk) -> bool {
        self.course_title
            .as_deref()
            .map_or(true, |t| chunk.course_title == t)
            && self.lesson_number.map_or(true, |n| chunk.lesson_number == n)
    }
}

/// A retrieved chunk with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: CourseChunk,

    /// Cosine similarity with the query embedding
    pub score: f32,

    /// Lesson link, when the document gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SearchResult {
    pub fn source(&self) -> Source {
        Source {
            text: self.chunk.label(),
            link: self.link.clone(),
        }
    }
}

/// A source cited by an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Catalogue summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Courses newly added to the index
    pub courses_added: usize,

    /// Chunks newly added to the index
    pub chunks_added: usize,

    /// Documents skipped because their course was already indexed
    pub skipped_existing: usize,

    /// Documents that failed to parse
    pub failed: usize,
}

/// Catalogue entry as kept by a vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course: Course,
    pub ingested_at: DateTime<Utc>,
}
