//! Sentence-aware chunking with configurable size and overlap.
//!
//! All offsets are in characters. Each chunk keeps its exact span of the
//! lesson text, so consecutive chunks share `overlap` characters and the
//! lesson can be rebuilt from the chunks by dropping the shared prefix.

use crate::config::RagConfig;
use crate::document;
use crate::types::{Course, CourseChunk, Lesson};
use lectern_core::{AppError, AppResult};
use unicode_segmentation::UnicodeSegmentation;

/// Tokens whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "dr.", "mr.", "mrs.", "ms.", "prof.", "sr.", "jr.", "st.", "vs.", "e.g.", "i.e.", "inc.",
    "ltd.", "fig.", "no.", "approx.",
];

/// Splits lesson text into overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &RagConfig) -> AppResult<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Parse a course document and chunk every lesson.
    pub fn process_document(&self, text: &str) -> AppResult<(Course, Vec<CourseChunk>)> {
        let course = document::parse_course(text)?;
        let chunks = self.chunk_course(&course);
        Ok((course, chunks))
    }

    /// Chunks for all lessons, indexed consecutively across the course.
    pub fn chunk_course(&self, course: &Course) -> Vec<CourseChunk> {
        let mut chunks = Vec::new();
        for lesson in &course.lessons {
            let next_index = chunks.len() as u32;
            chunks.extend(self.chunk_lesson(&course.title, lesson, next_index));
        }

        tracing::debug!(
            "Chunked course '{}' into {} chunks (size: {}, overlap: {})",
            course.title,
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }

    /// Chunks for one lesson, numbered from `first_index`.
    pub fn chunk_lesson(
        &self,
        course_title: &str,
        lesson: &Lesson,
        first_index: u32,
    ) -> Vec<CourseChunk> {
        if lesson.text.is_empty() {
            return Vec::new();
        }
        let text = CharText::new(&lesson.text);

        let max_unit = self.chunk_size - self.chunk_overlap;
        let units: Vec<(usize, usize)> = split_sentences(&lesson.text)
            .into_iter()
            .flat_map(|span| text.split_long(span, max_unit))
            .collect();

        let mut spans = Vec::new();
        let mut cur_start = 0;
        let mut cur_end = 0;

        for (_, unit_end) in units {
            if unit_end - cur_start <= self.chunk_size {
                cur_end = unit_end;
                continue;
            }

            spans.push((cur_start, cur_end));
            cur_start = cur_end.saturating_sub(self.chunk_overlap).max(cur_start + 1);
            cur_end = unit_end;
        }
        if cur_end > cur_start {
            spans.push((cur_start, cur_end));
        }

        spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                CourseChunk::new(
                    course_title,
                    lesson.number,
                    first_index + i as u32,
                    span,
                    text.slice(span).to_string(),
                )
            })
            .collect()
    }
}

/// Sentence spans in characters, covering the whole text.
///
/// Unicode sentence boundaries, except that a boundary right after a known
/// abbreviation or a single-letter initial ("J.") is merged away.
pub fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut pos = 0;
    let mut merge_next = false;

    for segment in text.split_sentence_bounds() {
        let len = segment.chars().count();
        let span = (pos, pos + len);
        pos += len;

        match spans.last_mut() {
            Some(last) if merge_next => last.1 = span.1,
            _ => spans.push(span),
        }
        merge_next = ends_with_abbreviation(segment);
    }

    spans
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let Some(token) = segment.split_whitespace().last() else {
        return false;
    };
    let token = token
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    if ABBREVIATIONS.contains(&token.as_str()) {
        return true;
    }

    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_alphabetic()
    )
}

/// Text addressed by character offsets.
struct CharText<'a> {
    text: &'a str,
    /// Byte offset of every char, plus the text length
    byte_offsets: Vec<usize>,
}

impl<'a> CharText<'a> {
    fn new(text: &'a str) -> Self {
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_offsets.push(text.len());
        Self { text, byte_offsets }
    }

    fn slice(&self, (start, end): (usize, usize)) -> &'a str {
        &self.text[self.byte_offsets[start]..self.byte_offsets[end]]
    }

    /// Break a span longer than `max` at whitespace, or hard-split when a
    /// window has no whitespace.
    fn split_long(&self, (start, end): (usize, usize), max: usize) -> Vec<(usize, usize)> {
        let mut pieces = Vec::new();
        let mut start = start;

        while end - start > max {
            let window = self.slice((start, start + max));
            let cut = window
                .char_indices()
                .filter(|(_, c)| c.is_whitespace())
                .map(|(byte, _)| window[..byte].chars().count() + 1)
                .last()
                .unwrap_or(max);
            pieces.push((start, start + cut));
            start += cut;
        }
        pieces.push((start, end));
        pieces
    }
}
