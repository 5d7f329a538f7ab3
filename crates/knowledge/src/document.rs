//! Course document structure: header lines and lesson markers.
//!
//! ```text
//! Course Title: Intro to Testing
//! Course Link: https://example.com/testing
//! Course Instructor: Ada Lovelace
//!
//! Lesson 1: Why Test
//! Lesson Link: https://example.com/testing/1
//! Lesson text...
//!
//! Lesson 2: Unit Tests
//! ...
//! ```

use crate::types::{Course, Lesson};
use lectern_core::{AppError, AppResult};
use std::collections::HashSet;

const TITLE_PREFIX: &str = "course title:";
const LINK_PREFIX: &str = "course link:";
const INSTRUCTOR_PREFIX: &str = "course instructor:";
const LESSON_LINK_PREFIX: &str = "lesson link:";

/// Value after a case-insensitive `prefix`, if the line starts with it.
fn header_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let trimmed = line.trim();
    let head = trimmed.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| trimmed[prefix.len()..].trim())
}

/// Parse a `Lesson N: title` marker.
fn lesson_marker(line: &str) -> Option<(u32, &str)> {
    let trimmed = line.trim();
    let head = trimmed.get(..6)?;
    if !head.eq_ignore_ascii_case("lesson") {
        return None;
    }

    let rest = trimmed[6..].trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let number = rest[..digits_end].parse().ok()?;
    let title = rest[digits_end..].trim_start().strip_prefix(':')?;
    Some((number, title.trim()))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

struct LessonBuilder {
    number: u32,
    title: String,
    link: Option<String>,
    lines: Vec<String>,
}

impl LessonBuilder {
    fn push_line(&mut self, line: &str) {
        if self.link.is_none() && self.lines.iter().all(|l| l.trim().is_empty()) {
            if let Some(link) = header_value(line, LESSON_LINK_PREFIX) {
                self.link = non_empty(link);
                return;
            }
        }
        self.lines.push(line.to_string());
    }

    fn finish(self) -> Lesson {
        Lesson {
            number: self.number,
            title: self.title,
            link: self.link,
            text: self.lines.join("\n").trim().to_string(),
        }
    }
}

/// Parse a course document.
///
/// Fails with [`AppError::MalformedDocument`] when the title line is missing
/// or empty, the link or instructor line is missing, no lesson marker exists,
/// or a lesson number repeats.
pub fn parse_course(text: &str) -> AppResult<Course> {
    let mut title: Option<String> = None;
    let mut link: Option<Option<String>> = None;
    let mut instructor: Option<Option<String>> = None;

    let mut lessons: Vec<Lesson> = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<LessonBuilder> = None;

    for line in text.lines() {
        if let Some((number, lesson_title)) = lesson_marker(line) {
            if !seen.insert(number) {
                return Err(AppError::MalformedDocument(format!(
                    "Lesson {} appears more than once",
                    number
                )));
            }
            if let Some(done) = current.take() {
                lessons.push(done.finish());
            }
            current = Some(LessonBuilder {
                number,
                title: lesson_title.to_string(),
                link: None,
                lines: Vec::new(),
            });
            continue;
        }

        match current.as_mut() {
            Some(lesson) => lesson.push_line(line),
            None => {
                if let Some(value) = header_value(line, TITLE_PREFIX) {
                    title = Some(value.to_string());
                } else if let Some(value) = header_value(line, LINK_PREFIX) {
                    link = Some(non_empty(value));
                } else if let Some(value) = header_value(line, INSTRUCTOR_PREFIX) {
                    instructor = Some(non_empty(value));
                } else if !line.trim().is_empty() {
                    tracing::debug!("Ignoring text before first lesson: {:?}", line.trim());
                }
            }
        }
    }

    if let Some(done) = current.take() {
        lessons.push(done.finish());
    }

    let title = title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::MalformedDocument("Missing 'Course Title:' line".to_string()))?;
    let link = link.ok_or_else(|| {
        AppError::MalformedDocument(format!("Course '{}' has no 'Course Link:' line", title))
    })?;
    let instructor = instructor.ok_or_else(|| {
        AppError::MalformedDocument(format!(
            "Course '{}' has no 'Course Instructor:' line",
            title
        ))
    })?;

    if lessons.is_empty() {
        return Err(AppError::MalformedDocument(format!(
            "Course '{}' has no 'Lesson N:' markers",
            title
        )));
    }

    tracing::debug!("Parsed course '{}' with {} lessons", title, lessons.len());

    Ok(Course {
        title,
        link,
        instructor,
        lessons,
    })
}
