use super::{optional_str, optional_u32, required_str, Tool, ToolOutput};
use crate::index::CourseIndex;
use crate::types::{SearchFilter, SearchResult};
use async_trait::async_trait;
use lectern_core::AppResult;
use lectern_llm::ToolDefinition;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Semantic search over course content, optionally filtered by course and
/// lesson. Allowed once per question.
pub struct CourseSearchTool {
    index: Arc<CourseIndex>,
}

impl CourseSearchTool {
    pub fn new(index: Arc<CourseIndex>) -> Self {
        Self { index }
    }

    /// Run a search and format it for the reasoning service.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> AppResult<ToolOutput> {
        let course_title = match course_name {
            Some(name) => match self.index.resolve_course(name).await? {
                Some(title) => Some(title),
                None => {
                    return Ok(ToolOutput::text(format!(
                        "No course found matching '{}'",
                        name
                    )))
                }
            },
            None => None,
        };

        let filter = SearchFilter {
            course_title,
            lesson_number,
        };
        let results = self.index.search(query, &filter, None).await?;

        if results.is_empty() {
            return Ok(ToolOutput::text(empty_message(&filter)));
        }

        Ok(ToolOutput {
            content: format_results(&results),
            sources: results.iter().map(SearchResult::source).collect(),
        })
    }
}

fn empty_message(filter: &SearchFilter) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = &filter.course_title {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = filter.lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("[{}]\n{}", r.chunk.label(), r.chunk.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn max_calls_per_turn(&self) -> Option<usize> {
        Some(1)
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
        let query = required_str(input, "query")?;
        let course_name = optional_str(input, "course_name");
        let lesson_number = optional_u32(input, "lesson_number")?;

        self.search(query, course_name, lesson_number).await
    }
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
Fixtures prepare shared state for tests.
";

    async fn tool() -> CourseSearchTool {
        let index = Arc::new(CourseIndex::new(
            Arc::new(TrigramProvider::new(256)),
            Arc::new(MemoryStore::new()),
            5,
        ));
        let (course, chunks) = Chunker::new(800, 100)
            .unwrap()
            .process_document(TESTING)
            .unwrap();
        index.index(&course, &chunks).await.unwrap();
        CourseSearchTool::new(index)
    }

    #[test]
    fn test_empty_messages() {
        assert_eq!(
            empty_message(&SearchFilter::default()),
            "No relevant content found."
        );
        assert_eq!(
            empty_message(&SearchFilter {
                course_title: Some("A".to_string()),
                lesson_number: Some(3),
            }),
            "No relevant content found in course 'A' in lesson 3."
        );
    }

    #[tokio::test]
    async fn test_definition_requires_query() {
        let definition = tool().await.definition();
        assert_eq!(definition.name, "search_course_content");
        assert_eq!(definition.input_schema["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_filtered_search_formats_blocks_and_sources() {
        let output = tool()
            .await
            .execute(&json!({"query": "fixtures", "course_name": "testing", "lesson_number": 2}))
            .await
            .unwrap();

        assert!(output
            .content
            .starts_with("[Intro to Testing - Lesson 2]\nFixtures prepare"));
        assert_eq!(output.sources.len(), 1);
        assert_eq!(output.sources[0].text, "Intro to Testing - Lesson 2");
        assert_eq!(output.sources[0].link, None);
    }

    #[tokio::test]
    async fn test_unfiltered_results_are_separated() {
        let output = tool().await.search("tests", None, None).await.unwrap();
        assert_eq!(output.content.matches("[Intro to Testing - Lesson").count(), 2);
        assert!(output.content.contains("\n\n[Intro to Testing - Lesson"));
        assert!(output
            .sources
            .iter()
            .any(|s| s.link.as_deref() == Some("https://example.com/testing/1")));
    }

    #[tokio::test]
    async fn test_unknown_course() {
        let output = tool()
            .await
            .search("tests", Some("Underwater Basket Weaving"), None)
            .await
            .unwrap();
        assert_eq!(
            output.content,
            "No course found matching 'Underwater Basket Weaving'"
        );
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_missing_lesson_is_empty() {
        let output = tool()
            .await
            .search("tests", Some("Intro to Testing"), Some(9))
            .await
            .unwrap();
        assert_eq!(
            output.content,
            "No relevant content found in course 'Intro to Testing' in lesson 9."
        );
    }
}
