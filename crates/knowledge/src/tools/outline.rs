use super::{required_str, Tool, ToolOutput};
use crate::index::CourseIndex;
use crate::types::{Course, Source};
use async_trait::async_trait;
use lectern_core::AppResult;
use lectern_llm::ToolDefinition;
use serde_json::{json, Value};
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// Course title, link, instructor and lesson list.
pub struct CourseOutlineTool {
    index: Arc<CourseIndex>,
}

impl CourseOutlineTool {
    pub fn new(index: Arc<CourseIndex>) -> Self {
        Self { index }
    }

    pub async fn outline(&self, course_name: &str) -> AppResult<ToolOutput> {
        let course = match self.index.resolve_course(course_name).await? {
            Some(title) => self.index.get_course(&title)?,
            None => None,
        };

        let Some(course) = course else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                course_name
            )));
        };

        Ok(ToolOutput {
            content: format_outline(&course),
            sources: vec![Source {
                text: course.title.clone(),
                link: course.link.clone(),
            }],
        })
    }
}

/// Markdown outline of a course.
pub fn format_outline(course: &Course) -> String {
    let mut lines = Vec::new();

    match &course.link {
        Some(link) => lines.push(format!("**Course Title:** [{}]({})", course.title, link)),
        None => lines.push(format!("**Course Title:** {}", course.title)),
    }
    if let Some(instructor) = &course.instructor {
        lines.push(format!("**Instructor:** {}", instructor));
    }

    lines.push(String::new());
    if course.lessons.is_empty() {
        lines.push("No lessons available".to_string());
    } else {
        lines.push(format!("**Lessons ({} total):**", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("- Lesson {}: {}", lesson.number, lesson.title));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get a course outline: title, link, instructor and the complete lesson list"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
        let course_name = required_str(input, "course_name")?;
        self.outline(course_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::store::MemoryStore;
    use crate::types::Lesson;

    fn course(link: Option<&str>, lessons: Vec<Lesson>) -> Course {
        Course {
            title: "MCP: Build Rich-Context AI Apps".to_string(),
            link: link.map(str::to_string),
            instructor: Some("John Doe".to_string()),
            lessons,
        }
    }

    fn lesson(number: u32, title: &str) -> Lesson {
        Lesson {
            number,
            title: title.to_string(),
            link: None,
            text: "Body.".to_string(),
        }
    }

    #[test]
    fn test_format_outline_with_link() {
        let text = format_outline(&course(
            Some("https://example.com/course"),
            vec![lesson(1, "Introduction"), lesson(2, "Getting Started")],
        ));

        assert!(text.contains(
            "**Course Title:** [MCP: Build Rich-Context AI Apps](https://example.com/course)"
        ));
        assert!(text.contains("**Instructor:** John Doe"));
        assert!(text.contains("- Lesson 1: Introduction"));
        assert!(text.contains("- Lesson 2: Getting Started"));
    }

    #[test]
    fn test_format_outline_without_link_or_lessons() {
        let text = format_outline(&course(None, Vec::new()));
        assert!(text.starts_with("**Course Title:** MCP: Build Rich-Context AI Apps\n"));
        assert!(text.contains("No lessons available"));
    }

    #[tokio::test]
    async fn test_outline_resolves_partial_name() {
        let index = Arc::new(CourseIndex::new(
            Arc::new(TrigramProvider::new(256)),
            Arc::new(MemoryStore::new()),
            5,
        ));
        let course = course(None, vec![lesson(1, "Introduction")]);
        let chunks = crate::chunker::Chunker::new(800, 100)
            .unwrap()
            .chunk_course(&course);
        index.index(&course, &chunks).await.unwrap();
        let tool = CourseOutlineTool::new(index);

        let output = tool.execute(&json!({"course_name": "MCP"})).await.unwrap();
        assert!(output.content.contains("- Lesson 1: Introduction"));
        assert_eq!(output.sources[0].text, "MCP: Build Rich-Context AI Apps");

        let missing = tool.outline("Nonexistent course").await.unwrap();
        assert_eq!(missing.content, "No course found matching 'Nonexistent course'");
        assert_eq!(tool.definition().input_schema["required"], json!(["course_name"]));
    }
}
