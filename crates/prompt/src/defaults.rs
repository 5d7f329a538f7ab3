//! Built-in prompt definitions.

use crate::types::PromptDefinition;

/// Identifier of the answer prompt; also the override file stem.
pub const ANSWER_PROMPT_ID: &str = "rag.answer";

const ANSWER_SYSTEM: &str = r#"You are an assistant for course materials and educational content, with tools for looking up course information.

Available tools:
1. search_course_content: search lesson text. Use it for specific concepts, details or examples inside courses. Filter by course name and lesson number when the question names them.
2. get_course_outline: fetch a course's title, link, instructor and numbered lesson list. Use it for questions about course structure or lesson lists.

Tool usage:
- Search course content at most once per question.
- Answer general knowledge questions from your own knowledge without tools.
- For course-specific questions, use the appropriate tool first, then answer.
- For outline questions, give the course title, course link, instructor and every lesson number with its title.
- If a tool finds nothing, say so plainly without offering alternatives.
- Give the answer only. Do not describe your reasoning, the tools, or the search results.

Responses must be brief and focused, educational, clear, and supported by examples when they help understanding.{{#if history}}

Previous conversation:
{{history}}{{/if}}"#;

const ANSWER_TEMPLATE: &str = "Answer this question about course materials: {{query}}";

/// The default answer prompt.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Course material answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "lectern".to_string(),
        system: ANSWER_SYSTEM.to_string(),
        template: ANSWER_TEMPLATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_mentions_both_tools() {
        let def = default_answer_prompt();
        assert_eq!(def.id, ANSWER_PROMPT_ID);
        assert!(def.system.contains("search_course_content"));
        assert!(def.system.contains("get_course_outline"));
        assert!(def.template.contains("{{query}}"));
    }
}
