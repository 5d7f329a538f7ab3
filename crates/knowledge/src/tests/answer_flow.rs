use super::*;
use lectern_llm::{Role, ToolChoice};
use serde_json::json;

#[tokio::test]
async fn test_direct_answer_without_tools() {
    let client = ScriptedClient::new(vec![text_reply("Two plus two is four.")]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let response = system.answer("What is 2 + 2?", None).await.unwrap();

    assert_eq!(response.answer, "Two plus two is four.");
    assert!(response.sources.is_empty());
    assert!(system.sessions().exists(&response.session_id).await);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "test-model");
    assert_eq!(request.max_tokens, 800);
    assert_eq!(request.temperature, Some(0.0));
    assert_eq!(request.tools, system.tool_definitions());
    let names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"search_course_content"));
    assert!(names.contains(&"get_course_outline"));
    assert!(!request.system.as_deref().unwrap().contains("Previous conversation"));
    assert_eq!(request.messages.len(), 1);
    assert_eq!(
        request.messages[0].content[0],
        ContentBlock::text("Answer this question about course materials: What is 2 + 2?")
    );
}

#[tokio::test]
async fn test_search_round_collects_sources() {
    let client = ScriptedClient::new(vec![
        tool_reply(&[(
            "search_course_content",
            json!({"query": "fixtures", "course_name": "Testing", "lesson_number": 2}),
        )]),
        text_reply("Fixtures prepare shared state."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let response = system
        .answer("What are fixtures in lesson 2 of the testing course?", None)
        .await
        .unwrap();

    assert_eq!(response.answer, "Fixtures prepare shared state.");
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].text, "Intro to Testing - Lesson 2");
    assert_eq!(
        response.sources[0].link.as_deref(),
        Some("https://example.com/testing/2")
    );

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    let second = &requests[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[1].role, Role::Assistant);
    let results = tool_results(second);
    assert_eq!(results.len(), 1);
    assert!(results[0].starts_with("[Intro to Testing - Lesson 2]\nFixtures prepare"));
}

#[tokio::test]
async fn test_second_search_is_rejected() {
    let client = ScriptedClient::new(vec![
        tool_reply(&[(
            "search_course_content",
            json!({"query": "regressions", "course_name": "Intro to Testing", "lesson_number": 1}),
        )]),
        tool_reply(&[(
            "search_course_content",
            json!({"query": "servers", "course_name": "MCP"}),
        )]),
        text_reply("Tests catch regressions."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let response = system.answer("Why test?", None).await.unwrap();

    assert_eq!(response.answer, "Tests catch regressions.");
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].text, "Intro to Testing - Lesson 1");

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    let results = tool_results(&requests[2]);
    assert_eq!(results.len(), 2);
    assert!(results[1].contains("only be called 1 time"));
    assert_eq!(requests[2].tools.len(), 2);
    assert_eq!(requests[2].tool_choice, ToolChoice::None);
}

#[tokio::test]
async fn test_outline_tool_round() {
    let client = ScriptedClient::new(vec![
        tool_reply(&[("get_course_outline", json!({"course_name": "MCP"}))]),
        text_reply("The MCP course has two lessons."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let response = system.answer("Outline the MCP course", None).await.unwrap();

    let results = tool_results(&client.requests()[1]);
    assert!(results[0]
        .contains("**Course Title:** [MCP: Build Rich-Context AI Apps](https://example.com/mcp)"));
    assert!(results[0].contains("- Lesson 0: Introduction"));
    assert!(results[0].contains("- Lesson 1: Servers"));
    assert_eq!(response.sources[0].text, "MCP: Build Rich-Context AI Apps");
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_model() {
    let client = ScriptedClient::new(vec![
        tool_reply(&[("delete_everything", json!({}))]),
        text_reply("I cannot do that."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    system.answer("Do something odd", None).await.unwrap();

    let results = tool_results(&client.requests()[1]);
    assert_eq!(results, vec!["Tool 'delete_everything' not found"]);
}

#[tokio::test]
async fn test_final_call_after_tool_rounds_forbids_tool_use() {
    let client = ScriptedClient::new(vec![
        tool_reply(&[("get_course_outline", json!({"course_name": "MCP"}))]),
        tool_reply(&[("get_course_outline", json!({"course_name": "Testing"}))]),
        text_reply("Both courses are available."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let response = system.answer("Compare the courses", None).await.unwrap();
    assert_eq!(response.answer, "Both courses are available.");

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].tool_choice, ToolChoice::Auto);
    assert_eq!(requests[1].tool_choice, ToolChoice::Auto);
    assert_eq!(requests[2].tool_choice, ToolChoice::None);
    // the conversation holds tool calls, so the definitions stay
    assert!(requests.iter().all(|r| r.tools.len() == 2));
}

#[tokio::test]
async fn test_sources_do_not_leak_between_answers() {
    let client = ScriptedClient::new(vec![
        tool_reply(&[("search_course_content", json!({"query": "protocol"}))]),
        text_reply("MCP connects assistants to tools."),
        text_reply("You're welcome."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let first = system.answer("What is MCP?", None).await.unwrap();
    assert!(!first.sources.is_empty());

    let second = system
        .answer("Thanks!", Some(&first.session_id))
        .await
        .unwrap();
    assert!(second.sources.is_empty());
    assert_eq!(second.session_id, first.session_id);
}

#[tokio::test]
async fn test_history_is_rendered_into_system_prompt() {
    let client = ScriptedClient::new(vec![
        text_reply("MCP is a protocol."),
        text_reply("Elie Schoppik teaches it."),
    ]);
    let (_temp, system) = ingested_system(client.clone()).await;

    let first = system.answer("What is MCP?", Some("session_1")).await.unwrap();
    assert_eq!(first.session_id, "session_1");
    system.answer("Who teaches it?", Some("session_1")).await.unwrap();

    let system_prompt = client.requests()[1].system.clone().unwrap();
    assert!(system_prompt
        .ends_with("Previous conversation:\nUser: What is MCP?\nAssistant: MCP is a protocol."));
}

#[tokio::test]
async fn test_history_keeps_latest_two_turns() {
    let client = ScriptedClient::new(vec![
        text_reply("a1"),
        text_reply("a2"),
        text_reply("a3"),
    ]);
    let (_temp, system) = ingested_system(client).await;

    let id = system.answer("q1", None).await.unwrap().session_id;
    system.answer("q2", Some(&id)).await.unwrap();
    system.answer("q3", Some(&id)).await.unwrap();

    let history = system.sessions().history(&id).await;
    let queries: Vec<&str> = history.iter().map(|t| t.query.as_str()).collect();
    assert_eq!(queries, vec!["q2", "q3"]);
}

#[tokio::test]
async fn test_failure_is_generation_error_and_session_untouched() {
    let client = ScriptedClient::new(vec![
        text_reply("First answer."),
        Err(AppError::Llm("Claude API error (401): invalid x-api-key".to_string())),
    ]);
    let (_temp, system) = ingested_system(client).await;

    let id = system.answer("q1", None).await.unwrap().session_id;
    let err = system.answer("q2", Some(&id)).await.unwrap_err();

    assert!(matches!(err, AppError::Generation(_)));
    assert!(err.to_string().contains("invalid x-api-key"));
    assert_eq!(system.sessions().history(&id).await.len(), 1);
}

#[tokio::test]
async fn test_empty_answer_is_generation_error() {
    let client = ScriptedClient::new(vec![text_reply("   ")]);
    let (_temp, system) = ingested_system(client).await;

    let err = system.answer("q", Some("s")).await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));
    assert!(system.sessions().history("s").await.is_empty());
}

#[test]
fn test_zero_tool_rounds_is_rejected() {
    let temp = tempfile::TempDir::new().unwrap();
    let config = RagConfig {
        max_tool_rounds: 0,
        ..Default::default()
    };

    let result = RagSystem::new(
        temp.path(),
        config,
        ScriptedClient::new(vec![]),
        "test-model",
        Arc::new(TrigramProvider::new(256)),
        Arc::new(MemoryStore::new()),
    );
    assert!(matches!(result, Err(AppError::Config(_))));
}
