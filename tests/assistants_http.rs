use httpmock::prelude::*;
use serde_json::json;
use runcall::client::{AssistantTool, ClientError, ConversationClient};
use runcall::model::{Role, RunStatus, ToolResult};
use runcall::options::{ModelOptions, TransportOptions};
use runcall::providers::{OpenAi, OpenAiClient};
use runcall::tools::ToolDefinition;

fn client(server: &MockServer) -> OpenAiClient {
    OpenAi::create_with_base_url(
        "sk-test".to_string(),
        server.base_url(),
        ModelOptions::new("gpt-4-1106-preview").with_instructions("You are a personal math tutor."),
        TransportOptions::new().with_header("X-Trace", "t1"),
    )
}

#[tokio::test]
async fn create_thread_sends_auth_and_beta_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/threads")
            .header("authorization", "Bearer sk-test")
            .header("openai-beta", "assistants=v2")
            .header("x-trace", "t1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": "thread_abc", "object": "thread", "created_at": 1}));
    });

    let thread_id = client(&server).create_thread().await.unwrap();

    assert_eq!(thread_id, "thread_abc");
    mock.assert();
}

#[tokio::test]
async fn create_assistant_sends_model_instructions_and_tools() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/assistants")
            .json_body_partial(
                r#"{"model":"gpt-4-1106-preview","name":"Math Tutor","instructions":"You are a personal math tutor."}"#,
            )
            .body_contains(r#""type":"code_interpreter""#)
            .body_contains(r#""name":"display_quiz""#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": "asst_1", "object": "assistant", "name": "Math Tutor"}));
    });

    let tools = vec![
        AssistantTool::CodeInterpreter,
        AssistantTool::Function(ToolDefinition::new(
            "display_quiz",
            "Displays a quiz",
            json!({"type": "object"}),
        )),
    ];
    let assistant = client(&server)
        .create_assistant("Math Tutor", tools)
        .await
        .unwrap();

    assert_eq!(assistant.id, "asst_1");
    assert_eq!(assistant.name.as_deref(), Some("Math Tutor"));
    mock.assert();
}

#[tokio::test]
async fn create_assistant_requires_a_model() {
    let server = MockServer::start();
    let client = OpenAi::create_with_base_url(
        "sk-test".to_string(),
        server.base_url(),
        ModelOptions::new(""),
        TransportOptions::default(),
    );

    let err = client.create_assistant("x", vec![]).await.unwrap_err();

    assert!(matches!(err, ClientError::Config(_)));
}

#[tokio::test]
async fn post_message_and_create_run() {
    let server = MockServer::start();
    let message = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/threads/thread_1/messages")
            .json_body(json!({"role": "user", "content": "What is 2 + 2?"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": "msg_1",
                "object": "thread.message",
                "role": "user",
                "run_id": null,
                "content": [{"type": "text", "text": {"value": "What is 2 + 2?", "annotations": []}}]
            }));
    });
    let run = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/threads/thread_1/runs")
            .json_body(json!({"assistant_id": "asst_1"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": "run_1", "thread_id": "thread_1", "status": "queued"}));
    });

    let client = client(&server);
    let posted = client
        .post_message("thread_1", Role::User, "What is 2 + 2?")
        .await
        .unwrap();
    let created = client.create_run("thread_1", "asst_1").await.unwrap();

    assert_eq!(posted.text(), Some("What is 2 + 2?"));
    assert_eq!(created.status, RunStatus::Queued);
    message.assert();
    run.assert();
}

#[tokio::test]
async fn retrieve_run_decodes_required_action() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(GET).path("/v1/threads/thread_1/runs/run_1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": "run_1",
                "object": "thread.run",
                "thread_id": "thread_1",
                "status": "requires_action",
                "required_action": {
                    "type": "submit_tool_outputs",
                    "submit_tool_outputs": {
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "allow_message", "arguments": "{\"message\":\"hi\"}"}
                        }]
                    }
                }
            }));
    });

    let run = client(&server)
        .retrieve_run("thread_1", "run_1")
        .await
        .unwrap();

    let calls = run.pending_tool_calls().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls.head.name, "allow_message");
    assert_eq!(calls.head.decode_arguments(), json!({"message": "hi"}));
}

#[tokio::test]
async fn submit_tool_outputs_posts_results() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/threads/thread_1/runs/run_1/submit_tool_outputs")
            .json_body(json!({"tool_outputs": [{"tool_call_id": "call_1", "output": "Message: hi\nReason: \n"}]}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": "run_1", "thread_id": "thread_1", "status": "queued"}));
    });

    let run = client(&server)
        .submit_tool_outputs(
            "thread_1",
            "run_1",
            vec![ToolResult {
                tool_call_id: "call_1".to_string(),
                output: "Message: hi\nReason: \n".to_string(),
            }],
        )
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Queued);
    mock.assert();
}

#[tokio::test]
async fn list_messages_returns_oldest_first() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/threads/thread_1/messages")
            .query_param("order", "desc");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "object": "list",
                "data": [
                    {"id": "msg_2", "role": "assistant", "run_id": "run_1",
                     "content": [{"type": "text", "text": {"value": "4", "annotations": []}}]},
                    {"id": "msg_1", "role": "user", "run_id": null,
                     "content": [{"type": "text", "text": {"value": "What is 2 + 2?", "annotations": []}}]}
                ],
                "has_more": false
            }));
    });

    let messages = client(&server).list_messages("thread_1").await.unwrap();

    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["msg_1", "msg_2"]);
    assert_eq!(messages[1].role, Role::Assistant);
    mock.assert();
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(GET).path("/v1/threads/missing/runs/run_1");
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"message": "No thread found with id 'missing'.", "type": "invalid_request_error"}}));
    });

    let err = client(&server)
        .retrieve_run("missing", "run_1")
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("No thread found"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}
