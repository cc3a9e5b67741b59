//! SSE streaming tests against a wiremock server.

use futures::StreamExt;
use mistral_sdk::{
    accumulate_content, CancellationToken, ChatCompletionRequest, Client, Error, StreamChunk,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chunk_line(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion.chunk",
            "created": 1700000000,
            "model": "mistral-small-latest",
            "choices": [{"index": 0, "delta": {"content": content}}]
        })
    )
}

fn sse_body(contents: &[&str]) -> String {
    let mut body = String::new();
    for content in contents {
        body.push_str(&chunk_line(content));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn mount_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .append_header("content-type", "text/event-stream"),
        )
        .mount(server)
        .await;
}

fn stream_client(server: &MockServer) -> Client {
    Client::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .max_retries(0)
        .build()
        .unwrap()
}

fn chat_request() -> ChatCompletionRequest {
    ChatCompletionRequest::builder()
        .model("mistral-small-latest")
        .user_message("Hello")
        .build()
        .unwrap()
}

#[tokio::test]
async fn single_chunk_then_done() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Hi"])).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content_delta(), Some("Hi"));
}

#[tokio::test]
async fn content_accumulates_in_arrival_order() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Hello", " ", "world"])).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let content = stream.collect_content().await.unwrap();
    assert_eq!(content, "Hello world");
}

#[tokio::test]
async fn accumulate_content_over_collected_chunks() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Hello", " ", "world"])).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(accumulate_content(&chunks), "Hello world");
}

#[tokio::test]
async fn malformed_payload_halts_the_stream() {
    let server = MockServer::start().await;
    let mut body = chunk_line("ok");
    body.push_str("data: {not json}\n\n");
    body.push_str(&chunk_line("never seen"));
    body.push_str("data: [DONE]\n\n");
    mount_stream(&server, body).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let results: Vec<Result<StreamChunk, Error>> = stream.collect().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().content_delta(), Some("ok"));
    assert!(matches!(results[1], Err(Error::Validation { .. })));
}

#[tokio::test]
async fn chunk_missing_choices_names_the_field() {
    let server = MockServer::start().await;
    mount_stream(&server, "data: {\"id\":\"cmpl-1\"}\n\ndata: [DONE]\n\n".to_string()).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let results: Vec<Result<StreamChunk, Error>> = stream.collect().await;
    assert_eq!(results.len(), 1);
    match &results[0] {
        Err(Error::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("choices")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn callback_drives_chunks_in_order() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["a", "b", "c"])).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let mut seen = Vec::new();
    stream
        .process(|chunk| {
            seen.push(chunk.content_delta().unwrap_or("").to_string());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn failing_callback_halts_the_stream() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["a", "b", "c"])).await;

    let stream = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap();

    let mut calls = 0;
    let result = stream
        .process(|_| {
            calls += 1;
            if calls == 2 {
                Err(Error::validation("stop"))
            } else {
                Ok(())
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls, 2);
}

#[tokio::test]
async fn pre_cancelled_token_aborts_before_dispatch() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["never"])).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut request = chat_request();
    request.stream = Some(true);
    let api_request = mistral_sdk::ApiRequest::post("/chat/completions")
        .json(&request)
        .unwrap()
        .cancel_token(cancel);

    let err = stream_client(&server)
        .execute_stream(&api_request)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn error_status_on_stream_call_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "Unauthorized"}))
                .append_header("x-request-id", "req-9"),
        )
        .mount(&server)
        .await;

    let err = stream_client(&server)
        .chat()
        .stream(&chat_request())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication { .. }));
    assert_eq!(err.request_id(), Some("req-9"));
}
