//! Server-Sent Events decoding for streaming responses.
//!
//! The decoder consumes raw byte frames from a streaming transport call,
//! splits them on line boundaries and drives a small state machine: `data:`
//! payloads are JSON-decoded and shape-validated, the exact sentinel line
//! `data: [DONE]` ends the stream, and the other SSE framing fields
//! (`event:`, `id:`, `retry:`) are recognized but ignored. A malformed or
//! invalid payload terminates the stream with a validation error; it is
//! never skipped silently.

use crate::error::{Error, Result};
use crate::transport::TransportError;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream};
use futures::StreamExt;
use pin_project_lite::pin_project;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// The terminal sentinel line.
const DONE_LINE: &str = "data: [DONE]";
/// Prefix of an event payload line.
const DATA_PREFIX: &str = "data: ";

/// One decoded chunk from a streaming response.
///
/// Wraps the raw JSON object and exposes read-only projections into it.
/// Chunks are ephemeral; the decoder hands them over and retains nothing.
#[derive(Debug, Clone)]
pub struct StreamChunk(Value);

impl StreamChunk {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON object.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Content delta of the first choice.
    pub fn content_delta(&self) -> Option<&str> {
        self.content_delta_at(0)
    }

    /// Content delta of the choice at `index`.
    pub fn content_delta_at(&self, index: usize) -> Option<&str> {
        self.choice(index)?
            .get("delta")?
            .get("content")?
            .as_str()
    }

    /// Tool-call delta of the first choice.
    pub fn tool_calls_delta(&self) -> Option<&Value> {
        self.tool_calls_delta_at(0)
    }

    /// Tool-call delta of the choice at `index`.
    pub fn tool_calls_delta_at(&self, index: usize) -> Option<&Value> {
        self.choice(index)?.get("delta")?.get("tool_calls")
    }

    /// Finish reason of the first choice.
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason_at(0)
    }

    /// Finish reason of the choice at `index`.
    pub fn finish_reason_at(&self, index: usize) -> Option<&str> {
        self.choice(index)?.get("finish_reason")?.as_str()
    }

    fn choice(&self, index: usize) -> Option<&Value> {
        self.0.get("choices")?.get(index)
    }
}

/// Concatenate the content deltas of `chunks` in arrival order.
///
/// Chunks without a content delta are skipped.
pub fn accumulate_content<'a>(chunks: impl IntoIterator<Item = &'a StreamChunk>) -> String {
    let mut content = String::new();
    for chunk in chunks {
        if let Some(delta) = chunk.content_delta() {
            content.push_str(delta);
        }
    }
    content
}

/// Minimal shape validation for a decoded chunk.
///
/// The chunk must be an object with a `choices` list; each choice must be
/// an object carrying an integer `index`, and its `delta`, if present,
/// must be an object. Violations name the offending field.
fn validate_chunk(value: &Value) -> Result<()> {
    let object = value.as_object().ok_or_else(|| {
        Error::validation_field("Stream chunk is not an object", "chunk", "must be an object")
    })?;

    let choices = object.get("choices").ok_or_else(|| {
        Error::validation_field("Stream chunk has no choices", "choices", "required")
    })?;

    let choices = choices.as_array().ok_or_else(|| {
        Error::validation_field("choices is not a list", "choices", "must be a list")
    })?;

    for choice in choices {
        let choice = choice.as_object().ok_or_else(|| {
            Error::validation_field("Choice is not an object", "choices", "must be an object")
        })?;

        if choice.get("index").and_then(Value::as_i64).is_none() {
            return Err(Error::validation_field(
                "Choice has no integer index",
                "index",
                "must be an integer",
            ));
        }

        if let Some(delta) = choice.get("delta") {
            if !delta.is_object() {
                return Err(Error::validation_field(
                    "delta is not an object",
                    "delta",
                    "must be an object",
                ));
            }
        }
    }

    Ok(())
}

/// Classification of one SSE line.
enum LineEvent<'a> {
    /// `data: [DONE]`, exact.
    Done,
    /// A `data: ` payload.
    Data(&'a str),
    /// Framing fields, empty lines and unrecognized lines.
    Ignored,
}

fn parse_line(line: &str) -> LineEvent<'_> {
    if line == DONE_LINE {
        return LineEvent::Done;
    }
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        return LineEvent::Data(payload);
    }
    // event:/id:/retry: fields, comments and transport wrapping quirks all
    // fall through here.
    LineEvent::Ignored
}

/// Decode one complete line, already stripped of its terminator.
///
/// `Ok(None)` means the line carried no chunk; `Err` is terminal.
fn decode_line(line: &str) -> std::result::Result<Option<StreamChunk>, Option<Error>> {
    match parse_line(line) {
        LineEvent::Done => Err(None),
        LineEvent::Ignored => Ok(None),
        LineEvent::Data(payload) => match serde_json::from_str::<Value>(payload) {
            Err(e) => Err(Some(Error::validation(format!(
                "Malformed stream payload: {e}"
            )))),
            Ok(value) => match validate_chunk(&value) {
                Ok(()) => Ok(Some(StreamChunk::new(value))),
                Err(e) => Err(Some(e)),
            },
        },
    }
}

/// Turn raw byte frames into a stream of decoded chunks.
///
/// Each line is fully handled before the next is read; the first decode or
/// validation failure is yielded and the stream ends. Cancellation is
/// observed between frames.
fn decode_frames(
    frames: BoxStream<'static, std::result::Result<Bytes, TransportError>>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<StreamChunk>> + Send {
    async_stream::stream! {
        let mut frames = frames;
        let mut buffer: Vec<u8> = Vec::new();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    yield Err(Error::Cancelled);
                    return;
                }
                next = frames.next() => next,
            };

            let Some(result) = next else { break };
            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(Error::network(e.message, e.reason));
                    return;
                }
            };
            buffer.extend_from_slice(&bytes);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=pos).collect();
                let line = match line_str(&raw[..raw.len() - 1]) {
                    Ok(line) => line.to_string(),
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                match decode_line(&line) {
                    Ok(Some(chunk)) => yield Ok(chunk),
                    Ok(None) => {}
                    Err(Some(e)) => {
                        yield Err(e);
                        return;
                    }
                    Err(None) => return,
                }
            }
        }

        // A final line may arrive without a terminator.
        if !buffer.is_empty() {
            let line = match line_str(&buffer) {
                Ok(line) => line.to_string(),
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            match decode_line(&line) {
                Ok(Some(chunk)) => yield Ok(chunk),
                Ok(None) | Err(None) => {}
                Err(Some(e)) => yield Err(e),
            }
        }
    }
}

/// Decode one line's bytes, tolerating a CRLF terminator.
fn line_str(raw: &[u8]) -> Result<&str> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw)
        .map_err(|e| Error::validation(format!("Stream line is not valid UTF-8: {e}")))
}

pin_project! {
    /// A stream of decoded chunks from one streaming call.
    ///
    /// Implements [`futures::Stream`], so callers can pull chunks with
    /// `next()`, or drive it through a callback with [`EventStream::process`].
    /// The first error ends the stream; no further lines are processed.
    pub struct EventStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>,
        content: String,
        done: bool,
    }
}

impl EventStream {
    pub(crate) fn new(
        frames: BoxStream<'static, std::result::Result<Bytes, TransportError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Box::pin(decode_frames(frames, cancel)),
            content: String::new(),
            done: false,
        }
    }

    /// Drive the stream through a callback, one chunk at a time.
    ///
    /// The callback's error return halts the stream and becomes the call's
    /// outcome.
    pub async fn process<F>(mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(StreamChunk) -> Result<()>,
    {
        while let Some(chunk) = self.next().await {
            callback(chunk?)?;
        }
        Ok(())
    }

    /// Pull the whole stream and return the accumulated content.
    pub async fn collect_content(mut self) -> Result<String> {
        while let Some(chunk) = self.next().await {
            chunk?;
        }
        Ok(self.content)
    }

    /// Content accumulated from the chunks observed so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check if the stream has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Stream for EventStream {
    type Item = Result<StreamChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(delta) = chunk.content_delta() {
                    this.content.push_str(delta);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                *this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                *this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("done", &self.done)
            .field("content_len", &self.content.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(value: Value) -> StreamChunk {
        StreamChunk::new(value)
    }

    fn frames(parts: Vec<&str>) -> BoxStream<'static, std::result::Result<Bytes, TransportError>> {
        let parts: Vec<std::result::Result<Bytes, TransportError>> = parts
            .into_iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        futures::stream::iter(parts).boxed()
    }

    fn stream_of(parts: Vec<&str>) -> EventStream {
        EventStream::new(frames(parts), CancellationToken::new())
    }

    #[test]
    fn test_projections() {
        let c = chunk(json!({
            "choices": [{
                "index": 0,
                "delta": {"content": "Hi", "tool_calls": [{"index": 0}]},
                "finish_reason": "stop"
            }]
        }));

        assert_eq!(c.content_delta(), Some("Hi"));
        assert_eq!(c.finish_reason(), Some("stop"));
        assert!(c.tool_calls_delta().is_some());
        assert_eq!(c.content_delta_at(1), None);
    }

    #[test]
    fn test_projections_absent() {
        let c = chunk(json!({"choices": [{"index": 0, "delta": {}}]}));
        assert_eq!(c.content_delta(), None);
        assert_eq!(c.finish_reason(), None);
        assert!(c.tool_calls_delta().is_none());
    }

    #[test]
    fn test_accumulate_content() {
        let chunks = vec![
            chunk(json!({"choices": [{"index": 0, "delta": {"content": "Hello"}}]})),
            chunk(json!({"choices": [{"index": 0, "delta": {"content": " "}}]})),
            chunk(json!({"choices": [{"index": 0, "delta": {}}]})),
            chunk(json!({"choices": [{"index": 0, "delta": {"content": "world"}}]})),
        ];
        assert_eq!(accumulate_content(&chunks), "Hello world");
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate_chunk(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(f), .. } if f == "chunk"));
    }

    #[test]
    fn test_validate_requires_choices() {
        let err = validate_chunk(&json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(f), .. } if f == "choices"));
    }

    #[test]
    fn test_validate_choices_must_be_list() {
        let err = validate_chunk(&json!({"choices": "nope"})).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(f), .. } if f == "choices"));
    }

    #[test]
    fn test_validate_choice_index() {
        let err = validate_chunk(&json!({"choices": [{"delta": {}}]})).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(f), .. } if f == "index"));

        let err = validate_chunk(&json!({"choices": [{"index": "zero"}]})).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(f), .. } if f == "index"));
    }

    #[test]
    fn test_validate_delta_must_be_object() {
        let err = validate_chunk(&json!({"choices": [{"index": 0, "delta": "hi"}]})).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(f), .. } if f == "delta"));
    }

    #[test]
    fn test_validate_accepts_minimal_chunk() {
        assert!(validate_chunk(&json!({"choices": []})).is_ok());
        assert!(validate_chunk(&json!({"choices": [{"index": 0}]})).is_ok());
    }

    #[tokio::test]
    async fn test_decode_happy_path() {
        let stream = stream_of(vec![
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n",
            "data: [DONE]\n",
        ]);

        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap().content_delta(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_decode_line_split_across_frames() {
        let stream = stream_of(vec![
            "data: {\"choices\":[{\"index\":0,",
            "\"delta\":{\"content\":\"Hi\"}}]}\ndata: [DONE]\n",
        ]);

        let content = stream.collect_content().await.unwrap();
        assert_eq!(content, "Hi");
    }

    #[tokio::test]
    async fn test_decode_crlf_lines() {
        let stream = stream_of(vec![
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\r\ndata: [DONE]\r\n",
        ]);

        let content = stream.collect_content().await.unwrap();
        assert_eq!(content, "Hi");
    }

    #[tokio::test]
    async fn test_decode_ignores_framing_fields() {
        let stream = stream_of(vec![
            "event: message\nid: 42\nretry: 100\n\n: comment\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ok\"}}]}\n",
            "data: [DONE]\n",
        ]);

        let content = stream.collect_content().await.unwrap();
        assert_eq!(content, "ok");
    }

    #[tokio::test]
    async fn test_decode_malformed_json_halts() {
        let stream = stream_of(vec![
            "data: {not json}\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"after\"}}]}\n",
        ]);

        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_decode_invalid_shape_halts_naming_field() {
        let stream = stream_of(vec!["data: {\"id\":\"x\"}\n"]);

        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(
            matches!(&results[0], Err(Error::Validation { field: Some(f), .. }) if f == "choices")
        );
    }

    #[tokio::test]
    async fn test_decode_nothing_after_done() {
        let stream = stream_of(vec![
            "data: [DONE]\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"late\"}}]}\n",
        ]);

        let chunks: Vec<_> = stream.collect().await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_process_callback_error_halts() {
        let stream = stream_of(vec![
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"b\"}}]}\n",
            "data: [DONE]\n",
        ]);

        let mut seen = 0;
        let result = stream
            .process(|_| {
                seen += 1;
                Err(Error::validation("stop here"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn test_cancellation_between_events() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream = EventStream::new(
            frames(vec![
                "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n",
            ]),
            cancel,
        );

        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::Cancelled)));
    }
}
