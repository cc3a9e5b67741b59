//! # Mistral SDK for Rust
//!
//! A Rust client for the Mistral AI platform API: chat completions,
//! embeddings, files, fine-tuning, batch jobs, OCR, moderation and the
//! beta agents/conversations surface.
//!
//! ## Features
//!
//! - Async-first design with full `tokio` support
//! - Streaming responses over Server-Sent Events
//! - Automatic retries with exponential backoff and jitter
//! - Closed error taxonomy callers can match on
//! - Pluggable transport for testing without a network
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mistral_sdk::{ChatCompletionRequest, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mistral_sdk::Error> {
//!     let client = Client::builder()
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let request = ChatCompletionRequest::builder()
//!         .model("mistral-small-latest")
//!         .user_message("Hello, world!")
//!         .build()?;
//!
//!     let response = client.chat().create(&request).await?;
//!     println!("{}", response.content());
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use mistral_sdk::{ChatCompletionRequest, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mistral_sdk::Error> {
//!     let client = Client::builder().api_key("your-api-key").build()?;
//!
//!     let request = ChatCompletionRequest::builder()
//!         .model("mistral-small-latest")
//!         .user_message("Tell me a story")
//!         .build()?;
//!
//!     let mut stream = client.chat().stream(&request).await?;
//!     while let Some(chunk) = stream.next().await {
//!         if let Some(delta) = chunk?.content_delta() {
//!             print!("{delta}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![forbid(unsafe_code)]

pub mod api;
mod client;
mod config;
mod error;
mod request;
mod retry;
mod streaming;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::{Error, NetworkReason, Result};
pub use request::{ApiRequest, RequestBody, RequestOptions};
pub use retry::RetryPolicy;
pub use streaming::{accumulate_content, EventStream, StreamChunk};

pub use api::batch::{BatchJob, BatchJobList, CreateBatchJobRequest};
pub use api::beta::{
    Agent, AgentList, ConversationHistory, ConversationRequest, ConversationResponse,
    CreateAgentRequest, UpdateAgentRequest,
};
pub use api::chat::{
    ChatChoice, ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse,
    Message, MessageRole, Tool, ToolCall, Usage,
};
pub use api::embeddings::{EmbeddingObject, EmbeddingRequest, EmbeddingResponse};
pub use api::files::{FileList, FileListParams, FileObject, UploadFileRequest};
pub use api::fine_tuning::{
    CreateFineTuningJobRequest, FineTuningJob, FineTuningJobList, JobListParams,
};
pub use api::models::{DeletedModel, ModelCard, ModelList};
pub use api::moderations::{
    ChatModerationRequest, ModerationRequest, ModerationResponse, ModerationResult,
};
pub use api::ocr::{DocumentSource, OcrPage, OcrRequest, OcrResponse};

// Re-export the cancellation token so callers don't need a direct
// tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
