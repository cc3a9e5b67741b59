//! Embeddings.

use crate::api::chat::Usage;
use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};

/// Request for embeddings over a batch of inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Embedding model to use.
    pub model: String,
    /// Texts to embed.
    pub input: Vec<String>,
    /// Output encoding, e.g. `float`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
}

impl EmbeddingRequest {
    /// Create a request for the given model and inputs.
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
            encoding_format: None,
        }
    }
}

/// Response carrying one embedding per input, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Unique identifier.
    pub id: String,
    /// Object type.
    pub object: String,
    /// Embeddings, one per input.
    pub data: Vec<EmbeddingObject>,
    /// Model used.
    pub model: String,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingObject {
    /// Object type.
    pub object: String,
    /// The embedding vector.
    pub embedding: Vec<f32>,
    /// Position of the corresponding input.
    pub index: u32,
}

/// Embeddings resource handle.
#[derive(Debug, Clone)]
pub struct Embeddings {
    client: Client,
}

impl Embeddings {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create embeddings for a batch of inputs.
    pub async fn create(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        let api_request = ApiRequest::post("/embeddings").json(request)?;
        self.client.execute(&api_request).await
    }
}
