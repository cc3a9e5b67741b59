//! Moderation and classification.

use crate::api::chat::Message;
use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request to moderate raw text inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRequest {
    /// Moderation model to use.
    pub model: String,
    /// Texts to classify.
    pub input: Vec<String>,
}

/// Request to moderate conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModerationRequest {
    /// Moderation model to use.
    pub model: String,
    /// Conversations to classify, one message list each.
    pub input: Vec<Vec<Message>>,
}

/// Classification of one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    /// Per-category boolean flags.
    pub categories: HashMap<String, bool>,
    /// Per-category scores in [0, 1].
    pub category_scores: HashMap<String, f64>,
}

impl ModerationResult {
    /// Whether any category was flagged.
    pub fn flagged(&self) -> bool {
        self.categories.values().any(|&v| v)
    }
}

/// Response from a moderation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResponse {
    /// Unique identifier.
    pub id: String,
    /// Model used.
    pub model: String,
    /// One result per input, in input order.
    pub results: Vec<ModerationResult>,
}

/// Moderations resource handle.
#[derive(Debug, Clone)]
pub struct Moderations {
    client: Client,
}

impl Moderations {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Classify raw text inputs.
    pub async fn create(&self, request: &ModerationRequest) -> Result<ModerationResponse> {
        let api_request = ApiRequest::post("/moderations").json(request)?;
        self.client.execute(&api_request).await
    }

    /// Classify conversations.
    pub async fn create_chat(&self, request: &ChatModerationRequest) -> Result<ModerationResponse> {
        let api_request = ApiRequest::post("/chat/moderations").json(request)?;
        self.client.execute(&api_request).await
    }
}
