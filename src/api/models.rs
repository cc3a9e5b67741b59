//! Model listing and management.

use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};

/// Description of an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    /// Model identifier.
    pub id: String,
    /// Object type.
    pub object: String,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: Option<i64>,
    /// Owner of the model.
    #[serde(default)]
    pub owned_by: Option<String>,
    /// Model capabilities, when reported.
    #[serde(default)]
    pub capabilities: Option<serde_json::Value>,
    /// Maximum context length, when reported.
    #[serde(default)]
    pub max_context_length: Option<u32>,
}

/// Response from listing models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    /// Object type.
    pub object: String,
    /// Available models.
    pub data: Vec<ModelCard>,
}

/// Acknowledgement of a model deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedModel {
    /// Model identifier.
    pub id: String,
    /// Object type.
    pub object: String,
    /// Whether the model was deleted.
    pub deleted: bool,
}

/// Models resource handle.
#[derive(Debug, Clone)]
pub struct Models {
    client: Client,
}

impl Models {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// List available models.
    pub async fn list(&self) -> Result<ModelList> {
        self.client.execute(&ApiRequest::get("/models")).await
    }

    /// Retrieve one model by id.
    pub async fn retrieve(&self, model_id: &str) -> Result<ModelCard> {
        self.client
            .execute(&ApiRequest::get(format!("/models/{model_id}")))
            .await
    }

    /// Delete a fine-tuned model.
    pub async fn delete(&self, model_id: &str) -> Result<DeletedModel> {
        self.client
            .execute(&ApiRequest::delete(format!("/models/{model_id}")))
            .await
    }
}
