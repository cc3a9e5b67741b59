//! Beta agents and conversations.
//!
//! These endpoints are marked beta by the platform; shapes here track the
//! published API and may change between releases.

use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};

/// Request to create an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    /// Model the agent runs on.
    pub model: String,
    /// Agent name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// System instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Tools available to the agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
}

/// Partial update of an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    /// New model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// An agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Agent identifier.
    pub id: String,
    /// Object type.
    #[serde(default)]
    pub object: Option<String>,
    /// Model the agent runs on.
    pub model: String,
    /// Agent name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// System instructions.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Agent version.
    #[serde(default)]
    pub version: Option<u32>,
}

/// Response from listing agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentList {
    /// Object type.
    #[serde(default)]
    pub object: Option<String>,
    /// Agents on this page.
    pub data: Vec<Agent>,
}

/// Request to start or append to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRequest {
    /// Agent to converse with; mutually exclusive with `model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Bare model to converse with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Input entries, plain text or structured messages.
    pub inputs: serde_json::Value,
}

/// A conversation exchange: the appended entries and their outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    /// Conversation identifier.
    pub conversation_id: String,
    /// Output entries produced by this exchange.
    pub outputs: Vec<serde_json::Value>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

/// Stored history of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    /// Object type.
    #[serde(default)]
    pub object: Option<String>,
    /// All entries, in order.
    pub entries: Vec<serde_json::Value>,
}

/// Beta surface handle.
#[derive(Debug, Clone)]
pub struct Beta {
    client: Client,
}

impl Beta {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Agent management.
    pub fn agents(&self) -> Agents {
        Agents {
            client: self.client.clone(),
        }
    }

    /// Conversations.
    pub fn conversations(&self) -> Conversations {
        Conversations {
            client: self.client.clone(),
        }
    }
}

/// Agents resource handle.
#[derive(Debug, Clone)]
pub struct Agents {
    client: Client,
}

impl Agents {
    /// Create an agent.
    pub async fn create(&self, request: &CreateAgentRequest) -> Result<Agent> {
        let api_request = ApiRequest::post("/agents").json(request)?;
        self.client.execute(&api_request).await
    }

    /// List agents.
    pub async fn list(&self) -> Result<AgentList> {
        self.client.execute(&ApiRequest::get("/agents")).await
    }

    /// Retrieve one agent.
    pub async fn retrieve(&self, agent_id: &str) -> Result<Agent> {
        self.client
            .execute(&ApiRequest::get(format!("/agents/{agent_id}")))
            .await
    }

    /// Update an agent.
    pub async fn update(&self, agent_id: &str, request: &UpdateAgentRequest) -> Result<Agent> {
        let api_request = ApiRequest::patch(format!("/agents/{agent_id}")).json(request)?;
        self.client.execute(&api_request).await
    }
}

/// Conversations resource handle.
#[derive(Debug, Clone)]
pub struct Conversations {
    client: Client,
}

impl Conversations {
    /// Start a conversation.
    pub async fn start(&self, request: &ConversationRequest) -> Result<ConversationResponse> {
        let api_request = ApiRequest::post("/conversations").json(request)?;
        self.client.execute(&api_request).await
    }

    /// Append entries to an existing conversation.
    pub async fn append(
        &self,
        conversation_id: &str,
        request: &ConversationRequest,
    ) -> Result<ConversationResponse> {
        let api_request =
            ApiRequest::post(format!("/conversations/{conversation_id}")).json(request)?;
        self.client.execute(&api_request).await
    }

    /// Fetch a conversation's stored history.
    pub async fn history(&self, conversation_id: &str) -> Result<ConversationHistory> {
        self.client
            .execute(&ApiRequest::get(format!(
                "/conversations/{conversation_id}/history"
            )))
            .await
    }
}
