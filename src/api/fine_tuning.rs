//! Fine-tuning job lifecycle.

use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};

/// Hyperparameters for a fine-tuning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Number of training steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_steps: Option<u32>,
    /// Learning rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
}

/// Request to create a fine-tuning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFineTuningJobRequest {
    /// Base model to fine-tune.
    pub model: String,
    /// Ids of uploaded training files.
    pub training_files: Vec<String>,
    /// Ids of uploaded validation files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_files: Option<Vec<String>>,
    /// Training hyperparameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperparameters: Option<Hyperparameters>,
    /// Suffix appended to the fine-tuned model name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Create the job without starting it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

/// A fine-tuning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuningJob {
    /// Job identifier.
    pub id: String,
    /// Base model.
    pub model: String,
    /// Job status, e.g. `QUEUED`, `RUNNING`, `SUCCESS`, `CANCELLED`.
    pub status: String,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Name of the resulting fine-tuned model, once available.
    #[serde(default)]
    pub fine_tuned_model: Option<String>,
    /// Training file ids.
    #[serde(default)]
    pub training_files: Vec<String>,
    /// Validation file ids.
    #[serde(default)]
    pub validation_files: Option<Vec<String>>,
}

/// Response from listing fine-tuning jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuningJobList {
    /// Object type.
    #[serde(default)]
    pub object: Option<String>,
    /// Jobs on this page.
    pub data: Vec<FineTuningJob>,
    /// Total number of jobs, when reported.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Filters for listing jobs.
#[derive(Debug, Clone, Default)]
pub struct JobListParams {
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub page_size: Option<u32>,
    /// Filter by status.
    pub status: Option<String>,
}

impl JobListParams {
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            params.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(status) = &self.status {
            params.push(("status".to_string(), status.clone()));
        }
        params
    }
}

/// Fine-tuning resource handle.
#[derive(Debug, Clone)]
pub struct FineTuning {
    client: Client,
}

impl FineTuning {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a fine-tuning job.
    pub async fn create_job(&self, request: &CreateFineTuningJobRequest) -> Result<FineTuningJob> {
        let api_request = ApiRequest::post("/fine_tuning/jobs").json(request)?;
        self.client.execute(&api_request).await
    }

    /// List fine-tuning jobs.
    pub async fn list_jobs(&self, params: &JobListParams) -> Result<FineTuningJobList> {
        let mut api_request = ApiRequest::get("/fine_tuning/jobs");
        api_request.options.params = params.to_params();
        self.client.execute(&api_request).await
    }

    /// Retrieve one job.
    pub async fn retrieve_job(&self, job_id: &str) -> Result<FineTuningJob> {
        self.client
            .execute(&ApiRequest::get(format!("/fine_tuning/jobs/{job_id}")))
            .await
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<FineTuningJob> {
        self.client
            .execute(&ApiRequest::post(format!(
                "/fine_tuning/jobs/{job_id}/cancel"
            )))
            .await
    }

    /// Start a job that was created with `auto_start: false`.
    pub async fn start_job(&self, job_id: &str) -> Result<FineTuningJob> {
        self.client
            .execute(&ApiRequest::post(format!(
                "/fine_tuning/jobs/{job_id}/start"
            )))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserialization() {
        let json = r#"{
            "id": "ft-1",
            "model": "open-mistral-7b",
            "status": "QUEUED",
            "training_files": ["file-1"]
        }"#;

        let job: FineTuningJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.status, "QUEUED");
        assert_eq!(job.training_files, vec!["file-1"]);
        assert!(job.fine_tuned_model.is_none());
    }
}
