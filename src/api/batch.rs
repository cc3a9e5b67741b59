//! Batch job lifecycle.

use crate::api::fine_tuning::JobListParams;
use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request to create a batch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatchJobRequest {
    /// Ids of uploaded input files.
    pub input_files: Vec<String>,
    /// Endpoint to run each request against, e.g. `/v1/chat/completions`.
    pub endpoint: String,
    /// Model applied to every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Caller-supplied metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    /// Hours before the job expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_hours: Option<u32>,
}

/// A batch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    /// Job identifier.
    pub id: String,
    /// Job status, e.g. `QUEUED`, `RUNNING`, `SUCCESS`.
    pub status: String,
    /// Input file ids.
    #[serde(default)]
    pub input_files: Vec<String>,
    /// Endpoint run against.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Id of the output file, once produced.
    #[serde(default)]
    pub output_file: Option<String>,
    /// Id of the error file, once produced.
    #[serde(default)]
    pub error_file: Option<String>,
    /// Number of requests completed so far.
    #[serde(default)]
    pub completed_requests: Option<u64>,
    /// Total number of requests.
    #[serde(default)]
    pub total_requests: Option<u64>,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Response from listing batch jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobList {
    /// Object type.
    #[serde(default)]
    pub object: Option<String>,
    /// Jobs on this page.
    pub data: Vec<BatchJob>,
    /// Total number of jobs, when reported.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Batch resource handle.
#[derive(Debug, Clone)]
pub struct Batch {
    client: Client,
}

impl Batch {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a batch job.
    pub async fn create_job(&self, request: &CreateBatchJobRequest) -> Result<BatchJob> {
        let api_request = ApiRequest::post("/batch/jobs").json(request)?;
        self.client.execute(&api_request).await
    }

    /// List batch jobs.
    pub async fn list_jobs(&self, params: &JobListParams) -> Result<BatchJobList> {
        let mut api_request = ApiRequest::get("/batch/jobs");
        api_request.options.params = params.to_params();
        self.client.execute(&api_request).await
    }

    /// Retrieve one job.
    pub async fn retrieve_job(&self, job_id: &str) -> Result<BatchJob> {
        self.client
            .execute(&ApiRequest::get(format!("/batch/jobs/{job_id}")))
            .await
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<BatchJob> {
        self.client
            .execute(&ApiRequest::post(format!("/batch/jobs/{job_id}/cancel")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_absent_fields() {
        let request = CreateBatchJobRequest {
            input_files: vec!["file-1".into()],
            endpoint: "/v1/chat/completions".into(),
            model: Some("mistral-small-latest".into()),
            metadata: None,
            timeout_hours: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"endpoint\":\"/v1/chat/completions\""));
        assert!(!json.contains("metadata"));
        assert!(!json.contains("timeout_hours"));
    }
}
