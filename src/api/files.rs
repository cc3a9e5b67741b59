//! File management.
//!
//! Uploads are `multipart/form-data`; the multipart body is assembled here
//! so the transport keeps its bytes-only contract.

use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file stored on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    /// File identifier.
    pub id: String,
    /// Object type.
    pub object: String,
    /// Size in bytes.
    #[serde(default)]
    pub bytes: Option<u64>,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Original filename.
    #[serde(default)]
    pub filename: Option<String>,
    /// Declared purpose, e.g. `fine-tune` or `batch`.
    #[serde(default)]
    pub purpose: Option<String>,
    /// Sample type reported by the server.
    #[serde(default)]
    pub sample_type: Option<String>,
}

/// Response from listing files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileList {
    /// Object type.
    #[serde(default)]
    pub object: Option<String>,
    /// Files on this page.
    pub data: Vec<FileObject>,
    /// Total number of files, when reported.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Acknowledgement of a file deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedFile {
    /// File identifier.
    pub id: String,
    /// Object type.
    pub object: String,
    /// Whether the file was deleted.
    pub deleted: bool,
}

/// An upload: filename, content and declared purpose.
#[derive(Debug, Clone)]
pub struct UploadFileRequest {
    /// Filename reported to the server.
    pub file_name: String,
    /// File content.
    pub content: Bytes,
    /// Declared purpose.
    pub purpose: String,
}

impl UploadFileRequest {
    /// Create an upload request.
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            purpose: purpose.into(),
        }
    }
}

/// Filters for listing files.
#[derive(Debug, Clone, Default)]
pub struct FileListParams {
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub page_size: Option<u32>,
    /// Filter by purpose.
    pub purpose: Option<String>,
}

impl FileListParams {
    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            params.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(purpose) = &self.purpose {
            params.push(("purpose".to_string(), purpose.clone()));
        }
        params
    }
}

/// Files resource handle.
#[derive(Debug, Clone)]
pub struct Files {
    client: Client,
}

impl Files {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Upload a file.
    pub async fn upload(&self, request: &UploadFileRequest) -> Result<FileObject> {
        let boundary = format!("mistral-sdk-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_body(&boundary, request);

        let api_request = ApiRequest::post("/files")
            .raw_body(body)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            );
        self.client.execute(&api_request).await
    }

    /// List files.
    pub async fn list(&self, params: &FileListParams) -> Result<FileList> {
        let mut api_request = ApiRequest::get("/files");
        api_request.options.params = params.to_params();
        self.client.execute(&api_request).await
    }

    /// Retrieve file metadata.
    pub async fn retrieve(&self, file_id: &str) -> Result<FileObject> {
        self.client
            .execute(&ApiRequest::get(format!("/files/{file_id}")))
            .await
    }

    /// Delete a file.
    pub async fn delete(&self, file_id: &str) -> Result<DeletedFile> {
        self.client
            .execute(&ApiRequest::delete(format!("/files/{file_id}")))
            .await
    }

    /// Download a file's content, unmodified.
    pub async fn download(&self, file_id: &str) -> Result<Bytes> {
        self.client
            .execute_raw(&ApiRequest::get(format!("/files/{file_id}/content")))
            .await
    }
}

/// Assemble a two-part multipart body: `purpose` and `file`.
fn multipart_body(boundary: &str, request: &UploadFileRequest) -> Bytes {
    let mut body = Vec::with_capacity(request.content.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"purpose\"\r\n\r\n");
    body.extend_from_slice(request.purpose.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            request.file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(&request.content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Bytes::from(body)
}
