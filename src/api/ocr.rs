//! OCR document processing.

use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde::{Deserialize, Serialize};

/// Source document for an OCR request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentSource {
    /// A document reachable by URL.
    #[serde(rename = "document_url")]
    DocumentUrl {
        /// URL of the document.
        document_url: String,
    },
    /// An image reachable by URL (or a data URL).
    #[serde(rename = "image_url")]
    ImageUrl {
        /// URL of the image.
        image_url: String,
    },
}

/// Request for OCR processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRequest {
    /// OCR model to use.
    pub model: String,
    /// Source document.
    pub document: DocumentSource,
    /// Specific pages to process (0-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<u32>>,
    /// Include extracted images as base64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_image_base64: Option<bool>,
}

/// One processed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    /// Page index.
    pub index: u32,
    /// Extracted text as markdown.
    pub markdown: String,
    /// Extracted images.
    #[serde(default)]
    pub images: Vec<serde_json::Value>,
    /// Page dimensions, when reported.
    #[serde(default)]
    pub dimensions: Option<serde_json::Value>,
}

/// Response from OCR processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    /// Processed pages.
    pub pages: Vec<OcrPage>,
    /// Model used.
    pub model: String,
    /// Processing usage details.
    #[serde(default)]
    pub usage_info: Option<serde_json::Value>,
}

impl OcrResponse {
    /// Concatenate the markdown of all pages, in page order.
    pub fn markdown(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// OCR resource handle.
#[derive(Debug, Clone)]
pub struct Ocr {
    client: Client,
}

impl Ocr {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Run OCR over a document.
    pub async fn process(&self, request: &OcrRequest) -> Result<OcrResponse> {
        let api_request = ApiRequest::post("/ocr").json(request)?;
        self.client.execute(&api_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_source_tagging() {
        let source = DocumentSource::DocumentUrl {
            document_url: "https://example.com/doc.pdf".into(),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"document_url\""));

        let source = DocumentSource::ImageUrl {
            image_url: "https://example.com/scan.png".into(),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"image_url\""));
    }

    #[test]
    fn test_markdown_concatenation() {
        let response = OcrResponse {
            pages: vec![
                OcrPage {
                    index: 0,
                    markdown: "# Page one".into(),
                    images: vec![],
                    dimensions: None,
                },
                OcrPage {
                    index: 1,
                    markdown: "Page two".into(),
                    images: vec![],
                    dimensions: None,
                },
            ],
            model: "mistral-ocr-latest".into(),
            usage_info: None,
        };
        assert_eq!(response.markdown(), "# Page one\n\nPage two");
    }
}
