//! Document text extraction for user-supplied briefing material.
//!
//! Plain-text uploads are decoded locally. Everything else is handed to a
//! multimodal model with a prompt suited to the file kind.

use crate::llm_client::{InlineFile, LLMClient};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
/// Characters assumed per page when estimating document length.
const CHARS_PER_PAGE: usize = 3000;

const DOCUMENT_PROMPT: &str = "Please extract and return ALL the text content from this document.
Include all slides, pages, headers, bullet points, and any text visible in the document.
If there are images with text, describe them briefly.
Format the output as plain text, maintaining the document's structure with clear separations between sections/slides.
Do not summarize - extract everything.";

const IMAGE_PROMPT: &str = "Please extract any text visible in this image.
If there is no text, describe what you see in the image.
If there are charts or diagrams, describe their content.";

const GENERIC_PROMPT: &str = "Please extract and return all text content from this file.";

/// Upstream failures callers can act on. Anything else stays a plain error.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Invalid API key for the extraction model. Please check the server configuration.")]
    InvalidApiKey,
    #[error("Extraction model quota exceeded. Please try again later.")]
    QuotaExceeded,
    #[error("File is too large for processing. Please use a smaller file.")]
    FileTooLarge,
}

impl ExtractionError {
    /// Recognizes a well-known failure from a model error message.
    pub fn classify(message: &str) -> Option<Self> {
        let message = message.to_lowercase();
        if message.contains("api key") {
            Some(Self::InvalidApiKey)
        } else if message.contains("quota") || message.contains("rate limit") {
            Some(Self::QuotaExceeded)
        } else if message.contains("too large") {
            Some(Self::FileTooLarge)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Pptx,
    Image,
    Text,
    Other,
}

fn has_extension(filename: &str, extensions: &[&str]) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

impl FileKind {
    /// Classifies an upload by MIME type, falling back to its extension.
    pub fn detect(filename: &str, content_type: &str) -> Self {
        if content_type.starts_with("text/") || has_extension(filename, &["txt", "md", "csv"]) {
            Self::Text
        } else if content_type == "application/pdf" || has_extension(filename, &["pdf"]) {
            Self::Pdf
        } else if content_type == PPTX_MIME || has_extension(filename, &["pptx"]) {
            Self::Pptx
        } else if content_type.starts_with("image/")
            || has_extension(filename, &["jpg", "jpeg", "png", "gif", "webp"])
        {
            Self::Image
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
            Self::Image => "image",
            Self::Text => "text",
            Self::Other => "other",
        }
    }

    fn is_document(self) -> bool {
        matches!(self, Self::Pdf | Self::Pptx)
    }

    fn prompt(self) -> &'static str {
        match self {
            Self::Pdf | Self::Pptx => DOCUMENT_PROMPT,
            Self::Image => IMAGE_PROMPT,
            Self::Text | Self::Other => GENERIC_PROMPT,
        }
    }
}

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// May be empty when the client did not send one.
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn kind(&self) -> FileKind {
        FileKind::detect(&self.filename, &self.content_type)
    }

    /// The declared MIME type, or one inferred from the extension.
    pub fn mime_type(&self) -> String {
        if !self.content_type.is_empty() {
            return self.content_type.clone();
        }
        let inferred = match self.kind() {
            FileKind::Pdf => "application/pdf",
            FileKind::Pptx => PPTX_MIME,
            _ if has_extension(&self.filename, &["png"]) => "image/png",
            _ if has_extension(&self.filename, &["jpg", "jpeg"]) => "image/jpeg",
            _ => "application/octet-stream",
        };
        inferred.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionMeta {
    pub pages: usize,
    pub chars: usize,
    pub file_type: FileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub meta: ExtractionMeta,
}

/// Rough page count for extracted document text.
pub fn estimate_pages(kind: FileKind, chars: usize) -> usize {
    if kind.is_document() {
        chars.div_ceil(CHARS_PER_PAGE).max(1)
    } else {
        1
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, file: &UploadedFile) -> Result<ExtractedDocument>;
}

/// Extracts text through a multimodal chat model.
pub struct LLMTextExtractor {
    client: Arc<dyn LLMClient>,
}

impl LLMTextExtractor {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextExtractor for LLMTextExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<ExtractedDocument> {
        let kind = file.kind();

        if kind == FileKind::Text {
            let text = String::from_utf8_lossy(&file.data).into_owned();
            let chars = text.chars().count();
            return Ok(ExtractedDocument {
                text,
                meta: ExtractionMeta {
                    pages: 1,
                    chars,
                    file_type: kind,
                    processed_by: None,
                },
            });
        }

        let inline = InlineFile {
            mime_type: file.mime_type(),
            data: file.data.clone(),
        };
        let text = match self.client.complete_with_file(kind.prompt(), &inline).await {
            Ok(text) => text,
            Err(e) => {
                let context = format!("Failed to extract text from '{}'", file.filename);
                return Err(match ExtractionError::classify(&format!("{:#}", e)) {
                    Some(known) => {
                        warn!(filename = %file.filename, error = %e, "Extraction model refused the file");
                        anyhow::Error::new(known).context(context)
                    }
                    None => e.context(context),
                });
            }
        };

        let chars = text.chars().count();
        info!(filename = %file.filename, ?kind, chars, "Extracted document text");
        Ok(ExtractedDocument {
            meta: ExtractionMeta {
                pages: estimate_pages(kind, chars),
                chars,
                file_type: kind,
                processed_by: Some(self.client.model()),
            },
            text,
        })
    }
}
