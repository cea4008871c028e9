//! Remote document service capability and its Quip HTTP implementation.
//!
//! The exporter only ever talks to a [`DocumentService`]; [`QuipClient`] is the
//! production implementation and tests substitute in-memory fakes.
//!
//! # Example
//!
//! ```no_run
//! use quip_export_core::remote::{ClientConfig, DocumentService, QuipClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://platform.quip.com", "token");
//! let client = QuipClient::new(config)?;
//! let folder = client.get_folder("AbCdEf123").await?;
//! println!("Root folder: {}", folder.title);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod retry;

pub use client::{ClientConfig, QuipClient};
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_API_BASE_URL, READ_TIMEOUT_SECS};
pub use error::ApiError;
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error,
    parse_retry_after,
};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

/// Export representations a document can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Word document export, the feature-preserving representation.
    Docx,
    /// Rendered HTML of the document body.
    Html,
}

impl ExportFormat {
    /// File extension written for this format (without the dot).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown export format '{other}' (expected docx or html)")),
        }
    }
}

/// Formats tried in order until one succeeds.
pub const DEFAULT_EXPORT_FORMATS: [ExportFormat; 2] = [ExportFormat::Docx, ExportFormat::Html];

/// Folder metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    /// Folder identifier.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    /// Document (thread) identifier.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// A child reference inside a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    /// Nested folder.
    Folder(String),
    /// Document.
    Document(String),
}

impl ChildRef {
    /// Identifier of the referenced entity.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(id) | Self::Document(id) => id,
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildPage {
    /// Children on this page, in service order.
    pub children: Vec<ChildRef>,
    /// Cursor for the next page; `None` once the listing is exhausted.
    pub next_cursor: Option<String>,
}

/// An attachment blob belonging to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Blob identifier.
    pub id: String,
    /// File name as reported by the service.
    pub name: String,
}

/// Read-only capability over a remote folder/document tree.
///
/// Implementations are expected to be cheap to call repeatedly; the exporter
/// makes one call at a time and never caches results across calls.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetches folder metadata.
    async fn get_folder(&self, folder_id: &str) -> Result<RemoteFolder, ApiError>;

    /// Fetches one page of a folder's children. `cursor` is `None` for the first page.
    async fn list_children(
        &self,
        folder_id: &str,
        cursor: Option<&str>,
    ) -> Result<ChildPage, ApiError>;

    /// Fetches document metadata.
    async fn get_document(&self, document_id: &str) -> Result<RemoteDocument, ApiError>;

    /// Exports a document in the given representation.
    async fn export_document(
        &self,
        document_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ApiError>;

    /// Lists a document's attachments.
    async fn list_attachments(&self, document_id: &str) -> Result<Vec<Attachment>, ApiError>;

    /// Downloads one attachment's bytes.
    async fn download_attachment(
        &self,
        document_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, ApiError>;
}
