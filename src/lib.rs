//! Quip Export Core Library
//!
//! This library mirrors a Quip folder tree onto local disk: one directory per
//! folder, one file per document (Word export preferred, HTML as fallback),
//! and an attachments directory next to each document that has attachments.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`remote`] - Document service trait and the Quip HTTP client
//! - [`sanitize`] - Safe, unique local names for remote titles
//! - [`export`] - Recursive export walk and its summary
//! - [`link`] - Folder link / id parsing and API base URL inference

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod export;
pub mod link;
pub mod remote;
pub mod sanitize;
mod user_agent;

// Re-export commonly used types
pub use export::{
    DEFAULT_MAX_DEPTH, ExportConfig, ExportError, ExportFailure, ExportSummary, Exporter,
    FailureKind,
};
pub use link::{FolderReference, LinkError, parse_folder_reference};
pub use remote::{
    ApiError, Attachment, ChildPage, ChildRef, ClientConfig, DEFAULT_EXPORT_FORMATS,
    DEFAULT_MAX_RETRIES, DocumentService, ExportFormat, QuipClient, RemoteDocument, RemoteFolder,
    RetryPolicy,
};
pub use sanitize::SiblingNames;
