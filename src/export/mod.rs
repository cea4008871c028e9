//! Recursive folder export onto the local filesystem.
//!
//! The [`Exporter`] walks a remote folder depth-first and mirrors it under an
//! output root: one directory per folder, one file per document (in the first
//! configured format that succeeds), and a `<name>_attachments` directory for
//! documents that have attachments.
//!
//! Failures below the root never abort the run. A folder that cannot be read
//! skips its subtree, a document whose formats all fail is skipped, and a
//! broken attachment is skipped; each is recorded in the [`ExportSummary`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use quip_export_core::export::{ExportConfig, Exporter};
//! use quip_export_core::remote::{ClientConfig, QuipClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = QuipClient::new(ClientConfig::new("https://platform.quip.com", "token"))?;
//! let exporter = Exporter::new(&client, ExportConfig::default());
//! let summary = exporter.export("AbCdEf123", Path::new("./quip_export")).await?;
//! println!("{} documents exported", summary.documents_exported());
//! # Ok(())
//! # }
//! ```

mod error;
mod summary;

pub use error::ExportError;
pub use summary::{ExportFailure, ExportSummary, FailureKind};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::remote::{
    ApiError, ChildRef, DEFAULT_EXPORT_FORMATS, DocumentService, ExportFormat, RemoteDocument,
};
use crate::sanitize::{ATTACHMENTS_SUFFIX, SiblingNames};

/// Default recursion bound below the root folder.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Tuning for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Formats tried in order for every document.
    pub formats: Vec<ExportFormat>,
    /// Folders nested deeper than this below the root are skipped and recorded.
    pub max_depth: usize,
    /// Pause between consecutive children of a folder.
    pub request_delay: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: DEFAULT_EXPORT_FORMATS.to_vec(),
            max_depth: DEFAULT_MAX_DEPTH,
            request_delay: Duration::ZERO,
        }
    }
}

/// Sequential depth-first exporter over a [`DocumentService`].
pub struct Exporter<'a> {
    service: &'a dyn DocumentService,
    config: ExportConfig,
}

impl<'a> Exporter<'a> {
    /// Creates an exporter borrowing the given service.
    #[must_use]
    pub fn new(service: &'a dyn DocumentService, config: ExportConfig) -> Self {
        Self { service, config }
    }

    /// Exports `root_folder_id` into a directory named after it under `output_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] only for setup failures: no formats configured,
    /// the output root (or root folder directory) cannot be created, or the
    /// root folder cannot be resolved or listed. Everything else ends up in
    /// the returned summary.
    #[instrument(skip(self, output_root), fields(output_root = %output_root.display()))]
    pub async fn export(
        &self,
        root_folder_id: &str,
        output_root: &Path,
    ) -> Result<ExportSummary, ExportError> {
        if self.config.formats.is_empty() {
            return Err(ExportError::NoFormats);
        }

        tokio::fs::create_dir_all(output_root)
            .await
            .map_err(|e| ExportError::output_root(output_root, e))?;

        let root = self
            .service
            .get_folder(root_folder_id)
            .await
            .map_err(|e| ExportError::root_folder(root_folder_id, e))?;

        let mut root_names = SiblingNames::new();
        let dir = output_root.join(root_names.claim_folder(&root.title, &root.id));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ExportError::output_root(&dir, e))?;

        let mut summary = ExportSummary::default();
        summary.record_folder();
        info!(folder = %root.title, path = %dir.display(), "exporting root folder");

        let children = self
            .list_all_children(root_folder_id)
            .await
            .map_err(|e| ExportError::root_folder(root_folder_id, e))?;

        self.export_children(&children, &dir, 0, &mut summary).await;

        info!(
            folders = summary.folders_created(),
            documents = summary.documents_exported(),
            failed_documents = summary.documents_failed(),
            attachments = summary.attachments_saved(),
            failures = summary.failures().len(),
            "export finished"
        );
        Ok(summary)
    }

    /// Drains every page of a folder listing.
    async fn list_all_children(&self, folder_id: &str) -> Result<Vec<ChildRef>, ApiError> {
        let mut children = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .service
                .list_children(folder_id, cursor.as_deref())
                .await?;
            children.extend(page.children);
            match page.next_cursor {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    warn!(folder_id, cursor = %next, "listing cursor did not advance; stopping");
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!(folder_id, count = children.len(), "listed children");
        Ok(children)
    }

    /// Exports children of the folder mirrored at `dir` (which sits at `depth`).
    async fn export_children(
        &self,
        children: &[ChildRef],
        dir: &Path,
        depth: usize,
        summary: &mut ExportSummary,
    ) {
        let mut names = SiblingNames::new();
        let total = children.len();

        for (index, child) in children.iter().enumerate() {
            if index > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
            debug!(item = index + 1, total, id = child.id(), "processing child");

            match child {
                ChildRef::Folder(id) => {
                    Box::pin(self.export_subfolder(id, dir, &mut names, depth + 1, summary)).await;
                }
                ChildRef::Document(id) => {
                    self.export_document(id, dir, &mut names, summary).await;
                }
            }
        }
    }

    #[instrument(skip(self, parent_dir, parent_names, summary))]
    async fn export_subfolder(
        &self,
        folder_id: &str,
        parent_dir: &Path,
        parent_names: &mut SiblingNames,
        depth: usize,
        summary: &mut ExportSummary,
    ) {
        if depth > self.config.max_depth {
            warn!(max_depth = self.config.max_depth, "folder nesting too deep; skipping subtree");
            summary.record_failure(
                FailureKind::Folder,
                folder_id,
                None,
                format!("maximum folder depth {} exceeded", self.config.max_depth),
            );
            return;
        }

        let folder = match self.service.get_folder(folder_id).await {
            Ok(folder) => folder,
            Err(error) => {
                warn!(error = %error, "cannot resolve folder; skipping subtree");
                summary.record_failure(FailureKind::Folder, folder_id, None, error.to_string());
                return;
            }
        };

        let dir = parent_dir.join(parent_names.claim_folder(&folder.title, &folder.id));
        if let Err(error) = tokio::fs::create_dir_all(&dir).await {
            warn!(path = %dir.display(), error = %error, "cannot create directory; skipping subtree");
            summary.record_failure(
                FailureKind::Folder,
                folder_id,
                Some(&folder.title),
                format!("cannot create {}: {error}", dir.display()),
            );
            return;
        }
        summary.record_folder();
        info!(folder = %folder.title, path = %dir.display(), "exporting folder");

        let children = match self.list_all_children(folder_id).await {
            Ok(children) => children,
            Err(error) => {
                warn!(error = %error, "cannot list folder; skipping subtree");
                summary.record_failure(
                    FailureKind::Folder,
                    folder_id,
                    Some(&folder.title),
                    error.to_string(),
                );
                return;
            }
        };

        self.export_children(&children, &dir, depth, summary).await;
    }

    #[instrument(skip(self, dir, names, summary))]
    async fn export_document(
        &self,
        document_id: &str,
        dir: &Path,
        names: &mut SiblingNames,
        summary: &mut ExportSummary,
    ) {
        let document = match self.service.get_document(document_id).await {
            Ok(document) => document,
            Err(error) => {
                warn!(error = %error, "cannot resolve document; skipping");
                summary.record_failure(FailureKind::Document, document_id, None, error.to_string());
                return;
            }
        };

        let extensions: Vec<&str> = self.config.formats.iter().map(|f| f.extension()).collect();
        let base = names.claim_document(&document.title, &document.id, &extensions);

        match self.export_content(&document, dir, &base).await {
            Ok((format, path)) => {
                let used_fallback = format != self.config.formats[0];
                info!(
                    document = %document.title,
                    format = %format,
                    fallback = used_fallback,
                    path = %path.display(),
                    "exported document"
                );
                summary.record_document(used_fallback);
            }
            Err(reason) => {
                warn!(document = %document.title, reason = %reason, "every export format failed");
                summary.record_failure(
                    FailureKind::Document,
                    &document.id,
                    Some(&document.title),
                    reason,
                );
            }
        }

        self.export_attachments(&document, dir, &base, summary).await;
    }

    /// Tries each configured format in order; returns the one written.
    async fn export_content(
        &self,
        document: &RemoteDocument,
        dir: &Path,
        base: &str,
    ) -> Result<(ExportFormat, PathBuf), String> {
        let mut attempts = Vec::with_capacity(self.config.formats.len());

        for &format in &self.config.formats {
            let bytes = match self.service.export_document(&document.id, format).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    debug!(document_id = %document.id, format = %format, error = %error, "export format failed");
                    attempts.push(format!("{format}: {error}"));
                    continue;
                }
            };

            let path = dir.join(format!("{base}.{}", format.extension()));
            match write_file(&path, &bytes).await {
                Ok(()) => return Ok((format, path)),
                Err(error) => {
                    attempts.push(format!("{format}: cannot write {}: {error}", path.display()));
                }
            }
        }

        Err(attempts.join("; "))
    }

    async fn export_attachments(
        &self,
        document: &RemoteDocument,
        dir: &Path,
        base: &str,
        summary: &mut ExportSummary,
    ) {
        let attachments = match self.service.list_attachments(&document.id).await {
            Ok(attachments) => attachments,
            Err(error) => {
                warn!(document = %document.title, error = %error, "cannot list attachments");
                summary.record_failure(
                    FailureKind::Attachment,
                    &document.id,
                    Some(&document.title),
                    format!("listing attachments: {error}"),
                );
                return;
            }
        };
        if attachments.is_empty() {
            return;
        }

        let attachments_dir = dir.join(format!("{base}{ATTACHMENTS_SUFFIX}"));
        if let Err(error) = tokio::fs::create_dir_all(&attachments_dir).await {
            warn!(path = %attachments_dir.display(), error = %error, "cannot create attachments directory");
            for attachment in &attachments {
                summary.record_failure(
                    FailureKind::Attachment,
                    &attachment.id,
                    Some(&attachment.name),
                    format!("cannot create {}: {error}", attachments_dir.display()),
                );
            }
            return;
        }

        let mut names = SiblingNames::new();
        for attachment in &attachments {
            let file_name = names.claim_file(&attachment.name, &attachment.id);
            let path = attachments_dir.join(&file_name);

            let outcome = match self
                .service
                .download_attachment(&document.id, &attachment.id)
                .await
            {
                Ok(bytes) => write_file(&path, &bytes)
                    .await
                    .map_err(|e| format!("cannot write {}: {e}", path.display())),
                Err(error) => Err(error.to_string()),
            };

            match outcome {
                Ok(()) => {
                    debug!(attachment = %file_name, path = %path.display(), "saved attachment");
                    summary.record_attachment();
                }
                Err(reason) => {
                    warn!(attachment = %attachment.name, reason = %reason, "attachment failed");
                    summary.record_failure(
                        FailureKind::Attachment,
                        &attachment.id,
                        Some(&attachment.name),
                        reason,
                    );
                }
            }
        }
    }
}

/// Writes `bytes` to `path` (create or overwrite), removing the file if the write fails.
async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Err(error) = tokio::fs::write(path, bytes).await {
        debug!(path = %path.display(), "cleaning up partial file after error");
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %cleanup, "cannot remove partial file");
            }
        }
        return Err(error);
    }
    Ok(())
}
