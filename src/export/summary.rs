//! Aggregate outcome of one export run.

use std::fmt;

/// What kind of entity a recorded failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureKind {
    /// A folder subtree was skipped.
    Folder,
    /// A document's content could not be exported.
    Document,
    /// A single attachment could not be listed or saved.
    Attachment,
}

impl FailureKind {
    /// Short label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Document => "document",
            Self::Attachment => "attachment",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    /// Entity kind.
    pub kind: FailureKind,
    /// Remote identifier of the failing entity.
    pub remote_id: String,
    /// Title, when it was known at the time of failure.
    pub title: Option<String>,
    /// Captured reason.
    pub reason: String,
}

/// Counts and failures produced by [`Exporter::export`](super::Exporter::export).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    folders_created: usize,
    documents_exported: usize,
    fallback_exports: usize,
    attachments_saved: usize,
    failures: Vec<ExportFailure>,
}

impl ExportSummary {
    /// Directories created (or found existing) for remote folders, root included.
    #[must_use]
    pub fn folders_created(&self) -> usize {
        self.folders_created
    }

    /// Documents whose content was written in some format.
    #[must_use]
    pub fn documents_exported(&self) -> usize {
        self.documents_exported
    }

    /// Exported documents that needed a non-preferred format.
    #[must_use]
    pub fn fallback_exports(&self) -> usize {
        self.fallback_exports
    }

    /// Attachments written to disk.
    #[must_use]
    pub fn attachments_saved(&self) -> usize {
        self.attachments_saved
    }

    /// Documents with no content written.
    #[must_use]
    pub fn documents_failed(&self) -> usize {
        self.count_failures(FailureKind::Document)
    }

    /// Number of failures of one kind.
    #[must_use]
    pub fn count_failures(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// All failures in the order they happened.
    #[must_use]
    pub fn failures(&self) -> &[ExportFailure] {
        &self.failures
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record_folder(&mut self) {
        self.folders_created += 1;
    }

    pub(crate) fn record_document(&mut self, used_fallback: bool) {
        self.documents_exported += 1;
        if used_fallback {
            self.fallback_exports += 1;
        }
    }

    pub(crate) fn record_attachment(&mut self) {
        self.attachments_saved += 1;
    }

    pub(crate) fn record_failure(
        &mut self,
        kind: FailureKind,
        remote_id: &str,
        title: Option<&str>,
        reason: impl Into<String>,
    ) {
        self.failures.push(ExportFailure {
            kind,
            remote_id: remote_id.to_string(),
            title: title.map(ToString::to_string),
            reason: reason.into(),
        });
    }
}
