//! Setup errors that abort an export before any traversal happens.

use std::path::PathBuf;

use thiserror::Error;

use crate::remote::ApiError;

/// Fatal export errors.
///
/// Everything that goes wrong *inside* the walk is recorded in the
/// [`ExportSummary`](super::ExportSummary) instead.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No export formats were configured.
    #[error("at least one export format must be configured")]
    NoFormats,

    /// The output root (or the root folder's directory) could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputRoot {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The root folder could not be resolved or listed.
    #[error("cannot read root folder {folder_id}: {source}")]
    RootFolder {
        /// Root folder identifier.
        folder_id: String,
        /// Underlying API error.
        #[source]
        source: ApiError,
    },
}

impl ExportError {
    /// Creates an output-root error.
    pub fn output_root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputRoot {
            path: path.into(),
            source,
        }
    }

    /// Creates a root-folder error.
    pub fn root_folder(folder_id: impl Into<String>, source: ApiError) -> Self {
        Self::RootFolder {
            folder_id: folder_id.into(),
            source,
        }
    }
}
