//! Error types for remote service calls.
//!
//! Every variant carries the URL (or document id) it came from so that a
//! failure recorded in the export summary can be traced back to the request.

use thiserror::Error;

use super::ExportFormat;

/// Errors that can occur while talking to the remote document service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The access token was rejected.
    #[error("[AUTH] access token rejected (HTTP {status}) requesting {url}")]
    AuthRequired {
        /// The URL that was refused.
        url: String,
        /// 401 or 403.
        status: u16,
    },

    /// The response body was not the JSON shape we expected.
    #[error("malformed response from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The service answered 200 but with an `error` payload.
    #[error("service error from {url}: {message}")]
    Service {
        /// The URL that returned the error payload.
        url: String,
        /// Message reported by the service.
        message: String,
    },

    /// The document cannot be produced in the requested format.
    #[error("{format} export not supported for document {document_id}")]
    NotSupported {
        /// The document that was requested.
        document_id: String,
        /// The format that is unavailable.
        format: ExportFormat,
    },

    /// A URL could not be built from the configured base URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl ApiError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates an authentication error.
    pub fn auth_required(url: impl Into<String>, status: u16) -> Self {
        Self::AuthRequired {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates a service-reported error.
    pub fn service(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a not-supported error for a document/format pair.
    pub fn not_supported(document_id: impl Into<String>, format: ExportFormat) -> Self {
        Self::NotSupported {
            document_id: document_id.into(),
            format,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns true when the error means the token itself is unusable.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }
}
