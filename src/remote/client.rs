//! HTTP implementation of [`DocumentService`] against the Quip REST API.
//!
//! Endpoints used:
//! - `GET /1/folders/{id}` for folder title and children
//! - `GET /1/threads/{id}` for document title, HTML body and blob list
//! - `GET /1/threads/{id}/export/docx` for the Word export
//! - `GET /1/blob/{thread_id}/{blob_id}` for attachment bytes

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error, parse_retry_after};
use super::{
    ApiError, Attachment, ChildPage, ChildRef, DocumentService, ExportFormat, RemoteDocument,
    RemoteFolder,
};
use crate::user_agent;

/// Title used when the service omits one.
const UNTITLED: &str = "Untitled";

/// Connection settings for [`QuipClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://platform.quip.com`.
    pub base_url: String,
    /// Pre-issued personal access token.
    pub access_token: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub read_timeout: Duration,
    /// Retry behavior for transient failures.
    pub retry_policy: RetryPolicy,
}

impl ClientConfig {
    /// Creates a config with default timeouts and retry policy.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Replaces both timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FolderResponse {
    folder: FolderMeta,
    #[serde(default)]
    children: Vec<ChildEntry>,
}

#[derive(Debug, Deserialize)]
struct FolderMeta {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChildEntry {
    #[serde(default)]
    folder_id: Option<String>,
    #[serde(default)]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    thread: ThreadMeta,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    blobs: Vec<BlobEntry>,
}

#[derive(Debug, Deserialize)]
struct ThreadMeta {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlobEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Quip REST client.
///
/// Created once per run and reused for every call, taking advantage of
/// connection pooling. The most recently fetched folder and thread are
/// memoized so that a folder's title and children, and a document's title,
/// HTML fallback and blob listing, each cost one request.
pub struct QuipClient {
    client: Client,
    base_url: Url,
    access_token: String,
    retry_policy: RetryPolicy,
    last_folder: LastResponse<FolderResponse>,
    last_thread: LastResponse<ThreadResponse>,
}

impl fmt::Debug for QuipClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuipClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"[REDACTED]")
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl QuipClient {
    /// Builds a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when `base_url` is not an absolute
    /// http(s) URL, or [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::invalid_url(config.base_url.clone()))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| ApiError::network(base_url.as_str(), e))?;

        Ok(Self {
            client,
            base_url,
            access_token: config.access_token,
            retry_policy: config.retry_policy,
            last_folder: LastResponse::new(),
            last_thread: LastResponse::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::invalid_url(self.base_url.as_str()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs a URL, retrying transient failures per the configured policy.
    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        let mut attempt = 1;
        loop {
            let error = match self.send_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    let delay = retry_after_override(&error, failure_type).unwrap_or(delay);
                    warn!(
                        url = %url,
                        error = %error,
                        attempt = next,
                        delay_ms = delay.as_millis(),
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url = %url, reason = %reason, "giving up on request");
                    return Err(error);
                }
            }
        }
    }

    async fn send_once(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            if matches!(status_code, 401 | 403) {
                return Err(ApiError::auth_required(url.as_str(), status_code));
            }
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(ApiError::http_status_with_retry_after(
                url.as_str(),
                status_code,
                retry_after,
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(url, e))?;
        debug!(url = %url, bytes = body.len(), "response received");
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let body = self.get_bytes(url).await?;
        if let Ok(payload) = serde_json::from_slice::<ErrorPayload>(&body) {
            let message = match payload.error_description {
                Some(description) => format!("{}: {description}", payload.error),
                None => payload.error,
            };
            return Err(ApiError::service(url.as_str(), message));
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::decode(url.as_str(), e))
    }

    /// Folder payload for `folder_id`, memoized until `list_children` consumes it.
    async fn fetch_folder(&self, folder_id: &str) -> Result<Arc<FolderResponse>, ApiError> {
        if let Some(folder) = self.last_folder.get(folder_id) {
            return Ok(folder);
        }
        let folder = Arc::new(self.request_folder(folder_id).await?);
        self.last_folder.store(folder_id, Arc::clone(&folder));
        Ok(folder)
    }

    async fn request_folder(&self, folder_id: &str) -> Result<FolderResponse, ApiError> {
        let url = self.endpoint(&["1", "folders", folder_id])?;
        self.get_json(&url).await
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Arc<ThreadResponse>, ApiError> {
        if let Some(thread) = self.last_thread.get(thread_id) {
            return Ok(thread);
        }
        let url = self.endpoint(&["1", "threads", thread_id])?;
        let thread = Arc::new(self.get_json(&url).await?);
        self.last_thread.store(thread_id, Arc::clone(&thread));
        Ok(thread)
    }
}

/// The most recent response of one kind, keyed by remote id.
struct LastResponse<T> {
    slot: Mutex<Option<(String, Arc<T>)>>,
}

impl<T> LastResponse<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(String, Arc<T>)>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, id: &str) -> Option<Arc<T>> {
        self.lock()
            .as_ref()
            .filter(|(cached_id, _)| cached_id == id)
            .map(|(_, value)| Arc::clone(value))
    }

    /// Removes and returns the entry if it belongs to `id`.
    fn take(&self, id: &str) -> Option<Arc<T>> {
        let mut guard = self.lock();
        if guard.as_ref().is_some_and(|(cached_id, _)| cached_id == id) {
            guard.take().map(|(_, value)| value)
        } else {
            None
        }
    }

    fn store(&self, id: &str, value: Arc<T>) {
        *self.lock() = Some((id.to_string(), value));
    }
}

fn map_transport_error(url: &Url, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(url.as_str())
    } else {
        ApiError::network(url.as_str(), error)
    }
}

fn retry_after_override(error: &ApiError, failure_type: FailureType) -> Option<Duration> {
    if failure_type != FailureType::RateLimited {
        return None;
    }
    match error {
        ApiError::HttpStatus {
            retry_after: Some(value),
            ..
        } => parse_retry_after(value),
        _ => None,
    }
}

fn title_or_untitled(title: Option<&str>) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

/// Blob id from the entry, or the last segment of its `/blob/{thread}/{id}` URL.
fn blob_id(entry: &BlobEntry) -> Option<String> {
    entry
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            entry
                .url
                .as_deref()?
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .map(ToString::to_string)
        })
}

#[async_trait]
impl DocumentService for QuipClient {
    #[instrument(skip(self))]
    async fn get_folder(&self, folder_id: &str) -> Result<RemoteFolder, ApiError> {
        let response = self.fetch_folder(folder_id).await?;
        Ok(RemoteFolder {
            id: folder_id.to_string(),
            title: title_or_untitled(response.folder.title.as_deref()),
        })
    }

    #[instrument(skip(self))]
    async fn list_children(
        &self,
        folder_id: &str,
        cursor: Option<&str>,
    ) -> Result<ChildPage, ApiError> {
        // The folder endpoint returns every child in one response.
        if cursor.is_some() {
            return Ok(ChildPage::default());
        }
        // Consume the memo so the next visit to this folder lists it afresh.
        let response = match self.last_folder.take(folder_id) {
            Some(response) => response,
            None => Arc::new(self.request_folder(folder_id).await?),
        };
        let children = response
            .children
            .iter()
            .filter_map(|entry| match (&entry.folder_id, &entry.thread_id) {
                (Some(id), _) => Some(ChildRef::Folder(id.clone())),
                (None, Some(id)) => Some(ChildRef::Document(id.clone())),
                (None, None) => {
                    warn!(folder_id, "ignoring child entry without folder_id or thread_id");
                    None
                }
            })
            .collect();
        Ok(ChildPage {
            children,
            next_cursor: None,
        })
    }

    #[instrument(skip(self))]
    async fn get_document(&self, document_id: &str) -> Result<RemoteDocument, ApiError> {
        let thread = self.fetch_thread(document_id).await?;
        Ok(RemoteDocument {
            id: document_id.to_string(),
            title: title_or_untitled(thread.thread.title.as_deref()),
        })
    }

    #[instrument(skip(self))]
    async fn export_document(
        &self,
        document_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ApiError> {
        match format {
            ExportFormat::Docx => {
                let url = self.endpoint(&["1", "threads", document_id, "export", "docx"])?;
                self.get_bytes(&url).await
            }
            ExportFormat::Html => {
                let thread = self.fetch_thread(document_id).await?;
                thread
                    .html
                    .as_deref()
                    .filter(|html| !html.trim().is_empty())
                    .map(|html| html.as_bytes().to_vec())
                    .ok_or_else(|| ApiError::not_supported(document_id, format))
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_attachments(&self, document_id: &str) -> Result<Vec<Attachment>, ApiError> {
        let thread = self.fetch_thread(document_id).await?;
        Ok(thread
            .blobs
            .iter()
            .filter_map(|entry| {
                let Some(id) = blob_id(entry) else {
                    warn!(document_id, "ignoring blob without id or url");
                    return None;
                };
                Some(Attachment {
                    id,
                    name: entry.name.clone().unwrap_or_default(),
                })
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn download_attachment(
        &self,
        document_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["1", "blob", document_id, attachment_id])?;
        self.get_bytes(&url).await
    }
}
