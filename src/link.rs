//! Folder reference parsing: folder link or bare id to `(folder_id, api_base_url)`.

use thiserror::Error;
use url::Url;

use crate::remote::DEFAULT_API_BASE_URL;

/// Errors from interpreting a folder reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// Nothing was supplied.
    #[error("folder reference is empty")]
    Empty,

    /// The input looked like a URL but did not parse.
    #[error("invalid folder link: {input}")]
    InvalidUrl {
        /// The rejected input.
        input: String,
    },

    /// The URL has no path segment to take an id from.
    #[error("no folder id found in link: {input}")]
    MissingId {
        /// The rejected input.
        input: String,
    },
}

/// A resolved folder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReference {
    /// Folder identifier passed to the API.
    pub folder_id: String,
    /// API base URL inferred from the link host.
    pub api_base_url: String,
}

/// Parses a folder link (`https://quip.com/AbC123`) or a bare id.
///
/// The id is the last non-empty path segment with any `#fragment` dropped.
/// The API base URL is `https://platform.<host>`, or the host itself if it
/// already starts with `platform.`. Bare ids map to the default base URL.
///
/// # Errors
///
/// Returns [`LinkError`] if the input is empty, an unparseable URL, or a URL
/// without any path segment.
pub fn parse_folder_reference(input: &str) -> Result<FolderReference, LinkError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LinkError::Empty);
    }

    if !input.contains("://") {
        let folder_id = input
            .split('#')
            .next()
            .unwrap_or_default()
            .trim_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        if folder_id.is_empty() {
            return Err(LinkError::MissingId {
                input: input.to_string(),
            });
        }
        return Ok(FolderReference {
            folder_id: folder_id.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        });
    }

    let url = Url::parse(input).map_err(|_| LinkError::InvalidUrl {
        input: input.to_string(),
    })?;
    let host = url.host_str().ok_or_else(|| LinkError::InvalidUrl {
        input: input.to_string(),
    })?;

    let folder_id = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .ok_or_else(|| LinkError::MissingId {
            input: input.to_string(),
        })?;

    let api_base_url = if host.starts_with("platform.") {
        format!("https://{host}")
    } else {
        format!("https://platform.{host}")
    };

    Ok(FolderReference {
        folder_id: folder_id.to_string(),
        api_base_url,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_takes_last_segment() {
        let reference = parse_folder_reference("https://quip.com/AbCdEf123").unwrap();
        assert_eq!(reference.folder_id, "AbCdEf123");
        assert_eq!(reference.api_base_url, "https://platform.quip.com");
    }

    #[test]
    fn test_parse_link_drops_fragment_and_trailing_slash() {
        let reference =
            parse_folder_reference("https://acme.quip.com/XyZ987/#section-2").unwrap();
        assert_eq!(reference.folder_id, "XyZ987");
        assert_eq!(reference.api_base_url, "https://platform.acme.quip.com");
    }

    #[test]
    fn test_parse_link_with_platform_host_kept() {
        let reference = parse_folder_reference("https://platform.quip-amazon.com/F1").unwrap();
        assert_eq!(reference.api_base_url, "https://platform.quip-amazon.com");
    }

    #[test]
    fn test_parse_bare_id_uses_default_base() {
        let reference = parse_folder_reference("  AbCdEf123 ").unwrap();
        assert_eq!(reference.folder_id, "AbCdEf123");
        assert_eq!(reference.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_parse_bare_id_with_fragment() {
        let reference = parse_folder_reference("AbCdEf123#top").unwrap();
        assert_eq!(reference.folder_id, "AbCdEf123");
    }

    #[test]
    fn test_parse_empty_rejected() {
        assert_eq!(parse_folder_reference("   "), Err(LinkError::Empty));
    }

    #[test]
    fn test_parse_link_without_path_rejected() {
        let err = parse_folder_reference("https://quip.com/").unwrap_err();
        assert!(matches!(err, LinkError::MissingId { .. }));
    }

    #[test]
    fn test_parse_garbage_url_rejected() {
        let err = parse_folder_reference("https://").unwrap_err();
        assert!(matches!(err, LinkError::InvalidUrl { .. }));
    }
}
