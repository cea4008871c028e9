//! Mapping of remote titles onto safe, unique local path segments.
//!
//! [`sanitize_component`] is the character-level cleanup; [`SiblingNames`]
//! holds the names already handed out in one directory and resolves
//! collisions by appending `_1`, `_2`, ... to the stem. Sibling names are
//! compared case-insensitively so an export made on Linux still unpacks
//! cleanly on macOS or Windows.

use std::collections::HashSet;

/// Longest segment we emit, leaving room for `_attachments` and `_N.docx`.
pub const MAX_COMPONENT_BYTES: usize = 180;

/// Suffix of the directory holding a document's attachments.
pub const ATTACHMENTS_SUFFIX: &str = "_attachments";

/// Longer "extensions" are treated as part of the stem.
const MAX_EXTENSION_BYTES: usize = 32;

const PLACEHOLDER_PREFIX: &str = "untitled";

const RESERVED_WINDOWS_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Cleans a title for use as a single path segment.
///
/// Replaces `/ \ : * ? " < > |` and control characters with `_`, trims
/// surrounding whitespace and trailing dots, marks Windows device names with
/// `_` after the stem, and truncates to [`MAX_COMPONENT_BYTES`]. May return
/// an empty string; callers substitute a placeholder.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    let cleaned = clean_characters(name);
    let truncated = truncate_on_char_boundary(&cleaned, MAX_COMPONENT_BYTES);
    mark_reserved_windows_name(truncated.trim_end_matches(['.', ' ']))
}

fn clean_characters(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced
        .trim()
        .trim_end_matches(['.', ' '])
        .trim_start()
        .to_string()
}

/// `nul.txt` becomes `nul_.txt`; anything after the stem is kept as is.
fn mark_reserved_windows_name(name: &str) -> String {
    if !is_reserved_windows_name(name) {
        return name.to_string();
    }
    let stem_len = name.split('.').next().unwrap_or(name).trim_end().len();
    format!("{}_{}", &name[..stem_len], &name[stem_len..])
}

/// Placeholder segment for an entity whose title sanitizes to nothing.
#[must_use]
pub fn placeholder_name(id: &str) -> String {
    let id = sanitize_component(id);
    if id.is_empty() {
        PLACEHOLDER_PREFIX.to_string()
    } else {
        format!("{PLACEHOLDER_PREFIX}_{id}")
    }
}

fn sanitize_or_placeholder(name: &str, id: &str) -> String {
    let sanitized = sanitize_component(name);
    if sanitized.is_empty() {
        placeholder_name(id)
    } else {
        sanitized
    }
}

fn truncate_on_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

fn is_reserved_windows_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED_WINDOWS_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Splits `chart.png` into (`chart`, `.png`); dotfiles and extensionless names keep an empty extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

/// Names already used inside one local directory.
///
/// Each directory being populated owns one registry; it is never shared
/// between sibling subtrees.
#[derive(Debug, Clone, Default)]
pub struct SiblingNames {
    taken: HashSet<String>,
}

impl SiblingNames {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `name` (case-insensitively) is already used.
    #[must_use]
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&fold(name))
    }

    /// Resolves a unique directory-style name without reserving it.
    #[must_use]
    pub fn resolve(&self, title: &str, id: &str) -> String {
        let base = sanitize_or_placeholder(title, id);
        self.first_free(&base, "", |candidate| vec![candidate.to_string()])
    }

    /// Reserves a name for a sub-folder.
    pub fn claim_folder(&mut self, title: &str, id: &str) -> String {
        let name = self.resolve(title, id);
        self.reserve([name.clone()]);
        name
    }

    /// Reserves a base name for a document.
    ///
    /// The base, its `<base>_attachments` directory and `<base>.<ext>` for
    /// every extension in `extensions` are reserved together, so none of a
    /// document's outputs can land on a sibling's path.
    pub fn claim_document(&mut self, title: &str, id: &str, extensions: &[&str]) -> String {
        let base = sanitize_or_placeholder(title, id);
        let derived = |candidate: &str| document_outputs(candidate, extensions);
        let name = self.first_free(&base, "", derived);
        self.reserve(document_outputs(&name, extensions));
        name
    }

    /// Reserves a file name, inserting any disambiguator before the extension.
    ///
    /// The extension survives truncation: only the stem is shortened to fit
    /// [`MAX_COMPONENT_BYTES`].
    pub fn claim_file(&mut self, name: &str, id: &str) -> String {
        let cleaned = clean_characters(name);
        let (stem, ext) = match split_extension(&cleaned) {
            (stem, ext) if ext.len() <= MAX_EXTENSION_BYTES => (stem, ext),
            _ => (cleaned.as_str(), ""),
        };
        let stem = truncate_on_char_boundary(stem, MAX_COMPONENT_BYTES - ext.len());
        let stem = if ext.is_empty() {
            stem.trim_end_matches(['.', ' '])
        } else {
            stem
        };
        let mut stem = mark_reserved_windows_name(stem);
        if stem.is_empty() {
            stem = placeholder_name(id);
        }
        let name = self.first_free(&stem, ext, |candidate| vec![candidate.to_string()]);
        self.reserve([name.clone()]);
        name
    }

    fn first_free<F>(&self, stem: &str, ext: &str, outputs: F) -> String
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut suffix = 0usize;
        loop {
            let candidate = if suffix == 0 {
                format!("{stem}{ext}")
            } else {
                format!("{stem}_{suffix}{ext}")
            };
            if outputs(&candidate).iter().all(|name| !self.is_taken(name)) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn reserve<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.taken.extend(names.into_iter().map(|name| fold(&name)));
    }
}

fn document_outputs(base: &str, extensions: &[&str]) -> Vec<String> {
    let mut outputs = Vec::with_capacity(extensions.len() + 2);
    outputs.push(base.to_string());
    outputs.push(format!("{base}{ATTACHMENTS_SUFFIX}"));
    outputs.extend(extensions.iter().map(|ext| format!("{base}.{ext}")));
    outputs
}
