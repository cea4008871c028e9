//! Access token and folder reference resolution.
//!
//! Precedence for the token: `--token-file`, then `--token`, then an
//! interactive prompt when stdin is a terminal.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use quip_export_core::{FolderReference, parse_folder_reference};

const TOKEN_PROMPT: &str = "Enter your Quip access token (from https://quip.com/dev/token): ";
const FOLDER_PROMPT: &str = "Enter the Quip folder link to export: ";

/// Reads one line from stdin after printing `message` to stderr.
///
/// Returns `None` when stdin is not a terminal, so piped/CI runs fail fast
/// instead of blocking.
pub(crate) fn prompt_line(message: &str) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut stderr = io::stderr();
    write!(stderr, "{message}")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(Some(line.trim().to_string()))
}

pub(crate) fn resolve_token<P>(
    token: Option<&str>,
    token_file: Option<&Path>,
    prompt: P,
) -> Result<String>
where
    P: FnOnce(&str) -> Result<Option<String>>,
{
    let token = if let Some(path) = token_file {
        fs::read_to_string(path)
            .with_context(|| format!("cannot read token file {}", path.display()))?
            .trim()
            .to_string()
    } else if let Some(token) = token {
        token.trim().to_string()
    } else if let Some(entered) = prompt(TOKEN_PROMPT)? {
        entered
    } else {
        bail!(
            "No access token provided.\n  \
             Pass --token TOKEN or --token-file PATH (generate one at https://quip.com/dev/token)."
        );
    };

    if token.is_empty() {
        bail!("Access token is empty.");
    }
    Ok(token)
}

pub(crate) fn resolve_folder<P>(
    folder: Option<&str>,
    api_url: Option<&str>,
    prompt: P,
) -> Result<FolderReference>
where
    P: FnOnce(&str) -> Result<Option<String>>,
{
    let input = match folder {
        Some(folder) => folder.to_string(),
        None => match prompt(FOLDER_PROMPT)? {
            Some(entered) => entered,
            None => bail!("No folder provided.\n  Pass --folder LINK_OR_ID."),
        },
    };

    let mut reference = parse_folder_reference(&input)
        .with_context(|| format!("cannot extract a folder id from '{input}'"))?;
    if let Some(api_url) = api_url.map(str::trim).filter(|url| !url.is_empty()) {
        reference.api_base_url = api_url.trim_end_matches('/').to_string();
    }
    Ok(reference)
}
