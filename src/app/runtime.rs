use std::time::Duration;

use anyhow::{Context, Result};
use quip_export_core::{
    ClientConfig, ExportConfig, ExportError, ExportSummary, Exporter, QuipClient, RetryPolicy,
};
use tracing::{debug, info};

use crate::app::{credentials, report, terminal};
use crate::cli::Args;

pub(crate) async fn run_export(args: Args) -> Result<ExportSummary> {
    terminal::init_tracing(
        terminal::resolve_default_log_level(args.quiet, args.verbose),
        terminal::no_color_env_requested(),
    );
    debug!(
        output = %args.output.display(),
        formats = ?args.formats,
        max_depth = args.max_depth,
        rate_limit_ms = args.rate_limit,
        "CLI arguments parsed"
    );

    let token = credentials::resolve_token(
        args.token.as_deref(),
        args.token_file.as_deref(),
        credentials::prompt_line,
    )?;
    let folder = credentials::resolve_folder(
        args.folder.as_deref(),
        args.api_url.as_deref(),
        credentials::prompt_line,
    )?;
    info!(folder_id = %folder.folder_id, api = %folder.api_base_url, "Quip export starting");

    let client_config = ClientConfig::new(folder.api_base_url.clone(), token)
        .with_timeouts(
            Duration::from_secs(args.connect_timeout),
            Duration::from_secs(args.read_timeout),
        )
        .with_retry_policy(RetryPolicy::with_max_attempts(u32::from(args.max_retries)));
    let client = QuipClient::new(client_config)
        .with_context(|| format!("cannot create API client for {}", folder.api_base_url))?;

    if args.rate_limit == 0 {
        debug!("request delay disabled");
    }
    let export_config = ExportConfig {
        formats: args.formats.clone(),
        max_depth: args.max_depth,
        request_delay: Duration::from_millis(args.rate_limit),
    };

    let summary = Exporter::new(&client, export_config)
        .export(&folder.folder_id, &args.output)
        .await
        .map_err(|error| {
            let hint = setup_hint(&error)
                .map(|hint| format!(" ({hint})"))
                .unwrap_or_default();
            anyhow::Error::new(error)
                .context(format!("export of folder {} failed{hint}", folder.folder_id))
        })?;

    info!(
        folders = summary.folders_created(),
        documents = summary.documents_exported(),
        attachments = summary.attachments_saved(),
        failures = summary.failures().len(),
        "Quip export complete"
    );
    report::print_summary(&summary, &args.output, args.quiet);

    Ok(summary)
}

/// Extra guidance for setup errors the user can fix directly.
fn setup_hint(error: &ExportError) -> Option<&'static str> {
    match error {
        ExportError::RootFolder { source, .. } if source.is_auth() => {
            Some("generate a new access token at https://quip.com/dev/token")
        }
        _ => None,
    }
}
