//! End-of-run summary report.

use std::path::Path;

use quip_export_core::{ExportSummary, FailureKind};

/// Builds the report lines; failures are always listed, counts only when not quiet.
pub(crate) fn summary_lines(summary: &ExportSummary, output_dir: &Path, quiet: bool) -> Vec<String> {
    let mut lines = Vec::new();

    if !quiet {
        lines.push(format!("Export finished: {}", output_dir.display()));
        lines.push(format!("  Folders:     {}", summary.folders_created()));
        lines.push(format!(
            "  Documents:   {} exported ({} via fallback), {} failed",
            summary.documents_exported(),
            summary.fallback_exports(),
            summary.documents_failed()
        ));
        lines.push(format!("  Attachments: {} saved", summary.attachments_saved()));
    }

    if summary.is_clean() {
        return lines;
    }

    lines.push(format!(
        "Failures ({}: {} folders, {} documents, {} attachments):",
        summary.failures().len(),
        summary.count_failures(FailureKind::Folder),
        summary.count_failures(FailureKind::Document),
        summary.count_failures(FailureKind::Attachment)
    ));
    for failure in summary.failures() {
        let title = failure
            .title
            .as_deref()
            .map(|title| format!(" \"{title}\""))
            .unwrap_or_default();
        lines.push(format!(
            "  [{}] {}{title}: {}",
            failure.kind, failure.remote_id, failure.reason
        ));
    }
    lines
}

/// Prints the report to stdout.
pub(crate) fn print_summary(summary: &ExportSummary, output_dir: &Path, quiet: bool) {
    for line in summary_lines(summary, output_dir, quiet) {
        println!("{line}");
    }
}
