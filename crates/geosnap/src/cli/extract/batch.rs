//! Batch driving: progress bar, Ctrl-C cancellation, and the summary table.

use std::fmt::Write as _;
use std::time::Duration;

use geosnap_core::pipeline::cancellation_token;
use geosnap_core::{Extraction, ExtractionReport, Extractor, ImageSource};

/// Run the orchestrator with a progress bar and Ctrl-C handling.
///
/// The first Ctrl-C stops new items from starting; the returned extraction
/// holds only the items that finished before it.
pub async fn run_extraction(
    extractor: &Extractor,
    batch: Vec<ImageSource>,
    show_progress: bool,
) -> Extraction {
    let progress = if show_progress {
        create_progress_bar(batch.len() as u64)
    } else {
        indicatif::ProgressBar::hidden()
    };

    let token = cancellation_token();
    let signal_token = token.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight images...");
            signal_token.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    let bar = progress.clone();
    let extraction = extractor
        .extract_with(batch, Some(token), move |p| {
            bar.set_position(p.processed as u64);
        })
        .await;

    signal_task.abort();
    progress.finish_and_clear();
    extraction
}

/// Create a progress bar for batch extraction.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb
}

/// Print the summary table to stderr.
pub fn print_summary(report: &ExtractionReport, elapsed: Duration) {
    eprint!("{}", format_summary(report, elapsed));
}

/// Render counts plus one line per skipped file.
fn format_summary(report: &ExtractionReport, elapsed: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "               Summary");
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "    Geotagged:    {:>8}", report.succeeded);
    let _ = writeln!(out, "    Skipped:      {:>8}", report.skipped);
    let _ = writeln!(out, "  ------------------------------------");
    let _ = writeln!(out, "    Processed:    {:>8}", report.processed);
    if report.cancelled {
        let _ = writeln!(
            out,
            "    Cancelled:    {:>8}",
            report.total - report.processed
        );
    }
    let _ = writeln!(out, "    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    let _ = writeln!(out, "  ====================================");

    let mut skipped = report.skipped_items().peekable();
    if skipped.peek().is_some() {
        let _ = writeln!(out, "    Skipped files:");
        for (name, reason) in skipped {
            let _ = writeln!(out, "      {name}: {reason}");
        }
    }
    out
}
