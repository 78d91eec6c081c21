//! The `geosnap extract` command: read GPS tags, then export or preview.

mod batch;
mod setup;
pub mod types;

pub use types::{ExportFormatArg, PreviewFormat};

use clap::Args;
use geosnap_core::{CoordinateSet, ExportFormat, ExtractionReport, OutputWriter};
use std::io::BufWriter;
use std::path::PathBuf;

use batch::{print_summary, run_extraction};
use setup::{setup_extraction, ExtractContext};

/// Arguments for the `extract` command.
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Image files or directories to scan
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory to write exports into (defaults to export.output_dir;
    /// without either, coordinates are printed to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format, repeatable (defaults to export.formats)
    #[arg(short = 'f', long = "format", value_enum)]
    pub formats: Vec<ExportFormatArg>,

    /// File stem of the exported files (defaults to export.base_name)
    #[arg(long)]
    pub name: Option<String>,

    /// Number of parallel workers (defaults to processing.parallel_workers)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Write the per-file batch report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Stdout preview format (defaults to output.format)
    #[arg(long, value_enum)]
    pub preview: Option<PreviewFormat>,

    /// Do not write export files when no image had GPS data
    #[arg(long)]
    pub skip_empty: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the extract command.
pub async fn execute(args: ExtractArgs) -> anyhow::Result<()> {
    let ctx = setup_extraction(&args)?;

    let batch = ctx.extractor.discover(&args.inputs)?;
    if batch.is_empty() {
        tracing::warn!("No files found in {:?}", args.inputs);
    } else {
        tracing::info!("Found {} file(s) to scan", batch.len());
    }

    let start = std::time::Instant::now();
    let extraction = run_extraction(&ctx.extractor, batch, !args.no_progress).await;
    print_summary(&extraction.report, start.elapsed());

    if let Some(path) = &args.report {
        write_report(&extraction.report, path)?;
    }

    if extraction.report.is_empty() {
        tracing::warn!("No GPS coordinates found in the selected images");
    }

    match &ctx.destination {
        Some(dir) if extraction.report.is_empty() && args.skip_empty => {
            tracing::info!("Nothing to export, leaving {:?} untouched", dir);
            Ok(())
        }
        Some(dir) => export(&ctx, &extraction.coordinates, dir),
        None => preview(&ctx, &extraction.coordinates),
    }
}

/// Write every selected format, reporting each failure before giving up.
fn export(ctx: &ExtractContext, coords: &CoordinateSet, dir: &std::path::Path) -> anyhow::Result<()> {
    let Some(selection) = &ctx.selection else {
        anyhow::bail!(geosnap_core::ExportError::NoFormatSelected);
    };

    let mut failed: Vec<ExportFormat> = Vec::new();
    for (format, result) in
        geosnap_core::export::export_to_dir(coords, selection, &ctx.base_name, dir)
    {
        match result {
            Ok(paths) => {
                for path in paths {
                    println!("{}", path.display());
                }
            }
            Err(e) => {
                tracing::error!("{} export failed: {}", format, e);
                failed.push(format);
            }
        }
    }

    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|f| f.name()).collect();
        anyhow::bail!("Export failed for: {}", names.join(", "));
    }
    tracing::info!("{} coordinate(s) exported to {:?}", coords.len(), dir);
    Ok(())
}

/// Print the coordinate set to stdout.
fn preview(ctx: &ExtractContext, coords: &CoordinateSet) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut writer = OutputWriter::new(stdout.lock(), ctx.preview_format, ctx.pretty);
    writer.write_coordinates(coords)?;
    writer.flush()?;
    Ok(())
}

/// Write the batch report as pretty JSON.
fn write_report(report: &ExtractionReport, path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut writer = OutputWriter::new(
        BufWriter::new(file),
        geosnap_core::OutputFormat::Json,
        true,
    );
    writer.write_report(report)?;
    writer.flush()?;
    tracing::info!("Report written to {:?}", path);
    Ok(())
}
