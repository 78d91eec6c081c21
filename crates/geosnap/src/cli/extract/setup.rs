//! Extractor setup: config overrides, destination and format resolution.

use std::path::PathBuf;

use geosnap_core::{Config, ExportFormat, Extractor, FormatSelection, OutputFormat};

use super::ExtractArgs;

/// Everything the extract command needs once arguments are resolved.
pub(crate) struct ExtractContext {
    pub extractor: Extractor,
    /// Export directory; `None` means preview on stdout
    pub destination: Option<PathBuf>,
    /// Formats to export; only resolved when there is a destination
    pub selection: Option<FormatSelection>,
    pub base_name: String,
    pub preview_format: OutputFormat,
    pub pretty: bool,
}

/// Load config, apply CLI overrides, and check export preconditions.
///
/// An export request without any format is rejected here, before a single
/// image is read.
pub fn setup_extraction(args: &ExtractArgs) -> anyhow::Result<ExtractContext> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let destination = resolve_destination(args, &config);
    require_destination_for_formats(args, destination.as_deref())?;
    let selection = match &destination {
        Some(_) => Some(resolve_selection(args, &config)?),
        None => None,
    };

    let preview_format = match args.preview {
        Some(format) => format.into(),
        None => OutputFormat::parse(&config.output.format).unwrap_or(OutputFormat::Json),
    };

    if let (Some(dir), Some(selection)) = (&destination, &selection) {
        let names: Vec<&str> = selection.iter().map(ExportFormat::name).collect();
        tracing::debug!("Exporting [{}] to {:?}", names.join(", "), dir);
    }

    Ok(ExtractContext {
        extractor: Extractor::new(&config),
        destination,
        selection,
        base_name: config.export.base_name.clone(),
        preview_format,
        pretty: config.output.pretty,
    })
}

fn apply_overrides(config: &mut Config, args: &ExtractArgs) {
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if args.recursive {
        config.processing.recursive = true;
    }
    if let Some(name) = &args.name {
        config.export.base_name = name.clone();
    }
}

fn resolve_destination(args: &ExtractArgs, config: &Config) -> Option<PathBuf> {
    match &args.output {
        Some(dir) => {
            let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
            Some(PathBuf::from(expanded))
        }
        None => config.output_dir(),
    }
}

/// `-f` requires an export directory.
fn require_destination_for_formats(
    args: &ExtractArgs,
    destination: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    if !args.formats.is_empty() && destination.is_none() {
        anyhow::bail!(
            "--format needs an export directory: pass --output DIR or set export.output_dir"
        );
    }
    Ok(())
}

/// CLI formats win over the config list; either way the result is non-empty.
fn resolve_selection(args: &ExtractArgs, config: &Config) -> anyhow::Result<FormatSelection> {
    let selection = if args.formats.is_empty() {
        FormatSelection::from_names(&config.export.formats)?
    } else {
        FormatSelection::new(args.formats.iter().copied().map(ExportFormat::from))?
    };
    Ok(selection)
}
