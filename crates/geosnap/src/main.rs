//! GeoSnap CLI - GPS coordinates from geotagged photos, exported for GIS.
//!
//! GeoSnap reads the EXIF GPS block of drone and camera photos and writes the
//! positions as CSV, KML, or an ESRI shapefile set.
//!
//! # Usage
//!
//! ```bash
//! # Preview coordinates of a folder as JSON
//! geosnap extract ./flight-01/
//!
//! # Export all formats into a directory
//! geosnap extract ./flight-01/ --output ./gis
//!
//! # Only KML, with a per-file report
//! geosnap extract a.jpg b.jpg -f kml -o ./gis --report report.json
//!
//! # View configuration
//! geosnap config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// GeoSnap - extract GPS coordinates from photos and export CSV, KML, Shapefile.
#[derive(Parser, Debug)]
#[command(name = "geosnap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract GPS coordinates and export or preview them
    Extract(cli::extract::ExtractArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match geosnap_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `geosnap config path`."
            );
            geosnap_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("GeoSnap v{}", geosnap_core::VERSION);

    match cli.command {
        Commands::Extract(args) => cli::extract::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract_args() {
        let cli = Cli::parse_from([
            "geosnap", "extract", "a.jpg", "dir", "-f", "csv", "-f", "shapefile", "-o", "out",
            "--parallel", "2", "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(
                    args.formats,
                    vec![
                        cli::extract::ExportFormatArg::Csv,
                        cli::extract::ExportFormatArg::Shp
                    ]
                );
                assert_eq!(args.parallel, Some(2));
                assert_eq!(args.output, Some(std::path::PathBuf::from("out")));
            }
            other => panic!("Expected extract, got {other:?}"),
        }
    }
}
