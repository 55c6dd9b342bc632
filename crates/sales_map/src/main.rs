use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

use sales_map::{Config, pipeline};

#[derive(Parser)]
#[command(author, version, about = "Render regional sales as a choropleth map with pie chart markers", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", default_value = "config/default.toml")]
    config: PathBuf,

    /// Sales CSV file (overrides input.data_path)
    #[arg(short = 'd', long = "data")]
    data: Option<PathBuf>,

    /// TopoJSON boundary file (overrides input.geo_path)
    #[arg(short = 'g', long = "geo")]
    geo: Option<PathBuf>,

    /// TopoJSON object holding the regions (overrides input.topojson_object)
    #[arg(long = "object")]
    object: Option<String>,

    /// Output HTML file (overrides output.path)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn main() {
    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let args = Args::parse();

    if let Err(e) = try_main(args) {
        error!("Error: {e:#}");

        // Provide helpful hints for common errors
        use std::io::ErrorKind;
        for cause in e.chain() {
            if let Some(ioe) = cause.downcast_ref::<std::io::Error>() {
                match ioe.kind() {
                    ErrorKind::NotFound => {
                        error!("Hint: Check the input paths or pass --data / --geo.");
                        break;
                    }
                    ErrorKind::PermissionDenied => {
                        error!("Hint: Choose a writable output path with --output.");
                        break;
                    }
                    _ => {}
                }
            }
        }
        std::process::exit(1);
    }
}

fn try_main(args: Args) -> Result<()> {
    // Load configuration
    let mut config = if args.config.exists() {
        Config::load_from_file(&args.config)?
    } else {
        warn!(
            "Config file not found: {}, using default settings",
            args.config.display()
        );
        Config::default()
    };

    // Command line overrides
    if let Some(data) = args.data {
        config.input.data_path = data;
    }
    if let Some(geo) = args.geo {
        config.input.geo_path = geo;
    }
    if let Some(object) = args.object {
        config.input.topojson_object = object;
    }
    if let Some(output) = args.output {
        config.output.path = output;
    }
    config.validate()?;

    let report = pipeline::run(&config)?;

    info!("Regions: {}", report.regions);
    info!("Products: {}", report.products.join(", "));
    info!("Markers placed: {}", report.markers);
    if !report.skipped_markers.is_empty() {
        warn!(
            "Regions without boundary: {}",
            report.skipped_markers.join(", ")
        );
    }
    info!("Map saved to: {}", report.output.display());
    Ok(())
}
