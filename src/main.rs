extern crate log;
pub mod buildings;
pub mod config;
pub mod geofile;
pub mod pipeline;
pub mod preview;
pub mod table;
use crate::config::Config;
use crate::pipeline::process_geojson;
use clap::Parser;
use std::path::PathBuf;

/// Extract building footprint points and heights from a GeoJSON file into a CSV table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: PathBuf,

    /// Do not render the preview image, even if the config file asks for one.
    #[arg(long)]
    no_preview: bool,
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let config = Config::load(&args.config_filepath)?;
    log::debug!("{:?}", config);

    let summary = process_geojson(&config, !args.no_preview)?;
    log::info!("{}", summary);
    if let Some((preview_path, kind)) = &summary.preview {
        log::info!(
            "Visualization saved to {} ({:?})",
            preview_path.display(),
            kind
        );
    }
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
