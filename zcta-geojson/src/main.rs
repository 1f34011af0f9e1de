//! Point d'entrée CLI pour zcta-geojson

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use zcta_geojson::{config, Config};

mod cli;

/// Convertir les ZCTA TIGER/Line 2020 en GeoJSON simplifié
#[derive(Parser)]
#[command(name = "zcta-geojson")]
#[command(author, version)]
#[command(about = "Télécharge les ZCTA du Census et écrit data/zip_codes.geojson")]
#[command(long_about = "Télécharge l'archive TIGER/Line 2020 des ZCTA, l'extrait dans data/, \
simplifie les polygones (tolérance 0.001) et écrit data/zip_codes.geojson.\n\n\
Variables d'environnement: ZCTA_URL, ZCTA_DATA_DIR, RUST_LOG.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long)]
    quiet: bool,

    /// Sauvegarder le rapport de conversion en JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Avant le parsing: RUST_LOG peut venir du .env
    let env_file = config::load_dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Some(path) = env_file {
        debug!(path = %path.display(), "Loaded .env");
    }

    cli::cmd_convert(Config::from_env(), cli.report.as_deref()).await
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
