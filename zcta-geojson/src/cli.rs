//! Commande de conversion

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use zcta_geojson::{Config, Pipeline};

/// Télécharge, convertit et affiche le résumé
pub async fn cmd_convert(config: Config, report_path: Option<&Path>) -> Result<()> {
    info!(
        url = %config.url,
        data_dir = %config.data_dir.display(),
        tolerance = config.tolerance,
        "Starting conversion"
    );
    debug!("Config: {}", serde_json::to_string(&config)?);

    let pipeline = Pipeline::from_config(config)?;
    let report = pipeline.run().await?;

    report.display();

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(())
}
