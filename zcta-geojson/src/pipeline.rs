//! Pipeline de conversion: téléchargement → extraction → transformation → écriture
//!
//! Chaque étape retourne un `Result`; la première erreur arrête le pipeline et
//! rien n'est écrit après elle.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use tiger::{FeatureTable, GEOMETRY_COLUMN};

use crate::codec::{GeometryCodec, TigerCodec};
use crate::config::Config;
use crate::fetch::{fetcher_for, Fetcher};
use crate::report::ConversionReport;

/// Nom de la colonne du code postal en sortie
pub const ZIP_COLUMN: &str = "zip";

/// Compteurs de sommets de la simplification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyStats {
    pub vertices_before: usize,
    pub vertices_after: usize,
}

pub struct Pipeline {
    config: Config,
    fetcher: Box<dyn Fetcher>,
    codec: Arc<dyn GeometryCodec>,
}

impl Pipeline {
    pub fn new(config: Config, fetcher: Box<dyn Fetcher>, codec: Arc<dyn GeometryCodec>) -> Self {
        Self {
            config,
            fetcher,
            codec,
        }
    }

    /// Pipeline de production: fetcher choisi d'après l'URL, codec tiger
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = fetcher_for(&config.url).context("Failed to build HTTP client")?;
        Ok(Self::new(config, fetcher, Arc::new(TigerCodec)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exécute toutes les étapes, dans l'ordre
    pub async fn run(&self) -> Result<ConversionReport> {
        let started_at = Instant::now();
        let output_path = self.config.output_path();
        let mut report = ConversionReport::new(&output_path);

        // 1. Téléchargement
        info!(url = %self.config.url, "Downloading ZCTA data...");
        let archive = self
            .fetcher
            .fetch(&self.config.url)
            .await
            .with_context(|| format!("Failed to download {}", self.config.url))?;
        report.archive_bytes = archive.len();
        report.archive_blake3 = hex::encode(blake3::hash(&archive).as_bytes());
        info!(bytes = report.archive_bytes, blake3 = %report.archive_blake3, "Archive received");

        // 2. Extraction
        info!(dir = %self.config.data_dir.display(), "Extracting files...");
        let data_dir = self.config.data_dir.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            tiger::archive::extract(&archive, &data_dir)
        })
        .await
        .context("Extraction task failed")?
        .with_context(|| {
            format!(
                "Failed to extract archive into {}",
                self.config.data_dir.display()
            )
        })?;
        report.extracted_files = extracted.len();

        // 3. Lecture + transformation
        let codec = Arc::clone(&self.codec);
        let config = self.config.clone();
        let (table, stats) = tokio::task::spawn_blocking(move || -> Result<_> {
            let shapefile = config.shapefile_path();
            info!(path = %shapefile.display(), "Reading shapefile...");
            let table = codec.read(&shapefile)?;
            transform(table, &config, codec.as_ref())
        })
        .await
        .context("Transform task failed")??;
        report.features = table.len();
        report.vertices_before = stats.vertices_before;
        report.vertices_after = stats.vertices_after;

        // 4. Écriture
        info!(path = %output_path.display(), "Converting to GeoJSON...");
        let codec = Arc::clone(&self.codec);
        let path = output_path.clone();
        report.output_bytes = tokio::task::spawn_blocking(move || codec.write(&table, &path))
            .await
            .context("Write task failed")?
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        report.set_duration(started_at.elapsed());
        info!("{}", report.summary());

        Ok(report)
    }
}

/// Normalise la table: `zip` numérique + géométrie simplifiée, rien d'autre
pub fn transform(
    mut table: FeatureTable,
    config: &Config,
    codec: &dyn GeometryCodec,
) -> Result<(FeatureTable, SimplifyStats)> {
    table
        .rename_column(&config.source_column, ZIP_COLUMN)
        .with_context(|| format!("Column {} not found in shapefile", config.source_column))?;
    table
        .to_numeric(ZIP_COLUMN)
        .context("ZIP codes are not numeric")?;
    table.select(&[ZIP_COLUMN, GEOMETRY_COLUMN])?;

    info!(tolerance = config.tolerance, features = table.len(), "Simplifying geometries...");
    let vertices_before = table.vertex_count();
    let tolerance = config.tolerance;
    table.map_geometries(|g| codec.simplify(g, tolerance));
    let vertices_after = table.vertex_count();

    Ok((
        table,
        SimplifyStats {
            vertices_before,
            vertices_after,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tiger::fixtures::square;
    use tiger::{Feature, TigerError, Value};

    /// Codec qui enregistre les appels et remplace chaque géométrie par un point
    #[derive(Default)]
    struct RecordingCodec {
        simplified: AtomicUsize,
        tolerances: Mutex<Vec<f64>>,
    }

    impl GeometryCodec for RecordingCodec {
        fn read(&self, _path: &Path) -> Result<FeatureTable> {
            unreachable!("transform receives the table directly")
        }

        fn simplify(&self, _geometry: &Geometry, tolerance: f64) -> Geometry {
            self.simplified.fetch_add(1, Ordering::Relaxed);
            self.tolerances.lock().unwrap().push(tolerance);
            Geometry::Point(Point::new(0.0, 0.0))
        }

        fn write(&self, _table: &FeatureTable, _path: &Path) -> Result<u64> {
            Ok(0)
        }
    }

    fn source_table(codes: &[&str]) -> FeatureTable {
        let columns = vec![
            "ZCTA5CE20".to_string(),
            "GEOID20".to_string(),
            "ALAND20".to_string(),
        ];
        let features = codes
            .iter()
            .enumerate()
            .map(|(i, code)| Feature {
                geometry: Some(Geometry::Polygon(square(i as f64, 0.0, 1.0))),
                attributes: vec![
                    Value::Text(code.to_string()),
                    Value::Text(code.to_string()),
                    Value::Integer(1),
                ],
            })
            .collect();
        FeatureTable::new(columns, features, None).unwrap()
    }

    #[test]
    fn test_transform_projects_and_simplifies() {
        let codec = RecordingCodec::default();
        let config = Config::default();

        let (table, stats) =
            transform(source_table(&["00601", "90210"]), &config, &codec).unwrap();

        assert_eq!(table.column_names(), ["zip", "geometry"]);
        assert_eq!(
            table.column("zip").unwrap(),
            [&Value::Integer(601), &Value::Integer(90210)]
        );
        assert_eq!(codec.simplified.load(Ordering::Relaxed), 2);
        assert_eq!(*codec.tolerances.lock().unwrap(), [0.001, 0.001]);
        assert_eq!(
            stats,
            SimplifyStats {
                vertices_before: 10,
                vertices_after: 2
            }
        );
    }

    #[test]
    fn test_transform_missing_column_skips_simplify() {
        let codec = RecordingCodec::default();
        let config = Config {
            source_column: "ZCTA5CE10".to_string(),
            ..Config::default()
        };

        let err = transform(source_table(&["00601"]), &config, &codec).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TigerError>(),
            Some(TigerError::MissingColumn(_))
        ));
        assert_eq!(codec.simplified.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_transform_non_numeric_zip() {
        let codec = RecordingCodec::default();

        let err = transform(source_table(&["00601", "ABCDE"]), &Config::default(), &codec)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TigerError>(),
            Some(TigerError::NotNumeric { row: 1, .. })
        ));
        assert_eq!(codec.simplified.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_transform_keeps_unique_zips() {
        let codes: Vec<String> = (600..700).map(|n| format!("{:05}", n)).collect();
        let refs: Vec<&str> = codes.iter().map(String::as_str).collect();

        let (table, _) =
            transform(source_table(&refs), &Config::default(), &TigerCodec).unwrap();

        let zips: std::collections::HashSet<i64> = table
            .column("zip")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_i64())
            .collect();
        assert_eq!(zips.len(), 100);
        assert_eq!(table.len(), 100);
    }
}
