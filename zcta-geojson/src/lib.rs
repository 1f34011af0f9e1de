//! # zcta-geojson
//!
//! Conversion des Zip Code Tabulation Areas (TIGER/Line 2020) en GeoJSON simplifié.
//!
//! ## Étapes
//!
//! - Téléchargement de l'archive (HTTP ou fichier local)
//! - Extraction dans `data/`
//! - Lecture du shapefile, renommage `ZCTA5CE20` → `zip` (numérique)
//! - Simplification Douglas-Peucker (tolérance 0.001)
//! - Écriture atomique de `data/zip_codes.geojson`
//!
//! ## Usage CLI
//!
//! ```bash
//! zcta-geojson
//! ZCTA_DATA_DIR=/tmp/zcta zcta-geojson -v --report report.json
//! ```

pub mod codec;
pub mod config;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod report;

pub use codec::{GeometryCodec, TigerCodec};
pub use config::Config;
pub use fetch::{fetcher_for, FetchError, Fetcher, FileFetcher, HttpFetcher};
pub use pipeline::{transform, Pipeline, SimplifyStats, ZIP_COLUMN};
pub use report::ConversionReport;
