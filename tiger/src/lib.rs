//! # tiger
//!
//! Lecture des shapefiles TIGER/Line du U.S. Census Bureau (ZCTA, comtés, ...).
//!
//! ## Features
//!
//! - Parsing des fichiers SHP, DBF, PRJ et CPG sans dépendance GDAL
//! - Décodage du texte avec `encoding_rs`, chemin rapide `simdutf8` pour l'UTF-8
//! - Extraction des archives zip du Census
//! - Opérations de table (renommage, conversion numérique, projection de colonnes)
//! - Simplification des géométries, types `geo` pour l'interopérabilité
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! let mut table = tiger::read(Path::new("data/tl_2020_us_zcta520.shp"))?;
//! table.rename_column("ZCTA5CE20", "zip")?;
//! table.to_numeric("zip")?;
//! table.select(&["zip", "geometry"])?;
//! table.map_geometries(|g| tiger::simplify(g, 0.001));
//! ```

pub mod archive;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod parser;
pub mod simplify;
pub mod table;
pub mod types;

pub use error::TigerError;
pub use simplify::simplify;
pub use table::{FeatureTable, GEOMETRY_COLUMN};
pub use types::{Feature, Field, FieldType, Projection, Value};

use std::path::Path;

use tracing::debug;

/// Lit un shapefile et ses fichiers compagnons (`.dbf`, `.prj`, `.cpg`).
///
/// # Arguments
///
/// * `shp_path` - Chemin vers le `.shp`; les autres fichiers sont cherchés à côté
///
/// # Returns
///
/// Une `FeatureTable` avec une ligne par enregistrement non supprimé, les
/// colonnes du DBF dans leur ordre d'origine et la projection du `.prj`.
///
/// # Errors
///
/// `TigerError::MissingFile` si le `.shp` ou le `.dbf` est absent,
/// `TigerError::ParseError` si un fichier est corrompu ou si les nombres
/// d'enregistrements ne correspondent pas.
pub fn read(shp_path: &Path) -> Result<FeatureTable, TigerError> {
    let shp = read_required(shp_path)?;
    let dbf = read_required(&shp_path.with_extension("dbf"))?;

    let encoding = read_optional(&shp_path.with_extension("cpg"))?
        .map(|data| parser::cpg::parse(&data))
        .unwrap_or_else(parser::cpg::default_encoding);
    let projection = read_optional(&shp_path.with_extension("prj"))?
        .and_then(|data| parser::prj::parse(&data));

    let geometries = parser::shp::parse(&shp)?;
    let dbf = parser::dbf::parse(&dbf, encoding)?;

    if geometries.len() != dbf.records.len() {
        return Err(TigerError::parse_error(
            "DBF",
            format!(
                "{} shapes but {} attribute records",
                geometries.len(),
                dbf.records.len()
            ),
        ));
    }

    debug!(
        path = %shp_path.display(),
        records = geometries.len(),
        fields = dbf.fields.len(),
        encoding = encoding.name(),
        epsg = ?projection.map(|p| p.epsg),
        "Shapefile read"
    );

    let columns = dbf.fields.into_iter().map(|f| f.name).collect();
    let features = geometries
        .into_iter()
        .zip(dbf.records)
        .filter_map(|(geometry, record)| {
            record.map(|attributes| Feature {
                geometry,
                attributes,
            })
        })
        .collect();

    FeatureTable::new(columns, features, projection)
}

fn read_required(path: &Path) -> Result<Vec<u8>, TigerError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TigerError::MissingFile(path.display().to_string()),
        _ => TigerError::Io(e),
    })
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, TigerError> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TigerError::Io(e)),
    }
}
