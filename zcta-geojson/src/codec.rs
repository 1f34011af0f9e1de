//! Lecture, simplification et écriture des géométries
//!
//! Le pipeline ne dépend que de `GeometryCodec`: les tests peuvent le remplacer
//! pour vérifier l'enchaînement des étapes sans toucher aux formats.

use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;

use tiger::FeatureTable;

pub trait GeometryCodec: Send + Sync {
    /// Charge le shapefile complet en mémoire
    fn read(&self, path: &Path) -> Result<FeatureTable>;

    /// Simplifie une géométrie avec la tolérance donnée
    fn simplify(&self, geometry: &Geometry, tolerance: f64) -> Geometry;

    /// Écrit la table en GeoJSON et retourne la taille du fichier
    fn write(&self, table: &FeatureTable, path: &Path) -> Result<u64>;
}

/// Implémentation par défaut: reader tiger, RDP de geo, writer geozero
#[derive(Debug, Default, Clone, Copy)]
pub struct TigerCodec;

impl GeometryCodec for TigerCodec {
    fn read(&self, path: &Path) -> Result<FeatureTable> {
        tiger::read(path).with_context(|| format!("Failed to read shapefile {}", path.display()))
    }

    fn simplify(&self, geometry: &Geometry, tolerance: f64) -> Geometry {
        tiger::simplify(geometry, tolerance)
    }

    fn write(&self, table: &FeatureTable, path: &Path) -> Result<u64> {
        crate::export::export_to_geojson(table, path)
    }
}
