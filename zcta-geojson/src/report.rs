//! Rapport de conversion
//!
//! Collecte les compteurs du pipeline et affiche le résumé final.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Rapport complet d'une conversion
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    /// Fichier GeoJSON produit
    pub output_path: PathBuf,
    /// Taille du fichier produit
    pub output_bytes: u64,
    /// Nombre de features écrites
    pub features: usize,
    /// Sommets avant simplification
    pub vertices_before: usize,
    /// Sommets après simplification
    pub vertices_after: usize,
    /// Taille de l'archive téléchargée
    pub archive_bytes: usize,
    /// Empreinte BLAKE3 de l'archive (hex)
    pub archive_blake3: String,
    /// Nombre de fichiers extraits
    pub extracted_files: usize,
    /// Durée totale
    pub duration_secs: f64,
}

impl ConversionReport {
    pub fn new(output_path: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            ..Default::default()
        }
    }

    /// Définit la durée de la conversion
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Taille de la sortie en Mo (1024 × 1024 bytes)
    pub fn size_mb(&self) -> f64 {
        self.output_bytes as f64 / BYTES_PER_MB
    }

    /// Part des sommets supprimés par la simplification, en %
    pub fn vertex_reduction(&self) -> f64 {
        if self.vertices_before == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.vertices_after as f64 / self.vertices_before as f64)
    }

    /// Les deux lignes du résumé opérateur
    pub fn summary_lines(&self) -> [String; 2] {
        [
            format!(
                "Processing complete. GeoJSON file saved to {}",
                self.output_path.display()
            ),
            format!("File size: {:.1} MB", self.size_mb()),
        ]
    }

    /// Affiche le résumé sur la console
    pub fn display(&self) {
        for line in self.summary_lines() {
            println!("{}", line);
        }
    }

    /// Affichage compact pour les logs
    pub fn summary(&self) -> String {
        format!(
            "{} features, {} -> {} vertices ({:.1}% removed), {:.2}s",
            self.features,
            self.vertices_before,
            self.vertices_after,
            self.vertex_reduction(),
            self.duration_secs
        )
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
