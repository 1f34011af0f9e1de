//! Configuration du pipeline

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Archive ZCTA 2020 du Census
pub const DEFAULT_URL: &str =
    "https://www2.census.gov/geo/tiger/TIGER2020/ZCTA520/tl_2020_us_zcta520.zip";

/// Répertoire de travail (extraction et sortie)
pub const DEFAULT_DATA_DIR: &str = "data";

/// Shapefile attendu après extraction
pub const DEFAULT_SHAPEFILE: &str = "tl_2020_us_zcta520.shp";

/// Colonne du code ZCTA dans le DBF
pub const DEFAULT_SOURCE_COLUMN: &str = "ZCTA5CE20";

/// Fichier GeoJSON produit
pub const DEFAULT_OUTPUT_FILE: &str = "zip_codes.geojson";

/// Tolérance de simplification, en degrés décimaux
pub const TOLERANCE: f64 = 0.001;

/// Configuration principale
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// URL de l'archive (http(s), `file://` ou chemin local)
    pub url: String,

    /// Répertoire d'extraction et de sortie
    pub data_dir: PathBuf,

    /// Nom du `.shp` dans l'archive
    pub shapefile: String,

    /// Colonne renommée en `zip`
    pub source_column: String,

    /// Nom du fichier GeoJSON dans `data_dir`
    pub output_file: String,

    /// Tolérance de simplification (non configurable par l'utilisateur)
    pub tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            shapefile: DEFAULT_SHAPEFILE.to_string(),
            source_column: DEFAULT_SOURCE_COLUMN.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            tolerance: TOLERANCE,
        }
    }
}

impl Config {
    /// Charge la configuration depuis les variables d'environnement
    ///
    /// `ZCTA_URL` et `ZCTA_DATA_DIR` remplacent l'URL et le répertoire; le
    /// reste garde les valeurs par défaut.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            url: lookup("ZCTA_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.url),
            data_dir: lookup("ZCTA_DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn shapefile_path(&self) -> PathBuf {
        self.data_dir.join(&self.shapefile)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_file)
    }
}

/// Charge `.env` (ZCTA_URL, ZCTA_DATA_DIR, RUST_LOG) et retourne le fichier lu
///
/// `dotenvy::dotenv` remonte depuis le répertoire courant jusqu'à la racine;
/// à défaut, on essaie le `.env` placé à côté du binaire. Les variables déjà
/// définies dans l'environnement ne sont pas écrasées.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }
    let exe_dir = std::env::current_exe().ok()?.parent()?.to_path_buf();
    load_dotenv_from(&[exe_dir])
}

/// Charge le premier `.env` trouvé dans `dirs`
pub fn load_dotenv_from(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(".env"))
        .find(|path| dotenvy::from_path(path).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_matches_census_layout() {
        let config = Config::default();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.shapefile_path(), Path::new("data/tl_2020_us_zcta520.shp"));
        assert_eq!(config.output_path(), Path::new("data/zip_codes.geojson"));
        assert_eq!(config.source_column, "ZCTA5CE20");
        assert_eq!(config.tolerance, 0.001);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ZCTA_URL", "file:///tmp/zcta.zip"),
            ("ZCTA_DATA_DIR", "/tmp/zcta"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.url, "file:///tmp/zcta.zip");
        assert_eq!(config.output_path(), Path::new("/tmp/zcta/zip_codes.geojson"));
        assert_eq!(config.tolerance, TOLERANCE);
    }

    #[test]
    fn test_empty_env_keeps_defaults() {
        let config = Config::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.data_dir, Path::new(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_url("http://localhost/zcta.zip")
            .with_data_dir("/srv/zcta");
        assert_eq!(config.url, "http://localhost/zcta.zip");
        assert_eq!(config.shapefile_path(), Path::new("/srv/zcta/tl_2020_us_zcta520.shp"));
    }

    #[test]
    fn test_load_dotenv_from_first_existing_dir() {
        let missing = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "ZCTA_DOTENV_TEST_LOADED=yes\nZCTA_DOTENV_TEST_KEPT=from-file\n",
        )
        .unwrap();
        std::env::set_var("ZCTA_DOTENV_TEST_KEPT", "from-env");

        let loaded = load_dotenv_from(&[missing.path().to_path_buf(), dir.path().to_path_buf()]);

        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(std::env::var("ZCTA_DOTENV_TEST_LOADED").unwrap(), "yes");
        assert_eq!(std::env::var("ZCTA_DOTENV_TEST_KEPT").unwrap(), "from-env");
    }

    #[test]
    fn test_load_dotenv_from_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_dotenv_from(&[dir.path().to_path_buf()]), None);
    }
}
