//! Types d'erreurs pour le crate tiger

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture et de la transformation TIGER/Line
#[derive(Debug, Error)]
pub enum TigerError {
    /// Erreur d'I/O lors de la lecture ou de l'écriture
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive zip corrompue ou format invalide
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// Fichier manquant à côté du `.shp`
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Erreur de parsing d'un fichier
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// Type de shape non géré
    #[error("Unsupported shape type: {0}")]
    UnsupportedShapeType(i32),

    /// Colonne absente de la table
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// Colonne déjà présente (renommage)
    #[error("Column already exists: {0}")]
    DuplicateColumn(String),

    /// Valeur non convertible en nombre
    #[error("Unable to parse {value:?} as a number (column {column}, row {row})")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
}

impl TigerError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

impl From<zip::result::ZipError> for TigerError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}
