//! Extraction des archives TIGER/Line (.zip)

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::TigerError;

/// Extrait une archive zip (en mémoire) dans `dest`
///
/// Le répertoire est créé s'il n'existe pas. Les fichiers existants sont
/// écrasés.
///
/// # Returns
///
/// Les chemins des fichiers écrits, dans l'ordre de l'archive
///
/// # Errors
///
/// `TigerError::InvalidArchive` si les bytes ne sont pas une archive zip ou si
/// une entrée sort de `dest`, `TigerError::Io` si l'écriture échoue.
pub fn extract(data: &[u8], dest: &Path) -> Result<Vec<PathBuf>, TigerError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| TigerError::InvalidArchive(e.to_string()))?;

    std::fs::create_dir_all(dest)?;

    let mut extracted = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        // Refuser les chemins absolus et les `..`
        let relative = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                TigerError::InvalidArchive(format!("unsafe entry name: {}", entry.name()))
            })?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&out_path)?;
        let mut writer = BufWriter::new(file);
        let written = std::io::copy(&mut entry, &mut writer)?;
        writer.flush()?;

        debug!(path = %out_path.display(), bytes = written, "Extracted");
        extracted.push(out_path);
    }

    Ok(extracted)
}
