//! Export vers GeoJSON avec geozero (streaming)
//!
//! Le fichier est écrit dans un fichier temporaire du même répertoire puis
//! renommé: une erreur laisse la sortie précédente intacte.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tempfile::NamedTempFile;

use tiger::{Feature, FeatureTable, Value};

/// Exporte une table en GeoJSON et retourne la taille du fichier écrit
pub fn export_to_geojson(table: &FeatureTable, output_path: &Path) -> Result<u64> {
    let dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .context(format!("Failed to create directory: {}", dir.display()))?;

    let tmp = NamedTempFile::new_in(dir)
        .context(format!("Failed to create temporary file in {}", dir.display()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        let name = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        write_collection(&mut writer, table, &name)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    let file: File = tmp
        .persist(output_path)
        .context(format!("Failed to write file: {}", output_path.display()))?;

    Ok(file.metadata()?.len())
}

/// Écrit la FeatureCollection complète, une feature par ligne
fn write_collection<W: Write>(writer: &mut W, table: &FeatureTable, name: &str) -> Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection","name":"#)?;
    serde_json::to_writer(&mut *writer, name)?;

    // CRS OGC (GDAL/geopandas écrivent le même membre)
    if let Some(projection) = table.projection() {
        write!(
            writer,
            r#","crs":{{"type":"name","properties":{{"name":"{}"}}}}"#,
            projection.urn()
        )?;
    }

    write!(writer, r#","features":["#)?;
    for (i, feature) in table.features().iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        writeln!(writer)?;
        write_feature(writer, table.columns(), feature)?;
    }
    writeln!(writer)?;
    writeln!(writer, "]}}")?;

    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, columns: &[String], feature: &Feature) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","properties":{{"#)?;
    for (i, (column, value)) in columns.iter().zip(&feature.attributes).enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        serde_json::to_writer(&mut *writer, column)?;
        write!(writer, ":")?;
        write_value(writer, value)?;
    }

    write!(writer, r#"}},"geometry":"#)?;
    match &feature.geometry {
        Some(geometry) => {
            let mut geom_writer = GeoJsonWriter::new(&mut *writer);
            geometry.process_geom(&mut geom_writer)?;
        }
        None => write!(writer, "null")?,
    }
    write!(writer, "}}")?;

    Ok(())
}

/// Écrit une valeur d'attribut en JSON
fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Null => write!(writer, "null")?,
        Value::Integer(n) => write!(writer, "{}", n)?,
        Value::Float(x) if x.is_finite() => serde_json::to_writer(&mut *writer, x)?,
        Value::Float(_) => write!(writer, "null")?,
        Value::Bool(b) => write!(writer, "{}", b)?,
        Value::Text(s) => serde_json::to_writer(&mut *writer, s)?,
    }
    Ok(())
}
