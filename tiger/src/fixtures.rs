//! Écriture de shapefiles TIGER/Line minimaux pour les tests
//!
//! Produit les fichiers `.shp`, `.shx`, `.dbf`, `.prj` et `.cpg` d'une couche
//! de polygones avec les colonnes `<code>`, `GEOID20` et `ALAND20`, et les
//! empaquette en zip comme l'archive du Census.

use std::f64::consts::TAU;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use geo::orient::{Direction, Orient};
use geo::{Area, BoundingRect, Coord, LineString, Polygon, Rect};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::parser::shp::{shape_type, FILE_CODE, HEADER_LEN, VERSION};

/// WKT du `.prj` des fichiers TIGER/Line
pub const NAD83_PRJ: &str = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295]]"#;

/// Couche de polygones à écrire
#[derive(Debug, Clone)]
pub struct ShapefileFixture {
    code_column: String,
    records: Vec<(String, Polygon)>,
    with_prj: bool,
}

impl ShapefileFixture {
    /// `code_column` est le nom de la colonne du code ZCTA (`ZCTA5CE20`)
    pub fn new(code_column: &str) -> Self {
        Self {
            code_column: code_column.to_string(),
            records: Vec::new(),
            with_prj: true,
        }
    }

    pub fn polygon(mut self, code: &str, polygon: Polygon) -> Self {
        self.records.push((code.to_string(), polygon));
        self
    }

    pub fn without_prj(mut self) -> Self {
        self.with_prj = false;
        self
    }

    /// Fichiers du shapefile `(nom, contenu)` pour une base de nom donnée
    pub fn files(&self, stem: &str) -> std::io::Result<Vec<(String, Vec<u8>)>> {
        let mut files = vec![
            (format!("{}.shp", stem), self.shp_bytes()?),
            (format!("{}.shx", stem), self.shx_bytes()?),
            (format!("{}.dbf", stem), self.dbf_bytes()?),
            (format!("{}.cpg", stem), b"UTF-8".to_vec()),
        ];
        if self.with_prj {
            files.push((format!("{}.prj", stem), NAD83_PRJ.as_bytes().to_vec()));
        }
        Ok(files)
    }

    /// Écrit le shapefile dans `dir` et retourne le chemin du `.shp`
    pub fn write(&self, dir: &Path, stem: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        for (name, content) in self.files(stem)? {
            std::fs::write(dir.join(name), content)?;
        }
        Ok(dir.join(format!("{}.shp", stem)))
    }

    /// Archive zip contenant tous les fichiers du shapefile
    pub fn to_zip(&self, stem: &str) -> zip::result::ZipResult<Vec<u8>> {
        let files = self.files(stem)?;
        let entries: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_slice()))
            .collect();
        zip_files(&entries)
    }

    /// Contenu du `.shp`
    pub fn shp_bytes(&self) -> std::io::Result<Vec<u8>> {
        let contents: Vec<Vec<u8>> = self
            .records
            .iter()
            .map(|(_, p)| polygon_content(p))
            .collect::<std::io::Result<_>>()?;

        let body_len: usize = contents.iter().map(|c| 8 + c.len()).sum();
        let mut out = Vec::with_capacity(HEADER_LEN + body_len);
        self.write_header(&mut out, HEADER_LEN + body_len)?;

        for (i, content) in contents.iter().enumerate() {
            out.write_i32::<BigEndian>(i as i32 + 1)?;
            out.write_i32::<BigEndian>((content.len() / 2) as i32)?;
            out.write_all(content)?;
        }
        Ok(out)
    }

    /// Contenu du `.shx` (index des enregistrements)
    pub fn shx_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_header(&mut out, HEADER_LEN + 8 * self.records.len())?;

        let mut offset = HEADER_LEN;
        for (_, polygon) in &self.records {
            let len = polygon_content(polygon)?.len();
            out.write_i32::<BigEndian>((offset / 2) as i32)?;
            out.write_i32::<BigEndian>((len / 2) as i32)?;
            offset += 8 + len;
        }
        Ok(out)
    }

    /// Contenu du `.dbf` (dBASE III, UTF-8)
    pub fn dbf_bytes(&self) -> std::io::Result<Vec<u8>> {
        let code_len = self
            .records
            .iter()
            .map(|(code, _)| code.len())
            .max()
            .unwrap_or(5)
            .max(5);
        let fields: [(&str, u8, usize); 3] = [
            (self.code_column.as_str(), b'C', code_len),
            ("GEOID20", b'C', code_len),
            ("ALAND20", b'N', 14),
        ];

        let header_len = 32 + 32 * fields.len() + 1;
        let record_len = 1 + fields.iter().map(|f| f.2).sum::<usize>();

        let mut out = Vec::new();
        out.write_u8(0x03)?;
        out.write_all(&[120, 1, 1])?;
        out.write_u32::<LittleEndian>(self.records.len() as u32)?;
        out.write_u16::<LittleEndian>(header_len as u16)?;
        out.write_u16::<LittleEndian>(record_len as u16)?;
        out.write_all(&[0u8; 20])?;

        for (name, kind, length) in fields {
            let mut descriptor = [0u8; 32];
            let bytes = name.as_bytes();
            let n = bytes.len().min(10);
            descriptor[..n].copy_from_slice(&bytes[..n]);
            descriptor[11] = kind;
            descriptor[16] = length as u8;
            out.write_all(&descriptor)?;
        }
        out.write_u8(0x0D)?;

        for (code, polygon) in &self.records {
            out.write_u8(b' ')?;
            write!(out, "{:<width$}", code, width = code_len)?;
            write!(out, "{:<width$}", code, width = code_len)?;
            let aland = (polygon.unsigned_area() * 1_000_000.0).round() as i64;
            write!(out, "{:>14}", aland)?;
        }
        out.write_u8(0x1A)?;

        Ok(out)
    }

    fn write_header(&self, out: &mut Vec<u8>, file_len: usize) -> std::io::Result<()> {
        out.write_i32::<BigEndian>(FILE_CODE)?;
        out.write_all(&[0u8; 20])?;
        out.write_i32::<BigEndian>((file_len / 2) as i32)?;
        out.write_i32::<LittleEndian>(VERSION)?;
        out.write_i32::<LittleEndian>(shape_type::POLYGON)?;

        let bbox = self
            .records
            .iter()
            .filter_map(|(_, p)| p.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            });
        write_bbox(out, bbox)?;
        // Plages Z et M
        out.write_all(&[0u8; 32])?;
        Ok(())
    }
}

/// Contenu d'un enregistrement Polygon, rings orientés ESRI
/// (extérieur horaire, trous anti-horaires)
fn polygon_content(polygon: &Polygon) -> std::io::Result<Vec<u8>> {
    let oriented = polygon.orient(Direction::Reversed);
    let rings: Vec<&LineString> = std::iter::once(oriented.exterior())
        .chain(oriented.interiors())
        .collect();
    let num_points: usize = rings.iter().map(|r| r.0.len()).sum();

    let mut out = Vec::new();
    out.write_i32::<LittleEndian>(shape_type::POLYGON)?;
    write_bbox(&mut out, oriented.bounding_rect())?;
    out.write_i32::<LittleEndian>(rings.len() as i32)?;
    out.write_i32::<LittleEndian>(num_points as i32)?;

    let mut start = 0;
    for ring in &rings {
        out.write_i32::<LittleEndian>(start as i32)?;
        start += ring.0.len();
    }
    for ring in &rings {
        for c in &ring.0 {
            out.write_f64::<LittleEndian>(c.x)?;
            out.write_f64::<LittleEndian>(c.y)?;
        }
    }
    Ok(out)
}

fn write_bbox(out: &mut Vec<u8>, bbox: Option<Rect>) -> std::io::Result<()> {
    let (min, max) = bbox
        .map(|r| (r.min(), r.max()))
        .unwrap_or((Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }));
    for v in [min.x, min.y, max.x, max.y] {
        out.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Construit une archive zip en mémoire
pub fn zip_files(entries: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default())?;
        writer.write_all(content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Carré `size × size` dont le coin bas-gauche est `(x, y)`
pub fn square(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::new(
        LineString::from(vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ]),
        vec![],
    )
}

/// Polygone régulier à `n` sommets approchant un cercle
pub fn circle(cx: f64, cy: f64, radius: f64, n: usize) -> Polygon {
    let coords: Vec<Coord> = (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Coord {
                x: cx + radius * angle.cos(),
                y: cy + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}
