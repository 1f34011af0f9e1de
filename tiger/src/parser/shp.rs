//! Parser pour les fichiers SHP (géométries)
//!
//! Header de 100 bytes (big endian pour le code et la longueur, little endian
//! pour le reste), puis une suite d'enregistrements `numéro + longueur + contenu`.
//! Seuls X/Y sont conservés: les variantes Z et M sont lues comme leur
//! équivalent 2D, le reste du contenu est ignoré.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use geo::{
    Area, Contains, Coord, CoordsIter, Geometry, Intersects, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon, Winding,
};

use crate::TigerError;

/// Code de fichier attendu en tête de `.shp` et `.shx`
pub const FILE_CODE: i32 = 9994;

/// Version du format
pub const VERSION: i32 = 1000;

/// Taille du header principal
pub const HEADER_LEN: usize = 100;

/// Types de shapes (ESRI Shapefile Technical Description)
pub mod shape_type {
    pub const NULL: i32 = 0;
    pub const POINT: i32 = 1;
    pub const POLYLINE: i32 = 3;
    pub const POLYGON: i32 = 5;
    pub const MULTIPOINT: i32 = 8;
    pub const POINT_Z: i32 = 11;
    pub const POLYLINE_Z: i32 = 13;
    pub const POLYGON_Z: i32 = 15;
    pub const MULTIPOINT_Z: i32 = 18;
    pub const POINT_M: i32 = 21;
    pub const POLYLINE_M: i32 = 23;
    pub const POLYGON_M: i32 = 25;
    pub const MULTIPOINT_M: i32 = 28;
}

/// Parse le contenu d'un `.shp` et retourne une géométrie par enregistrement
pub fn parse(data: &[u8]) -> Result<Vec<Option<Geometry>>, TigerError> {
    if data.len() < HEADER_LEN {
        return Err(TigerError::parse_error("SHP", "file shorter than header"));
    }

    let mut header = Cursor::new(&data[..HEADER_LEN]);
    let file_code = header.read_i32::<BigEndian>().map_err(eof)?;
    if file_code != FILE_CODE {
        return Err(TigerError::parse_error(
            "SHP",
            format!("bad file code {} (expected {})", file_code, FILE_CODE),
        ));
    }

    header.set_position(24);
    // Longueur exprimée en mots de 16 bits
    let declared_len = header.read_i32::<BigEndian>().map_err(eof)?.max(0) as usize * 2;
    let end = declared_len.clamp(HEADER_LEN, data.len());

    let mut geometries = Vec::new();
    let mut pos = HEADER_LEN;

    while pos + 8 <= end {
        let mut record_header = Cursor::new(&data[pos..pos + 8]);
        let record_number = record_header.read_i32::<BigEndian>().map_err(eof)?;
        let content_len = record_header.read_i32::<BigEndian>().map_err(eof)?.max(0) as usize * 2;

        let start = pos + 8;
        let stop = start + content_len;
        if stop > data.len() {
            return Err(TigerError::parse_error(
                "SHP",
                format!("record {} truncated", record_number),
            ));
        }

        geometries.push(parse_record(&data[start..stop])?);
        pos = stop;
    }

    Ok(geometries)
}

/// Parse le contenu d'un enregistrement
fn parse_record(content: &[u8]) -> Result<Option<Geometry>, TigerError> {
    let mut cur = Cursor::new(content);
    let kind = cur.read_i32::<LittleEndian>().map_err(eof)?;

    match kind {
        shape_type::NULL => Ok(None),
        shape_type::POINT | shape_type::POINT_Z | shape_type::POINT_M => {
            let coord = read_coord(&mut cur)?;
            Ok(Some(Geometry::Point(Point::from(coord))))
        }
        shape_type::MULTIPOINT | shape_type::MULTIPOINT_Z | shape_type::MULTIPOINT_M => {
            skip_bbox(&mut cur)?;
            let num_points = read_count(&mut cur)?;
            ensure_remaining(&cur, num_points.saturating_mul(16), || {
                format!("{} points exceed record size", num_points)
            })?;
            let mut points = Vec::with_capacity(num_points);
            for _ in 0..num_points {
                points.push(Point::from(read_coord(&mut cur)?));
            }
            Ok(Some(Geometry::MultiPoint(MultiPoint::new(points))))
        }
        shape_type::POLYLINE | shape_type::POLYLINE_Z | shape_type::POLYLINE_M => {
            let mut lines: Vec<LineString> =
                read_parts(&mut cur)?.into_iter().map(LineString::new).collect();
            Ok(match lines.len() {
                0 => None,
                1 => lines.pop().map(Geometry::LineString),
                _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
            })
        }
        shape_type::POLYGON | shape_type::POLYGON_Z | shape_type::POLYGON_M => {
            let rings = read_parts(&mut cur)?.into_iter().map(LineString::new).collect();
            Ok(organize_rings(rings))
        }
        other => Err(TigerError::UnsupportedShapeType(other)),
    }
}

/// Lit les parts d'un PolyLine/Polygon: bbox, nombre de parts, nombre de points,
/// index de début de chaque part, puis les points
fn read_parts(cur: &mut Cursor<&[u8]>) -> Result<Vec<Vec<Coord>>, TigerError> {
    skip_bbox(cur)?;
    let num_parts = read_count(cur)?;
    let num_points = read_count(cur)?;

    let needed = num_parts
        .saturating_mul(4)
        .saturating_add(num_points.saturating_mul(16));
    ensure_remaining(cur, needed, || {
        format!("{} parts / {} points exceed record size", num_parts, num_points)
    })?;

    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        starts.push(read_count(cur)?);
    }

    let mut coords = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        coords.push(read_coord(cur)?);
    }

    let mut parts = Vec::with_capacity(num_parts);
    for (i, &start) in starts.iter().enumerate() {
        let stop = starts.get(i + 1).copied().unwrap_or(num_points);
        if start > stop || stop > num_points {
            return Err(TigerError::parse_error(
                "SHP",
                format!("invalid part index {}", start),
            ));
        }
        parts.push(coords[start..stop].to_vec());
    }

    Ok(parts)
}

/// Organise les rings en polygones avec trous
///
/// Convention shapefile: les rings extérieurs sont dans le sens horaire, les
/// trous dans le sens anti-horaire. Un trou est rattaché au plus petit
/// extérieur qui le contient (îles dans un lac); un trou dont tous les sommets
/// sont sur le bord d'un extérieur lui appartient aussi. Un trou orphelin
/// devient un extérieur.
pub fn organize_rings(rings: Vec<LineString>) -> Option<Geometry> {
    let (mut outers, mut holes): (Vec<LineString>, Vec<LineString>) =
        rings.into_iter().partition(|r| r.is_cw());

    // Fichier sans orientation ESRI: tous les rings sont des extérieurs
    if outers.is_empty() {
        outers = std::mem::take(&mut holes);
    }

    let mut shells: Vec<Polygon> = outers
        .into_iter()
        .map(|ring| Polygon::new(ring, vec![]))
        .collect();
    let mut interiors: Vec<Vec<LineString>> = vec![Vec::new(); shells.len()];
    let mut areas: Vec<f64> = shells.iter().map(|shell| shell.unsigned_area()).collect();

    for hole in holes {
        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, shell)| {
                hole.coords_iter().any(|c| shell.contains(&c))
                    || hole.coords_iter().all(|c| shell.intersects(&c))
            })
            .min_by(|(a, _), (b, _)| areas[*a].total_cmp(&areas[*b]))
            .map(|(i, _)| i);

        match owner {
            Some(i) => interiors[i].push(hole),
            None => {
                let shell = Polygon::new(hole, vec![]);
                areas.push(shell.unsigned_area());
                shells.push(shell);
                interiors.push(Vec::new());
            }
        }
    }

    let mut polygons: Vec<Polygon> = shells
        .into_iter()
        .zip(interiors)
        .map(|(shell, holes)| {
            let (exterior, _) = shell.into_inner();
            Polygon::new(exterior, holes)
        })
        .collect();

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

fn read_coord(cur: &mut Cursor<&[u8]>) -> Result<Coord, TigerError> {
    let x = cur.read_f64::<LittleEndian>().map_err(eof)?;
    let y = cur.read_f64::<LittleEndian>().map_err(eof)?;
    Ok(Coord { x, y })
}

fn read_count(cur: &mut Cursor<&[u8]>) -> Result<usize, TigerError> {
    let n = cur.read_i32::<LittleEndian>().map_err(eof)?;
    usize::try_from(n).map_err(|_| TigerError::parse_error("SHP", format!("negative count {}", n)))
}

fn ensure_remaining<F>(cur: &Cursor<&[u8]>, needed: usize, reason: F) -> Result<(), TigerError>
where
    F: FnOnce() -> String,
{
    let remaining = cur.get_ref().len().saturating_sub(cur.position() as usize);
    if needed > remaining {
        return Err(TigerError::parse_error("SHP", reason()));
    }
    Ok(())
}

fn skip_bbox(cur: &mut Cursor<&[u8]>) -> Result<(), TigerError> {
    let mut bbox = [0u8; 32];
    cur.read_exact(&mut bbox).map_err(eof)
}

fn eof(_: std::io::Error) -> TigerError {
    TigerError::parse_error("SHP", "unexpected end of data")
}
