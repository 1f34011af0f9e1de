//! Parser pour les fichiers PRJ (système de coordonnées, WKT ESRI)

use memchr::memchr;
use tracing::warn;

use crate::types::Projection;

/// Mapping des noms WKT géographiques vers EPSG
const GEOGRAPHIC: &[(&str, u32)] = &[
    ("GCS_North_American_1983", 4269),
    ("NAD83", 4269),
    ("GCS_WGS_1984", 4326),
    ("WGS 84", 4326),
    ("WGS84", 4326),
    ("GCS_North_American_1927", 4267),
    ("NAD27", 4267),
];

/// Mapping des noms WKT projetés vers EPSG
const PROJECTED: &[(&str, u32)] = &[
    ("WGS_1984_Web_Mercator_Auxiliary_Sphere", 3857),
    ("WGS 84 / Pseudo-Mercator", 3857),
    ("NAD_1983_Contiguous_USA_Albers", 5070),
    ("NAD83 / Conus Albers", 5070),
];

/// Parse un `.prj` et retourne la projection reconnue
///
/// Retourne `None` (avec un warning) si le nom WKT n'est pas dans le mapping.
pub fn parse(data: &[u8]) -> Option<Projection> {
    let content = String::from_utf8_lossy(data);
    let Some((keyword, name)) = root_name(&content) else {
        warn!("Unreadable PRJ content, CRS left unset");
        return None;
    };

    let table = if keyword.eq_ignore_ascii_case("PROJCS") {
        PROJECTED
    } else {
        GEOGRAPHIC
    };

    for &(known, epsg) in table {
        if name.eq_ignore_ascii_case(known) {
            return Some(Projection { epsg, name: known });
        }
    }

    warn!(crs = name, "Unknown CRS in PRJ, CRS left unset");
    None
}

/// Extrait le mot-clé racine et son nom: `GEOGCS["GCS_North_American_1983",...`
fn root_name(wkt: &str) -> Option<(&str, &str)> {
    let bytes = wkt.as_bytes();
    let open = memchr(b'[', bytes)?;
    let keyword = wkt[..open].trim();

    let rest = wkt[open + 1..].trim_start().strip_prefix('"')?;
    let close = memchr(b'"', rest.as_bytes())?;
    Some((keyword, &rest[..close]))
}
