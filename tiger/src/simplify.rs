//! Simplification des géométries (Ramer–Douglas–Peucker)

use geo::{Geometry, GeometryCollection, LineString, MultiPolygon, Polygon, Simplify};

/// Nombre minimal de coordonnées d'un ring fermé
const MIN_RING_COORDS: usize = 4;

/// Simplifie une géométrie avec une tolérance exprimée dans les unités des coordonnées
///
/// Un ring qui tomberait sous 4 coordonnées garde ses sommets d'origine: le
/// polygone ne dégénère jamais et le nombre de sommets ne croît jamais.
/// Les points et multipoints sont inchangés.
pub fn simplify(geometry: &Geometry, tolerance: f64) -> Geometry {
    match geometry {
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon(p, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.0.iter().map(|p| simplify_polygon(p, tolerance)).collect(),
        )),
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(&tolerance)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(mls.simplify(&tolerance)),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection::new_from(
            gc.0.iter().map(|g| simplify(g, tolerance)).collect(),
        )),
        other => other.clone(),
    }
}

fn simplify_polygon(polygon: &Polygon, tolerance: f64) -> Polygon {
    Polygon::new(
        simplify_ring(polygon.exterior(), tolerance),
        polygon
            .interiors()
            .iter()
            .map(|ring| simplify_ring(ring, tolerance))
            .collect(),
    )
}

fn simplify_ring(ring: &LineString, tolerance: f64) -> LineString {
    let simplified = ring.simplify(&tolerance);
    if simplified.0.len() < MIN_RING_COORDS {
        ring.clone()
    } else {
        simplified
    }
}
