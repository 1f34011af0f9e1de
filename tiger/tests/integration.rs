//! Tests d'intégration avec le vrai shapefile ZCTA du Census

use std::collections::HashSet;
use std::path::Path;

use tiger::Value;

#[test]
fn test_read_real_zcta_shapefile() {
    let shp_path = Path::new("../data/tl_2020_us_zcta520.shp");

    if !shp_path.exists() {
        eprintln!("Shapefile not found, skipping test");
        return;
    }

    let table = match tiger::read(shp_path) {
        Ok(table) => table,
        Err(e) => panic!("Failed to read shapefile: {:?}", e),
    };

    println!("Records: {}", table.len());
    println!("Columns: {:?}", table.column_names());

    // 2020: 33 791 ZCTA
    assert!(table.len() > 30_000, "Should have every ZCTA");
    assert_eq!(table.projection().map(|p| p.epsg), Some(4269), "Should be NAD83");

    let codes = table.column("ZCTA5CE20").unwrap();
    let unique: HashSet<&str> = codes.iter().filter_map(|v| v.as_text()).collect();
    assert_eq!(unique.len(), table.len(), "ZCTA codes should be unique");
    assert!(codes
        .iter()
        .all(|v| matches!(v, Value::Text(s) if s.len() == 5)));
}

#[test]
fn test_simplify_real_zcta_shapefile() {
    let shp_path = Path::new("../data/tl_2020_us_zcta520.shp");

    if !shp_path.exists() {
        eprintln!("Shapefile not found, skipping test");
        return;
    }

    let mut table = tiger::read(shp_path).unwrap();
    let before = table.vertex_count();
    table.map_geometries(|g| tiger::simplify(g, 0.001));
    let after = table.vertex_count();

    println!("Vertices: {} -> {}", before, after);
    assert!(after <= before);
}
