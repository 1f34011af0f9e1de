//! Table de features géo-attribuées
//!
//! Colonnes d'attributs ordonnées, une géométrie optionnelle par ligne, et la
//! pseudo-colonne `geometry` (toujours en dernière position).

use geo::{CoordsIter, Geometry};

use crate::types::{Feature, Projection, Value};
use crate::TigerError;

/// Nom de la colonne géométrie
pub const GEOMETRY_COLUMN: &str = "geometry";

#[derive(Debug, Clone)]
pub struct FeatureTable {
    columns: Vec<String>,
    features: Vec<Feature>,
    projection: Option<Projection>,
    has_geometry: bool,
}

impl FeatureTable {
    /// Crée une table; chaque feature doit avoir une valeur par colonne
    pub fn new(
        columns: Vec<String>,
        features: Vec<Feature>,
        projection: Option<Projection>,
    ) -> Result<Self, TigerError> {
        if let Some(row) = features
            .iter()
            .position(|f| f.attributes.len() != columns.len())
        {
            return Err(TigerError::parse_error(
                "table",
                format!(
                    "row {} has {} values for {} columns",
                    row,
                    features[row].attributes.len(),
                    columns.len()
                ),
            ));
        }

        Ok(Self {
            columns,
            features,
            projection,
            has_geometry: true,
        })
    }

    /// Colonnes d'attributs (sans la géométrie)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Toutes les colonnes, géométrie comprise
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        if self.has_geometry {
            names.push(GEOMETRY_COLUMN);
        }
        names
    }

    pub fn has_geometry(&self) -> bool {
        self.has_geometry
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn projection(&self) -> Option<Projection> {
        self.projection
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Index d'une colonne d'attribut
    pub fn column_index(&self, name: &str) -> Result<usize, TigerError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TigerError::MissingColumn(name.to_string()))
    }

    /// Valeurs d'une colonne d'attribut
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TigerError> {
        let idx = self.column_index(name)?;
        Ok(self.features.iter().map(|f| &f.attributes[idx]).collect())
    }

    /// Renomme une colonne d'attribut
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), TigerError> {
        let idx = self.column_index(from)?;
        if from == to {
            return Ok(());
        }
        if self.columns.iter().any(|c| c == to) || (self.has_geometry && to == GEOMETRY_COLUMN) {
            return Err(TigerError::DuplicateColumn(to.to_string()));
        }
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Convertit une colonne en numérique
    ///
    /// Texte → entier (`"00601"` → `601`), ou réel si une valeur a une partie
    /// décimale ou un exposant; dans ce cas toute la colonne passe en réel.
    /// Null reste null. Un booléen est refusé (`NotNumeric`), comme un texte
    /// non numérique. La table n'est pas modifiée en cas d'erreur.
    pub fn to_numeric(&mut self, column: &str) -> Result<(), TigerError> {
        let idx = self.column_index(column)?;

        let mut converted = Vec::with_capacity(self.features.len());
        let mut any_float = false;

        for (row, feature) in self.features.iter().enumerate() {
            let value = match &feature.attributes[idx] {
                Value::Null => Value::Null,
                Value::Integer(n) => Value::Integer(*n),
                Value::Float(x) => Value::Float(*x),
                Value::Bool(b) => {
                    return Err(TigerError::NotNumeric {
                        column: column.to_string(),
                        row,
                        value: b.to_string(),
                    })
                }
                Value::Text(s) => parse_number(s).ok_or_else(|| TigerError::NotNumeric {
                    column: column.to_string(),
                    row,
                    value: s.clone(),
                })?,
            };
            any_float |= matches!(value, Value::Float(_));
            converted.push(value);
        }

        for (feature, value) in self.features.iter_mut().zip(converted) {
            feature.attributes[idx] = match value {
                Value::Integer(n) if any_float => Value::Float(n as f64),
                other => other,
            };
        }

        Ok(())
    }

    /// Garde exactement les colonnes listées, dans l'ordre donné
    ///
    /// `geometry` désigne la colonne géométrie; si elle n'est pas listée, les
    /// géométries sont supprimées.
    pub fn select(&mut self, columns: &[&str]) -> Result<(), TigerError> {
        let mut indices = Vec::with_capacity(columns.len());
        let mut keep_geometry = false;

        for (i, &name) in columns.iter().enumerate() {
            if columns[..i].contains(&name) {
                return Err(TigerError::DuplicateColumn(name.to_string()));
            }
            if name == GEOMETRY_COLUMN && self.has_geometry {
                keep_geometry = true;
            } else {
                indices.push(self.column_index(name)?);
            }
        }

        for feature in &mut self.features {
            let mut old = std::mem::take(&mut feature.attributes);
            feature.attributes = indices
                .iter()
                .map(|&i| std::mem::replace(&mut old[i], Value::Null))
                .collect();
            if !keep_geometry {
                feature.geometry = None;
            }
        }

        self.columns = indices
            .iter()
            .map(|&i| std::mem::take(&mut self.columns[i]))
            .collect();
        self.has_geometry = keep_geometry;

        Ok(())
    }

    /// Remplace chaque géométrie présente
    pub fn map_geometries<F>(&mut self, mut f: F)
    where
        F: FnMut(&Geometry) -> Geometry,
    {
        for feature in &mut self.features {
            if let Some(geometry) = &feature.geometry {
                feature.geometry = Some(f(geometry));
            }
        }
    }

    /// Nombre total de sommets
    pub fn vertex_count(&self) -> usize {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(|g| g.coords_count())
            .sum()
    }
}

/// Parse un nombre fini: entier d'abord, réel sinon
fn parse_number(s: &str) -> Option<Value> {
    let text = s.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    fast_float::parse::<f64, _>(text)
        .ok()
        .filter(|x| x.is_finite())
        .map(Value::Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::square;

    fn table(codes: &[&str]) -> FeatureTable {
        let columns = vec!["ZCTA5CE20".to_string(), "ALAND20".to_string()];
        let features = codes
            .iter()
            .enumerate()
            .map(|(i, code)| Feature {
                geometry: Some(Geometry::Polygon(square(i as f64, 0.0, 1.0))),
                attributes: vec![Value::Text(code.to_string()), Value::Integer(42)],
            })
            .collect();
        FeatureTable::new(columns, features, None).unwrap()
    }

    #[test]
    fn test_new_rejects_misaligned_rows() {
        let features = vec![Feature {
            geometry: None,
            attributes: vec![Value::Null],
        }];
        let result = FeatureTable::new(vec!["A".into(), "B".into()], features, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_rename_column() {
        let mut t = table(&["00601"]);
        t.rename_column("ZCTA5CE20", "zip").unwrap();
        assert_eq!(t.column_names(), ["zip", "ALAND20", "geometry"]);
    }

    #[test]
    fn test_rename_missing_column() {
        let mut t = table(&["00601"]);
        let result = t.rename_column("ZCTA5CE10", "zip");
        assert!(matches!(result, Err(TigerError::MissingColumn(c)) if c == "ZCTA5CE10"));
    }

    #[test]
    fn test_rename_to_existing_column() {
        let mut t = table(&["00601"]);
        assert!(matches!(
            t.rename_column("ZCTA5CE20", "ALAND20"),
            Err(TigerError::DuplicateColumn(_))
        ));
        assert!(matches!(
            t.rename_column("ZCTA5CE20", "geometry"),
            Err(TigerError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_to_numeric_drops_leading_zeros() {
        let mut t = table(&["00601", "90210"]);
        t.to_numeric("ZCTA5CE20").unwrap();

        let values = t.column("ZCTA5CE20").unwrap();
        assert_eq!(values, [&Value::Integer(601), &Value::Integer(90210)]);
    }

    #[test]
    fn test_to_numeric_promotes_to_float() {
        let mut t = table(&["1", "2.5"]);
        t.to_numeric("ZCTA5CE20").unwrap();

        let values = t.column("ZCTA5CE20").unwrap();
        assert_eq!(values, [&Value::Float(1.0), &Value::Float(2.5)]);
    }

    #[test]
    fn test_to_numeric_rejects_text() {
        let mut t = table(&["00601", "A0602"]);
        let result = t.to_numeric("ZCTA5CE20");

        match result {
            Err(TigerError::NotNumeric { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "A0602");
            }
            other => panic!("Expected NotNumeric, got {:?}", other),
        }
        // Table inchangée
        assert_eq!(
            t.column("ZCTA5CE20").unwrap()[0],
            &Value::Text("00601".to_string())
        );
    }

    #[test]
    fn test_to_numeric_keeps_null() {
        let mut t = table(&["00601"]);
        t.features[0].attributes[0] = Value::Null;
        t.to_numeric("ZCTA5CE20").unwrap();
        assert!(t.column("ZCTA5CE20").unwrap()[0].is_null());
    }

    #[test]
    fn test_to_numeric_rejects_bool() {
        let mut t = table(&["00601", "00602"]);
        t.features[1].attributes[0] = Value::Bool(true);

        match t.to_numeric("ZCTA5CE20") {
            Err(TigerError::NotNumeric { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "true");
            }
            other => panic!("Expected NotNumeric, got {:?}", other),
        }
        assert_eq!(
            t.column("ZCTA5CE20").unwrap()[0],
            &Value::Text("00601".to_string())
        );
    }

    #[test]
    fn test_select_exact_columns() {
        let mut t = table(&["00601", "00602"]);
        t.rename_column("ZCTA5CE20", "zip").unwrap();
        t.select(&["zip", "geometry"]).unwrap();

        assert_eq!(t.column_names(), ["zip", "geometry"]);
        assert!(t.features().iter().all(|f| f.attributes.len() == 1));
        assert!(t.features().iter().all(|f| f.geometry.is_some()));
    }

    #[test]
    fn test_select_without_geometry() {
        let mut t = table(&["00601"]);
        t.select(&["ALAND20"]).unwrap();

        assert_eq!(t.column_names(), ["ALAND20"]);
        assert!(t.features()[0].geometry.is_none());
        assert_eq!(t.features()[0].attributes, [Value::Integer(42)]);
    }

    #[test]
    fn test_select_missing_column() {
        let mut t = table(&["00601"]);
        assert!(matches!(
            t.select(&["zip", "geometry"]),
            Err(TigerError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_select_duplicate_column() {
        let mut t = table(&["00601"]);
        assert!(matches!(
            t.select(&["ALAND20", "ALAND20"]),
            Err(TigerError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_vertex_count_and_map_geometries() {
        let mut t = table(&["00601", "00602"]);
        // Carré fermé: 5 coordonnées
        assert_eq!(t.vertex_count(), 10);

        t.map_geometries(|_| Geometry::Point(geo::Point::new(0.0, 0.0)));
        assert_eq!(t.vertex_count(), 2);
    }
}
