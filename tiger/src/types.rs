//! Types de données pour le crate tiger

use geo::Geometry;

/// Valeur d'attribut lue depuis le DBF
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Champ vide
    Null,
    /// Texte (champs `C` et `D`)
    Text(String),
    /// Entier (champs `N` sans décimales, ou texte converti)
    Integer(i64),
    /// Réel (champs `N`/`F` avec décimales)
    Float(f64),
    /// Logique (champs `L`)
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Une ligne de la table: géométrie optionnelle + valeurs alignées sur les colonnes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Géométrie (absente pour les shapes `Null`)
    pub geometry: Option<Geometry>,

    /// Valeurs des attributs, dans l'ordre de `FeatureTable::columns`
    pub attributes: Vec<Value>,
}

/// Système de coordonnées détecté dans le `.prj`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// Code EPSG
    pub epsg: u32,

    /// Nom WKT reconnu
    pub name: &'static str,
}

impl Projection {
    /// Nom OGC utilisé dans le membre `crs` du GeoJSON
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }
}

/// Type de champ DBF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Logical,
    Date,
}

/// Descripteur de champ DBF
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub length: usize,
    pub decimals: u8,
}
