//! Parsers des fichiers composant un shapefile

pub mod cpg;
pub mod dbf;
pub mod prj;
pub mod shp;
