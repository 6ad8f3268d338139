//! Error types for geometry parsing and dataset loading.
//!
//! Every [`LoadError`] is fatal: the binaries refuse to serve anything
//! from a partially loaded dataset.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("malformed WKT: {0}")]
    Malformed(String),

    #[error("unsupported geometry type {0}, expected Polygon or MultiPolygon")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {table} table: {source}")]
    Io {
        table: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table} row {row}: column '{column}' is empty")]
    MissingValue {
        table: &'static str,
        row: usize,
        column: &'static str,
    },

    #[error("{table} row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("neighborhood '{neighborhood}' has unusable geometry: {source}")]
    Geometry {
        neighborhood: String,
        #[source]
        source: GeometryError,
    },

    #[error("duplicate neighborhood id '{0}'")]
    DuplicateNeighborhood(String),

    #[error("listing row {row} references unknown neighborhood '{neighborhood}'")]
    UnknownNeighborhood { row: usize, neighborhood: String },

    #[error("listings table has no rows")]
    EmptyListings,
}
