//! # Error Types
//!
//! Every fallible library operation returns [`PointResult`]. Failures are never
//! recovered from inside the pipeline: a missing file, a missing variable or an
//! unreadable time axis aborts the run and surfaces here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while enumerating, extracting, aggregating or rendering
#[derive(Error, Debug)]
pub enum PointError {
    #[error("NetCDF error in '{path}': {source}")]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("Variable '{name}' not found in '{path}'")]
    MissingVariable { name: String, path: PathBuf },

    #[error("Variable '{name}' in '{path}' has dimensions {dims:?}, expected (time, lat, lon)")]
    UnexpectedShape {
        name: String,
        path: PathBuf,
        dims: Vec<String>,
    },

    #[error("Coordinate array '{0}' is empty")]
    EmptyCoordinate(String),

    #[error("Invalid start date '{0}': expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid time units '{0}': expected '<unit> since <reference>'")]
    InvalidTimeUnits(String),

    #[error("Time value {0} does not map to a representable timestamp")]
    InvalidTimeValue(f64),

    #[error("Unsupported calendar '{0}'")]
    UnsupportedCalendar(String),

    #[error("Series length mismatch in '{path}': {primary} primary, {secondary} secondary, {times} time steps")]
    LengthMismatch {
        path: PathBuf,
        primary: usize,
        secondary: usize,
        times: usize,
    },

    #[error("No files to aggregate")]
    EmptySeries,

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for point-series operations
pub type PointResult<T> = Result<T, PointError>;

impl PointError {
    /// Wraps a netcdf error with the path of the file being read.
    pub fn netcdf(path: impl Into<PathBuf>, source: netcdf::Error) -> Self {
        PointError::NetCdf {
            path: path.into(),
            source,
        }
    }
}
