//! # Data Extraction
//!
//! Reads the two configured fields at a single grid cell, across the whole
//! internal time dimension of one NetCDF file.
//!
//! ## Key Components
//!
//! - [`FileSeries`]: Aligned per-file samples and the cell they came from
//! - [`extract_point_series`]: Opens a file, locates the cell and reads it

use crate::error::{PointError, PointResult};
use crate::input::VariableConfig;
use crate::locate::{GeoPoint, GridCell, GridLocator};
use crate::time::{CfTimeUnits, check_calendar};
use chrono::NaiveDateTime;
use log::debug;
use netcdf::AttributeValue;
use std::path::Path;

/// Default fill values netCDF-C writes when no `_FillValue` attribute exists.
const NC_FILL_FLOAT: f32 = 9.969_209_968_386_869e36;
const NC_FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

/// Samples read from one file at one grid cell.
///
/// `primary`, `secondary` and `times` always have the same length: the
/// number of time steps stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSeries {
    pub primary: Vec<f64>,
    pub secondary: Vec<f64>,
    pub times: Vec<NaiveDateTime>,
    pub cell: GridCell,
}

impl FileSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Extracts the point series of one file.
///
/// This function:
/// 1. Opens the file and reads the longitude, latitude and time coordinates
/// 2. Locates the grid cell nearest to `point` with `locator`
/// 3. Reads both fields at that cell for every time step
/// 4. Decodes the time coordinate into timestamps
///
/// # Errors
///
/// Any failure is returned as-is, without retry:
/// - The file cannot be opened
/// - A coordinate or field variable is missing
/// - A field is not three-dimensional `(time, lat, lon)`
/// - The time `units` attribute is missing or unparseable
/// - The three sequences end up with different lengths
pub fn extract_point_series(
    path: &Path,
    variables: &VariableConfig,
    point: GeoPoint,
    locator: &dyn GridLocator,
) -> PointResult<FileSeries> {
    debug!("Opening NetCDF file: {}", path.display());
    let file = netcdf::open(path).map_err(|e| PointError::netcdf(path, e))?;

    let series = read_point_series(&file, path, variables, point, locator)?;

    file.close().map_err(|e| PointError::netcdf(path, e))?;
    Ok(series)
}

fn read_point_series(
    file: &netcdf::File,
    path: &Path,
    variables: &VariableConfig,
    point: GeoPoint,
    locator: &dyn GridLocator,
) -> PointResult<FileSeries> {
    let lon = read_coordinate(file, path, &variables.lon)?;
    let lat = read_coordinate(file, path, &variables.lat)?;
    let cell = locator.locate(&lon, &lat, point)?;
    debug!(
        "Nearest cell to ({}, {}) is [{}, {}] at ({}, {})",
        point.lat, point.lon, cell.lat_index, cell.lon_index, cell.lat, cell.lon
    );

    let primary = read_point_values(file, path, &variables.primary, &cell)?;
    let secondary = read_point_values(file, path, &variables.secondary, &cell)?;
    let times = read_times(file, path, &variables.time)?;

    if primary.len() != times.len() || secondary.len() != times.len() {
        return Err(PointError::LengthMismatch {
            path: path.to_path_buf(),
            primary: primary.len(),
            secondary: secondary.len(),
            times: times.len(),
        });
    }

    Ok(FileSeries {
        primary,
        secondary,
        times,
        cell,
    })
}

fn variable<'f>(
    file: &'f netcdf::File,
    path: &Path,
    name: &str,
) -> PointResult<netcdf::Variable<'f>> {
    file.variable(name).ok_or_else(|| PointError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

fn read_coordinate(file: &netcdf::File, path: &Path, name: &str) -> PointResult<Vec<f64>> {
    let var = variable(file, path, name)?;
    var.get_values::<f64, _>(..)
        .map_err(|e| PointError::netcdf(path, e))
}

/// Reads `name[:, lat_index, lon_index]` with fill values masked as NaN and
/// packing (`scale_factor` / `add_offset`) undone.
fn read_point_values(
    file: &netcdf::File,
    path: &Path,
    name: &str,
    cell: &GridCell,
) -> PointResult<Vec<f64>> {
    let var = variable(file, path, name)?;
    let dims = var.dimensions();
    if dims.len() != 3 {
        return Err(PointError::UnexpectedShape {
            name: name.to_string(),
            path: path.to_path_buf(),
            dims: dims.iter().map(|d| d.name().to_string()).collect(),
        });
    }
    let n_time = dims[0].len();

    let raw = var
        .get_values::<f64, _>((0..n_time, cell.lat_index, cell.lon_index))
        .map_err(|e| PointError::netcdf(path, e))?;

    let fill = attr_f64(&var, "_FillValue");
    let missing = attr_f64(&var, "missing_value");
    let scale = attr_f64(&var, "scale_factor").unwrap_or(1.0);
    let offset = attr_f64(&var, "add_offset").unwrap_or(0.0);

    Ok(raw
        .into_iter()
        .map(|v| {
            if is_missing(v, fill, missing) {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect())
}

fn is_missing(value: f64, fill: Option<f64>, missing: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match fill {
        Some(f) if value == f => return true,
        None if value == f64::from(NC_FILL_FLOAT) || value == NC_FILL_DOUBLE => return true,
        _ => {}
    }
    missing.is_some_and(|m| value == m)
}

fn read_times(file: &netcdf::File, path: &Path, name: &str) -> PointResult<Vec<NaiveDateTime>> {
    let var = variable(file, path, name)?;
    let values = var
        .get_values::<f64, _>(..)
        .map_err(|e| PointError::netcdf(path, e))?;

    let units = attr_string(&var, "units")
        .ok_or_else(|| PointError::InvalidTimeUnits(format!("<missing units on '{}'>", name)))?;
    check_calendar(attr_string(&var, "calendar").as_deref())?;

    let cf_units = CfTimeUnits::parse(&units)?;
    cf_units.decode(&values)
}

fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            AttributeValue::Double(d) => Some(d),
            AttributeValue::Float(f) => Some(f64::from(f)),
            AttributeValue::Int(i) => Some(f64::from(i)),
            AttributeValue::Short(s) => Some(f64::from(s)),
            _ => None,
        })
}

fn attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}
