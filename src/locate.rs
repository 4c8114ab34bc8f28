//! # Point Location
//!
//! Maps a target latitude/longitude to a grid cell of a rectilinear grid.
//!
//! The shipped locator, [`PerAxisNearest`], picks the nearest latitude and the
//! nearest longitude independently. It is not a joint 2-D or geodesic nearest
//! neighbour: on a regular grid both agree, on irregular spacing they may not.
//! It also never refuses a point, however far outside the grid it lies.

use crate::error::{PointError, PointResult};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// The grid cell chosen for a target point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub lat_index: usize,
    pub lon_index: usize,
    /// Latitude of the chosen cell
    pub lat: f64,
    /// Longitude of the chosen cell
    pub lon: f64,
}

impl GridCell {
    pub fn same_indices(&self, other: &GridCell) -> bool {
        self.lat_index == other.lat_index && self.lon_index == other.lon_index
    }
}

pub trait GridLocator {
    fn locate(&self, lon: &[f64], lat: &[f64], target: GeoPoint) -> PointResult<GridCell>;
}

/// Independent per-axis nearest-index lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerAxisNearest;

impl GridLocator for PerAxisNearest {
    fn locate(&self, lon: &[f64], lat: &[f64], target: GeoPoint) -> PointResult<GridCell> {
        let lat_index = nearest_index(lat, target.lat)
            .ok_or_else(|| PointError::EmptyCoordinate("lat".to_string()))?;
        let lon_index = nearest_index(lon, target.lon)
            .ok_or_else(|| PointError::EmptyCoordinate("lon".to_string()))?;

        Ok(GridCell {
            lat_index,
            lon_index,
            lat: lat[lat_index],
            lon: lon[lon_index],
        })
    }
}

/// Index of the value closest to `target`.
///
/// Ties go to the first occurrence, so `[10, 20, 30, 40]` with target `25`
/// returns `1`. NaN entries are skipped unless every entry is NaN, in which
/// case index `0` is returned. Returns `None` only for an empty slice.
///
/// ```rust
/// use ncpoint::locate::nearest_index;
///
/// assert_eq!(nearest_index(&[10.0, 20.0, 30.0], 25.0), Some(1));
/// assert_eq!(nearest_index(&[10.0, 20.0, 30.0, 40.0], 25.0), Some(1));
/// assert_eq!(nearest_index(&[], 25.0), None);
/// ```
pub fn nearest_index(coords: &[f64], target: f64) -> Option<usize> {
    if coords.is_empty() {
        return None;
    }

    let mut best_index = 0;
    let mut best_distance = (coords[0] - target).abs();

    for (idx, &value) in coords.iter().enumerate().skip(1) {
        let distance = (value - target).abs();
        if distance < best_distance || (best_distance.is_nan() && !distance.is_nan()) {
            best_index = idx;
            best_distance = distance;
        }
    }

    Some(best_index)
}
