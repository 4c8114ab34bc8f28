//! # Series Aggregation
//!
//! Concatenates per-file point series into one combined series, in the order
//! the files were enumerated. No sorting or deduplication happens here, so
//! the result is chronological only if the file list is.

use crate::error::{PointError, PointResult};
use crate::extract::{FileSeries, extract_point_series};
use crate::input::VariableConfig;
use crate::locate::{GeoPoint, GridCell, GridLocator, PerAxisNearest};
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Produces the point series of one file.
pub trait SeriesSource {
    fn read(&self, path: &Path) -> PointResult<FileSeries>;
}

/// Reads point series from NetCDF files on disk.
pub struct NetcdfSource {
    variables: VariableConfig,
    point: GeoPoint,
    locator: Box<dyn GridLocator>,
}

impl NetcdfSource {
    /// Creates a source using the per-axis nearest locator.
    pub fn new(variables: VariableConfig, point: GeoPoint) -> Self {
        Self::with_locator(variables, point, Box::new(PerAxisNearest))
    }

    pub fn with_locator(
        variables: VariableConfig,
        point: GeoPoint,
        locator: Box<dyn GridLocator>,
    ) -> Self {
        NetcdfSource {
            variables,
            point,
            locator,
        }
    }
}

impl SeriesSource for NetcdfSource {
    fn read(&self, path: &Path) -> PointResult<FileSeries> {
        extract_point_series(path, &self.variables, self.point, self.locator.as_ref())
    }
}

/// The concatenation of every file's samples, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSeries {
    pub primary: Vec<f64>,
    pub secondary: Vec<f64>,
    pub times: Vec<NaiveDateTime>,
    /// Cell resolved in the first file
    pub cell: GridCell,
    /// Number of files read
    pub files: usize,
}

impl CombinedSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Synthetic x-axis: `0..len()` as plotting positions.
    pub fn index(&self) -> Vec<f64> {
        (0..self.len()).map(|i| i as f64).collect()
    }

    fn append(&mut self, series: FileSeries) {
        self.primary.extend(series.primary);
        self.secondary.extend(series.secondary);
        self.times.extend(series.times);
        self.files += 1;
    }

    /// Builds a DataFrame with `step`, `time`, and one column per variable.
    ///
    /// Timestamps are written as `%Y-%m-%d %H:%M:%S` strings.
    pub fn to_dataframe(&self, primary_name: &str, secondary_name: &str) -> PointResult<DataFrame> {
        let steps: Vec<i64> = (0..self.len() as i64).collect();
        let times: Vec<String> = self
            .times
            .iter()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .collect();

        let columns = vec![
            Series::new("step".into(), steps).into(),
            Series::new("time".into(), times).into(),
            Series::new(primary_name.into(), self.primary.clone()).into(),
            Series::new(secondary_name.into(), self.secondary.clone()).into(),
        ];

        Ok(DataFrame::new(columns)?)
    }
}

/// Reads every path through `source` and concatenates the results.
///
/// The first failing file aborts the whole run. If a later file resolves to a
/// different grid cell than the first one a warning is logged and its samples
/// are appended anyway.
///
/// # Errors
///
/// Returns [`PointError::EmptySeries`] for an empty path list, or the first
/// error raised by `source`.
pub fn aggregate<S: SeriesSource + ?Sized>(
    paths: &[PathBuf],
    source: &S,
    progress: bool,
) -> PointResult<CombinedSeries> {
    let (first_path, rest) = paths.split_first().ok_or(PointError::EmptySeries)?;

    let bar = progress_bar(paths.len() as u64, progress);

    bar.set_message(file_label(first_path));
    let first = source.read(first_path)?;
    bar.inc(1);

    let mut combined = CombinedSeries {
        primary: Vec::with_capacity(first.len() * paths.len()),
        secondary: Vec::with_capacity(first.len() * paths.len()),
        times: Vec::with_capacity(first.len() * paths.len()),
        cell: first.cell,
        files: 0,
    };
    debug!(
        "{}: {} samples at cell [{}, {}]",
        first_path.display(),
        first.len(),
        first.cell.lat_index,
        first.cell.lon_index
    );
    combined.append(first);

    for path in rest {
        bar.set_message(file_label(path));
        let series = source.read(path)?;
        if !series.cell.same_indices(&combined.cell) {
            warn!(
                "{} resolved to cell [{}, {}], expected [{}, {}]; grids differ between files",
                path.display(),
                series.cell.lat_index,
                series.cell.lon_index,
                combined.cell.lat_index,
                combined.cell.lon_index
            );
        }
        debug!("{}: {} samples", path.display(), series.len());
        combined.append(series);
        bar.inc(1);
    }

    bar.finish_and_clear();
    info!(
        "Combined {} samples from {} files",
        combined.len(),
        combined.files
    );
    Ok(combined)
}

fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ");
    bar.set_style(style);
    bar
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
