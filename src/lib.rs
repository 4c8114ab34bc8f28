//! # ncpoint
//!
//! A Rust library for pulling a single-point time series out of a sequence of
//! gridded NetCDF model files and charting it.
//!
//! ## Features
//!
//! - **File enumeration**: Date-templated file names at a fixed sub-daily step
//! - **Point extraction**: Per-axis nearest grid cell, two fields plus CF time
//! - **Aggregation**: Concatenation across files in enumeration order
//! - **Rendering**: Single-series or dual-axis PNG line charts
//! - **Export**: Optional Parquet copy of the combined series
//!
//! Nothing runs on import; every side effect sits behind
//! [`run_point_job`] or [`plot_point_job`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ncpoint::{plot_point_job, input::JobConfig, render::ChartVariant};
//!
//! let config = JobConfig::from_file("chaco_2015.json").expect("Failed to load config");
//! config.validate().expect("Invalid config");
//!
//! let chart = plot_point_job(&config, ChartVariant::Dual, true).expect("Failed to plot");
//! println!("wrote {}", chart.display());
//! ```
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "files": {
//!     "data_dir": "/mnt/ypy3_5/land/gldas/data/2015/",
//!     "start_date": "20150201",
//!     "num_days": 28
//!   },
//!   "point": { "lat": -27.27, "lon": -59.14 },
//!   "variables": { "primary": "SoilMoi0_10cm_inst", "secondary": "Rainf_f_tavg" }
//! }
//! ```

pub mod aggregate;
pub mod cli;
pub mod error;
pub mod extract;
pub mod files;
pub mod info;
pub mod input;
pub mod locate;
pub mod log;
pub mod output;
pub mod render;
pub mod time;


use crate::aggregate::{CombinedSeries, NetcdfSource, aggregate};
use crate::error::PointResult;
use crate::files::enumerate_file_paths;
use crate::input::JobConfig;
use crate::output::write_series_to_parquet;
use crate::render::{ChartVariant, render, show_image};
use std::path::PathBuf;

/// Enumerates, extracts and aggregates the point series described by `config`.
///
/// `progress` draws a progress bar over the file list.
///
/// # Errors
///
/// Fails on the first file that cannot be read; see
/// [`extract::extract_point_series`] for the individual causes.
pub fn run_point_job(config: &JobConfig, progress: bool) -> PointResult<CombinedSeries> {
    let paths = enumerate_file_paths(&config.files)?;
    ::log::info!(
        "Reading {} files from {}",
        paths.len(),
        config.files.data_dir
    );

    let source = NetcdfSource::new(config.variables.clone(), config.point.geo_point());
    aggregate(&paths, &source, progress)
}

/// Runs the job and renders the requested chart variant.
///
/// This function orchestrates the entire pipeline:
/// 1. Builds the file list and reads every file
/// 2. Writes the combined series to Parquet when `series_output` is set
/// 3. Renders the chart to its configured PNG path
/// 4. Opens the image in the system viewer: by default for the dual-axis
///    chart only, or as `render.show` says when it is set
///
/// Returns the path of the written chart.
pub fn plot_point_job(
    config: &JobConfig,
    variant: ChartVariant,
    progress: bool,
) -> PointResult<PathBuf> {
    let series = run_point_job(config, progress)?;

    if let Some(series_output) = &config.series_output {
        let df = series.to_dataframe(&config.variables.primary, &config.variables.secondary)?;
        write_series_to_parquet(&df, series_output)?;
    }

    let chart = render(&series, &config.render, variant)?;

    if config.render.show_for(variant) {
        // the chart is already on disk, so a missing viewer does not fail the run
        if let Err(e) = show_image(&chart) {
            ::log::warn!("Could not display {}: {}", chart.display(), e);
        }
    }

    Ok(chart)
}
