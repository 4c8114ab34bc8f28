//! # Input Configuration Module
//!
//! This module provides configuration parsing and validation for ncpoint jobs.
//! A job names the files to read, the point to sample, the variables to pull
//! out of each file and where the charts go.
//!
//! ## Configuration Structure
//!
//! A configuration file specifies:
//! - **files**: Data directory, start date, day count, step and file name template
//! - **point**: Target latitude/longitude
//! - **variables**: The two plotted fields plus the coordinate variable names
//! - **render**: Chart titles, labels, output paths and resolution
//! - **series_output**: Optional Parquet path for the combined series
//!
//! Every section has defaults, so an empty `{}` is a complete configuration
//! describing a February 2015 GLDAS NOAH run at Colonia Popular, Chaco.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ncpoint::input::JobConfig;
//!
//! // Load from file (JSON or YAML, chosen by extension)
//! let config = JobConfig::from_file("job.yaml")?;
//!
//! // Load from JSON string
//! let json = r#"
//! {
//!   "files": { "data_dir": "/data/gldas/2016", "start_date": "20160401", "num_days": 30 },
//!   "point": { "lat": -27.65, "lon": -58.77 }
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{PointError, PointResult};
use crate::locate::GeoPoint;
use crate::render::ChartVariant;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Highest accepted chart resolution. A 10 x 6 in figure at this value is
/// already 12000 x 7200 px.
pub const MAX_DPI: u32 = 1200;

/// Date format used by `files.start_date` and by the `{date}` template field.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Main configuration structure for ncpoint jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobConfig {
    /// Which files to read, in order
    pub files: FileSchedule,
    /// Target coordinate
    pub point: PointConfig,
    /// Variables read from each file
    pub variables: VariableConfig,
    /// Chart settings
    pub render: RenderConfig,
    /// Optional Parquet output for the combined series
    pub series_output: Option<String>,
}

/// Describes the ordered sequence of input files.
///
/// File names are produced by substituting `{date}` (YYYYMMDD) and `{hour}`
/// (two-digit hour) into `template` for every step of every day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchedule {
    /// Directory holding the model files
    pub data_dir: String,
    /// First day, formatted YYYYMMDD
    pub start_date: String,
    /// Number of consecutive days
    pub num_days: u32,
    /// Hours between files within a day; must divide 24
    pub step_hours: u32,
    /// File name template with `{date}` and `{hour}` fields
    pub template: String,
}

/// Target location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointConfig {
    /// Latitude in degrees north
    pub lat: f64,
    /// Longitude in degrees east
    pub lon: f64,
    /// Human-readable place name, only used in console output
    pub name: Option<String>,
}

/// Names of the variables read from every file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableConfig {
    /// Field plotted on the left axis
    pub primary: String,
    /// Field plotted on the right axis
    pub secondary: String,
    pub lon: String,
    pub lat: String,
    pub time: String,
}

/// Chart settings shared by both variants plus per-variant labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output resolution in dots per inch
    pub dpi: u32,
    /// Open the written chart in the system image viewer. When unset the
    /// dual-axis chart is shown and the single-series chart is not.
    pub show: Option<bool>,
    pub single: SingleChartConfig,
    pub dual: DualChartConfig,
}

/// Which combined series a single-series chart draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeriesChoice {
    #[default]
    Primary,
    Secondary,
}

/// Single-series line chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleChartConfig {
    pub output: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: SeriesChoice,
}

/// Dual-axis line chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualChartConfig {
    pub output: String,
    pub title: String,
    pub x_label: String,
    /// Legend entry for the primary series
    pub primary_label: String,
    /// Left axis description
    pub primary_axis_label: String,
    /// Legend entry for the secondary series
    pub secondary_label: String,
    /// Right axis description
    pub secondary_axis_label: String,
}

impl Default for FileSchedule {
    fn default() -> Self {
        Self {
            data_dir: "/mnt/ypy3_5/land/gldas/data/2015/".to_string(),
            start_date: "20150201".to_string(),
            num_days: 28,
            step_hours: 3,
            template: "GLDAS_NOAH025_3H.A{date}.{hour}00.021.nc4".to_string(),
        }
    }
}

impl Default for PointConfig {
    fn default() -> Self {
        Self {
            lat: -27.27,
            lon: -59.14,
            name: Some("Colonia Popular, Chaco".to_string()),
        }
    }
}

impl Default for VariableConfig {
    fn default() -> Self {
        Self {
            primary: "SoilMoi0_10cm_inst".to_string(),
            secondary: "Rainf_f_tavg".to_string(),
            lon: "lon".to_string(),
            lat: "lat".to_string(),
            time: "time".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            show: None,
            single: SingleChartConfig::default(),
            dual: DualChartConfig::default(),
        }
    }
}

impl Default for SingleChartConfig {
    fn default() -> Self {
        Self {
            output: "soil_region_sp.png".to_string(),
            title: "GLDAS NOAH-Soil Moisture (0_10cm underground)\n\n15 days Mar 2015 - Sáenz Peña,Chaco".to_string(),
            x_label: "Time".to_string(),
            y_label: "Soil Moisture (0_10cm) = (0,01 m3/m3)".to_string(),
            series: SeriesChoice::Primary,
        }
    }
}

impl Default for DualChartConfig {
    fn default() -> Self {
        Self {
            output: "sm_tpr_point_cp.png".to_string(),
            title: "GLDAS NOAH\nFebruary 2015 - Colonia Popular,Chaco".to_string(),
            x_label: "Time".to_string(),
            primary_label: "Soil moisture (0-10cm)".to_string(),
            primary_axis_label: "Soil moisture (kg m2) = (0,01 m3/m3)".to_string(),
            secondary_label: "Total precipitation rate".to_string(),
            secondary_axis_label: "Total precipitation rate (kg m-2 s1) = (mm seg)".to_string(),
        }
    }
}

impl PointConfig {
    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl RenderConfig {
    /// Whether the chart for `variant` is opened after it is written.
    pub fn show_for(&self, variant: ChartVariant) -> bool {
        self.show.unwrap_or(variant == ChartVariant::Dual)
    }
}

impl FileSchedule {
    /// Parses `start_date` as YYYYMMDD.
    pub fn start(&self) -> PointResult<NaiveDate> {
        NaiveDate::parse_from_str(self.start_date.trim(), DATE_FORMAT)
            .map_err(|_| PointError::InvalidDate(self.start_date.clone()))
    }

    /// Number of files per day implied by `step_hours`.
    pub fn steps_per_day(&self) -> u32 {
        if self.step_hours == 0 {
            0
        } else {
            24 / self.step_hours
        }
    }
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else
    /// as JSON. The result is not validated; call [`JobConfig::validate`].
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use ncpoint::input::JobConfig;
    ///
    /// let config = JobConfig::from_file("chaco_2015.json")?;
    /// println!("Reading {} days", config.files.num_days);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> PointResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Loads a job configuration from a JSON string.
    ///
    /// ```rust
    /// use ncpoint::input::JobConfig;
    ///
    /// let config = JobConfig::from_json(r#"{ "point": { "lat": -31.86, "lon": -63.75 } }"#)?;
    /// assert_eq!(config.files.num_days, 28);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_json(json_str: &str) -> PointResult<Self> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    /// Loads a job configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> PointResult<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    pub fn to_json(&self) -> PointResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> PointResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the configuration for values that cannot produce a run.
    ///
    /// # Errors
    ///
    /// - `start_date` is not a valid YYYYMMDD date
    /// - `num_days` is zero
    /// - `step_hours` is zero or does not divide 24
    /// - the template has no `{date}` field
    /// - the point coordinates are not finite
    /// - a variable name or output path is empty
    /// - `dpi` is zero or above [`MAX_DPI`]
    pub fn validate(&self) -> PointResult<()> {
        self.files.start()?;

        if self.files.num_days == 0 {
            return Err(PointError::InvalidConfig(
                "num_days must be at least 1".to_string(),
            ));
        }
        if self.files.step_hours == 0 || 24 % self.files.step_hours != 0 {
            return Err(PointError::InvalidConfig(format!(
                "step_hours must divide 24, got {}",
                self.files.step_hours
            )));
        }
        if !self.files.template.contains("{date}") {
            return Err(PointError::InvalidConfig(
                "file template must contain a {date} field".to_string(),
            ));
        }
        if !self.point.lat.is_finite() || !self.point.lon.is_finite() {
            return Err(PointError::InvalidConfig(format!(
                "point coordinates must be finite, got ({}, {})",
                self.point.lat, self.point.lon
            )));
        }

        let names = [
            ("primary", &self.variables.primary),
            ("secondary", &self.variables.secondary),
            ("lon", &self.variables.lon),
            ("lat", &self.variables.lat),
            ("time", &self.variables.time),
        ];
        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(PointError::InvalidConfig(format!(
                    "variable name '{}' cannot be empty",
                    field
                )));
            }
        }

        if self.render.dpi == 0 || self.render.dpi > MAX_DPI {
            return Err(PointError::InvalidConfig(format!(
                "dpi must be between 1 and {}, got {}",
                MAX_DPI, self.render.dpi
            )));
        }
        if self.render.single.output.trim().is_empty() || self.render.dual.output.trim().is_empty()
        {
            return Err(PointError::InvalidConfig(
                "chart output paths cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
