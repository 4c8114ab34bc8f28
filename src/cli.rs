//! # CLI Module
//!
//! This module provides the command-line interface for ncpoint, including:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML)
//! - Environment variable support with the NCPOINT_ prefix
//! - Configuration merging: CLI flags > environment > config file > defaults
//! - Subcommands for plotting, extraction, file listing and inspection

use crate::error::{PointError, PointResult};
use crate::input::{JobConfig, SeriesChoice};
use crate::render::ChartVariant;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Point time-series extraction and charting for gridded NetCDF model output
#[derive(Parser, Debug)]
#[command(name = "ncpoint")]
#[command(about = "Extract a point time series from gridded NetCDF files and chart it")]
#[command(version)]
#[command(author = "Rogerio Alves <rjmalves@users.noreply.github.com>")]
#[command(long_about = "
ncpoint reads a date-ordered sequence of gridded NetCDF files (GLDAS NOAH by
default), samples two variables at the grid cell nearest a target point and
draws them as a single-series or dual-axis PNG chart.

EXAMPLES:
  # Dual-axis soil moisture / precipitation chart with the built-in defaults
  ncpoint plot

  # Another station and month
  ncpoint plot --point=-31.86,-63.75 --start-date 20221101 --days 30 \\
    --data-dir /data/gldas/2022 -o manfredi_nov2022.png

  # Single-series chart of the precipitation rate
  ncpoint plot --single --series secondary

  # Dump the combined series as CSV
  ncpoint --output-format csv extract

  # Check which input files are missing
  ncpoint files --check

  # Using a config file
  ncpoint --config chaco.yaml plot --no-show
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "NCPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the point series and render a chart
    #[command(long_about = "
Read every enumerated file, build the combined point series and render it.

The default is the dual-axis chart (primary variable on the left axis,
secondary on the right) and it is opened in the system image viewer once
written. --single draws one series instead and is not opened unless --show
is given.

EXAMPLES:
  ncpoint plot
  ncpoint plot --no-show
  ncpoint plot --single -o soil.png
  ncpoint plot --single --dpi 150 --show
  ncpoint plot --series-output series.parquet
")]
    Plot {
        #[command(flatten)]
        job: JobArgs,

        /// Draw a single-series chart instead of the dual-axis one
        #[arg(long)]
        single: bool,

        /// Series drawn by --single
        #[arg(long, value_enum, requires = "single")]
        series: Option<SeriesArg>,

        /// Override the chart output path
        #[arg(short, long, env = "NCPOINT_CHART_OUTPUT")]
        output: Option<String>,

        /// Override the chart resolution
        #[arg(long, env = "NCPOINT_DPI")]
        dpi: Option<u32>,

        /// Open the chart in the system image viewer after writing it
        #[arg(long, env = "NCPOINT_SHOW", conflicts_with = "no_show")]
        show: bool,

        /// Do not open the chart, even the dual-axis one
        #[arg(long, env = "NCPOINT_NO_SHOW")]
        no_show: bool,

        /// Also write the combined series to this Parquet file
        #[arg(long, env = "NCPOINT_SERIES_OUTPUT")]
        series_output: Option<String>,
    },

    /// Extract the point series and print or export it
    #[command(long_about = "
Read every enumerated file and print the combined series using the global
--output-format (human, json, yaml or csv). With -o the series is written to
a Parquet file instead.

EXAMPLES:
  ncpoint extract
  ncpoint --output-format csv extract > series.csv
  ncpoint extract -o series.parquet
")]
    Extract {
        #[command(flatten)]
        job: JobArgs,

        /// Write the series to this Parquet file instead of printing it
        #[arg(short, long, env = "NCPOINT_SERIES_OUTPUT")]
        output: Option<String>,
    },

    /// List the file names the job would read
    Files {
        #[command(flatten)]
        job: JobArgs,

        /// Report which files are missing from the data directory
        #[arg(long)]
        check: bool,
    },

    /// Show information about a NetCDF file
    #[command(long_about = "
Inspect a NetCDF file and display its dimensions, variables and attributes.
Use it to find the variable names of a new model product.

EXAMPLES:
  ncpoint info GLDAS_NOAH025_3H.A20150201.0000.021.nc4
  ncpoint info data.nc4 -n SoilMoi0_10cm_inst
  ncpoint info data.nc4 --detailed --format json
")]
    Info {
        /// NetCDF file path
        file: PathBuf,

        /// Show global attributes as well
        #[arg(long)]
        detailed: bool,

        /// Show only specific variable info
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for file information
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print a configuration file with every default filled in
    Template {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate (default: --config)
        config_file: Option<PathBuf>,

        /// Print the resolved configuration
        #[arg(long)]
        detailed: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Job overrides shared by the commands that read data files.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct JobArgs {
    /// Directory holding the model files
    #[arg(long, env = "NCPOINT_DATA_DIR")]
    pub data_dir: Option<String>,

    /// First day, YYYYMMDD
    #[arg(long, env = "NCPOINT_START_DATE")]
    pub start_date: Option<String>,

    /// Number of days to read
    #[arg(long = "days", env = "NCPOINT_DAYS")]
    pub num_days: Option<u32>,

    /// Hours between files
    #[arg(long, env = "NCPOINT_STEP_HOURS")]
    pub step_hours: Option<u32>,

    /// File name template with {date} and {hour} fields
    #[arg(long, env = "NCPOINT_TEMPLATE")]
    pub template: Option<String>,

    /// Target point: lat,lon
    #[arg(long, env = "NCPOINT_POINT", value_parser = parse_point, allow_hyphen_values = true)]
    pub point: Option<PointArg>,

    /// Primary variable (left axis)
    #[arg(long, env = "NCPOINT_PRIMARY")]
    pub primary: Option<String>,

    /// Secondary variable (right axis)
    #[arg(long, env = "NCPOINT_SECONDARY")]
    pub secondary: Option<String>,
}

#[derive(ValueEnum, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output (where applicable)
    Csv,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesArg {
    Primary,
    Secondary,
}

impl From<SeriesArg> for SeriesChoice {
    fn from(arg: SeriesArg) -> Self {
        match arg {
            SeriesArg::Primary => SeriesChoice::Primary,
            SeriesArg::Secondary => SeriesChoice::Secondary,
        }
    }
}

/// Target point argument from command line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointArg {
    pub lat: f64,
    pub lon: f64,
}

/// Parse a point from a command line argument
/// Format: lat,lon
pub fn parse_point(s: &str) -> Result<PointArg, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Point must be in format 'lat,lon'".to_string());
    }

    let lat = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid latitude value")?;
    let lon = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid longitude value")?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be within [-90, 90]".to_string());
    }
    if !(-180.0..=360.0).contains(&lon) {
        return Err("Longitude must be within [-180, 360]".to_string());
    }

    Ok(PointArg { lat, lon })
}

impl JobArgs {
    /// Applies every override that was given, leaving the rest of `config`
    /// untouched.
    pub fn apply(&self, config: &mut JobConfig) {
        if let Some(data_dir) = &self.data_dir {
            config.files.data_dir = data_dir.clone();
        }
        if let Some(start_date) = &self.start_date {
            config.files.start_date = start_date.clone();
        }
        if let Some(num_days) = self.num_days {
            config.files.num_days = num_days;
        }
        if let Some(step_hours) = self.step_hours {
            config.files.step_hours = step_hours;
        }
        if let Some(template) = &self.template {
            config.files.template = template.clone();
        }
        if let Some(point) = self.point {
            config.point.lat = point.lat;
            config.point.lon = point.lon;
            config.point.name = None;
        }
        if let Some(primary) = &self.primary {
            config.variables.primary = primary.clone();
        }
        if let Some(secondary) = &self.secondary {
            config.variables.secondary = secondary.clone();
        }
    }
}

/// Loads the config file when one is given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> PointResult<JobConfig> {
    match path {
        Some(path) => JobConfig::from_file(path),
        None => Ok(JobConfig::default()),
    }
}

/// Plot-specific overrides, applied after [`JobArgs::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotOverrides {
    pub single: bool,
    pub series: Option<SeriesArg>,
    pub output: Option<String>,
    pub dpi: Option<u32>,
    pub show: bool,
    pub no_show: bool,
    pub series_output: Option<String>,
}

impl PlotOverrides {
    pub fn variant(&self) -> ChartVariant {
        if self.single {
            ChartVariant::Single
        } else {
            ChartVariant::Dual
        }
    }

    pub fn apply(&self, config: &mut JobConfig) {
        if let Some(series) = self.series {
            config.render.single.series = series.into();
        }
        if let Some(output) = &self.output {
            match self.variant() {
                ChartVariant::Single => config.render.single.output = output.clone(),
                ChartVariant::Dual => config.render.dual.output = output.clone(),
            }
        }
        if let Some(dpi) = self.dpi {
            config.render.dpi = dpi;
        }
        if self.show {
            config.render.show = Some(true);
        } else if self.no_show {
            config.render.show = Some(false);
        }
        if let Some(series_output) = &self.series_output {
            config.series_output = Some(series_output.clone());
        }
    }
}

/// Builds the effective configuration for a data command.
///
/// Priority: CLI flags and NCPOINT_* variables (resolved by clap) over the
/// config file over the built-in defaults. The result is validated.
pub fn resolve_config(config_path: Option<&Path>, job: &JobArgs) -> PointResult<JobConfig> {
    let mut config = load_config(config_path)?;
    job.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Same as [`resolve_config`] with plot overrides layered on top.
pub fn resolve_plot_config(
    config_path: Option<&Path>,
    job: &JobArgs,
    plot: &PlotOverrides,
) -> PointResult<JobConfig> {
    let mut config = load_config(config_path)?;
    job.apply(&mut config);
    plot.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Serializes a configuration in the requested format.
pub fn render_template(config: &JobConfig, format: &ConfigFormat) -> PointResult<String> {
    match format {
        ConfigFormat::Json => config.to_json(),
        ConfigFormat::Yaml => config.to_yaml(),
    }
}

/// Resolves which config file `validate` should check.
pub fn validation_target(
    explicit: Option<&Path>,
    global: Option<&Path>,
) -> PointResult<PathBuf> {
    explicit
        .or(global)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            PointError::InvalidConfig(
                "no configuration file given (pass a path or --config)".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Global mutex to ensure environment variable tests run sequentially
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const JOB_ENV_VARS: &[&str] = &[
        "NCPOINT_DATA_DIR",
        "NCPOINT_START_DATE",
        "NCPOINT_DAYS",
        "NCPOINT_STEP_HOURS",
        "NCPOINT_TEMPLATE",
        "NCPOINT_POINT",
        "NCPOINT_PRIMARY",
        "NCPOINT_SECONDARY",
        "NCPOINT_CONFIG",
    ];

    fn save_env() -> Vec<(&'static str, Option<String>)> {
        JOB_ENV_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect()
    }

    fn restore_env(saved: Vec<(&'static str, Option<String>)>) {
        unsafe {
            for (key, value) in saved {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_parse_point() {
        let result = parse_point("-27.27,-59.14").unwrap();
        assert_eq!(result.lat, -27.27);
        assert_eq!(result.lon, -59.14);

        let result = parse_point(" -31.86 , -63.75 ").unwrap();
        assert_eq!(result.lat, -31.86);
        assert_eq!(result.lon, -63.75);

        // Test invalid formats
        assert!(parse_point("-27.27").is_err());
        assert!(parse_point("-27.27,-59.14,3").is_err());
        assert!(parse_point("south,-59.14").is_err());
        assert!(parse_point("95.0,-59.14").is_err()); // latitude out of range
        assert!(parse_point("-27.27,400.0").is_err()); // longitude out of range
    }

    #[test]
    fn test_job_args_apply_only_overrides_given_fields() {
        let mut config = JobConfig::default();
        let args = JobArgs {
            start_date: Some("20160401".to_string()),
            num_days: Some(30),
            point: Some(PointArg {
                lat: -27.65,
                lon: -58.77,
            }),
            ..JobArgs::default()
        };

        args.apply(&mut config);

        assert_eq!(config.files.start_date, "20160401");
        assert_eq!(config.files.num_days, 30);
        assert_eq!(config.point.lat, -27.65);
        assert_eq!(config.point.lon, -58.77);
        assert_eq!(config.point.name, None);
        // untouched
        assert_eq!(config.files.step_hours, 3);
        assert_eq!(config.variables.primary, "SoilMoi0_10cm_inst");
    }

    #[test]
    fn test_plot_overrides_target_selected_variant() {
        let mut config = JobConfig::default();
        let overrides = PlotOverrides {
            single: true,
            series: Some(SeriesArg::Secondary),
            output: Some("rain.png".to_string()),
            dpi: Some(100),
            ..PlotOverrides::default()
        };

        overrides.apply(&mut config);

        assert_eq!(overrides.variant(), ChartVariant::Single);
        assert_eq!(config.render.single.output, "rain.png");
        assert_eq!(config.render.dual.output, "sm_tpr_point_cp.png");
        assert_eq!(config.render.single.series, SeriesChoice::Secondary);
        assert_eq!(config.render.dpi, 100);
        assert_eq!(config.render.show, None);
        assert!(!config.render.show_for(overrides.variant()));
    }

    #[test]
    fn test_show_defaults_per_variant() {
        let mut config = JobConfig::default();
        PlotOverrides::default().apply(&mut config);
        assert!(config.render.show_for(ChartVariant::Dual));
        assert!(!config.render.show_for(ChartVariant::Single));

        let no_show = PlotOverrides {
            no_show: true,
            ..PlotOverrides::default()
        };
        no_show.apply(&mut config);
        assert_eq!(config.render.show, Some(false));
        assert!(!config.render.show_for(ChartVariant::Dual));

        let show = PlotOverrides {
            single: true,
            show: true,
            ..PlotOverrides::default()
        };
        show.apply(&mut config);
        assert!(config.render.show_for(ChartVariant::Single));
    }

    #[test]
    fn test_environment_variables_fill_job_args() {
        // Acquire mutex to ensure exclusive access to environment variables
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        let saved = save_env();

        unsafe {
            for key in JOB_ENV_VARS {
                std::env::remove_var(key);
            }
            std::env::set_var("NCPOINT_START_DATE", "20221101");
            std::env::set_var("NCPOINT_DAYS", "30");
            std::env::set_var("NCPOINT_POINT", "-31.86,-63.75");
        }

        let cli = Cli::try_parse_from(["ncpoint", "files"]).unwrap();
        if let Commands::Files { job, check } = &cli.command {
            assert!(!check);
            assert_eq!(job.start_date.as_deref(), Some("20221101"));
            assert_eq!(job.num_days, Some(30));
            assert_eq!(
                job.point,
                Some(PointArg {
                    lat: -31.86,
                    lon: -63.75
                })
            );
            assert_eq!(job.data_dir, None);
        } else {
            panic!("Expected Files command");
        }

        restore_env(saved);
    }

    #[test]
    fn test_cli_flags_take_priority_over_environment() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        let saved = save_env();

        unsafe {
            for key in JOB_ENV_VARS {
                std::env::remove_var(key);
            }
            std::env::set_var("NCPOINT_DAYS", "30");
            std::env::set_var("NCPOINT_PRIMARY", "Tair_f_inst");
        }

        let cli = Cli::try_parse_from(["ncpoint", "files", "--days", "5"]).unwrap();
        if let Commands::Files { job, .. } = &cli.command {
            assert_eq!(job.num_days, Some(5));
            assert_eq!(job.primary.as_deref(), Some("Tair_f_inst"));
        } else {
            panic!("Expected Files command");
        }

        restore_env(saved);
    }

    #[test]
    fn test_resolve_config_layers_file_then_flags() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.yaml");
        std::fs::write(
            &path,
            "files:\n  start_date: \"20160401\"\n  num_days: 10\npoint:\n  lat: -27.65\n  lon: -58.77\n",
        )
        .unwrap();

        let args = JobArgs {
            num_days: Some(2),
            ..JobArgs::default()
        };
        let config = resolve_config(Some(&path), &args).unwrap();

        assert_eq!(config.files.start_date, "20160401"); // from file
        assert_eq!(config.files.num_days, 2); // flag wins
        assert_eq!(config.point.lat, -27.65); // from file
        assert_eq!(config.files.step_hours, 3); // default
    }

    #[test]
    fn test_resolve_config_rejects_invalid_result() {
        let args = JobArgs {
            step_hours: Some(5),
            ..JobArgs::default()
        };
        assert!(matches!(
            resolve_config(None, &args),
            Err(PointError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validation_target() {
        let explicit = PathBuf::from("a.json");
        let global = PathBuf::from("b.json");

        assert_eq!(
            validation_target(Some(&explicit), Some(&global)).unwrap(),
            explicit
        );
        assert_eq!(validation_target(None, Some(&global)).unwrap(), global);
        assert!(validation_target(None, None).is_err());
    }
}
