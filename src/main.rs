use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use log::{debug, info, warn};
use ncpoint::aggregate::CombinedSeries;
use ncpoint::cli::{
    Cli, Commands, JobArgs, OutputFormat, PlotOverrides, render_template, resolve_config,
    resolve_plot_config, validation_target,
};
use ncpoint::files::enumerate_file_names;
use ncpoint::info::{get_netcdf_info, print_file_info_human, print_file_info_json, print_file_info_yaml};
use ncpoint::input::JobConfig;
use ncpoint::log::{config_echo, show_farewell_with_timing, show_greeting, show_series_summary};
use ncpoint::output::write_series_to_parquet;
use ncpoint::{plot_point_job, run_point_job};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    run(cli)
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    let banners = !cli.quiet && cli.output_format == OutputFormat::Human;

    match cli.command {
        Commands::Plot {
            job,
            single,
            series,
            output,
            dpi,
            show,
            no_show,
            series_output,
        } => {
            let overrides = PlotOverrides {
                single,
                series,
                output,
                dpi,
                show,
                no_show,
                series_output,
            };
            run_plot(config_path.as_deref(), &job, &overrides, banners, !cli.quiet)
        }
        Commands::Extract { job, output } => run_extract(
            config_path.as_deref(),
            &job,
            output.as_deref(),
            &cli.output_format,
            banners,
            !cli.quiet,
        ),
        Commands::Files { job, check } => {
            run_files(config_path.as_deref(), &job, check, &cli.output_format)
        }
        Commands::Info {
            file,
            detailed,
            variable,
            format,
        } => {
            let format = format.unwrap_or(cli.output_format);
            run_info(&file, variable.as_deref(), detailed, &format)
        }
        Commands::Template { output, format } => {
            let text = render_template(&JobConfig::default(), &format)?;
            write_or_print(output.as_deref(), &text)
        }
        Commands::Validate {
            config_file,
            detailed,
        } => run_validate(config_file.as_deref(), config_path.as_deref(), detailed),
        Commands::Completions { shell, output } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    generate(shell, &mut cmd, name, &mut file);
                    info!("Completions written to {}", path.display());
                }
                None => generate(shell, &mut cmd, name, &mut io::stdout()),
            }
            Ok(())
        }
    }
}

fn config_label(config_path: Option<&Path>) -> String {
    config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string())
}

fn run_plot(
    config_path: Option<&Path>,
    job: &JobArgs,
    overrides: &PlotOverrides,
    banners: bool,
    progress: bool,
) -> Result<()> {
    let start_time = Instant::now();
    if banners {
        show_greeting(&config_label(config_path));
    }

    let config = resolve_plot_config(config_path, job, overrides)?;
    if banners {
        config_echo(&config);
    }

    let chart = plot_point_job(&config, overrides.variant(), progress)?;
    debug!("Plot finished: {}", chart.display());

    if banners {
        show_farewell_with_timing(start_time.elapsed());
    }
    Ok(())
}

fn run_extract(
    config_path: Option<&Path>,
    job: &JobArgs,
    output: Option<&str>,
    format: &OutputFormat,
    banners: bool,
    progress: bool,
) -> Result<()> {
    let start_time = Instant::now();
    if banners {
        show_greeting(&config_label(config_path));
    }

    let mut config = resolve_config(config_path, job)?;
    if let Some(output) = output {
        config.series_output = Some(output.to_string());
    }
    if banners {
        config_echo(&config);
    }

    let series = run_point_job(&config, progress)?;

    match &config.series_output {
        Some(path) => {
            let df = series.to_dataframe(&config.variables.primary, &config.variables.secondary)?;
            write_series_to_parquet(&df, path)?;
            info!("Series written to {}", path);
            if banners {
                show_series_summary(&series);
            }
        }
        None => print_series(&series, &config, format)?,
    }

    if banners {
        show_farewell_with_timing(start_time.elapsed());
    }
    Ok(())
}

#[derive(Serialize)]
struct SeriesRow {
    step: usize,
    time: String,
    primary: f64,
    secondary: f64,
}

fn series_rows(series: &CombinedSeries) -> Vec<SeriesRow> {
    series
        .times
        .iter()
        .zip(series.primary.iter().zip(series.secondary.iter()))
        .enumerate()
        .map(|(step, (time, (p, s)))| SeriesRow {
            step,
            time: time.format("%Y-%m-%d %H:%M:%S").to_string(),
            primary: *p,
            secondary: *s,
        })
        .collect()
}

fn print_series(series: &CombinedSeries, config: &JobConfig, format: &OutputFormat) -> Result<()> {
    let rows = series_rows(series);
    let primary = &config.variables.primary;
    let secondary = &config.variables.secondary;

    match format {
        OutputFormat::Human => {
            show_series_summary(series);
            println!();
            println!("{:>6}  {:<19}  {:>16}  {:>16}", "step", "time", primary, secondary);
            for row in &rows {
                println!(
                    "{:>6}  {:<19}  {:>16.6}  {:>16.6e}",
                    row.step, row.time, row.primary, row.secondary
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&rows)?);
        }
        OutputFormat::Csv => {
            println!("step,time,{},{}", primary, secondary);
            for row in &rows {
                println!(
                    "{},{},{},{}",
                    row.step, row.time, row.primary, row.secondary
                );
            }
        }
    }
    Ok(())
}

fn run_files(
    config_path: Option<&Path>,
    job: &JobArgs,
    check: bool,
    format: &OutputFormat,
) -> Result<()> {
    let config = resolve_config(config_path, job)?;
    let names = enumerate_file_names(&config.files)?;
    let data_dir = PathBuf::from(&config.files.data_dir);

    let missing: Vec<&String> = if check {
        names
            .iter()
            .filter(|name| !data_dir.join(name).exists())
            .collect()
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "data_dir": config.files.data_dir,
                "files": names,
                "missing": missing,
            }))?
        ),
        OutputFormat::Yaml => println!(
            "{}",
            serde_yaml::to_string(&serde_json::json!({
                "data_dir": config.files.data_dir,
                "files": names,
                "missing": missing,
            }))?
        ),
        OutputFormat::Human | OutputFormat::Csv => {
            for name in &names {
                if check && missing.contains(&name) {
                    println!("{}  (missing)", name);
                } else {
                    println!("{}", name);
                }
            }
        }
    }

    if check {
        if missing.is_empty() {
            info!("All {} files present in {}", names.len(), data_dir.display());
        } else {
            warn!(
                "{} of {} files missing from {}",
                missing.len(),
                names.len(),
                data_dir.display()
            );
        }
    }
    Ok(())
}

fn run_info(file: &Path, variable: Option<&str>, detailed: bool, format: &OutputFormat) -> Result<()> {
    let info = get_netcdf_info(file, variable, detailed)?;
    match format {
        OutputFormat::Json => print_file_info_json(&info)?,
        OutputFormat::Yaml => print_file_info_yaml(&info)?,
        OutputFormat::Human | OutputFormat::Csv => print_file_info_human(&info),
    }
    Ok(())
}

fn run_validate(explicit: Option<&Path>, global: Option<&Path>, detailed: bool) -> Result<()> {
    let path = validation_target(explicit, global)?;
    debug!("Validating {}", path.display());

    let config = JobConfig::from_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    println!("Configuration is valid: {}", path.display());
    if detailed {
        config_echo(&config);
    }
    Ok(())
}

fn write_or_print(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Template written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
