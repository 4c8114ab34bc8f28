use crate::aggregate::CombinedSeries;
use crate::input::JobConfig;
use std::time::Duration;

pub fn show_greeting(config_source: &str) {
    println!("=== NetCDF Point Series Plotter ===");
    println!("Configuration: {}", config_source);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Data directory: {}", config.files.data_dir);
    println!(
        "  Period: {} + {} days, every {} h",
        config.files.start_date, config.files.num_days, config.files.step_hours
    );
    match &config.point.name {
        Some(name) => println!(
            "  Point: {} ({}, {})",
            name, config.point.lat, config.point.lon
        ),
        None => println!("  Point: ({}, {})", config.point.lat, config.point.lon),
    }
    println!(
        "  Variables: {} / {}",
        config.variables.primary, config.variables.secondary
    );
}

pub fn show_series_summary(series: &CombinedSeries) {
    println!("\nSeries:");
    println!("  Files read: {}", series.files);
    println!("  Samples: {}", series.len());
    println!(
        "  Grid cell: [{}, {}] at ({}, {})",
        series.cell.lat_index, series.cell.lon_index, series.cell.lat, series.cell.lon
    );
    if let (Some(first), Some(last)) = (series.times.first(), series.times.last()) {
        println!("  Time span: {} .. {}", first, last);
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Completed in {:.2}s ===", elapsed.as_secs_f64());
}
