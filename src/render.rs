//! # Chart Rendering
//!
//! Draws a combined series as a PNG line chart with `plotters`, either one
//! series on a single axis or both series on twin y-axes sharing the synthetic
//! time index.
//!
//! Figure sizes are given in inches and font sizes in points, then scaled by
//! the configured DPI, so a 6.4 x 4.8 in figure at 300 dpi is 1920 x 1440 px.
//! Non-finite samples split a line into separate segments instead of being
//! drawn as zeros.

use crate::aggregate::CombinedSeries;
use crate::error::{PointError, PointResult};
use crate::input::{DualChartConfig, RenderConfig, SeriesChoice, SingleChartConfig};
use log::{debug, info};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

const TOMATO: RGBColor = RGBColor(255, 99, 71);
const ROYAL_BLUE: RGBColor = RGBColor(65, 105, 225);

const SINGLE_FIGURE: FigureSize = FigureSize {
    width_in: 10.0,
    height_in: 6.0,
};
const DUAL_FIGURE: FigureSize = FigureSize {
    width_in: 6.4,
    height_in: 4.8,
};

const FONT: &str = "sans-serif";
const TITLE_FONT: &str = "monospace";

/// Which chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartVariant {
    /// One series over the synthetic index
    Single,
    /// Both series on twin y-axes
    #[default]
    Dual,
}

/// Figure dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FigureSize {
    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        (
            (self.width_in * f64::from(dpi)).round() as u32,
            (self.height_in * f64::from(dpi)).round() as u32,
        )
    }
}

/// Points to pixels at the given resolution.
fn px(points: f64, dpi: u32) -> f64 {
    points * f64::from(dpi) / 72.0
}

fn render_err<E: std::fmt::Display>(e: E) -> PointError {
    PointError::Render(e.to_string())
}

/// Renders the requested variant and returns the path written.
pub fn render(
    series: &CombinedSeries,
    config: &RenderConfig,
    variant: ChartVariant,
) -> PointResult<PathBuf> {
    match variant {
        ChartVariant::Single => render_single(series, &config.single, config.dpi),
        ChartVariant::Dual => render_dual(series, &config.dual, config.dpi),
    }
}

/// Single-series line chart over the synthetic index.
pub fn render_single(
    series: &CombinedSeries,
    config: &SingleChartConfig,
    dpi: u32,
) -> PointResult<PathBuf> {
    let output = PathBuf::from(&config.output);
    let (width, height) = SINGLE_FIGURE.pixels(dpi);
    debug!(
        "Rendering single-series chart {}x{} to {}",
        width,
        height,
        output.display()
    );

    let values = match config.series {
        SeriesChoice::Primary => &series.primary,
        SeriesChoice::Secondary => &series.secondary,
    };
    let index = series.index();

    let root = BitMapBackend::new(&output, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let plot_area = draw_title(&root, &config.title, px(12.0, dpi), dpi)?;

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(px(8.0, dpi) as u32)
        .x_label_area_size(px(28.0, dpi) as u32)
        .y_label_area_size(px(44.0, dpi) as u32)
        .build_cartesian_2d(value_range(&index), value_range(values))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(10)
        .y_labels(8)
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .axis_desc_style((FONT, px(10.0, dpi)))
        .label_style((FONT, px(8.0, dpi)))
        .draw()
        .map_err(render_err)?;

    let stroke = (px(1.5, dpi) as u32).max(1);
    chart
        .draw_series(
            segments(&index, values)
                .into_iter()
                .map(|segment| PathElement::new(segment, ROYAL_BLUE.stroke_width(stroke))),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!("Chart written to {}", output.display());
    Ok(output.clone())
}

/// Dual-axis chart: primary on the left axis, secondary on the right, one
/// combined legend in the upper right corner.
pub fn render_dual(
    series: &CombinedSeries,
    config: &DualChartConfig,
    dpi: u32,
) -> PointResult<PathBuf> {
    let output = PathBuf::from(&config.output);
    let (width, height) = DUAL_FIGURE.pixels(dpi);
    debug!(
        "Rendering dual-axis chart {}x{} to {}",
        width,
        height,
        output.display()
    );

    let index = series.index();
    let x_range = value_range(&index);

    let root = BitMapBackend::new(&output, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let plot_area = draw_title(&root, &config.title, px(9.5, dpi), dpi)?;

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(px(6.0, dpi) as u32)
        .x_label_area_size(px(22.0, dpi) as u32)
        .y_label_area_size(px(36.0, dpi) as u32)
        .right_y_label_area_size(px(36.0, dpi) as u32)
        .build_cartesian_2d(x_range.clone(), value_range(&series.primary))
        .map_err(render_err)?
        .set_secondary_coord(x_range, value_range(&series.secondary));

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(10)
        .y_labels(8)
        .x_desc(config.x_label.as_str())
        .y_desc(config.primary_axis_label.as_str())
        .axis_desc_style((FONT, px(6.0, dpi)))
        .label_style((FONT, px(6.0, dpi)))
        .y_label_style((FONT, px(6.0, dpi)).into_font().color(&TOMATO))
        .draw()
        .map_err(render_err)?;

    chart
        .configure_secondary_axes()
        .y_labels(8)
        .y_desc(config.secondary_axis_label.as_str())
        .axis_desc_style((FONT, px(6.0, dpi)))
        .label_style((FONT, px(6.0, dpi)).into_font().color(&ROYAL_BLUE))
        .draw()
        .map_err(render_err)?;

    let stroke = (px(1.0, dpi) as u32).max(1);
    let legend_len = px(14.0, dpi) as i32;

    chart
        .draw_series(
            segments(&index, &series.primary)
                .into_iter()
                .map(|segment| PathElement::new(segment, TOMATO.stroke_width(stroke))),
        )
        .map_err(render_err)?
        .label(config.primary_label.as_str())
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + legend_len, y)], TOMATO.stroke_width(stroke))
        });

    chart
        .draw_secondary_series(
            segments(&index, &series.secondary)
                .into_iter()
                .map(|segment| PathElement::new(segment, ROYAL_BLUE.stroke_width(stroke))),
        )
        .map_err(render_err)?
        .label(config.secondary_label.as_str())
        .legend(move |(x, y)| {
            PathElement::new(
                vec![(x, y), (x + legend_len, y)],
                ROYAL_BLUE.stroke_width(stroke),
            )
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font((FONT, px(8.0, dpi)))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!("Chart written to {}", output.display());
    Ok(output.clone())
}

/// Draws a possibly multi-line, centered title across the top of `area` and
/// returns the area left below it.
fn draw_title<'a>(
    area: &DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>,
    title: &str,
    size_px: f64,
    dpi: u32,
) -> PointResult<DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>> {
    let lines: Vec<&str> = title.lines().collect();
    if lines.is_empty() {
        return Ok(area.clone());
    }

    let line_height = (size_px * 1.3).ceil() as u32;
    let top_pad = px(6.0, dpi) as u32;
    let title_height = top_pad * 2 + line_height * lines.len() as u32;
    let (title_area, rest) = area.split_vertically(title_height);

    let (width, _) = title_area.dim_in_pixel();
    let style = TextStyle::from((TITLE_FONT, size_px).into_font().style(FontStyle::Bold))
        .pos(Pos::new(HPos::Center, VPos::Top));

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let y = (top_pad + line_height * i as u32) as i32;
        title_area
            .draw(&Text::new(
                line.to_string(),
                ((width / 2) as i32, y),
                style.clone(),
            ))
            .map_err(render_err)?;
    }

    Ok(rest)
}

/// Axis range covering the finite values, padded by 5% on each side.
///
/// A constant series gets a non-zero range around its value, and a series
/// without finite values gets `0..1`.
pub fn value_range(values: &[f64]) -> Range<f64> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let span = max - min;
    if span == 0.0 {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
        return (min - pad)..(max + pad);
    }

    let pad = span * 0.05;
    (min - pad)..(max + pad)
}

/// Splits `(x, y)` pairs into runs of finite values.
pub fn segments(x: &[f64], y: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut result = Vec::new();
    let mut current = Vec::new();

    for (&xv, &yv) in x.iter().zip(y) {
        if yv.is_finite() {
            current.push((xv, yv));
        } else if !current.is_empty() {
            result.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Opens an image in the platform's default viewer and waits for the
/// launcher to exit.
///
/// # Errors
///
/// Fails when the launcher cannot be started or exits unsuccessfully.
pub fn show_image(path: &Path) -> PointResult<()> {
    let (program, mut command) = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(path);
        ("open", c)
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        ("cmd /C start", c)
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        ("xdg-open", c)
    };

    debug!("Opening {} with {}", path.display(), program);
    let status = command
        .status()
        .map_err(|e| PointError::Render(format!("failed to run {}: {}", program, e)))?;

    if !status.success() {
        return Err(PointError::Render(format!(
            "{} exited with {} for {}",
            program,
            status,
            path.display()
        )));
    }
    Ok(())
}
