//! # Parquet Output Module
//!
//! Writes the combined point series to a Parquet file so it can be reused
//! outside the chart (notebooks, other plotting tools, QA checks).

use crate::error::PointResult;
use log::debug;
use polars::prelude::*;
use std::fs::File;

/// Writes a DataFrame to a Parquet file, overwriting any existing file.
///
/// # Errors
///
/// This function will return an error if:
/// - The output path is not writable
/// - The DataFrame cannot be encoded as Parquet
pub fn write_series_to_parquet(df: &DataFrame, output_path: &str) -> PointResult<()> {
    debug!("Writing series to parquet file: {}", output_path);
    debug!("DataFrame shape: {:?}", df.shape());
    debug!("DataFrame schema:\n{:?}", df.schema());
    debug!("First few rows:\n{}", df.head(Some(5)));

    let file = File::create(output_path)?;
    let mut df_clone = df.clone();
    ParquetWriter::new(file).finish(&mut df_clone)?;

    debug!("Successfully wrote parquet file: {}", output_path);
    Ok(())
}
