use crate::resolve::Resolution;
use anyhow::Context;
use polars::prelude::{Column, DataFrame, DataType, StringChunked};
use std::collections::HashSet;
use tracing::{info, warn};

/// The values of `column` as text. Categoricals yield their labels, numbers
/// their decimal rendering; nulls stay null.
pub fn column_text(column: &Column) -> anyhow::Result<StringChunked> {
    let text = column
        .cast(&DataType::String)
        .with_context(|| format!("column '{}' cannot be read as text", column.name()))?;
    Ok(text.as_materialized_series().str()?.clone())
}

/// Distinct non-null values in order of first occurrence.
pub fn distinct_values(text: &StringChunked) -> Vec<String> {
    let mut seen = HashSet::new();
    text.iter()
        .flatten()
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

/// The sample identifiers for a resolved column: its distinct values, or,
/// with no column, one identifier per observation taken from `obs_names`.
pub fn sample_ids(
    obs: &DataFrame,
    obs_names: Vec<String>,
    resolution: &Resolution,
) -> anyhow::Result<Vec<String>> {
    match &resolution.column {
        Some(col) => {
            let text = column_text(obs.column(col)?)?;
            let samples = distinct_values(&text);
            info!(
                "Found {} unique samples in column '{}'",
                samples.len(),
                col
            );
            Ok(samples)
        }
        None => {
            warn!("Using cell barcodes as sample identifiers");
            Ok(obs_names)
        }
    }
}
