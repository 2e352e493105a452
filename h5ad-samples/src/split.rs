use crate::dataset::read_obs;
use crate::error::SampleError;
use crate::extract::{column_text, distinct_values};
use crate::obs_columns;
use crate::resolve::require_column_ci;
use anndata::data::SelectInfoElem;
use anndata::{AnnData, Backend};
use anndata_hdf5::H5;
use anyhow::Context;
use polars::prelude::StringChunked;
use std::path::Path;
use tracing::info;

/// `true` for every row whose value equals `sample` exactly. Nulls never
/// match.
pub fn sample_mask(samples: &StringChunked, sample: &str) -> Vec<bool> {
    samples.iter().map(|v| v == Some(sample)).collect()
}

/// Positions of the `true` entries of `mask`, in row order.
pub fn selected_rows(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, keep)| keep.then_some(i))
        .collect()
}

/// Writes the observations of `adata` whose `sample_column` (matched
/// case-insensitively) equals `sample` to a new H5AD file at `output`.
/// Observation-aligned elements are row-filtered, variable-aligned elements
/// and `uns` are copied as is. Nothing is written if the column or the
/// sample cannot be found. Returns the number of observations written.
pub fn split_sample<B: Backend, P: AsRef<Path>>(
    adata: &AnnData<B>,
    sample_column: &str,
    sample: &str,
    output: P,
) -> anyhow::Result<usize> {
    let output = output.as_ref();
    let obs = read_obs(adata)?;
    let column = require_column_ci(&obs_columns(&obs), sample_column)?;

    let samples = column_text(obs.column(&column)?)?;
    let available = distinct_values(&samples);
    info!(
        "Found {} unique samples in column '{}'",
        available.len(),
        column
    );
    info!("Samples: {:?}", available);

    if !available.iter().any(|s| s == sample) {
        return Err(SampleError::SampleNotFound {
            sample: sample.to_owned(),
            column,
            available,
        }
        .into());
    }

    info!("Extracting sample '{}'", sample);
    let rows = selected_rows(&sample_mask(&samples, sample));
    let n_obs = rows.len();
    info!("Sample contains {} observations", n_obs);

    info!("Writing output to: {}", output.display());
    let mut sw = libsw::Sw::new();
    sw.start()?;
    adata
        .write_select::<H5, _, _>(
            [SelectInfoElem::from(rows), SelectInfoElem::full()],
            output,
        )
        .with_context(|| SampleError::OutputWrite {
            path: output.to_path_buf(),
        })?;
    info!("writing the per-sample file took {:#?}", sw.elapsed());
    Ok(n_obs)
}
