//! Sample-oriented utilities for H5AD files: listing the `obs` columns,
//! extracting sample identifiers, projecting per-sample metadata into a
//! typed CSV, and splitting a multi-sample file into per-sample files.

pub mod dataset;
pub mod error;
pub mod extract;
pub mod output;
pub mod project;
pub mod resolve;
pub mod split;

pub use dataset::{obs_columns, open_backed};
pub use error::SampleError;
pub use project::{project_columns, type_label, ConsistencyPolicy, TypeLabel};
pub use resolve::{resolve_column, Resolution, ResolvedBy, SAMPLE_COLUMN_FALLBACKS};
pub use split::split_sample;

use anyhow::bail;
use std::path::Path;
use tracing::{error, info};

fn ensure_input(input: &Path) -> anyhow::Result<()> {
    if !input.is_file() {
        error!(
            "the H5AD file was expected at {} but could not be found",
            input.display()
        );
        bail!(SampleError::InputUnreadable {
            path: input.to_path_buf()
        });
    }
    Ok(())
}

/// The output H5AD is created while the input is still open for reading, so
/// the two must not be the same file.
fn ensure_distinct_output(input: &Path, output: &Path) -> anyhow::Result<()> {
    if !output.exists() {
        return Ok(());
    }
    if input.canonicalize()? == output.canonicalize()? {
        error!(
            "the output {} is the input file; refusing to overwrite it",
            output.display()
        );
        bail!(SampleError::OutputWrite {
            path: output.to_path_buf()
        });
    }
    Ok(())
}

/// Writes the names of the `obs` columns of `input` to `output`, one per row.
pub fn list_columns<P: AsRef<Path>>(input: P, output: P) -> anyhow::Result<Vec<String>> {
    let input = input.as_ref();
    ensure_input(input)?;
    let adata = open_backed(input)?;
    let columns = obs_columns(&dataset::read_obs(&adata)?);

    output::write_single_column(output.as_ref(), &columns)?;
    info!("Available columns: {:?}", columns);
    Ok(columns)
}

/// Writes the sample identifiers of `input` to `sample_output`, one per row.
///
/// The sample column is `column` if it matches an `obs` column
/// case-insensitively, otherwise the first of [`SAMPLE_COLUMN_FALLBACKS`]
/// that does. With no match every observation name is written instead.
/// When `column_output` is given, the `obs` column names are written there
/// as well.
pub fn extract_samples<P: AsRef<Path>>(
    input: P,
    sample_output: P,
    column_output: Option<P>,
    column: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    let input = input.as_ref();
    let sample_output = sample_output.as_ref();
    ensure_input(input)?;

    let adata = open_backed(input)?;
    let obs = dataset::read_obs(&adata)?;
    let columns = obs_columns(&obs);

    let resolution = resolve_column(&columns, column, &SAMPLE_COLUMN_FALLBACKS);
    let samples = extract::sample_ids(&obs, dataset::obs_names(&adata), &resolution)?;

    output::write_single_column(sample_output, &samples)?;

    if let Some(column_output) = column_output {
        let column_output = column_output.as_ref();
        output::write_single_column(column_output, &columns)?;
        info!("Columns list written to: {}", column_output.display());
    }

    info!("Successfully extracted {} samples", samples.len());
    info!("Output written to: {}", sample_output.display());
    Ok(samples)
}

/// Writes one row per distinct value of `sample_column` with the first
/// observation's value of each of `columns`, under `<name>:<Long|Double|String>`
/// headers. All columns are matched case-sensitively and checked before
/// anything is written.
pub fn extract_columns<P: AsRef<Path>>(
    input: P,
    output: P,
    sample_column: &str,
    columns: &[String],
    policy: ConsistencyPolicy,
) -> anyhow::Result<usize> {
    let input = input.as_ref();
    let output = output.as_ref();
    ensure_input(input)?;

    let adata = open_backed(input)?;
    let obs = dataset::read_obs(&adata)?;
    let projected = project_columns(&obs, sample_column, columns, policy)?;

    output::write_table(output, &projected)?;
    info!(
        "Successfully extracted {} samples and {} columns",
        projected.height(),
        columns.len()
    );
    info!("Output written to: {}", output.display());
    Ok(projected.height())
}

/// Writes the observations of `input` belonging to `sample` to a new H5AD
/// file at `output`. See [`split_sample`].
pub fn split_h5ad<P: AsRef<Path>>(
    input: P,
    output: P,
    sample_column: &str,
    sample: &str,
) -> anyhow::Result<usize> {
    let input = input.as_ref();
    ensure_input(input)?;
    ensure_distinct_output(input, output.as_ref())?;

    let mut sw = libsw::Sw::new();
    sw.start()?;
    let adata = open_backed(input)?;
    let n_obs = split_sample(&adata, sample_column, sample, output)?;
    adata.close()?;
    info!("splitting took {:#?}", sw.elapsed());

    info!(
        "Successfully created per-sample H5AD file for '{}'",
        sample
    );
    Ok(n_obs)
}
