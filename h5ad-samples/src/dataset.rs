use crate::error::SampleError;
use anndata::{AnnData, AnnDataOp, Backend};
use anndata_hdf5::H5;
use anyhow::Context;
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::info;

/// Opens an H5AD file read-only. The HDF5 backend is lazy, so nothing but the
/// file structure is touched until an element is read.
pub fn open_backed<P: AsRef<Path>>(path: P) -> anyhow::Result<AnnData<H5>> {
    let path = path.as_ref();
    info!("Reading H5AD file: {}", path.display());
    let adata = H5::open(path)
        .and_then(AnnData::<H5>::open)
        .with_context(|| SampleError::InputUnreadable {
            path: path.to_path_buf(),
        })?;
    info!(
        "{} observations x {} variables",
        adata.n_obs(),
        adata.n_vars()
    );
    Ok(adata)
}

/// Reads the full `obs` table into memory.
pub fn read_obs<B: Backend>(adata: &AnnData<B>) -> anyhow::Result<DataFrame> {
    adata
        .read_obs()
        .with_context(|| SampleError::InputUnreadable {
            path: adata.filename(),
        })
}

pub fn obs_columns(obs: &DataFrame) -> Vec<String> {
    obs.get_column_names()
        .iter()
        .map(|c| c.as_str().to_owned())
        .collect()
}

pub fn obs_names<A: AnnDataOp>(adata: &A) -> Vec<String> {
    adata.obs_names().into_vec()
}
