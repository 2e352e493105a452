use std::path::PathBuf;
use thiserror::Error;

/// The kinds of failure the tools report. Every variant is fatal; callers
/// find the tag by downcasting the `anyhow::Error` they receive.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("unable to read H5AD file {}", .path.display())]
    InputUnreadable { path: PathBuf },

    #[error("Sample column '{column}' not found in anndata.obs; available columns: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("The following columns were not found in anndata.obs: {missing:?}; available columns: {available:?}")]
    ColumnsNotFound {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Sample '{sample}' not found in column '{column}'; available samples: {available:?}")]
    SampleNotFound {
        sample: String,
        column: String,
        available: Vec<String>,
    },

    /// Raised only under the strict consistency policy; each pair is
    /// (sample, column).
    #[error("metadata differs between observations of the same sample for: {pairs:?}")]
    InconsistentMetadata { pairs: Vec<(String, String)> },

    #[error("unable to write output file {}", .path.display())]
    OutputWrite { path: PathBuf },
}
