use crate::error::SampleError;
use std::collections::HashMap;
use tracing::{info, warn};

/// Column names tried, in order, when the requested sample column is absent.
pub const SAMPLE_COLUMN_FALLBACKS: [&str; 3] = ["sample", "samples", "replicate"];

/// How a sample column was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Requested,
    Fallback,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The matching column, in the casing used by the file.
    pub column: Option<String>,
    pub source: ResolvedBy,
}

/// lower-cased name -> name as it appears in `obs`. As with a map built in
/// column order, a later column wins when two names fold to the same key.
fn case_folded(available: &[String]) -> HashMap<String, &str> {
    available
        .iter()
        .map(|c| (c.to_lowercase(), c.as_str()))
        .collect()
}

/// Resolves the sample column against the `available` obs columns. A
/// `requested` name that matches case-insensitively always wins; otherwise the
/// first of `fallbacks` present is used. No other normalisation is applied.
pub fn resolve_column(
    available: &[String],
    requested: Option<&str>,
    fallbacks: &[&str],
) -> Resolution {
    let column_map = case_folded(available);

    if let Some(req) = requested {
        if let Some(col) = column_map.get(&req.to_lowercase()) {
            info!("Using provided column '{}'", col);
            return Resolution {
                column: Some((*col).to_owned()),
                source: ResolvedBy::Requested,
            };
        }
        warn!("Provided column '{}' not found in anndata.obs", req);
        warn!("Available columns: {:?}", available);
    }

    for name in fallbacks {
        if let Some(col) = column_map.get(&name.to_lowercase()) {
            info!("Using fallback column '{}'", col);
            return Resolution {
                column: Some((*col).to_owned()),
                source: ResolvedBy::Fallback,
            };
        }
    }

    warn!("No supported sample column found in anndata.obs");
    warn!("Supported column names (case-insensitive): {:?}", fallbacks);
    warn!("Available columns: {:?}", available);
    Resolution {
        column: None,
        source: ResolvedBy::None,
    }
}

/// Case-insensitive match of a single column with no fallback.
pub fn require_column_ci(available: &[String], requested: &str) -> Result<String, SampleError> {
    match case_folded(available).get(&requested.to_lowercase()) {
        Some(col) => {
            info!("Using sample column '{}'", col);
            Ok((*col).to_owned())
        }
        None => Err(SampleError::ColumnNotFound {
            column: requested.to_owned(),
            available: available.to_vec(),
        }),
    }
}
