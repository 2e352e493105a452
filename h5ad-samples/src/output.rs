use crate::error::SampleError;
use anyhow::Context;
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use polars_io::csv::write::CsvWriter;
use polars_io::SerWriter;
use std::fs::File;
use std::path::Path;

fn write_csv(path: &Path, df: &mut DataFrame, include_header: bool) -> anyhow::Result<()> {
    let mut file = File::create(path).with_context(|| SampleError::OutputWrite {
        path: path.to_path_buf(),
    })?;
    CsvWriter::new(&mut file)
        .include_header(include_header)
        .finish(df)
        .with_context(|| SampleError::OutputWrite {
            path: path.to_path_buf(),
        })
}

/// Writes `values` as a one-column CSV with no header, one value per row.
pub fn write_single_column<S: AsRef<str>>(path: &Path, values: &[S]) -> anyhow::Result<()> {
    let values: Vec<&str> = values.iter().map(|v| v.as_ref()).collect();
    let series = Series::new("value".into(), values);
    let mut df = DataFrame::new_infer_height(vec![Column::from(series)])?;
    write_csv(path, &mut df, false)
}

/// Writes `df` with its header. Categorical columns are written as the
/// strings they encode.
pub fn write_table(path: &Path, df: &DataFrame) -> anyhow::Result<()> {
    let columns = df
        .columns()
        .iter()
        .map(|c| match c.dtype() {
            DataType::Categorical(..) | DataType::Enum(..) => c.cast(&DataType::String),
            _ => Ok(c.clone()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut df = DataFrame::new_infer_height(columns)?;
    write_csv(path, &mut df, true)
}
