use crate::error::SampleError;
use crate::extract::column_text;
use crate::obs_columns;
use polars::prelude::{Column, DataFrame, DataType, IdxCa, IdxSize, Series, SortOptions, StringChunked};
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// The scalar type suffix appended to projected column headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeLabel {
    Long,
    Double,
    String,
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLabel::Long => write!(f, "Long"),
            TypeLabel::Double => write!(f, "Double"),
            TypeLabel::String => write!(f, "String"),
        }
    }
}

/// Integers (signed or not) are `Long`, floats are `Double`, and every other
/// dtype, including ones added to polars later, is `String`.
pub fn type_label(dtype: &DataType) -> TypeLabel {
    if dtype.is_integer() {
        TypeLabel::Long
    } else if dtype.is_float() {
        TypeLabel::Double
    } else {
        TypeLabel::String
    }
}

/// What to do when observations of one sample disagree on a projected column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsistencyPolicy {
    /// Keep the first row's value without looking at the others.
    #[default]
    FirstValue,
    Warn,
    Strict,
}

/// Row positions grouped by sample value. Rows whose sample is null belong
/// to no group.
struct SampleGroups {
    names: Vec<String>,
    first_rows: Vec<IdxSize>,
    row_group: Vec<Option<usize>>,
}

impl SampleGroups {
    fn new(samples: &StringChunked) -> Self {
        let mut index = HashMap::new();
        let mut names = Vec::new();
        let mut first_rows = Vec::new();
        let row_group = samples
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.map(|s| {
                    *index.entry(s).or_insert_with(|| {
                        names.push(s.to_owned());
                        first_rows.push(row as IdxSize);
                        names.len() - 1
                    })
                })
            })
            .collect();
        Self {
            names,
            first_rows,
            row_group,
        }
    }

    /// (sample, column) pairs where some row differs from the sample's first
    /// row, in order of discovery.
    fn inconsistencies(&self, column: &str, values: &StringChunked) -> Vec<(String, String)> {
        let mut flagged = vec![false; self.names.len()];
        let mut pairs = Vec::new();
        for (row, group) in self.row_group.iter().enumerate() {
            let Some(g) = *group else { continue };
            if flagged[g] {
                continue;
            }
            if values.get(row) != values.get(self.first_rows[g] as usize) {
                flagged[g] = true;
                pairs.push((self.names[g].clone(), column.to_owned()));
            }
        }
        pairs
    }
}

/// Key the projected rows are ordered by. Categoricals sort by their labels,
/// everything else by value.
fn sort_key(column: &Column) -> anyhow::Result<Series> {
    Ok(match column.dtype() {
        DataType::Categorical(..) | DataType::Enum(..) => column
            .cast(&DataType::String)?
            .as_materialized_series()
            .clone(),
        _ => column.as_materialized_series().clone(),
    })
}

/// Checks that `sample_column` and every name in `columns` exist verbatim in
/// `obs`, reporting all of the missing ones at once.
pub fn validate_columns(
    obs: &DataFrame,
    sample_column: &str,
    columns: &[String],
) -> Result<(), SampleError> {
    let available = obs_columns(obs);
    if !available.iter().any(|c| c == sample_column) {
        return Err(SampleError::ColumnNotFound {
            column: sample_column.to_owned(),
            available,
        });
    }
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| !available.contains(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SampleError::ColumnsNotFound { missing, available });
    }
    Ok(())
}

/// One row per distinct sample of `sample_column`, sorted by sample, holding
/// the first observation's value for each of `columns`. Headers are rewritten to
/// `<name>:<label>`; the values themselves are not converted.
pub fn project_columns(
    obs: &DataFrame,
    sample_column: &str,
    columns: &[String],
    policy: ConsistencyPolicy,
) -> anyhow::Result<DataFrame> {
    validate_columns(obs, sample_column, columns)?;
    info!("Using column '{}' to identify samples", sample_column);

    let mut wanted: Vec<&str> = vec![sample_column];
    for c in columns {
        if wanted.contains(&c.as_str()) {
            warn!("Column '{}' requested more than once; keeping one copy", c);
        } else {
            wanted.push(c);
        }
    }

    let groups = SampleGroups::new(&column_text(obs.column(sample_column)?)?);
    info!("Found {} unique samples", groups.names.len());
    info!("Extracting columns: {:?}", columns);

    if policy != ConsistencyPolicy::FirstValue {
        let mut pairs = Vec::new();
        for c in &wanted[1..] {
            pairs.extend(groups.inconsistencies(c, &column_text(obs.column(c)?)?));
        }
        for (sample, column) in &pairs {
            warn!(
                "Sample '{}' has more than one value in column '{}'; using the first",
                sample, column
            );
        }
        if policy == ConsistencyPolicy::Strict && !pairs.is_empty() {
            return Err(SampleError::InconsistentMetadata { pairs }.into());
        }
    }

    let first_rows = IdxCa::from_vec("first_row".into(), groups.first_rows);
    let projected = obs.select(wanted.iter().copied())?.take(&first_rows)?;
    let order = sort_key(projected.column(sample_column)?)?.arg_sort(SortOptions::default());
    let mut projected = projected.take(&order)?;

    for name in wanted {
        let dtype = projected.column(name)?.dtype().clone();
        let label = type_label(&dtype);
        info!("Column '{}' detected as {} -> {}", name, dtype, label);
        projected.rename(name, format!("{}:{}", name, label).into())?;
    }
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::NamedFrom;

    fn example_obs() -> DataFrame {
        DataFrame::new_infer_height(vec![
            Column::from(Series::new("sample".into(), &["A", "A", "B"])),
            Column::from(Series::new("age".into(), &[5i64, 5, 7])),
            Column::from(Series::new("tissue".into(), &["liver", "liver", "lung"])),
        ])
        .unwrap()
    }

    fn header(df: &DataFrame) -> Vec<String> {
        obs_columns(df)
    }

    #[test]
    fn labels_cover_every_dtype() {
        assert_eq!(type_label(&DataType::Int8), TypeLabel::Long);
        assert_eq!(type_label(&DataType::UInt64), TypeLabel::Long);
        assert_eq!(type_label(&DataType::Float32), TypeLabel::Double);
        assert_eq!(type_label(&DataType::Float64), TypeLabel::Double);
        assert_eq!(type_label(&DataType::String), TypeLabel::String);
        assert_eq!(type_label(&DataType::Boolean), TypeLabel::String);
        assert_eq!(
            type_label(&DataType::from_categories(polars::prelude::Categories::global())),
            TypeLabel::String
        );
        assert_eq!(type_label(&DataType::Null), TypeLabel::String);
    }

    #[test]
    fn projects_first_row_per_sample() {
        let out = project_columns(
            &example_obs(),
            "sample",
            &["age".to_string(), "tissue".to_string()],
            ConsistencyPolicy::FirstValue,
        )
        .unwrap();
        assert_eq!(
            header(&out),
            vec!["sample:String", "age:Long", "tissue:String"]
        );
        assert_eq!(out.height(), 2);
        let age = out.column("age:Long").unwrap().as_materialized_series().i64().unwrap();
        assert_eq!(age.get(0), Some(5));
        assert_eq!(age.get(1), Some(7));
        let tissue = out.column("tissue:String").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(tissue.get(1), Some("lung"));
    }

    #[test]
    fn requested_order_is_kept() {
        let out = project_columns(
            &example_obs(),
            "sample",
            &["tissue".to_string(), "age".to_string()],
            ConsistencyPolicy::FirstValue,
        )
        .unwrap();
        assert_eq!(
            header(&out),
            vec!["sample:String", "tissue:String", "age:Long"]
        );
    }

    #[test]
    fn float_columns_are_double() {
        let mut obs = example_obs();
        obs.with_column(Series::new("pct_mito".into(), &[0.5f64, 0.25, 0.1]).into())
            .unwrap();
        let out = project_columns(
            &obs,
            "sample",
            &["pct_mito".to_string()],
            ConsistencyPolicy::FirstValue,
        )
        .unwrap();
        assert_eq!(header(&out), vec!["sample:String", "pct_mito:Double"]);
        let pct = out.column("pct_mito:Double").unwrap().as_materialized_series().f64().unwrap();
        assert_eq!(pct.get(0), Some(0.5));
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let err = project_columns(
            &example_obs(),
            "sample",
            &["age".to_string(), "donor".to_string(), "Tissue".to_string()],
            ConsistencyPolicy::FirstValue,
        )
        .unwrap_err();
        match err.downcast_ref::<SampleError>() {
            Some(SampleError::ColumnsNotFound { missing, .. }) => {
                assert_eq!(missing, &vec!["donor".to_string(), "Tissue".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn sample_column_match_is_case_sensitive() {
        let err = project_columns(
            &example_obs(),
            "Sample",
            &["age".to_string()],
            ConsistencyPolicy::FirstValue,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SampleError>(),
            Some(SampleError::ColumnNotFound { column, .. }) if column == "Sample"
        ));
    }

    #[test]
    fn rows_are_sorted_by_sample_not_first_seen() {
        let obs = DataFrame::new_infer_height(vec![
            Column::from(Series::new("sample".into(), &["B", "A", "B", "C"])),
            Column::from(Series::new("age".into(), &[7i64, 5, 7, 9])),
        ])
        .unwrap();
        let out = project_columns(&obs, "sample", &["age".to_string()], ConsistencyPolicy::FirstValue)
            .unwrap();
        let samples = out.column("sample:String").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(
            samples.iter().collect::<Vec<_>>(),
            vec![Some("A"), Some("B"), Some("C")]
        );
        let age = out.column("age:Long").unwrap().as_materialized_series().i64().unwrap();
        assert_eq!(age.iter().collect::<Vec<_>>(), vec![Some(5), Some(7), Some(9)]);
    }

    #[test]
    fn numeric_samples_sort_numerically() {
        let obs = DataFrame::new_infer_height(vec![
            Column::from(Series::new("replicate".into(), &[10i64, 2, 10])),
            Column::from(Series::new("tissue".into(), &["lung", "liver", "lung"])),
        ])
        .unwrap();
        let out = project_columns(
            &obs,
            "replicate",
            &["tissue".to_string()],
            ConsistencyPolicy::FirstValue,
        )
        .unwrap();
        let reps = out.column("replicate:Long").unwrap().as_materialized_series().i64().unwrap();
        assert_eq!(reps.iter().collect::<Vec<_>>(), vec![Some(2), Some(10)]);
    }

    #[test]
    fn categorical_samples_sort_by_label() {
        let sample = Series::new("sample".into(), &["lung_2", "lung_1", "lung_2"])
            .cast(&DataType::from_categories(polars::prelude::Categories::global()))
            .unwrap();
        let obs = DataFrame::new_infer_height(vec![
            Column::from(sample),
            Column::from(Series::new("age".into(), &[3i64, 4, 3])),
        ])
        .unwrap();
        let out = project_columns(&obs, "sample", &["age".to_string()], ConsistencyPolicy::FirstValue)
            .unwrap();
        let age = out.column("age:Long").unwrap().as_materialized_series().i64().unwrap();
        assert_eq!(age.iter().collect::<Vec<_>>(), vec![Some(4), Some(3)]);
    }

    #[test]
    fn divergent_values_keep_first_unless_strict() {
        let obs = DataFrame::new_infer_height(vec![
            Column::from(Series::new("sample".into(), &["A", "A", "B"])),
            Column::from(Series::new("age".into(), &[5i64, 6, 7])),
        ])
        .unwrap();
        let cols = ["age".to_string()];

        for policy in [ConsistencyPolicy::FirstValue, ConsistencyPolicy::Warn] {
            let out = project_columns(&obs, "sample", &cols, policy).unwrap();
            assert_eq!(out.column("age:Long").unwrap().as_materialized_series().i64().unwrap().get(0), Some(5));
        }

        let err = project_columns(&obs, "sample", &cols, ConsistencyPolicy::Strict).unwrap_err();
        match err.downcast_ref::<SampleError>() {
            Some(SampleError::InconsistentMetadata { pairs }) => {
                assert_eq!(pairs, &vec![("A".to_string(), "age".to_string())]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
