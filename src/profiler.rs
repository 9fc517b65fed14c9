//! Per-column profiling driven by the inferred semantic type.
//!
//! Every column gets null and cardinality metrics. Numeric columns add a
//! five-number style summary with IQR outlier fences; categorical columns add
//! a frequency digest (top values, entropy, dominant share). The two stats
//! shapes are variants of one enum so a column can never carry both.

use serde::{Deserialize, Serialize};

use crate::{
    config::Thresholds,
    dataset::{Column, Dataset},
    inference::ColumnType,
    stats,
    validator::DatasetIssue,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub metrics: ColumnMetrics,
    #[serde(default)]
    pub issues: Vec<DatasetIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetrics {
    pub inferred_type: ColumnType,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub stats: Option<ColumnStats>,
}

impl ColumnMetrics {
    pub fn numeric(&self) -> Option<&NumericStats> {
        match &self.stats {
            Some(ColumnStats::Numeric(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn categorical(&self) -> Option<&CategoricalStats> {
        match &self.stats {
            Some(ColumnStats::Categorical(stats)) => Some(stats),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub outlier_count: usize,
    pub iqr_lower_bound: Option<f64>,
    pub iqr_upper_bound: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub top_values: Vec<ValueCount>,
    pub entropy: f64,
    pub dominant_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Whole-dataset shape figures reported next to the column profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows_analyzed: usize,
    pub columns: usize,
    pub duplicate_rows: usize,
    pub missing_cells_percentage: f64,
}

/// Profiles every column; `types` must be aligned with the dataset's columns.
pub fn profile_columns(
    dataset: &Dataset,
    types: &[ColumnType],
    thresholds: &Thresholds,
) -> Vec<ColumnProfile> {
    dataset
        .columns()
        .iter()
        .zip(types)
        .map(|(column, ty)| ColumnProfile {
            name: column.name().to_string(),
            metrics: column_metrics(column, *ty, thresholds),
            issues: Vec::new(),
        })
        .collect()
}

pub fn column_metrics(column: &Column, ty: ColumnType, thresholds: &Thresholds) -> ColumnMetrics {
    let stats = match ty {
        ColumnType::Number => Some(ColumnStats::Numeric(numeric_stats(column, thresholds))),
        ColumnType::Categorical => Some(ColumnStats::Categorical(categorical_stats(
            column, thresholds,
        ))),
        ColumnType::Boolean | ColumnType::Datetime | ColumnType::String => None,
    };
    ColumnMetrics {
        inferred_type: ty,
        null_count: column.null_count(),
        null_percentage: column.null_ratio() * 100.0,
        unique_count: column.distinct_count(),
        stats,
    }
}

pub fn numeric_stats(column: &Column, thresholds: &Thresholds) -> NumericStats {
    let values = column.numeric_values();
    let bounds = stats::iqr_bounds(&values, thresholds.iqr_multiplier);
    NumericStats {
        min: stats::min(&values),
        max: stats::max(&values),
        mean: stats::mean(&values),
        median: stats::median(&values),
        outlier_count: bounds.map_or(0, |b| b.count_outliers(&values)),
        iqr_lower_bound: bounds.map(|b| b.lower),
        iqr_upper_bound: bounds.map(|b| b.upper),
    }
}

pub fn categorical_stats(column: &Column, thresholds: &Thresholds) -> CategoricalStats {
    let counts = column.value_counts();
    let total = counts.iter().map(|(_, count)| *count).sum::<usize>();
    let dominant = counts.first().map_or(0, |(_, count)| *count);
    CategoricalStats {
        top_values: counts
            .iter()
            .take(thresholds.top_values_limit)
            .map(|(value, count)| ValueCount {
                value: value.clone(),
                count: *count,
            })
            .collect(),
        entropy: stats::shannon_entropy(counts.iter().map(|(_, count)| *count)),
        dominant_ratio: stats::ratio(dominant, total),
    }
}

pub fn profile_dataset(dataset: &Dataset) -> DatasetProfile {
    let mut seen = std::collections::HashSet::new();
    let duplicate_rows = (0..dataset.row_count())
        .filter(|&row| !seen.insert(dataset.row_key(row)))
        .count();
    let missing_cells_percentage = if dataset.column_count() == 0 {
        0.0
    } else {
        dataset
            .columns()
            .iter()
            .map(Column::null_ratio)
            .sum::<f64>()
            / dataset.column_count() as f64
            * 100.0
    };
    DatasetProfile {
        rows_analyzed: dataset.row_count(),
        columns: dataset.column_count(),
        duplicate_rows,
        missing_cells_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer_types;

    fn sample_dataset() -> Dataset {
        let mut region = vec!["north"; 18];
        region.extend(["south", "east"]);
        let amount = [
            "10", "12", "11", "13", "12", "11", "10", "12", "13", "11", "12", "10", "11", "13",
            "12", "11", "", "", "500", "12",
        ];
        let note = (0..20).map(|i| format!("note {i}")).collect::<Vec<_>>();
        Dataset::new(vec![
            Column::from_raw("region", &region),
            Column::from_raw("amount", &amount),
            Column::from_raw("note", &note),
        ])
        .unwrap()
    }

    #[test]
    fn profiles_attach_stats_by_type() {
        let thresholds = Thresholds::default();
        let dataset = sample_dataset();
        let types = infer_types(&dataset, &thresholds);
        let profiles = profile_columns(&dataset, &types, &thresholds);

        let region = &profiles[0].metrics;
        assert_eq!(region.inferred_type, ColumnType::Categorical);
        let cat = region.categorical().expect("categorical stats");
        assert_eq!(cat.top_values[0].value, "north");
        assert_eq!(cat.top_values[0].count, 18);
        assert!((cat.dominant_ratio - 0.9).abs() < 1e-12);
        assert!(region.numeric().is_none());

        let amount = &profiles[1].metrics;
        assert_eq!(amount.inferred_type, ColumnType::Number);
        assert_eq!(amount.null_count, 2);
        assert!((amount.null_percentage - 10.0).abs() < 1e-12);
        let num = amount.numeric().expect("numeric stats");
        assert_eq!(num.min, Some(10.0));
        assert_eq!(num.max, Some(500.0));
        assert_eq!(num.outlier_count, 1);
        assert!(amount.categorical().is_none());

        let note = &profiles[2].metrics;
        assert_eq!(note.inferred_type, ColumnType::String);
        assert!(note.stats.is_none());
        assert_eq!(note.unique_count, 20);
    }

    #[test]
    fn empty_numeric_column_has_null_bounds() {
        let column = Column::from_raw("blank", &["", "", ""]);
        let stats = numeric_stats(&column, &Thresholds::default());
        assert_eq!(stats.outlier_count, 0);
        assert_eq!(stats.iqr_lower_bound, None);
        assert_eq!(stats.iqr_upper_bound, None);
        assert_eq!(stats.mean, None);
    }

    #[test]
    fn top_values_are_capped_but_entropy_uses_every_category() {
        let cells = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let column = Column::from_raw("letters", &cells);
        let stats = categorical_stats(&column, &Thresholds::default());
        assert_eq!(stats.top_values.len(), 5);
        assert!((stats.entropy - 3.0).abs() < 1e-12);
        assert!((stats.dominant_ratio - 0.125).abs() < 1e-12);
    }

    #[test]
    fn all_missing_categorical_column_has_zero_ratio() {
        let column = Column::new(
            "c",
            crate::dataset::ColumnValues::Text(vec![None, None]),
        );
        let stats = categorical_stats(&column, &Thresholds::default());
        assert_eq!(stats.dominant_ratio, 0.0);
        assert_eq!(stats.entropy, 0.0);
        assert!(stats.top_values.is_empty());
    }

    #[test]
    fn dataset_profile_counts_duplicates_and_missing_cells() {
        let dataset = Dataset::new(vec![
            Column::from_raw("a", &["1", "1", "2", ""]),
            Column::from_raw("b", &["x", "x", "y", "z"]),
        ])
        .unwrap();
        let profile = profile_dataset(&dataset);
        assert_eq!(profile.rows_analyzed, 4);
        assert_eq!(profile.columns, 2);
        assert_eq!(profile.duplicate_rows, 1);
        assert!((profile.missing_cells_percentage - 12.5).abs() < 1e-12);
    }

    #[test]
    fn stats_serialize_without_variant_tag() {
        let column = Column::from_raw("n", &["1", "2", "3"]);
        let metrics = column_metrics(&column, ColumnType::Number, &Thresholds::default());
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["inferred_type"], "number");
        assert_eq!(json["stats"]["median"], 2.0);
        assert_eq!(json["stats"]["outlier_count"], 0);
    }
}
