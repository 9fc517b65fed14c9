//! Semantic column type inference.
//!
//! Physical storage decides the first three branches; text columns are then
//! split into `categorical` and `string` by their distinct-to-row ratio.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::Thresholds,
    dataset::{Column, ColumnValues, Dataset},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    Boolean,
    Datetime,
    Categorical,
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Datetime => "datetime",
            ColumnType::Categorical => "categorical",
            ColumnType::String => "string",
        }
    }

    /// Types whose raw text may still hide a date column.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Categorical | ColumnType::String)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One type per column, in dataset column order.
pub fn infer_types(dataset: &Dataset, thresholds: &Thresholds) -> Vec<ColumnType> {
    dataset
        .columns()
        .iter()
        .map(|column| infer_column_type(column, dataset.row_count(), thresholds))
        .collect()
}

pub fn infer_column_type(column: &Column, row_count: usize, thresholds: &Thresholds) -> ColumnType {
    match column.values() {
        ColumnValues::Number(_) => ColumnType::Number,
        ColumnValues::Boolean(_) => ColumnType::Boolean,
        ColumnValues::DateTime(_) => ColumnType::Datetime,
        ColumnValues::Text(_) => {
            let ratio = column.distinct_count() as f64 / row_count.max(1) as f64;
            if ratio < thresholds.categorical_ratio {
                ColumnType::Categorical
            } else {
                ColumnType::String
            }
        }
    }
}
