//! Columnar survey dataset and the helpers used by the splitter, recipe and
//! evaluator to slice it by row and resolve fields by name.
use std::collections::{BTreeMap, HashMap};

use crate::error::{PipelineError, Result};
use crate::math::Array2;

/// One cell of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Numeric(f64),
    Categorical(String),
}

/// One row of a dataset, keyed by field name.
pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<String>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical(_))
    }

    pub fn as_numeric(&self) -> Result<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Ok(v),
            ColumnData::Categorical(_) => Err(PipelineError::Schema(format!(
                "column '{}' is categorical, expected numeric",
                self.name
            ))),
        }
    }

    pub fn as_categorical(&self) -> Result<&[String]> {
        match &self.data {
            ColumnData::Categorical(v) => Ok(v),
            ColumnData::Numeric(_) => Err(PipelineError::Schema(format!(
                "column '{}' is numeric, expected categorical",
                self.name
            ))),
        }
    }

    fn value(&self, row: usize) -> Value {
        match &self.data {
            ColumnData::Numeric(v) => Value::Numeric(v[row]),
            ColumnData::Categorical(v) => Value::Categorical(v[row].clone()),
        }
    }
}

/// Ordered collection of equally long named columns.
///
/// A dataset is never modified in place; selecting rows builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    nrows: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let nrows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        let mut seen = HashMap::new();
        for (i, col) in columns.iter().enumerate() {
            if col.data.len() != nrows {
                return Err(PipelineError::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name,
                    col.data.len(),
                    nrows
                )));
            }
            if seen.insert(col.name.clone(), i).is_some() {
                return Err(PipelineError::Schema(format!(
                    "duplicate column '{}'",
                    col.name
                )));
            }
        }
        Ok(Dataset { columns, nrows })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolve a field by name, failing with a schema error when absent.
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::Schema(format!("missing column '{}'", name)))
    }

    /// Labels of a categorical field, e.g. the outcome.
    pub fn labels(&self, field: &str) -> Result<&[String]> {
        self.require(field)?.as_categorical()
    }

    pub fn record(&self, row: usize) -> Option<Record> {
        if row >= self.nrows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.value(row)))
                .collect(),
        )
    }

    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(indices),
                })
                .collect(),
            nrows: indices.len(),
        }
    }

    /// Row indices grouped by the value of a categorical field, with groups
    /// in order of first appearance.
    pub fn group_indices(&self, field: &str) -> Result<Vec<(String, Vec<usize>)>> {
        let labels = self.labels(field)?;
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            let g = *position.entry(label.as_str()).or_insert_with(|| {
                groups.push((label.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[g].1.push(i);
        }
        Ok(groups)
    }

    /// Dense matrix of every numeric column except `exclude`, in column order.
    pub fn feature_matrix(&self, exclude: &str) -> Result<(Vec<String>, Array2<f64>)> {
        let mut names = Vec::new();
        let mut cols: Vec<&[f64]> = Vec::new();
        for col in self.columns.iter().filter(|c| c.name != exclude) {
            cols.push(col.as_numeric()?);
            names.push(col.name.clone());
        }
        let mut data = Vec::with_capacity(self.nrows * cols.len());
        for r in 0..self.nrows {
            for col in &cols {
                data.push(col[r]);
            }
        }
        let x = Array2::from_shape_vec((self.nrows, cols.len()), data)
            .map_err(|e| PipelineError::Schema(e.to_string()))?;
        Ok((names, x))
    }

    pub fn log_summary(&self, label_field: &str) {
        log::info!(
            "Dataset: {} rows, {} columns ({})",
            self.nrows,
            self.columns.len(),
            self.column_names().join(", ")
        );
        if let Ok(groups) = self.group_indices(label_field) {
            for (label, rows) in groups {
                log::info!(
                    "  {} = {}: {} rows ({:.1}%)",
                    label_field,
                    label,
                    rows.len(),
                    100.0 * rows.len() as f64 / self.nrows.max(1) as f64
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        Dataset::new(vec![
            Column::numeric("x", vec![1.0, 2.0, 3.0]),
            Column::categorical("segment", vec!["own".into(), "shopping".into(), "own".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn group_indices_follow_first_appearance() {
        let groups = tiny().group_indices("segment").unwrap();
        assert_eq!(groups[0], ("own".to_string(), vec![0, 2]));
        assert_eq!(groups[1], ("shopping".to_string(), vec![1]));
    }

    #[test]
    fn unequal_columns_are_rejected() {
        let err = Dataset::new(vec![
            Column::numeric("a", vec![1.0]),
            Column::numeric("b", vec![1.0, 2.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn record_exposes_row_values() {
        let rec = tiny().record(1).unwrap();
        assert_eq!(rec["x"], Value::Numeric(2.0));
        assert_eq!(rec["segment"], Value::Categorical("shopping".into()));
        assert!(tiny().record(3).is_none());
    }
}
