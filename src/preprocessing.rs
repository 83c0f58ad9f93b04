//! Feature recipe: dummy encoding, zero-variance filtering and
//! normalization, learned once on training data and replayed on any other
//! dataset.
//!
//! Dummy columns use reference coding. The levels of a categorical
//! predictor are sorted lexicographically, the first one is the reference and
//! is dropped, and every other level becomes a 0/1 column named
//! `{column}_{level}`.
use std::collections::{HashMap, HashSet};

use crate::data_handling::{Column, ColumnData, Dataset};
use crate::error::{PipelineError, Result};
use crate::stats::{is_constant, mean_sd};

/// Unfitted recipe. All columns other than `outcome` are predictors.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    outcome: String,
}

/// Levels learned for one categorical predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct DummyEncoding {
    pub column: String,
    /// All training levels, sorted; `levels[0]` is the reference.
    pub levels: Vec<String>,
}

impl DummyEncoding {
    pub fn output_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .skip(1)
            .map(|level| format!("{}_{}", self.column, level))
            .collect()
    }
}

/// Normalization parameters for one output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Predictor {
    Numeric(String),
    Categorical(DummyEncoding),
}

/// Recipe with parameters estimated from a training set.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedRecipe {
    outcome: String,
    predictors: Vec<Predictor>,
    removed: Vec<String>,
    stats: Vec<ColumnStats>,
}

impl Recipe {
    pub fn new(outcome: impl Into<String>) -> Self {
        Recipe {
            outcome: outcome.into(),
        }
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    /// Estimate levels, zero-variance columns and per-column mean/sd from
    /// `train` only.
    pub fn prep(&self, train: &Dataset) -> Result<FittedRecipe> {
        train.require(&self.outcome)?;
        if train.is_empty() {
            return Err(PipelineError::InsufficientData(
                "cannot prep a recipe on an empty dataset".to_string(),
            ));
        }

        let mut predictors = Vec::new();
        let mut removed = Vec::new();
        for col in train.columns().iter().filter(|c| c.name != self.outcome) {
            match &col.data {
                ColumnData::Numeric(_) => predictors.push(Predictor::Numeric(col.name.clone())),
                ColumnData::Categorical(values) => {
                    let mut levels: Vec<String> = values
                        .iter()
                        .cloned()
                        .collect::<HashSet<_>>()
                        .into_iter()
                        .collect();
                    levels.sort();
                    if levels.len() < 2 {
                        // reference coding leaves nothing for a single level
                        removed.push(col.name.clone());
                    }
                    predictors.push(Predictor::Categorical(DummyEncoding {
                        column: col.name.clone(),
                        levels,
                    }));
                }
            }
        }

        check_output_names(&predictors, &self.outcome)?;

        let mut fitted = FittedRecipe {
            outcome: self.outcome.clone(),
            predictors,
            removed,
            stats: Vec::new(),
        };

        let derived = fitted.derive(train)?;
        for (name, values) in derived {
            if is_constant(&values) {
                fitted.removed.push(name);
                continue;
            }
            // non-constant columns with at least two rows always have sd > 0
            let (mean, sd) = mean_sd(&values).unwrap_or((0.0, 0.0));
            fitted.stats.push(ColumnStats { name, mean, sd });
        }

        if !fitted.removed.is_empty() {
            log::debug!("Zero-variance columns removed: {:?}", fitted.removed);
        }
        if fitted.stats.is_empty() {
            log::warn!("Recipe kept no predictor columns");
        }
        log::debug!(
            "Recipe prepped on {} rows: {} output predictors",
            train.nrows(),
            fitted.stats.len()
        );
        Ok(fitted)
    }
}

impl FittedRecipe {
    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    /// Columns dropped by the zero-variance step, including categorical
    /// predictors with a single training level.
    pub fn removed_columns(&self) -> &[String] {
        &self.removed
    }

    /// Output predictor names, in column order.
    pub fn output_columns(&self) -> Vec<&str> {
        self.stats.iter().map(|s| s.name.as_str()).collect()
    }

    /// Mean and sd applied to each output column.
    pub fn column_stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    pub fn dummy_encodings(&self) -> Vec<&DummyEncoding> {
        self.predictors
            .iter()
            .filter_map(|p| match p {
                Predictor::Categorical(enc) => Some(enc),
                Predictor::Numeric(_) => None,
            })
            .collect()
    }

    /// Apply the stored transformation to `data`. The outcome column is
    /// carried over unchanged when present, so unlabeled data can be baked.
    pub fn bake(&self, data: &Dataset) -> Result<Dataset> {
        let derived = self.derive(data)?;
        let removed: HashSet<&str> = self.removed.iter().map(String::as_str).collect();

        let mut columns = Vec::with_capacity(self.stats.len() + 1);
        let mut stats = self.stats.iter();
        for (name, values) in derived {
            if removed.contains(name.as_str()) {
                continue;
            }
            let st = stats
                .next()
                .filter(|s| s.name == name)
                .ok_or_else(|| {
                    PipelineError::Schema(format!("no normalization parameters for '{}'", name))
                })?;
            if !(st.sd.is_finite() && st.sd > 0.0) {
                return Err(PipelineError::Config(format!(
                    "column '{}' has standard deviation {}; cannot normalize",
                    name, st.sd
                )));
            }
            let scaled = values.iter().map(|v| (v - st.mean) / st.sd).collect();
            columns.push(Column::numeric(name, scaled));
        }

        if let Some(outcome) = data.column(&self.outcome) {
            columns.push(outcome.clone());
        }
        Dataset::new(columns)
    }

    /// Numeric and dummy columns before filtering and scaling.
    fn derive(&self, data: &Dataset) -> Result<Vec<(String, Vec<f64>)>> {
        let mut out = Vec::new();
        for predictor in &self.predictors {
            match predictor {
                Predictor::Numeric(name) => {
                    let values = data.require(name)?.as_numeric()?;
                    out.push((name.clone(), values.to_vec()));
                }
                Predictor::Categorical(enc) => {
                    let values = data.require(&enc.column)?.as_categorical()?;
                    let unseen = values
                        .iter()
                        .filter(|v| enc.levels.binary_search(*v).is_err())
                        .count();
                    if unseen > 0 {
                        log::warn!(
                            "{} rows of '{}' have levels not seen during prep; encoded as reference level",
                            unseen,
                            enc.column
                        );
                    }
                    for (level, name) in enc.levels.iter().skip(1).zip(enc.output_names()) {
                        let indicator = values
                            .iter()
                            .map(|v| if v == level { 1.0 } else { 0.0 })
                            .collect();
                        out.push((name, indicator));
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Every derived column name must be unique and differ from the outcome.
fn check_output_names(predictors: &[Predictor], outcome: &str) -> Result<()> {
    let mut sources: HashMap<String, String> = HashMap::new();
    sources.insert(outcome.to_string(), format!("outcome column '{}'", outcome));
    for predictor in predictors {
        let derived = match predictor {
            Predictor::Numeric(name) => vec![(name.clone(), format!("numeric column '{}'", name))],
            Predictor::Categorical(enc) => enc
                .levels
                .iter()
                .skip(1)
                .zip(enc.output_names())
                .map(|(level, name)| {
                    (name, format!("level '{}' of categorical column '{}'", level, enc.column))
                })
                .collect(),
        };
        for (name, source) in derived {
            if let Some(existing) = sources.get(&name) {
                return Err(PipelineError::Schema(format!(
                    "derived column '{}' from {} collides with {}",
                    name, source, existing
                )));
            }
            sources.insert(name, source);
        }
    }
    Ok(())
}
