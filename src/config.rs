use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// How raw survey columns are read and projected.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct LoaderConfig {
    /// Raw column holding the integer segment code.
    pub label_source: String,
    /// Canonical name of the derived label column.
    pub label_name: String,
    /// Raw code -> segment name. Codes outside this map are schema errors.
    pub label_codes: BTreeMap<i64, String>,
    pub numeric: Vec<String>,
    /// Columns cast to categorical.
    pub categorical: Vec<String>,
    pub delimiter: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let label_codes = [(1, "own"), (3, "shopping"), (4, "considering")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        Self {
            label_source: "status".to_string(),
            label_name: "segment".to_string(),
            label_codes,
            numeric: ["age", "income", "brand_affinity", "price_sensitivity", "visits"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            categorical: vec!["gender".to_string(), "region".to_string()],
            delimiter: b',',
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SplitConfig {
    pub prop: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { prop: 0.75, seed: 42 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Classification,
}

/// Hidden-layer transfer function.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Tanh,
    Relu,
}

/// The three tunable values of the network.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Hyperparams {
    pub hidden_units: usize,
    pub epochs: usize,
    pub penalty: f64,
}

impl Hyperparams {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_units == 0 {
            return Err(PipelineError::invalid_hyperparameter(
                "hidden_units",
                "must be at least 1",
            ));
        }
        if self.epochs == 0 {
            return Err(PipelineError::invalid_hyperparameter("epochs", "must be at least 1"));
        }
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(PipelineError::invalid_hyperparameter(
                "penalty",
                format!("must be a finite value >= 0, got {}", self.penalty),
            ));
        }
        Ok(())
    }
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    Mlp {
        hidden_units: usize,
        epochs: usize,
        penalty: f64,
        activation: Activation,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Mlp {
            hidden_units: 5,
            epochs: 100,
            penalty: 0.0,
            activation: Activation::Sigmoid,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mlp" | "nnet" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

/// Full description of a classifier to train.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub learning_rate: f64,
    /// Seed for weight initialization.
    pub seed: u64,
    #[serde(default)]
    pub mode: Mode,

    #[serde(flatten)]
    pub model_type: ModelType,
}

impl ModelSpec {
    pub fn new(learning_rate: f64, seed: u64, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            seed,
            mode: Mode::Classification,
            model_type,
        }
    }

    pub fn mlp(hidden_units: usize, epochs: usize, penalty: f64) -> Self {
        Self::new(
            0.5,
            42,
            ModelType::Mlp {
                hidden_units,
                epochs,
                penalty,
                activation: Activation::Sigmoid,
            },
        )
    }

    pub fn hyperparams(&self) -> Hyperparams {
        match &self.model_type {
            ModelType::Mlp {
                hidden_units,
                epochs,
                penalty,
                ..
            } => Hyperparams {
                hidden_units: *hidden_units,
                epochs: *epochs,
                penalty: *penalty,
            },
        }
    }

    /// Copy of this spec with the tunable values replaced.
    pub fn with_hyperparams(&self, params: &Hyperparams) -> ModelSpec {
        let model_type = match &self.model_type {
            ModelType::Mlp { activation, .. } => ModelType::Mlp {
                hidden_units: params.hidden_units,
                epochs: params.epochs,
                penalty: params.penalty,
                activation: *activation,
            },
        };
        ModelSpec {
            model_type,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PipelineError::invalid_hyperparameter(
                "learning_rate",
                format!("must be finite and > 0, got {}", self.learning_rate),
            ));
        }
        self.hyperparams().validate()
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::new(0.5, 42, ModelType::default())
    }
}

/// Candidate values searched during tuning.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GridConfig {
    Explicit {
        hidden_units: Vec<usize>,
        epochs: Vec<usize>,
        penalty: Vec<f64>,
    },
    /// `levels` evenly spaced values per parameter over default ranges.
    Regular { levels: usize },
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig::Regular { levels: 3 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TuningConfig {
    pub folds: usize,
    pub seed: u64,
    pub grid: GridConfig,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            seed: 42,
            grid: GridConfig::default(),
        }
    }
}

/// Everything `run_pipeline` needs, loadable from JSON.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: LoaderConfig,
    pub split: SplitConfig,
    pub model: ModelSpec,
    pub tuning: TuningConfig,
}

/// Load a pipeline configuration from a JSON file.
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(&path).map_err(|e| {
        PipelineError::DataAccess(format!(
            "failed to read config {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        PipelineError::Config(format!(
            "failed to parse config {}: {}",
            path.as_ref().display(),
            e
        ))
    })
}
