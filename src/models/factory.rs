use crate::config::{ModelSpec, ModelType};
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::mlp::MlpClassifier;

/// Build a boxed, unfitted classifier from a `ModelSpec`.
///
/// `spec` is validated up front so bad hyperparameters fail before any
/// data is touched.
pub fn build_model(spec: &ModelSpec) -> Result<Box<dyn ClassifierModel>> {
    spec.validate()?;
    match spec.model_type {
        ModelType::Mlp { .. } => Ok(Box::new(MlpClassifier::new(spec.clone()))),
    }
}
