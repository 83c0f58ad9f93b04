//! A workflow bundles a recipe with a model specification so that the
//! recipe is always prepped on exactly the rows the model is trained on.
use std::fmt;

use crate::config::{Hyperparams, ModelSpec};
use crate::data_handling::Dataset;
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;
use crate::preprocessing::{FittedRecipe, Recipe};

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub recipe: Recipe,
    pub spec: ModelSpec,
}

/// Trained recipe + classifier. Immutable once built; only used to predict.
pub struct FittedWorkflow {
    recipe: FittedRecipe,
    model: Box<dyn ClassifierModel>,
    classes: Vec<String>,
    features: Vec<String>,
    spec: ModelSpec,
}

impl Workflow {
    pub fn new(recipe: Recipe, spec: ModelSpec) -> Self {
        Workflow { recipe, spec }
    }

    pub fn outcome(&self) -> &str {
        self.recipe.outcome()
    }

    /// Prep the recipe on `train`, bake it, and fit the model on the result.
    pub fn fit(&self, train: &Dataset) -> Result<FittedWorkflow> {
        let outcome = self.recipe.outcome();
        let labels = train.labels(outcome)?;

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        let y = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect::<Vec<usize>>();

        let recipe = self.recipe.prep(train)?;
        let baked = recipe.bake(train)?;
        let (features, x) = baked.feature_matrix(outcome)?;

        let mut model = build_model(&self.spec)?;
        model.fit(&x, &y, classes.len())?;

        Ok(FittedWorkflow {
            recipe,
            model,
            classes,
            features,
            spec: self.spec.clone(),
        })
    }
}

impl FittedWorkflow {
    pub fn recipe(&self) -> &FittedRecipe {
        &self.recipe
    }

    /// Outcome levels in the order used for class indices.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn hyperparams(&self) -> Hyperparams {
        self.spec.hyperparams()
    }

    fn design_matrix(&self, data: &Dataset) -> Result<Array2<f64>> {
        let baked = self.recipe.bake(data)?;
        let (names, x) = baked.feature_matrix(self.recipe.outcome())?;
        if names != self.features {
            return Err(PipelineError::Schema(format!(
                "baked predictors {:?} do not match trained predictors {:?}",
                names, self.features
            )));
        }
        Ok(x)
    }

    /// Predicted outcome level for every row of `data`.
    pub fn predict(&self, data: &Dataset) -> Result<Vec<String>> {
        let x = self.design_matrix(data)?;
        let idx = self.model.predict(&x)?;
        Ok(idx.into_iter().map(|i| self.classes[i].clone()).collect())
    }

    /// Class probabilities; columns follow [`FittedWorkflow::classes`].
    pub fn predict_proba(&self, data: &Dataset) -> Result<Array2<f64>> {
        let x = self.design_matrix(data)?;
        self.model.predict_proba(&x)
    }
}

impl fmt::Debug for FittedWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedWorkflow")
            .field("model", &self.model.name())
            .field("classes", &self.classes)
            .field("features", &self.features)
            .field("spec", &self.spec)
            .finish()
    }
}
