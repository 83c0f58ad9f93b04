//! Single-hidden-layer feed-forward classifier on candle.
//!
//! Hidden units use the configured activation, the output layer is a
//! softmax over the classes. Training minimizes mean cross-entropy plus an
//! L2 weight-decay term `penalty / 2 * sum(w^2)` (biases excluded) with
//! full-batch SGD for exactly `epochs` steps.
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{Linear, Module, Optimizer, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Activation, ModelSpec, ModelType};
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;

/// Trained layers. The tensors share storage with the training vars.
#[derive(Debug, Clone)]
struct MlpLayers {
    hidden: Linear,
    output: Linear,
    n_inputs: usize,
    n_classes: usize,
}

#[derive(Debug, Clone)]
pub struct MlpClassifier {
    spec: ModelSpec,
    device: Device,
    layers: Option<MlpLayers>,
    final_loss: Option<f64>,
}

impl MlpClassifier {
    pub fn new(spec: ModelSpec) -> Self {
        MlpClassifier {
            spec,
            device: Device::Cpu,
            layers: None,
            final_loss: None,
        }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Training loss after the last epoch, once fitted.
    pub fn final_loss(&self) -> Option<f64> {
        self.final_loss
    }

    fn activation(&self) -> Activation {
        match &self.spec.model_type {
            ModelType::Mlp { activation, .. } => *activation,
        }
    }

    /// Fill `varmap` with Glorot-uniform weights drawn from `spec.seed` and
    /// zero biases, so `candle_nn::linear` picks them up instead of its own
    /// unseeded initializer.
    fn seed_vars(&self, varmap: &VarMap, n_inputs: usize, n_hidden: usize, n_classes: usize) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(self.spec.seed);
        let mut glorot = |fan_out: usize, fan_in: usize| -> Result<Var> {
            let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
            let data: Vec<f64> = (0..fan_out * fan_in)
                .map(|_| rng.gen_range(-limit..limit))
                .collect();
            Ok(Var::from_tensor(&Tensor::from_vec(data, (fan_out, fan_in), &self.device)?)?)
        };
        let w1 = glorot(n_hidden, n_inputs)?;
        let w2 = glorot(n_classes, n_hidden)?;
        let b1 = Var::zeros(n_hidden, DType::F64, &self.device)?;
        let b2 = Var::zeros(n_classes, DType::F64, &self.device)?;

        let mut ws = varmap
            .data()
            .lock()
            .map_err(|_| PipelineError::Config("model variable store is poisoned".to_string()))?;
        ws.insert("hidden.weight".to_string(), w1);
        ws.insert("hidden.bias".to_string(), b1);
        ws.insert("output.weight".to_string(), w2);
        ws.insert("output.bias".to_string(), b2);
        Ok(())
    }

    fn to_tensor(&self, x: &Array2<f64>) -> Result<Tensor> {
        Ok(Tensor::from_slice(x.as_slice(), x.shape(), &self.device)?)
    }

    /// Unnormalized class scores, shape (n_samples, n_classes).
    fn logits(&self, layers: &MlpLayers, xs: &Tensor) -> Result<Tensor> {
        let z1 = layers.hidden.forward(xs)?;
        let a1 = match self.activation() {
            Activation::Sigmoid => (z1.neg()?.exp()? + 1.0)?.recip()?,
            Activation::Tanh => z1.tanh()?,
            Activation::Relu => z1.relu()?,
        };
        Ok(layers.output.forward(&a1)?)
    }
}

impl ClassifierModel for MlpClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        self.spec.validate()?;
        let params = self.spec.hyperparams();
        let (n, n_inputs) = x.shape();
        if n == 0 {
            return Err(PipelineError::InsufficientData(
                "cannot train on zero rows".to_string(),
            ));
        }
        if y.len() != n {
            return Err(PipelineError::Schema(format!(
                "{} labels for {} rows",
                y.len(),
                n
            )));
        }
        if n_classes < 2 {
            return Err(PipelineError::InsufficientData(format!(
                "classification needs at least 2 classes, got {}",
                n_classes
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(PipelineError::Schema(format!(
                "class index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let lr = self.spec.learning_rate;
        let penalty = params.penalty;
        let n_hidden = params.hidden_units;

        let varmap = VarMap::new();
        self.seed_vars(&varmap, n_inputs, n_hidden, n_classes)?;
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, &self.device);
        let layers = MlpLayers {
            hidden: candle_nn::linear(n_inputs, n_hidden, vb.pp("hidden"))?,
            output: candle_nn::linear(n_hidden, n_classes, vb.pp("output"))?,
            n_inputs,
            n_classes,
        };

        let xs = self.to_tensor(x)?;
        let targets = Tensor::from_vec(
            y.iter().map(|&c| c as u32).collect::<Vec<u32>>(),
            n,
            &self.device,
        )?;
        let mut opt = candle_nn::SGD::new(varmap.all_vars(), lr)?;

        let mut loss_value = f64::NAN;
        for epoch in 0..params.epochs {
            let logits = self.logits(&layers, &xs)?;
            let ce = candle_nn::loss::cross_entropy(&logits, &targets)?;
            let decay = (layers.hidden.weight().sqr()?.sum_all()?
                + layers.output.weight().sqr()?.sum_all()?)?;
            let loss = (ce + decay.affine(0.5 * penalty, 0.0)?)?;

            loss_value = loss.to_scalar::<f64>()?;
            if !loss_value.is_finite() {
                return Err(PipelineError::ConvergenceFailure(format!(
                    "loss became {} at epoch {} (learning_rate = {})",
                    loss_value,
                    epoch + 1,
                    lr
                )));
            }
            log::trace!("epoch {}: loss = {:.6}", epoch + 1, loss_value);
            opt.backward_step(&loss)?;
        }

        for var in varmap.all_vars() {
            let values = var.as_tensor().flatten_all()?.to_vec1::<f64>()?;
            if values.iter().any(|v| !v.is_finite()) {
                return Err(PipelineError::ConvergenceFailure(
                    "weights diverged during the final epoch".to_string(),
                ));
            }
        }

        log::debug!(
            "MLP fit: {} rows, {} inputs, {} hidden, {} classes, {} epochs, final loss {:.6}",
            n,
            n_inputs,
            n_hidden,
            n_classes,
            params.epochs,
            loss_value
        );
        self.layers = Some(layers);
        self.final_loss = Some(loss_value);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let layers = self
            .layers
            .as_ref()
            .ok_or_else(|| PipelineError::Config("model has not been fitted".to_string()))?;
        if x.ncols() != layers.n_inputs {
            return Err(PipelineError::Schema(format!(
                "model expects {} features, got {}",
                layers.n_inputs,
                x.ncols()
            )));
        }
        let logits = self.logits(layers, &self.to_tensor(x)?)?;
        let proba = candle_nn::ops::softmax(&logits, 1)?.to_vec2::<f64>()?;
        Array2::from_rows(proba, layers.n_classes).map_err(|e| PipelineError::Schema(e.to_string()))
    }

    fn name(&self) -> &str {
        "mlp"
    }
}
