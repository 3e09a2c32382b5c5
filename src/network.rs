use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use bincode::{serialize, deserialize};

use crate::activations::Activation;
use crate::error::{LaneChaseError, Result};
use crate::layers::DenseLayer;
use crate::optimizer::{GradientClipper, Optimizer, OptimizerWrapper};

/// A feed-forward value network: a stack of dense layers mapping a state
/// vector to one estimate per discrete action.
///
/// The network holds parameters only. Optimizer state lives with whoever
/// trains it, so a frozen copy (the DQN target) carries no training baggage.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes and activations.
    /// `activations` has one entry per weight layer (`layer_sizes.len() - 1`).
    pub fn new<R: Rng + ?Sized>(layer_sizes: &[usize], activations: &[Activation], rng: &mut R) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(LaneChaseError::invalid_parameter(
                "layer_sizes",
                "network needs at least an input and an output size",
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(LaneChaseError::invalid_parameter("layer_sizes", "layer sizes must be positive"));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(LaneChaseError::dimension_mismatch(
                format!("{} activations", layer_sizes.len() - 1),
                format!("{} activations", activations.len()),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, &mut *rng))
            .collect();

        Ok(NeuralNetwork { layers })
    }

    /// Build a Q-network: `hidden_activation` on every hidden layer and a
    /// linear output layer of `output_size` action values.
    pub fn q_network<R: Rng + ?Sized>(
        input_size: usize,
        hidden_sizes: &[usize],
        output_size: usize,
        hidden_activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        layer_sizes.push(input_size);
        layer_sizes.extend_from_slice(hidden_sizes);
        layer_sizes.push(output_size);

        let mut activations = vec![hidden_activation; hidden_sizes.len()];
        activations.push(Activation::Linear);

        Self::new(&layer_sizes, &activations, rng)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_size())
    }

    /// Sizes of every layer boundary, input first.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(|layer| layer.output_size()));
        sizes
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.parameter_count()).sum()
    }

    /// Estimate action values for a single state.
    pub fn predict(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        if input.len() != self.input_size() {
            return Err(LaneChaseError::dimension_mismatch(
                self.input_size().to_string(),
                input.len().to_string(),
            ));
        }
        let output = self.predict_batch(input.insert_axis(Axis(0)))?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Estimate action values for a batch of states (one state per row).
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(LaneChaseError::dimension_mismatch(
                format!("{} columns", self.input_size()),
                format!("{} columns", inputs.ncols()),
            ));
        }
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.predict_batch(current_output.view());
        }
        Ok(current_output)
    }

    /// Forward pass that caches activations in every layer for `backward_batch`.
    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    /// Backpropagate output errors through the cached forward pass, returning
    /// `(weight_gradients, bias_gradients)` per layer, input layer first.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer
                .backward_batch(current_error.view())
                .ok_or_else(|| LaneChaseError::NumericalError("backward pass without forward pass".to_string()))?;
            gradients.push((weight_gradients, bias_gradients));

            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One gradient step on the mean-squared error between the estimate of
    /// each row's taken action and its target. Other action outputs receive
    /// no gradient. Returns the loss measured before the update.
    pub fn train_on_actions(
        &mut self,
        inputs: ArrayView2<f32>,
        actions: &[usize],
        targets: ArrayView1<f32>,
        learning_rate: f32,
        optimizer: &mut OptimizerWrapper,
        clipper: &GradientClipper,
    ) -> Result<f32> {
        let batch_size = inputs.nrows();
        if batch_size == 0 {
            return Err(LaneChaseError::EmptyBuffer("no samples to train on".to_string()));
        }
        if actions.len() != batch_size || targets.len() != batch_size {
            return Err(LaneChaseError::dimension_mismatch(
                format!("{} actions and targets", batch_size),
                format!("{} actions, {} targets", actions.len(), targets.len()),
            ));
        }
        if inputs.ncols() != self.input_size() {
            return Err(LaneChaseError::dimension_mismatch(
                format!("{} columns", self.input_size()),
                format!("{} columns", inputs.ncols()),
            ));
        }
        let output_size = self.output_size();
        if let Some(&bad) = actions.iter().find(|&&a| a >= output_size) {
            return Err(LaneChaseError::InvalidAction { action: bad, max_actions: output_size });
        }

        let outputs = self.forward_batch(inputs);

        let mut output_errors = Array2::<f32>::zeros(outputs.dim());
        let mut squared_error = 0.0;
        for (i, (&action, &target)) in actions.iter().zip(targets.iter()).enumerate() {
            let diff = outputs[[i, action]] - target;
            squared_error += diff * diff;
            // d/dq of mean((q - y)^2)
            output_errors[[i, action]] = 2.0 * diff / batch_size as f32;
        }
        let loss = squared_error / batch_size as f32;
        if !loss.is_finite() {
            return Err(LaneChaseError::NumericalError(format!("non-finite loss {}", loss)));
        }

        let mut gradients = self.backward_batch(output_errors.view())?;
        clipper.clip(&mut gradients);

        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
        }
        optimizer.step();

        Ok(loss)
    }

    /// Overwrite every parameter with `source`'s. Both networks must share an
    /// architecture.
    pub fn copy_from(&mut self, source: &NeuralNetwork) -> Result<()> {
        if self.layer_sizes() != source.layer_sizes() {
            return Err(LaneChaseError::dimension_mismatch(
                format!("{:?}", self.layer_sizes()),
                format!("{:?}", source.layer_sizes()),
            ));
        }
        for (dst, src) in self.layers.iter_mut().zip(&source.layers) {
            dst.copy_parameters_from(src);
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(deserialize(bytes)?)
    }

    /// Save the network's parameters to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Load a network previously written by [`NeuralNetwork::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
