use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

use super::EpsilonSchedule;
use crate::activations::Activation;
use crate::error::{LaneChaseError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{GradientClipper, OptimizerWrapper};
use crate::replay_buffer::Transition;

/// Index of the largest value; ties go to the first maximum. NaN entries
/// never win. `None` for an empty or all-NaN input.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if v <= best_value => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Deep Q-Network agent with a policy network and a target network.
///
/// The policy network is updated by [`DqnAgent::train_on_batch`]; the target
/// network only changes through [`DqnAgent::sync_target`], which the trainer
/// calls on a fixed episode cadence.
pub struct DqnAgent {
    /// Network used for action selection and trained every learning step
    pub q_network: NeuralNetwork,

    /// Frozen copy used for bootstrapped targets
    pub target_network: NeuralNetwork,

    /// Optimizer state for `q_network`
    pub optimizer: OptimizerWrapper,

    /// Exploration rate and its per-episode decay
    pub exploration: EpsilonSchedule,

    /// Select next actions with `q_network`, evaluate them with `target_network`
    pub use_double_dqn: bool,

    pub gradient_clipper: GradientClipper,

    /// Number of training steps performed
    pub train_steps: usize,

    /// Number of target synchronizations performed
    pub target_syncs: usize,
}

impl DqnAgent {
    /// Build an agent around an existing policy network. The target starts as
    /// an exact copy.
    pub fn from_network(q_network: NeuralNetwork, optimizer: OptimizerWrapper, exploration: EpsilonSchedule) -> Self {
        let target_network = q_network.clone();
        DqnAgent {
            q_network,
            target_network,
            optimizer,
            exploration,
            use_double_dqn: false,
            gradient_clipper: GradientClipper::None,
            train_steps: 0,
            target_syncs: 0,
        }
    }

    pub fn num_actions(&self) -> usize {
        self.q_network.output_size()
    }

    pub fn state_size(&self) -> usize {
        self.q_network.input_size()
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.value()
    }

    /// Epsilon-greedy action selection: with probability `epsilon` a uniform
    /// random action, otherwise the greedy one.
    pub fn act<R: Rng + ?Sized>(&self, state: ArrayView1<f32>, rng: &mut R) -> Result<usize> {
        if rng.gen::<f32>() < self.epsilon() {
            Ok(rng.gen_range(0..self.num_actions()))
        } else {
            self.greedy_action(state)
        }
    }

    /// Action maximizing the policy network's estimate, first maximum on ties.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_network.predict(state)?;
        argmax(q_values.view())
            .ok_or_else(|| LaneChaseError::NumericalError("No valid Q-values".to_string()))
    }

    /// Update epsilon, clamped to `[0, 1]`
    pub fn update_epsilon(&mut self, epsilon: f32) {
        self.exploration.set(epsilon);
    }

    /// Apply one episode's decay and return the new rate.
    pub fn decay_epsilon(&mut self) -> f32 {
        self.exploration.decay()
    }

    /// Copy every policy parameter into the target network.
    pub fn sync_target(&mut self) -> Result<()> {
        self.target_network.copy_from(&self.q_network)?;
        self.target_syncs += 1;
        Ok(())
    }

    /// One gradient step on a minibatch.
    ///
    /// Each transition's target is `reward + gamma * max_a target(next)[a] *
    /// (1 - done)`; the loss is the mean-squared error between the policy's
    /// estimate for the taken action and that target. Returns the loss.
    pub fn train_on_batch(&mut self, batch: &[&Transition], gamma: f32, learning_rate: f32) -> Result<f32> {
        if batch.is_empty() {
            return Err(LaneChaseError::EmptyBuffer("No transitions to train on".to_string()));
        }

        let batch_size = batch.len();
        let state_size = self.state_size();

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Vec::with_capacity(batch_size);

        for (i, t) in batch.iter().enumerate() {
            if t.state.len() != state_size || t.next_state.len() != state_size {
                return Err(LaneChaseError::dimension_mismatch(
                    state_size.to_string(),
                    t.state.len().max(t.next_state.len()).to_string(),
                ));
            }
            states.row_mut(i).assign(&t.state);
            next_states.row_mut(i).assign(&t.next_state);
            actions.push(t.action);
        }

        let next_values = self.next_state_values(&next_states)?;

        let targets: Array1<f32> = batch
            .iter()
            .zip(next_values.iter())
            .map(|(t, &next_value)| {
                let not_done = if t.done { 0.0 } else { 1.0 };
                t.reward + gamma * next_value * not_done
            })
            .collect();

        let loss = self.q_network.train_on_actions(
            states.view(),
            &actions,
            targets.view(),
            learning_rate,
            &mut self.optimizer,
            &self.gradient_clipper,
        )?;

        self.train_steps += 1;
        Ok(loss)
    }

    /// Bootstrap value of each next state according to the target network.
    fn next_state_values(&self, next_states: &Array2<f32>) -> Result<Array1<f32>> {
        let target_q = self.target_network.predict_batch(next_states.view())?;

        if self.use_double_dqn {
            let online_q = self.q_network.predict_batch(next_states.view())?;
            Ok(online_q
                .rows()
                .into_iter()
                .zip(target_q.rows())
                .map(|(online_row, target_row)| {
                    let best = argmax(online_row).unwrap_or(0);
                    target_row[best]
                })
                .collect())
        } else {
            Ok(target_q
                .rows()
                .into_iter()
                .map(|row| row.iter().fold(f32::NEG_INFINITY, |max, &v| max.max(v)))
                .collect())
        }
    }

    /// Persist the policy network's parameters.
    pub fn save_policy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.q_network.save(path)
    }

    /// Replace both networks with a saved policy of the same architecture.
    pub fn load_policy<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let loaded = NeuralNetwork::load(path)?;
        self.q_network.copy_from(&loaded)?;
        self.target_network.copy_from(&loaded)?;
        Ok(())
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    state_size: usize,
    num_actions: usize,
    hidden_sizes: Vec<usize>,
    hidden_activation: Activation,
    epsilon: f32,
    epsilon_end: Option<f32>,
    epsilon_decay: f32,
    optimizer: Option<OptimizerWrapper>,
    use_double_dqn: bool,
    gradient_clipper: GradientClipper,
    seed: Option<u64>,
}

impl DqnAgentBuilder {
    /// Start a builder for a network mapping `state_size` inputs to
    /// `num_actions` values, both taken from the environment.
    pub fn new(state_size: usize, num_actions: usize) -> Self {
        DqnAgentBuilder {
            state_size,
            num_actions,
            hidden_sizes: vec![128, 64],
            hidden_activation: Activation::Relu,
            epsilon: 1.0,
            epsilon_end: None,
            epsilon_decay: 1.0,
            optimizer: None,
            use_double_dqn: false,
            gradient_clipper: GradientClipper::None,
            seed: None,
        }
    }

    pub fn hidden_sizes(mut self, sizes: &[usize]) -> Self {
        self.hidden_sizes = sizes.to_vec();
        self
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.hidden_activation = activation;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Decay epsilon by `decay` per episode down to `end`. Without this the
    /// rate stays at its starting value.
    pub fn epsilon_decay(mut self, end: f32, decay: f32) -> Self {
        self.epsilon_end = Some(end);
        self.epsilon_decay = decay;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerWrapper) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn use_double_dqn(mut self, use_double: bool) -> Self {
        self.use_double_dqn = use_double;
        self
    }

    pub fn gradient_clipper(mut self, clipper: GradientClipper) -> Self {
        self.gradient_clipper = clipper;
        self
    }

    /// Seed for weight initialization.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        if self.state_size == 0 || self.num_actions == 0 {
            return Err(LaneChaseError::invalid_parameter(
                "layer_sizes",
                "state size and action count must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(LaneChaseError::invalid_parameter("epsilon", "must lie in [0, 1]"));
        }
        let epsilon_end = self.epsilon_end.unwrap_or(self.epsilon);
        if !(0.0..=self.epsilon).contains(&epsilon_end) {
            return Err(LaneChaseError::invalid_parameter("epsilon_end", "must lie in [0, epsilon]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(LaneChaseError::invalid_parameter("epsilon_decay", "must lie in (0, 1]"));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let q_network = NeuralNetwork::q_network(
            self.state_size,
            &self.hidden_sizes,
            self.num_actions,
            self.hidden_activation,
            &mut rng,
        )?;

        let optimizer = self.optimizer.unwrap_or_else(OptimizerWrapper::adam);
        let mut agent = DqnAgent::from_network(
            q_network,
            optimizer,
            EpsilonSchedule::new(self.epsilon, epsilon_end, self.epsilon_decay),
        );
        agent.use_double_dqn = self.use_double_dqn;
        agent.gradient_clipper = self.gradient_clipper;
        Ok(agent)
    }
}
