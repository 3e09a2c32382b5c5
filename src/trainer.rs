//! # Trainer
//!
//! Runs DQN episodes against an [`Environment`]:
//!
//! ```text
//! per episode: reset
//!   per step:  act (epsilon-greedy) -> env.step -> store -> [learn]
//! decay epsilon -> [sync target] -> [log] -> [checkpoint on new best]
//! ```
//!
//! Learning starts once the replay buffer holds `min_replay` transitions and
//! then takes one gradient step per environment step. The target network is
//! synchronized only at episode boundaries.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::agent::{DqnAgent, DqnAgentBuilder};
use crate::checkpoint::Checkpointer;
use crate::config::TrainerConfig;
use crate::env::Environment;
use crate::error::{LaneChaseError, Result};
use crate::metrics::{EpisodeRecord, MetricsTracker, TrainingMetrics};
use crate::network::NeuralNetwork;
use crate::replay_buffer::{ReplayBuffer, Transition};

/// Best reward before any episode has finished.
const INITIAL_BEST_REWARD: f32 = -1e9;

/// Seed offsets so the agent's weights and the trainer's exploration stream
/// differ even when both derive from one run seed.
const AGENT_SEED_OFFSET: u64 = 0x5EED_0001;
const TRAINER_SEED_OFFSET: u64 = 0x5EED_0002;

/// Outcome of a full training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metrics: TrainingMetrics,
    pub best_reward: f32,
    pub final_epsilon: f32,
    pub target_syncs: usize,
    pub checkpoints: usize,
}

/// Greedy-policy rollout statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub episodes: usize,
    pub mean_reward: f32,
    pub mean_length: f32,
    pub collisions: u32,
}

pub struct Trainer<E: Environment, C: Checkpointer> {
    env: E,
    agent: DqnAgent,
    buffer: ReplayBuffer,
    config: TrainerConfig,
    rng: StdRng,
    checkpointer: C,
    metrics: MetricsTracker,
    best_reward: f32,
    checkpoints: usize,
}

impl<E: Environment, C: Checkpointer> Trainer<E, C> {
    /// Build a trainer whose networks are sized from `env`'s observation and
    /// action spaces. With `seed`, weight initialization, exploration and
    /// minibatch sampling are reproducible.
    pub fn new(env: E, config: TrainerConfig, checkpointer: C, seed: Option<u64>) -> Result<Self> {
        config.validate()?;

        let mut builder = DqnAgentBuilder::new(env.observation_space_dim(), env.action_space())
            .hidden_sizes(&config.hidden_sizes)
            .hidden_activation(config.hidden_activation)
            .optimizer(config.optimizer.build())
            .use_double_dqn(config.double_dqn)
            .gradient_clipper(config.gradient_clipper)
            .epsilon(config.epsilon_start)
            .epsilon_decay(config.epsilon_end, config.epsilon_decay);
        if let Some(seed) = seed {
            builder = builder.seed(seed.wrapping_add(AGENT_SEED_OFFSET));
        }
        let agent = builder.build()?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(TRAINER_SEED_OFFSET)),
            None => StdRng::from_entropy(),
        };

        Ok(Trainer {
            env,
            agent,
            buffer: ReplayBuffer::new(config.buffer_capacity),
            config,
            rng,
            checkpointer,
            metrics: MetricsTracker::default(),
            best_reward: INITIAL_BEST_REWARD,
            checkpoints: 0,
        })
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DqnAgent {
        &mut self.agent
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn epsilon(&self) -> f32 {
        self.agent.epsilon()
    }

    pub fn best_reward(&self) -> f32 {
        self.best_reward
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    pub fn checkpointer(&self) -> &C {
        &self.checkpointer
    }

    /// Run `config.episodes` episodes and report.
    pub fn train(&mut self) -> Result<TrainingReport> {
        let episodes = self.config.episodes;
        tracing::info!(
            episodes,
            actions = self.env.action_space(),
            observation_dim = self.env.observation_space_dim(),
            parameters = self.agent.q_network.parameter_count(),
            "starting training"
        );

        for episode in 1..=episodes {
            self.run_episode(episode)?;
        }

        tracing::info!(
            best_reward = self.best_reward,
            checkpoints = self.checkpoints,
            "training finished"
        );

        Ok(TrainingReport {
            metrics: self.metrics.metrics().clone(),
            best_reward: self.best_reward,
            final_epsilon: self.agent.epsilon(),
            target_syncs: self.agent.target_syncs,
            checkpoints: self.checkpoints,
        })
    }

    /// Play one episode (1-based `episode` drives the sync, log and
    /// checkpoint cadence) and return its record.
    pub fn run_episode(&mut self, episode: usize) -> Result<EpisodeRecord> {
        let mut state = self.env.reset();
        self.metrics.start_episode();

        let collisions = loop {
            let action = self.agent.act(state.view(), &mut self.rng)?;
            let step = self.env.step(action)?;
            self.metrics.step(step.reward);

            self.buffer.push(Transition {
                state,
                action,
                reward: step.reward,
                next_state: step.obs.clone(),
                done: step.done,
            });

            if self.buffer.len() >= self.config.min_replay {
                let loss = self.learn()?;
                self.metrics.record_loss(loss);
            }

            state = step.obs;
            if step.done {
                break step.info.score;
            }
        };

        let epsilon = self.agent.decay_epsilon();

        if episode % self.config.target_update == 0 {
            self.agent.sync_target()?;
            tracing::debug!(episode, syncs = self.agent.target_syncs, "synchronized target network");
        }

        let record = self.metrics.end_episode(epsilon, collisions);

        if episode % self.config.log_interval == 0 {
            tracing::info!(
                episode,
                episodes = self.config.episodes,
                reward = record.reward,
                avg_reward = self.metrics.avg_episode_reward(self.config.log_interval).unwrap_or(record.reward),
                loss = self.metrics.avg_loss(self.config.log_interval * 10).unwrap_or(f32::NAN),
                epsilon,
                buffer = self.buffer.len(),
                "episode finished"
            );
        }

        if record.reward > self.best_reward {
            self.best_reward = record.reward;
            self.checkpointer.save(&self.agent.q_network, episode, record.reward)?;
            self.checkpoints += 1;
        }

        Ok(record)
    }

    /// Sample a minibatch and take one gradient step on the policy network.
    fn learn(&mut self) -> Result<f32> {
        let batch = self.buffer.sample(self.config.batch_size, &mut self.rng);
        self.agent.train_on_batch(&batch, self.config.gamma, self.config.learning_rate)
    }
}

/// Roll out the greedy policy of `network` for `episodes` episodes.
pub fn evaluate<E: Environment>(env: &mut E, network: &NeuralNetwork, episodes: usize) -> Result<EvaluationReport> {
    if episodes == 0 {
        return Err(LaneChaseError::invalid_parameter("episodes", "must be positive"));
    }
    if network.input_size() != env.observation_space_dim() || network.output_size() != env.action_space() {
        return Err(LaneChaseError::dimension_mismatch(
            format!("{} -> {}", env.observation_space_dim(), env.action_space()),
            format!("{} -> {}", network.input_size(), network.output_size()),
        ));
    }

    let mut total_reward = 0.0;
    let mut total_length = 0;
    let mut collisions = 0;

    for _ in 0..episodes {
        let mut state: Array1<f32> = env.reset();
        loop {
            let q_values = network.predict(state.view())?;
            let action = crate::agent::argmax(q_values.view())
                .ok_or_else(|| LaneChaseError::NumericalError("No valid Q-values".to_string()))?;
            let step = env.step(action)?;
            total_reward += step.reward;
            total_length += 1;
            state = step.obs;
            if step.done {
                collisions += step.info.score;
                break;
            }
        }
    }

    Ok(EvaluationReport {
        episodes,
        mean_reward: total_reward / episodes as f32,
        mean_length: total_length as f32 / episodes as f32,
        collisions,
    })
}
