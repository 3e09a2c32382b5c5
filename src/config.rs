//! Run configuration: environment geometry and dynamics, DQN hyperparameters,
//! and the run-level settings that tie them together.
//!
//! Every struct deserializes from JSON with missing fields falling back to
//! the defaults below, so a config file only has to name what it changes.

use serde::{Serialize, Deserialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::activations::Activation;
use crate::env::Archetype;
use crate::error::{LaneChaseError, Result};
use crate::optimizer::{GradientClipper, OptimizerWrapper, SGD};

/// Environment construction parameters and simulation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    // --- Geometry ---
    /// Number of lanes (at least 2).
    pub lanes: usize,
    /// Number of NPCs under the agent's control (at least 1).
    pub npc_count: usize,
    /// Behavioural bias applied to every NPC.
    pub archetype: Archetype,
    /// Episode step cap.
    pub max_steps: usize,

    // --- Player ---
    /// Fixed vertical position of the player.
    pub player_y: f32,
    /// Probability per step that the player shifts one lane.
    pub player_drift_prob: f64,

    // --- Spawning ---
    /// Vertical spawn range `[min, max)`, both negative (off-screen).
    pub spawn_y_range: (f32, f32),
    /// Extra upward offset per NPC index at reset.
    pub spawn_stagger: f32,
    /// Speed range at reset.
    pub initial_speed_range: (f32, f32),
    /// Speed range on respawn after arrival.
    pub respawn_speed_range: (f32, f32),
    /// Vertical position at which an NPC has arrived.
    pub arrival_y: f32,

    // --- Archetype bias ---
    pub aggressive_bias_prob: f64,
    pub defensive_bias_prob: f64,

    // --- Reward shaping ---
    /// Reward when the minimum distance shrinks.
    pub reward_closing: f32,
    /// Lower (exclusive) and upper (inclusive) bound of the engagement band.
    pub engagement_band: (f32, f32),
    pub reward_engaged: f32,
    /// Penalty (negative) when beyond the engagement band.
    pub reward_far: f32,
    /// Added every step.
    pub reward_survival: f32,
    /// Added on a terminal collision.
    pub collision_penalty: f32,

    /// Reject out-of-range actions instead of clamping them.
    pub strict_actions: bool,
}

impl EnvConfig {
    pub fn new(lanes: usize, npc_count: usize, archetype: Archetype, max_steps: usize) -> Self {
        EnvConfig {
            lanes,
            npc_count,
            archetype,
            max_steps,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.lanes < 2 {
            return Err(LaneChaseError::invalid_parameter("lanes", "need at least 2 lanes"));
        }
        if self.npc_count < 1 {
            return Err(LaneChaseError::invalid_parameter("npc_count", "need at least 1 NPC"));
        }
        if self.max_steps < 1 {
            return Err(LaneChaseError::invalid_parameter("max_steps", "must be positive"));
        }
        check_probability("player_drift_prob", self.player_drift_prob)?;
        check_probability("aggressive_bias_prob", self.aggressive_bias_prob)?;
        check_probability("defensive_bias_prob", self.defensive_bias_prob)?;

        check_finite("player_y", self.player_y)?;
        check_finite("arrival_y", self.arrival_y)?;
        check_finite("spawn_stagger", self.spawn_stagger)?;
        if self.spawn_stagger < 0.0 {
            return Err(LaneChaseError::invalid_parameter("spawn_stagger", "must not be negative"));
        }

        let (lo, hi) = self.spawn_y_range;
        if !(lo.is_finite() && lo < hi && hi <= 0.0) {
            return Err(LaneChaseError::invalid_parameter(
                "spawn_y_range",
                "must be a non-empty range at or above the top edge (negative y)",
            ));
        }
        check_speed_range("initial_speed_range", self.initial_speed_range)?;
        check_speed_range("respawn_speed_range", self.respawn_speed_range)?;

        let (band_lo, band_hi) = self.engagement_band;
        if !(band_lo.is_finite() && band_hi.is_finite() && band_lo < band_hi) {
            return Err(LaneChaseError::invalid_parameter("engagement_band", "lower bound must be below upper bound"));
        }
        Ok(())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            lanes: 5,
            npc_count: 3,
            archetype: Archetype::Aggressive,
            max_steps: 200,
            player_y: 0.9,
            player_drift_prob: 0.6,
            spawn_y_range: (-1.0, -0.2),
            spawn_stagger: 0.3,
            initial_speed_range: (0.01, 0.03),
            respawn_speed_range: (0.01, 0.04),
            arrival_y: 1.0,
            aggressive_bias_prob: 0.2,
            defensive_bias_prob: 0.15,
            reward_closing: 1.0,
            engagement_band: (0.3, 0.6),
            reward_engaged: 0.5,
            reward_far: -0.5,
            reward_survival: 0.1,
            collision_penalty: -100.0,
            strict_actions: false,
        }
    }
}

/// Optimizer selection for the policy network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(&self) -> OptimizerWrapper {
        match self {
            OptimizerKind::Adam => OptimizerWrapper::adam(),
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new()),
        }
    }
}

/// DQN hyperparameters consumed by the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub gamma: f32,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub buffer_capacity: usize,
    /// Buffer fill required before any learning step.
    pub min_replay: usize,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    pub epsilon_decay: f32,
    pub episodes: usize,
    /// Copy policy into target every this many episodes.
    pub target_update: usize,
    /// Log progress every this many episodes.
    pub log_interval: usize,
    pub hidden_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub optimizer: OptimizerKind,
    pub gradient_clipper: GradientClipper,
    /// Select next actions with the policy network and evaluate them with the target.
    pub double_dqn: bool,
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(LaneChaseError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(LaneChaseError::invalid_parameter("learning_rate", "must be positive"));
        }
        if self.batch_size == 0 {
            return Err(LaneChaseError::invalid_parameter("batch_size", "must be positive"));
        }
        if self.buffer_capacity < self.batch_size {
            return Err(LaneChaseError::invalid_parameter("buffer_capacity", "must hold at least one batch"));
        }
        if self.min_replay < self.batch_size || self.min_replay > self.buffer_capacity {
            return Err(LaneChaseError::invalid_parameter(
                "min_replay",
                "must lie between batch_size and buffer_capacity",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon_end) || !(0.0..=1.0).contains(&self.epsilon_start) {
            return Err(LaneChaseError::invalid_parameter("epsilon", "start and end must lie in [0, 1]"));
        }
        if self.epsilon_end > self.epsilon_start {
            return Err(LaneChaseError::invalid_parameter("epsilon_end", "must not exceed epsilon_start"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(LaneChaseError::invalid_parameter("epsilon_decay", "must lie in (0, 1]"));
        }
        if self.target_update == 0 || self.log_interval == 0 {
            return Err(LaneChaseError::invalid_parameter("intervals", "target_update and log_interval must be positive"));
        }
        if self.hidden_sizes.len() < 2 || self.hidden_sizes.contains(&0) {
            return Err(LaneChaseError::invalid_parameter("hidden_sizes", "need at least two non-empty hidden layers"));
        }
        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            gamma: 0.99,
            learning_rate: 1e-3,
            batch_size: 64,
            buffer_capacity: 5000,
            min_replay: 500,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.995,
            episodes: 1000,
            target_update: 20,
            log_interval: 10,
            hidden_sizes: vec![128, 64],
            hidden_activation: Activation::Relu,
            optimizer: OptimizerKind::Adam,
            gradient_clipper: GradientClipper::None,
            double_dqn: false,
        }
    }
}

/// Everything needed to launch a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub env: EnvConfig,
    pub trainer: TrainerConfig,
    /// Seed for every random source in the run; `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Where the best policy so far is written.
    pub checkpoint_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            env: EnvConfig::default(),
            trainer: TrainerConfig::default(),
            seed: None,
            checkpoint_path: PathBuf::from("models/dqn_agent.bin"),
        }
    }
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.env.validate()?;
        self.trainer.validate()
    }
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(LaneChaseError::invalid_parameter(name.to_string(), "must lie in [0, 1]".to_string()))
    }
}

fn check_finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LaneChaseError::invalid_parameter(name.to_string(), "must be finite".to_string()))
    }
}

fn check_speed_range(name: &str, (lo, hi): (f32, f32)) -> Result<()> {
    if lo > 0.0 && lo < hi && hi.is_finite() {
        Ok(())
    } else {
        Err(LaneChaseError::invalid_parameter(name.to_string(), "must be a non-empty positive range".to_string()))
    }
}
