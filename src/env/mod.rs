//! # Environments
//!
//! The [`Environment`] trait is the contract the trainer drives: reset to an
//! initial observation, step with a discrete action, and report the sizes the
//! value networks must be built with. [`LaneChaseEnv`] is the lane-interception
//! simulation in which NPCs learn to close in on a drifting player.

pub mod archetype;
pub mod lane_chase;

use ndarray::Array1;

use crate::error::Result;

pub use archetype::Archetype;
pub use lane_chase::{LaneChaseEnv, Move, Npc, Player, OBSERVATION_DIM};

/// Per-step diagnostics returned alongside the reward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepInfo {
    /// Collisions so far in this episode.
    pub score: u32,
    /// Steps taken so far in this episode.
    pub steps: usize,
}

/// The outcome of a single environment tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub obs: Array1<f32>,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

pub trait Environment {
    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Array1<f32>;

    /// Advance one tick with a discrete action.
    fn step(&mut self, action: usize) -> Result<Step>;

    /// Number of discrete actions.
    fn action_space(&self) -> usize;

    /// Length of an observation vector.
    fn observation_space_dim(&self) -> usize;
}
