//! # Lanechase - DQN training for lane-interception NPCs
//!
//! A small deep Q-learning stack for teaching a group of NPCs to intercept a
//! drifting player on a multi-lane road. Each step the agent moves one NPC
//! one lane left, right, or not at all; NPCs descend toward the player's row
//! and an arrival in the player's lane ends the episode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lanechase::checkpoint::FileCheckpointer;
//! use lanechase::config::RunConfig;
//! use lanechase::env::LaneChaseEnv;
//! use lanechase::trainer::Trainer;
//!
//! let config = RunConfig::default();
//! let env = LaneChaseEnv::with_seed(config.env.clone(), 42).unwrap();
//! let checkpointer = FileCheckpointer::new(&config.checkpoint_path);
//!
//! let mut trainer = Trainer::new(env, config.trainer.clone(), checkpointer, Some(42)).unwrap();
//! let report = trainer.train().unwrap();
//! println!("best reward {}", report.best_reward);
//! ```
//!
//! ## Module Organization
//!
//! - [`env`] - The [`env::Environment`] trait and the lane-chase simulation
//! - [`replay_buffer`] - Bounded FIFO experience storage with uniform sampling
//! - [`network`] - Feed-forward Q-value network built from [`layers`]
//! - [`agent`] - DQN agent owning the policy/target pair
//! - [`optimizer`] - SGD and Adam with per-layer state, gradient clipping
//! - [`trainer`] - Episode loop, target sync, checkpointing, evaluation
//! - [`config`] - JSON-loadable environment and trainer settings
//! - [`metrics`] - Per-episode records and loss history
//! - [`checkpoint`] - Where the best policy goes
//! - [`error`] - Error types and result handling

pub mod activations;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
