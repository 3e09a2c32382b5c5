//! # DQN Agent
//!
//! The value function pair and its exploration policy.
//!
//! - [`DqnAgent`] owns a *policy* network, trained every learning step, and a
//!   *target* network, a point-in-time copy refreshed by
//!   [`DqnAgent::sync_target`] and used only to compute bootstrapped targets.
//! - [`EpsilonSchedule`] holds the exploration rate and its per-episode
//!   multiplicative decay.
//!
//! ```rust,no_run
//! use lanechase::agent::DqnAgentBuilder;
//! use ndarray::array;
//! use rand::SeedableRng;
//!
//! let agent = DqnAgentBuilder::new(5, 9)
//!     .hidden_sizes(&[128, 64])
//!     .epsilon(1.0)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let action = agent.act(array![0.5, 0.25, -0.4, 0.02, 1.0].view(), &mut rng).unwrap();
//! assert!(action < 9);
//! ```

mod dqn;
pub mod exploration;

pub use dqn::{argmax, DqnAgent, DqnAgentBuilder};
pub use exploration::EpsilonSchedule;
