use std::collections::VecDeque;
use std::path::Path;
use serde::{Serialize, Deserialize};

/// Summary of one finished episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub reward: f32,
    pub length: usize,
    /// Epsilon after this episode's decay
    pub epsilon: f32,
    /// NPC arrivals in the player's lane
    pub collisions: u32,
}

/// Stores training metrics over time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Every completed episode, in order
    pub episodes: Vec<EpisodeRecord>,

    /// Most recent loss values
    pub losses: VecDeque<f32>,

    /// Total learning steps taken
    pub learn_steps: usize,
}

/// Tracks metrics during training
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    loss_history: usize,

    // Episode tracking
    current_episode_reward: f32,
    current_episode_length: usize,

    // Step tracking
    total_steps: usize,
}

impl MetricsTracker {
    /// `loss_history` bounds how many recent losses are kept.
    pub fn new(loss_history: usize) -> Self {
        MetricsTracker {
            metrics: TrainingMetrics::default(),
            loss_history: loss_history.max(1),
            current_episode_reward: 0.0,
            current_episode_length: 0,
            total_steps: 0,
        }
    }

    /// Record a training loss
    pub fn record_loss(&mut self, loss: f32) {
        if self.metrics.losses.len() >= self.loss_history {
            self.metrics.losses.pop_front();
        }
        self.metrics.losses.push_back(loss);
        self.metrics.learn_steps += 1;
    }

    /// Start a new episode
    pub fn start_episode(&mut self) {
        self.current_episode_reward = 0.0;
        self.current_episode_length = 0;
    }

    /// Record a step within an episode
    pub fn step(&mut self, reward: f32) {
        self.current_episode_reward += reward;
        self.current_episode_length += 1;
        self.total_steps += 1;
    }

    pub fn current_episode_reward(&self) -> f32 {
        self.current_episode_reward
    }

    /// End the current episode and return its record
    pub fn end_episode(&mut self, epsilon: f32, collisions: u32) -> EpisodeRecord {
        let record = EpisodeRecord {
            reward: self.current_episode_reward,
            length: self.current_episode_length,
            epsilon,
            collisions,
        };
        self.metrics.episodes.push(record);
        record
    }

    /// Get a reference to the metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> TrainingMetrics {
        self.metrics
    }

    pub fn episode_count(&self) -> usize {
        self.metrics.episodes.len()
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Get recent average loss
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        if self.metrics.losses.is_empty() || window == 0 {
            return None;
        }

        let n = window.min(self.metrics.losses.len());
        let sum: f32 = self.metrics.losses.iter().rev().take(n).sum();
        Some(sum / n as f32)
    }

    /// Get recent average episode reward
    pub fn avg_episode_reward(&self, window: usize) -> Option<f32> {
        if self.metrics.episodes.is_empty() || window == 0 {
            return None;
        }

        let n = window.min(self.metrics.episodes.len());
        let sum: f32 = self.metrics.episodes.iter().rev().take(n).map(|e| e.reward).sum();
        Some(sum / n as f32)
    }

    /// Save metrics to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        let serialized = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}
