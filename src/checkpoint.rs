//! Persistence of the best policy seen during training.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::network::NeuralNetwork;

/// Receives the policy network whenever an episode beats the best reward.
pub trait Checkpointer {
    fn save(&mut self, network: &NeuralNetwork, episode: usize, reward: f32) -> Result<()>;
}

/// Writes the policy to a fixed path with bincode, overwriting the previous
/// best. Parent directories are created on first save.
#[derive(Debug, Clone)]
pub struct FileCheckpointer {
    path: PathBuf,
}

impl FileCheckpointer {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileCheckpointer { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpointer for FileCheckpointer {
    fn save(&mut self, network: &NeuralNetwork, episode: usize, reward: f32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        network.save(&self.path)?;
        tracing::debug!(episode, reward, path = %self.path.display(), "saved checkpoint");
        Ok(())
    }
}

/// Keeps the latest best policy in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointer {
    pub best: Option<(usize, f32, Vec<u8>)>,
    pub saves: usize,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the stored policy, if any.
    pub fn restore(&self) -> Result<Option<NeuralNetwork>> {
        match &self.best {
            Some((_, _, bytes)) => Ok(Some(NeuralNetwork::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }
}

impl Checkpointer for MemoryCheckpointer {
    fn save(&mut self, network: &NeuralNetwork, episode: usize, reward: f32) -> Result<()> {
        self.best = Some((episode, reward, network.to_bytes()?));
        self.saves += 1;
        Ok(())
    }
}
