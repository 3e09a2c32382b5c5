use serde::{Serialize, Deserialize};

/// Exploration rate decayed multiplicatively once per episode and floored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub end: f32,
    pub decay: f32,
    current: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, end: f32, decay: f32) -> Self {
        EpsilonSchedule {
            start,
            end,
            decay,
            current: start,
        }
    }

    /// Schedule that holds `value` forever.
    pub fn constant(value: f32) -> Self {
        Self::new(value, value, 1.0)
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    /// Overwrite the current rate, clamped to `[0, 1]`.
    pub fn set(&mut self, value: f32) {
        self.current = value.clamp(0.0, 1.0);
    }

    /// `epsilon = max(end, epsilon * decay)`; returns the new value.
    pub fn decay(&mut self) -> f32 {
        self.current = (self.current * self.decay).max(self.end);
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.start;
    }
}
