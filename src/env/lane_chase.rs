use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EnvConfig;
use crate::error::{LaneChaseError, Result};
use super::{Archetype, Environment, Step, StepInfo};

/// Length of the observation vector:
/// `[player_lane, npc0_lane, npc0_y, npc0_speed, archetype_code]`.
pub const OBSERVATION_DIM: usize = 5;

/// Moves available per NPC; actions encode `npc_index * 3 + move`.
pub const MOVES_PER_NPC: usize = 3;

/// Lane change applied to the NPC an action selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Stay,
    ShiftLeft,
    ShiftRight,
}

impl Move {
    fn from_code(code: usize) -> Self {
        match code % MOVES_PER_NPC {
            0 => Move::Stay,
            1 => Move::ShiftLeft,
            _ => Move::ShiftRight,
        }
    }
}

/// A non-player entity descending toward the player's row.
///
/// Negative `y` is off-screen above; `y >= arrival_y` means it has arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Npc {
    pub lane: usize,
    pub y: f32,
    pub speed: f32,
}

/// The drifting target. `lane` is stored as a real value; collisions compare
/// its truncation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub lane: f32,
    pub y: f32,
}

impl Player {
    /// Lane used for collision checks.
    pub fn lane_index(&self) -> usize {
        self.lane.max(0.0) as usize
    }
}

/// Lane-interception simulation.
///
/// The agent steers one NPC per step; the player drifts at random; every NPC
/// descends at its own speed with an archetype-dependent lane bias. An NPC
/// that arrives in the player's lane ends the episode with a large penalty.
/// Every random draw goes through the environment's own `rng`.
pub struct LaneChaseEnv<R: Rng = StdRng> {
    config: EnvConfig,
    rng: R,
    player: Player,
    npcs: Vec<Npc>,
    steps: usize,
    score: u32,
    last_distance: f32,
}

impl LaneChaseEnv<StdRng> {
    /// Environment with a seeded RNG, for reproducible runs.
    pub fn with_seed(config: EnvConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: EnvConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> LaneChaseEnv<R> {
    /// Validate `config` and build an environment already reset once.
    pub fn with_rng(config: EnvConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let player = Player {
            lane: (config.lanes / 2) as f32,
            y: config.player_y,
        };
        let mut env = LaneChaseEnv {
            config,
            rng,
            player,
            npcs: Vec::new(),
            steps: 0,
            score: 0,
            last_distance: 0.0,
        };
        env.reset();
        Ok(env)
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Place the player and NPCs explicitly, e.g. to stage a scenario.
    /// The cached distance is recomputed so the next reward compares against
    /// this layout.
    pub fn set_state(&mut self, player_lane: f32, npcs: Vec<Npc>) -> Result<()> {
        let last_lane = self.last_lane();
        if !(0.0..=last_lane as f32).contains(&player_lane) {
            return Err(LaneChaseError::invalid_parameter(
                "player_lane".to_string(),
                format!("{} outside [0, {}]", player_lane, last_lane),
            ));
        }
        if npcs.len() != self.config.npc_count {
            return Err(LaneChaseError::dimension_mismatch(
                format!("{} NPCs", self.config.npc_count),
                format!("{} NPCs", npcs.len()),
            ));
        }
        let invalid = |npc: &&Npc| {
            npc.lane > last_lane || !npc.y.is_finite() || !(npc.speed > 0.0 && npc.speed.is_finite())
        };
        if let Some(npc) = npcs.iter().find(invalid) {
            return Err(LaneChaseError::invalid_parameter(
                "npcs".to_string(),
                format!("invalid NPC {:?}", npc),
            ));
        }
        self.player.lane = player_lane;
        self.npcs = npcs;
        self.last_distance = self.min_distance();
        Ok(())
    }

    fn last_lane(&self) -> usize {
        self.config.lanes - 1
    }

    /// Smallest `|lane difference| + |vertical difference|` between the
    /// player and any NPC.
    fn min_distance(&self) -> f32 {
        self.npcs
            .iter()
            .map(|npc| (npc.lane as f32 - self.player.lane).abs() + (npc.y - self.player.y).abs())
            .fold(f32::INFINITY, f32::min)
    }

    fn observation(&self) -> Array1<f32> {
        let scale = self.last_lane() as f32;
        let lead = &self.npcs[0];
        array![
            self.player.lane / scale,
            lead.lane as f32 / scale,
            lead.y,
            lead.speed,
            self.config.archetype.code(),
        ]
    }

    fn spawn_npc(&mut self, index: usize) -> Npc {
        let (y_lo, y_hi) = self.config.spawn_y_range;
        let (s_lo, s_hi) = self.config.initial_speed_range;
        let lane = self.rng.gen_range(0..self.config.lanes);
        let y = self.rng.gen_range(y_lo..y_hi) - index as f32 * self.config.spawn_stagger;
        let speed = self.rng.gen_range(s_lo..s_hi);
        Npc { lane, y, speed }
    }

    /// Decode and apply the agent's lane change. Out-of-range NPC indices are
    /// clamped to the last NPC unless `strict_actions` is set.
    fn apply_action(&mut self, action: usize) -> Result<()> {
        let max_actions = self.action_space();
        if self.config.strict_actions && action >= max_actions {
            return Err(LaneChaseError::InvalidAction { action, max_actions });
        }
        let npc_index = (action / MOVES_PER_NPC).min(self.config.npc_count - 1);
        let last_lane = self.last_lane();
        let npc = &mut self.npcs[npc_index];
        match Move::from_code(action) {
            Move::Stay => {}
            Move::ShiftLeft => npc.lane = npc.lane.saturating_sub(1),
            Move::ShiftRight => npc.lane = (npc.lane + 1).min(last_lane),
        }
        Ok(())
    }

    /// With `player_drift_prob`, try a left shift half the time; when that is
    /// not taken (coin flip or already at lane 0) shift right if room remains.
    fn drift_player(&mut self) {
        if !self.rng.gen_bool(self.config.player_drift_prob) {
            return;
        }
        let last_lane = self.last_lane() as f32;
        if self.rng.gen_bool(0.5) && self.player.lane > 0.0 {
            self.player.lane -= 1.0;
        } else if self.player.lane < last_lane {
            self.player.lane += 1.0;
        }
    }

    fn shaping_reward(&self, min_dist: f32) -> f32 {
        let (band_lo, band_hi) = self.config.engagement_band;
        let mut reward = 0.0;
        if min_dist < self.last_distance {
            reward += self.config.reward_closing;
        } else if min_dist > band_lo && min_dist <= band_hi {
            reward += self.config.reward_engaged;
        } else if min_dist > band_hi {
            reward += self.config.reward_far;
        }
        reward + self.config.reward_survival
    }

    /// Descend every NPC, apply archetype bias, and resolve arrivals.
    /// Returns the collision penalty accrued and whether a collision occurred.
    fn advance_npcs(&mut self) -> (f32, bool) {
        let last_lane = self.last_lane();
        let player_lane = self.player.lane_index();
        let target_lane = self.player.lane.round().max(0.0) as usize;
        let mut penalty = 0.0;
        let mut collided = false;

        for i in 0..self.npcs.len() {
            let mut npc = self.npcs[i];
            npc.y += npc.speed;

            match self.config.archetype {
                Archetype::Aggressive => {
                    if self.rng.gen_bool(self.config.aggressive_bias_prob) {
                        if npc.lane < target_lane {
                            npc.lane = (npc.lane + 1).min(last_lane);
                        } else if npc.lane > target_lane {
                            npc.lane -= 1;
                        }
                    }
                }
                Archetype::Defensive => {
                    if self.rng.gen_bool(self.config.defensive_bias_prob) && npc.lane == player_lane {
                        npc.lane = if self.rng.gen_bool(0.5) {
                            npc.lane.saturating_sub(1)
                        } else {
                            (npc.lane + 1).min(last_lane)
                        };
                    }
                }
                Archetype::Neutral => {}
            }

            if npc.y >= self.config.arrival_y {
                if npc.lane == player_lane {
                    penalty += self.config.collision_penalty;
                    collided = true;
                    self.score += 1;
                }
                npc = self.respawn_npc();
            }

            self.npcs[i] = npc;
        }

        (penalty, collided)
    }

    fn respawn_npc(&mut self) -> Npc {
        let (y_lo, y_hi) = self.config.spawn_y_range;
        let (s_lo, s_hi) = self.config.respawn_speed_range;
        let y = self.rng.gen_range(y_lo..y_hi);
        let lane = self.rng.gen_range(0..self.config.lanes);
        let speed = self.rng.gen_range(s_lo..s_hi);
        Npc { lane, y, speed }
    }
}

impl<R: Rng> Environment for LaneChaseEnv<R> {
    fn reset(&mut self) -> Array1<f32> {
        self.player = Player {
            lane: (self.config.lanes / 2) as f32,
            y: self.config.player_y,
        };
        let npcs: Vec<Npc> = (0..self.config.npc_count).map(|i| self.spawn_npc(i)).collect();
        self.npcs = npcs;
        self.steps = 0;
        self.score = 0;
        self.last_distance = self.min_distance();
        self.observation()
    }

    /// One tick: agent move, player drift, distance shaping (measured before
    /// NPCs advance), NPC descent and bias, arrivals, then the step cap.
    fn step(&mut self, action: usize) -> Result<Step> {
        self.apply_action(action)?;
        self.steps += 1;

        self.drift_player();

        let min_dist = self.min_distance();
        let mut reward = self.shaping_reward(min_dist);

        let (penalty, collided) = self.advance_npcs();
        reward += penalty;

        self.last_distance = min_dist;

        let done = collided || self.steps >= self.config.max_steps;

        Ok(Step {
            obs: self.observation(),
            reward,
            done,
            info: StepInfo {
                score: self.score,
                steps: self.steps,
            },
        })
    }

    fn action_space(&self) -> usize {
        MOVES_PER_NPC * self.config.npc_count
    }

    fn observation_space_dim(&self) -> usize {
        OBSERVATION_DIM
    }
}
