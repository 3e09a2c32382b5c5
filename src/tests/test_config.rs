use std::path::PathBuf;
use tempfile::tempdir;

use crate::config::{EnvConfig, OptimizerKind, RunConfig, TrainerConfig};
use crate::env::Archetype;
use crate::error::LaneChaseError;
use crate::optimizer::{GradientClipper, OptimizerWrapper};

#[test]
fn test_default_values() {
    let run = RunConfig::default();
    assert_eq!(run.env.lanes, 5);
    assert_eq!(run.env.npc_count, 3);
    assert_eq!(run.env.archetype, Archetype::Aggressive);
    assert_eq!(run.env.max_steps, 200);
    assert_eq!(run.env.collision_penalty, -100.0);

    assert_eq!(run.trainer.gamma, 0.99);
    assert_eq!(run.trainer.batch_size, 64);
    assert_eq!(run.trainer.buffer_capacity, 5000);
    assert_eq!(run.trainer.min_replay, 500);
    assert_eq!(run.trainer.target_update, 20);
    assert_eq!(run.trainer.hidden_sizes, vec![128, 64]);
    assert!(!run.trainer.double_dqn);

    assert_eq!(run.seed, None);
    assert_eq!(run.checkpoint_path, PathBuf::from("models/dqn_agent.bin"));
    assert!(run.validate().is_ok());
}

#[test]
fn test_partial_json_uses_defaults() {
    let json = r#"{
        "env": { "lanes": 7, "archetype": "defensive", "spawn_y_range": [-2.0, -0.5] },
        "trainer": {
            "episodes": 10,
            "optimizer": "sgd",
            "gradient_clipper": { "clip_by_global_norm": { "max_norm": 1.0 } }
        },
        "seed": 3
    }"#;
    let run = RunConfig::from_json_str(json).unwrap();

    assert_eq!(run.env.lanes, 7);
    assert_eq!(run.env.archetype, Archetype::Defensive);
    assert_eq!(run.env.spawn_y_range, (-2.0, -0.5));
    assert_eq!(run.env.npc_count, 3);
    assert_eq!(run.trainer.episodes, 10);
    assert_eq!(run.trainer.optimizer, OptimizerKind::Sgd);
    assert_eq!(run.trainer.gradient_clipper, GradientClipper::ClipByGlobalNorm { max_norm: 1.0 });
    assert_eq!(run.trainer.batch_size, 64);
    assert_eq!(run.seed, Some(3));
}

#[test]
fn test_json_round_trip() {
    let mut run = RunConfig::default();
    run.seed = Some(99);
    run.trainer.double_dqn = true;
    run.env.strict_actions = true;

    let json = run.to_json_string().unwrap();
    assert_eq!(RunConfig::from_json_str(&json).unwrap(), run);
}

#[test]
fn test_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, r#"{ "trainer": { "episodes": 5 } }"#).unwrap();

    let run = RunConfig::from_json_file(&path).unwrap();
    assert_eq!(run.trainer.episodes, 5);

    let err = RunConfig::from_json_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, LaneChaseError::IoError(_)));
}

#[test]
fn test_malformed_json() {
    let err = RunConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, LaneChaseError::ConfigError(_)));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let err = RunConfig::from_json_str(r#"{ "env": { "lanes": 1 } }"#).unwrap_err();
    assert!(matches!(err, LaneChaseError::InvalidParameter { .. }));
}

#[test]
fn test_env_validation() {
    let mut config = EnvConfig::default();
    config.player_drift_prob = 1.5;
    assert!(config.validate().is_err());

    let mut config = EnvConfig::default();
    config.spawn_y_range = (-0.2, -1.0);
    assert!(config.validate().is_err());

    let mut config = EnvConfig::default();
    config.respawn_speed_range = (0.0, 0.04);
    assert!(config.validate().is_err());

    let mut config = EnvConfig::default();
    config.engagement_band = (0.6, 0.3);
    assert!(config.validate().is_err());
}

#[test]
fn test_env_validation_rejects_non_finite() {
    let cases: Vec<Box<dyn Fn(&mut EnvConfig)>> = vec![
        Box::new(|c: &mut EnvConfig| c.spawn_y_range = (f32::NEG_INFINITY, -0.2)),
        Box::new(|c: &mut EnvConfig| c.spawn_y_range = (f32::NAN, -0.2)),
        Box::new(|c: &mut EnvConfig| c.initial_speed_range = (0.01, f32::INFINITY)),
        Box::new(|c: &mut EnvConfig| c.respawn_speed_range = (0.01, f32::INFINITY)),
        Box::new(|c: &mut EnvConfig| c.respawn_speed_range = (f32::NAN, 0.04)),
        Box::new(|c: &mut EnvConfig| c.engagement_band = (0.3, f32::INFINITY)),
        Box::new(|c: &mut EnvConfig| c.arrival_y = f32::NAN),
        Box::new(|c: &mut EnvConfig| c.arrival_y = f32::INFINITY),
        Box::new(|c: &mut EnvConfig| c.player_y = f32::NAN),
        Box::new(|c: &mut EnvConfig| c.spawn_stagger = f32::INFINITY),
        Box::new(|c: &mut EnvConfig| c.spawn_stagger = -0.3),
        Box::new(|c: &mut EnvConfig| c.player_drift_prob = f64::NAN),
    ];
    for (i, mutate) in cases.iter().enumerate() {
        let mut config = EnvConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "case {} should be rejected", i);
    }
}

#[test]
fn test_overflowing_json_bounds_rejected() {
    // -1e39 overflows f32 to negative infinity.
    let err = RunConfig::from_json_str(r#"{ "env": { "spawn_y_range": [-1e39, -0.2] } }"#).unwrap_err();
    assert!(matches!(err, LaneChaseError::InvalidParameter { .. }));

    let err = RunConfig::from_json_str(r#"{ "env": { "respawn_speed_range": [0.01, 1e39] } }"#).unwrap_err();
    assert!(matches!(err, LaneChaseError::InvalidParameter { .. }));

    let mut config = EnvConfig::default();
    config.spawn_y_range = (f32::NEG_INFINITY, -0.2);
    assert!(crate::env::LaneChaseEnv::with_seed(config, 0).is_err());
}

#[test]
fn test_trainer_validation() {
    let valid = TrainerConfig::default();
    assert!(valid.validate().is_ok());

    let cases: Vec<Box<dyn Fn(&mut TrainerConfig)>> = vec![
        Box::new(|c: &mut TrainerConfig| c.gamma = 1.5),
        Box::new(|c: &mut TrainerConfig| c.learning_rate = 0.0),
        Box::new(|c: &mut TrainerConfig| c.batch_size = 0),
        Box::new(|c: &mut TrainerConfig| c.min_replay = 10),
        Box::new(|c: &mut TrainerConfig| c.min_replay = 6000),
        Box::new(|c: &mut TrainerConfig| c.epsilon_end = 1.1),
        Box::new(|c: &mut TrainerConfig| c.epsilon_decay = 0.0),
        Box::new(|c: &mut TrainerConfig| c.target_update = 0),
        Box::new(|c: &mut TrainerConfig| c.hidden_sizes = vec![32]),
    ];
    for (i, mutate) in cases.iter().enumerate() {
        let mut config = TrainerConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "case {} should be rejected", i);
    }
}

#[test]
fn test_optimizer_kind_build() {
    assert!(matches!(OptimizerKind::Adam.build(), OptimizerWrapper::Adam(_)));
    assert!(matches!(OptimizerKind::Sgd.build(), OptimizerWrapper::SGD(_)));
}
