use lanechase::{
    agent::DqnAgentBuilder,
    checkpoint::FileCheckpointer,
    config::{EnvConfig, RunConfig, TrainerConfig},
    env::{Archetype, Environment, LaneChaseEnv},
    network::NeuralNetwork,
    trainer::{evaluate, Trainer},
};
use tempfile::tempdir;

fn quick_run_config(checkpoint: std::path::PathBuf) -> RunConfig {
    RunConfig {
        env: EnvConfig::new(5, 3, Archetype::Aggressive, 60),
        trainer: TrainerConfig {
            batch_size: 16,
            buffer_capacity: 500,
            min_replay: 32,
            episodes: 12,
            target_update: 4,
            log_interval: 4,
            hidden_sizes: vec![32, 16],
            ..TrainerConfig::default()
        },
        seed: Some(2024),
        checkpoint_path: checkpoint,
    }
}

#[test]
fn test_end_to_end_training_writes_loadable_checkpoint() {
    let dir = tempdir().unwrap();
    let checkpoint = dir.path().join("models").join("dqn_agent.bin");
    let run = quick_run_config(checkpoint.clone());
    run.validate().unwrap();

    let env = LaneChaseEnv::with_seed(run.env.clone(), 2024).unwrap();
    let mut trainer = Trainer::new(env, run.trainer.clone(), FileCheckpointer::new(&run.checkpoint_path), run.seed).unwrap();
    let report = trainer.train().unwrap();

    assert_eq!(report.metrics.episodes.len(), 12);
    assert_eq!(report.target_syncs, 3);
    assert!(report.checkpoints >= 1);
    assert!(report.metrics.learn_steps > 0);
    assert!(report.metrics.losses.iter().all(|l| l.is_finite()));
    assert!(checkpoint.exists());

    let network = NeuralNetwork::load(&checkpoint).unwrap();
    assert_eq!(network.layer_sizes(), vec![5, 32, 16, 9]);

    let mut eval_env = LaneChaseEnv::with_seed(run.env.clone(), 7).unwrap();
    let summary = evaluate(&mut eval_env, &network, 2).unwrap();
    assert_eq!(summary.episodes, 2);
    assert!(summary.mean_length >= 1.0 && summary.mean_length <= 60.0);
}

#[test]
fn test_checkpoint_restores_agent() {
    let dir = tempdir().unwrap();
    let checkpoint = dir.path().join("best.bin");
    let run = quick_run_config(checkpoint.clone());

    let env = LaneChaseEnv::with_seed(run.env.clone(), 1).unwrap();
    let mut trainer = Trainer::new(env, run.trainer.clone(), FileCheckpointer::new(&checkpoint), Some(1)).unwrap();
    trainer.train().unwrap();

    let env = LaneChaseEnv::with_seed(run.env.clone(), 1).unwrap();
    let mut agent = DqnAgentBuilder::new(env.observation_space_dim(), env.action_space())
        .hidden_sizes(&[32, 16])
        .epsilon(0.0)
        .build()
        .unwrap();
    agent.load_policy(&checkpoint).unwrap();

    let saved = NeuralNetwork::load(&checkpoint).unwrap();
    let mut env = env;
    let obs = env.reset();
    assert_eq!(
        agent.q_network.predict(obs.view()).unwrap(),
        saved.predict(obs.view()).unwrap()
    );
    let action = agent.greedy_action(obs.view()).unwrap();
    assert!(action < env.action_space());
}

#[test]
fn test_run_config_json_drives_training() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("run.json");
    let checkpoint = dir.path().join("out.bin");
    let json = format!(
        r#"{{
            "env": {{ "lanes": 4, "npc_count": 2, "archetype": "defensive", "max_steps": 30 }},
            "trainer": {{ "episodes": 3, "batch_size": 8, "min_replay": 8, "buffer_capacity": 100, "hidden_sizes": [16, 16] }},
            "seed": 11,
            "checkpoint_path": {:?}
        }}"#,
        checkpoint.to_string_lossy()
    );
    std::fs::write(&config_path, json).unwrap();

    let run = RunConfig::from_json_file(&config_path).unwrap();
    assert_eq!(run.checkpoint_path, checkpoint);

    let env = LaneChaseEnv::with_seed(run.env.clone(), 11).unwrap();
    assert_eq!(env.action_space(), 6);
    let mut trainer = Trainer::new(env, run.trainer.clone(), FileCheckpointer::new(&run.checkpoint_path), run.seed).unwrap();
    let report = trainer.train().unwrap();

    assert_eq!(report.metrics.episodes.len(), 3);
    assert!(run.checkpoint_path.exists());
}
