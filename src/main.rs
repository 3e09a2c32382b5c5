// Command-line front end: train a policy or evaluate a saved one.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lanechase::checkpoint::FileCheckpointer;
use lanechase::config::RunConfig;
use lanechase::env::LaneChaseEnv;
use lanechase::network::NeuralNetwork;
use lanechase::trainer::{evaluate, Trainer};

#[derive(Parser, Debug)]
#[command(name = "lanechase", about = "Train NPC interception policies with DQN")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train from scratch and keep the best policy.
    Train {
        /// JSON run config; missing fields use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        episodes: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Overrides the config's checkpoint path.
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
    /// Run the greedy policy from a checkpoint.
    Evaluate {
        #[arg(long)]
        checkpoint: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = 20)]
        episodes: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn build_env(config: &RunConfig, seed: Option<u64>) -> Result<LaneChaseEnv> {
    let env = match seed {
        Some(seed) => LaneChaseEnv::with_seed(config.env.clone(), seed)?,
        None => LaneChaseEnv::from_entropy(config.env.clone())?,
    };
    Ok(env)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train { config, episodes, seed, checkpoint } => {
            let mut run = load_config(config.as_ref())?;
            if let Some(episodes) = episodes {
                run.trainer.episodes = episodes;
            }
            if seed.is_some() {
                run.seed = seed;
            }
            if let Some(checkpoint) = checkpoint {
                run.checkpoint_path = checkpoint;
            }
            run.validate()?;

            let env = build_env(&run, run.seed)?;
            let checkpointer = FileCheckpointer::new(&run.checkpoint_path);
            let mut trainer = Trainer::new(env, run.trainer.clone(), checkpointer, run.seed)?;
            let report = trainer.train()?;

            tracing::info!(
                best_reward = report.best_reward,
                final_epsilon = report.final_epsilon,
                target_syncs = report.target_syncs,
                checkpoint = %run.checkpoint_path.display(),
                "done"
            );
        }
        Command::Evaluate { checkpoint, config, episodes, seed } => {
            let run = load_config(config.as_ref())?;
            let network = NeuralNetwork::load(&checkpoint)
                .with_context(|| format!("loading checkpoint {}", checkpoint.display()))?;
            let mut env = build_env(&run, seed)?;
            let summary = evaluate(&mut env, &network, episodes)?;

            tracing::info!(
                episodes = summary.episodes,
                mean_reward = summary.mean_reward,
                mean_length = summary.mean_length,
                collisions = summary.collisions,
                "evaluation finished"
            );
        }
    }

    Ok(())
}
