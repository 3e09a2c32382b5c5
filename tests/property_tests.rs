#[cfg(test)]
mod property_tests {
    use lanechase::config::EnvConfig;
    use lanechase::env::{Archetype, Environment, LaneChaseEnv};
    use lanechase::replay_buffer::{ReplayBuffer, Transition};
    use ndarray::array;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn archetype_strategy() -> impl Strategy<Value = Archetype> {
        prop_oneof![
            Just(Archetype::Aggressive),
            Just(Archetype::Defensive),
            Just(Archetype::Neutral),
        ]
    }

    proptest! {
        #[test]
        fn test_lanes_stay_in_range(
            lanes in 2usize..8,
            npc_count in 1usize..4,
            archetype in archetype_strategy(),
            seed in any::<u64>(),
            actions in prop::collection::vec(0usize..32, 1..150),
        ) {
            let config = EnvConfig::new(lanes, npc_count, archetype, 100);
            let mut env = LaneChaseEnv::with_seed(config, seed).unwrap();
            let last_lane = (lanes - 1) as f32;

            for action in actions {
                let step = env.step(action).unwrap();
                prop_assert!(env.player().lane >= 0.0 && env.player().lane <= last_lane);
                prop_assert!(env.npcs().iter().all(|npc| npc.lane < lanes));
                prop_assert_eq!(step.obs.len(), env.observation_space_dim());
                prop_assert!(step.obs[0] >= 0.0 && step.obs[0] <= 1.0);
                if step.done {
                    env.reset();
                }
            }
        }

        #[test]
        fn test_collision_is_terminal_and_penalized(
            seed in any::<u64>(),
            actions in prop::collection::vec(0usize..9, 1..400),
        ) {
            let mut env = LaneChaseEnv::with_seed(EnvConfig::default(), seed).unwrap();
            for action in actions {
                let before = env.score();
                let step = env.step(action).unwrap();
                if step.info.score > before {
                    prop_assert!(step.done);
                    prop_assert!(step.reward <= -98.0);
                }
                prop_assert!(step.info.steps <= 200);
                if step.done {
                    env.reset();
                }
            }
        }

        #[test]
        fn test_buffer_never_exceeds_capacity(
            capacity in 1usize..64,
            pushes in 0usize..200,
            batch in 0usize..80,
            seed in any::<u64>(),
        ) {
            let mut buffer = ReplayBuffer::new(capacity);
            for i in 0..pushes {
                buffer.push(Transition {
                    state: array![i as f32],
                    action: 0,
                    reward: i as f32,
                    next_state: array![i as f32 + 1.0],
                    done: false,
                });
                prop_assert!(buffer.len() <= capacity);
            }
            prop_assert_eq!(buffer.len(), pushes.min(capacity));

            // The survivors are exactly the newest pushes, oldest first.
            let first_kept = pushes.saturating_sub(capacity);
            let rewards: Vec<f32> = buffer.iter().map(|t| t.reward).collect();
            let expected: Vec<f32> = (first_kept..pushes).map(|i| i as f32).collect();
            prop_assert_eq!(rewards, expected);

            let mut rng = StdRng::seed_from_u64(seed);
            prop_assert_eq!(buffer.sample(batch, &mut rng).len(), batch.min(buffer.len()));
        }
    }
}
