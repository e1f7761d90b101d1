//! Spawn phase: a single accumulator drives both enemy and item spawns,
//! each gated by its own population cap.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::enemy::{roll_wander_target, EnemyAgent};
use crate::events::{EventBus, GameplayEvent};
use crate::items::roll_item;
use crate::math::Vec2;
use crate::tuning::{DifficultySettings, GameTuning};
use crate::world::{ActorKind, ArenaWorld, EnemyKind, EntityId};

#[derive(Debug, Default)]
pub(crate) struct SpawnDirector {
    accumulator: f32,
}

impl SpawnDirector {
    pub(crate) fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn tick(
        &mut self,
        world: &mut ArenaWorld,
        agents: &mut HashMap<EntityId, EnemyAgent>,
        tuning: &GameTuning,
        difficulty: &DifficultySettings,
        fixed_dt_seconds: f32,
        rng: &mut ChaCha8Rng,
        events: &mut EventBus,
    ) {
        self.accumulator += fixed_dt_seconds;
        let interval =
            tuning.session.spawn_interval_seconds / difficulty.spawn_rate_multiplier;
        if self.accumulator < interval {
            return;
        }
        self.accumulator = 0.0;

        if world.enemy_count() < tuning.session.max_enemies {
            let kind = EnemyKind::ALL[rng.random_range(0..EnemyKind::ALL.len())];
            let stats = tuning.enemy.stats_for(kind);
            let position = random_spawn_position(rng, tuning.arena.spawn_extent);
            let id = world.spawn_actor(
                ActorKind::Enemy(kind),
                position,
                stats.max_health,
                stats.move_speed * difficulty.enemy_speed_multiplier,
                stats.score_value,
            );
            agents.insert(
                id,
                EnemyAgent::new(roll_wander_target(
                    rng,
                    position,
                    tuning.enemy.wander_radius,
                    tuning.arena.half_extent,
                )),
            );
            events.emit(GameplayEvent::EnemySpawned { id, kind });
        }

        if world.item_count() < tuning.session.max_items {
            let (kind, value) = roll_item(rng, &tuning.items);
            let position = random_spawn_position(rng, tuning.arena.spawn_extent);
            let id = world.spawn_item(kind, value, position, tuning.items.lifetime_seconds);
            events.emit(GameplayEvent::ItemSpawned { id, kind, value });
        }
    }
}

fn random_spawn_position(rng: &mut ChaCha8Rng, spawn_extent: f32) -> Vec2 {
    Vec2 {
        x: rng.random_range(-spawn_extent..spawn_extent),
        y: rng.random_range(-spawn_extent..spawn_extent),
    }
}
