//! Enemy phase: the wander/chase state machine with hysteresis, plus the
//! cooldown-gated contact attack.

use std::collections::HashMap;
use std::f32::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::events::EventBus;
use crate::math::{clamp_to_extent, distance, step_toward, Vec2};
use crate::player::{damage_player, PlayerState};
use crate::tuning::GameTuning;
use crate::world::{ArenaWorld, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnemyAiState {
    Wandering,
    Chasing,
}

/// Per-enemy AI bookkeeping kept outside the world registry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EnemyAgent {
    pub(crate) state: EnemyAiState,
    pub(crate) wander_target: Vec2,
    pub(crate) wander_clock: f32,
    pub(crate) attack_timer: f32,
}

impl EnemyAgent {
    pub(crate) fn new(wander_target: Vec2) -> Self {
        Self {
            state: EnemyAiState::Wandering,
            wander_target,
            wander_clock: 0.0,
            attack_timer: 0.0,
        }
    }

    fn can_attack(&self, cooldown_seconds: f32) -> bool {
        self.attack_timer >= cooldown_seconds
    }
}

/// Uniform point in a disc around `origin`, clamped to the arena.
pub(crate) fn roll_wander_target(
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    wander_radius: f32,
    half_extent: f32,
) -> Vec2 {
    let angle = rng.random_range(0.0..TAU);
    let reach = rng.random_range(0.0..wander_radius);
    clamp_to_extent(
        Vec2 {
            x: origin.x + angle.cos() * reach,
            y: origin.y + angle.sin() * reach,
        },
        half_extent,
    )
}

pub(crate) fn run_enemy_phase(
    world: &mut ArenaWorld,
    agents: &mut HashMap<EntityId, EnemyAgent>,
    player: &mut PlayerState,
    tuning: &GameTuning,
    fixed_dt_seconds: f32,
    rng: &mut ChaCha8Rng,
    events: &mut EventBus,
) {
    let Some(player_position) = world.find_actor(player.id).map(|actor| actor.position) else {
        return;
    };

    let enemy_ids: Vec<EntityId> = world
        .actors()
        .iter()
        .filter(|actor| actor.kind.is_enemy())
        .map(|actor| actor.id)
        .collect();

    for id in enemy_ids {
        let Some(agent) = agents.get_mut(&id) else {
            continue;
        };
        agent.attack_timer += fixed_dt_seconds;

        let (position, move_speed) = {
            let Some(enemy) = world.find_actor(id) else {
                continue;
            };
            (enemy.position, enemy.move_speed)
        };
        let player_distance = distance(position, player_position);

        // Hysteresis: the chase only drops once the player leaves the wider
        // exit radius, so enemies near the edge do not flicker between states.
        if player_distance <= tuning.enemy.detection_range {
            if agent.state != EnemyAiState::Chasing {
                trace!(id = id.0, "enemy_chase_entered");
            }
            agent.state = EnemyAiState::Chasing;
        } else if player_distance
            > tuning.enemy.detection_range * tuning.enemy.chase_exit_factor
        {
            if agent.state != EnemyAiState::Wandering {
                agent.wander_target =
                    roll_wander_target(rng, position, tuning.enemy.wander_radius, tuning.arena.half_extent);
                agent.wander_clock = 0.0;
                trace!(id = id.0, "enemy_chase_dropped");
            }
            agent.state = EnemyAiState::Wandering;
        }

        let next_position = match agent.state {
            EnemyAiState::Chasing => {
                let (next, _) = step_toward(
                    position,
                    player_position,
                    move_speed,
                    fixed_dt_seconds,
                    tuning.enemy.wander_arrival_threshold,
                );
                next
            }
            EnemyAiState::Wandering => {
                agent.wander_clock += fixed_dt_seconds;
                let arrived =
                    distance(position, agent.wander_target) < tuning.enemy.wander_arrival_threshold;
                if arrived || agent.wander_clock >= tuning.enemy.wander_interval_seconds {
                    agent.wander_target = roll_wander_target(
                        rng,
                        position,
                        tuning.enemy.wander_radius,
                        tuning.arena.half_extent,
                    );
                    agent.wander_clock = 0.0;
                }
                let (next, _) = step_toward(
                    position,
                    agent.wander_target,
                    move_speed,
                    fixed_dt_seconds,
                    tuning.enemy.wander_arrival_threshold,
                );
                next
            }
        };
        if let Some(enemy) = world.find_actor_mut(id) {
            enemy.position = clamp_to_extent(next_position, tuning.arena.half_extent);
        }

        // The swing spends the cooldown whether or not the hit lands.
        if player_distance <= tuning.enemy.attack_reach
            && agent.can_attack(tuning.enemy.attack_cooldown_seconds)
        {
            agent.attack_timer = 0.0;
            damage_player(
                world,
                player,
                tuning.enemy.contact_damage,
                tuning.player.invincibility_seconds,
                events,
            );
        }
    }
}
