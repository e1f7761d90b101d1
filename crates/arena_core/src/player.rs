//! Player phase: invincibility countdown, input-driven movement, the
//! cooldown-gated melee attack, and item pickup resolution.

use tracing::{debug, warn};

use crate::events::{EventBus, GameplayEvent};
use crate::input::{InputAction, InputSnapshot};
use crate::math::{clamp_to_extent, distance, normalize_or_zero, Vec2};
use crate::tuning::GameTuning;
use crate::world::{ArenaWorld, EntityId, ItemKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlayerState {
    pub(crate) id: EntityId,
    pub(crate) invincibility_remaining: f32,
    pub(crate) attack_timer: f32,
    pub(crate) items_collected: u32,
    pub(crate) enemies_defeated: u32,
}

impl PlayerState {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            invincibility_remaining: 0.0,
            attack_timer: 0.0,
            items_collected: 0,
            enemies_defeated: 0,
        }
    }

    /// Back to defaults in place; the id is kept for the process lifetime.
    pub(crate) fn reset(&mut self) {
        self.invincibility_remaining = 0.0;
        self.attack_timer = 0.0;
        self.items_collected = 0;
        self.enemies_defeated = 0;
    }

    pub(crate) fn is_invincible(&self) -> bool {
        self.invincibility_remaining > 0.0
    }
}

/// Repeated f32 subtraction of a non-representable dt leaves a residue of a
/// few ulps once the window has fully elapsed; anything below this counts as
/// expired.
const TIMER_EPSILON: f32 = 1e-4;

/// Runs one player tick and returns the score points earned by it (enemy
/// kills at face value plus collected Score items at `score_multiplier`).
pub(crate) fn run_player_phase(
    world: &mut ArenaWorld,
    state: &mut PlayerState,
    input: &InputSnapshot,
    tuning: &GameTuning,
    score_multiplier: f32,
    fixed_dt_seconds: f32,
    events: &mut EventBus,
) -> i32 {
    state.invincibility_remaining -= fixed_dt_seconds;
    if state.invincibility_remaining < TIMER_EPSILON {
        state.invincibility_remaining = 0.0;
    }
    state.attack_timer += fixed_dt_seconds;

    let player_position = {
        let Some(player) = world.find_actor_mut(state.id) else {
            warn!(id = state.id.0, "player_actor_missing");
            return 0;
        };
        let delta = movement_delta(input, fixed_dt_seconds, player.move_speed);
        player.position = clamp_to_extent(
            Vec2 {
                x: player.position.x + delta.x,
                y: player.position.y + delta.y,
            },
            tuning.arena.half_extent,
        );
        player.position
    };

    let mut earned = 0i32;

    if input.attack_pressed() && state.attack_timer >= tuning.player.attack_cooldown_seconds {
        // The swing spends the cooldown even when it hits nothing.
        state.attack_timer = 0.0;
        let hit_ids: Vec<EntityId> = world
            .actors()
            .iter()
            .filter(|actor| {
                actor.kind.is_enemy()
                    && distance(actor.position, player_position) <= tuning.player.attack_range
            })
            .map(|actor| actor.id)
            .collect();
        debug!(hits = hit_ids.len(), "player_attack");

        for id in hit_ids {
            let Some(enemy) = world.find_actor_mut(id) else {
                continue;
            };
            enemy.apply_damage(tuning.player.attack_damage);
            if enemy.is_dead() {
                let score_awarded = enemy.score_value;
                world.despawn(id);
                state.enemies_defeated = state.enemies_defeated.saturating_add(1);
                earned = earned.saturating_add(score_awarded);
                events.emit(GameplayEvent::EnemyDied { id, score_awarded });
            }
        }
    }

    let collected: Vec<EntityId> = world
        .items()
        .iter()
        .filter(|item| distance(item.position, player_position) <= tuning.items.pickup_radius)
        .map(|item| item.id)
        .collect();
    for id in collected {
        let Some(item) = world.find_item(id) else {
            continue;
        };
        let (kind, value) = (item.kind, item.value);
        world.despawn(id);
        state.items_collected = state.items_collected.saturating_add(1);

        let points_awarded = match kind {
            ItemKind::Health => {
                if let Some(player) = world.find_actor_mut(state.id) {
                    player.heal(value);
                }
                0
            }
            ItemKind::Score => {
                let points = (value as f32 * score_multiplier).round() as i32;
                earned = earned.saturating_add(points);
                points
            }
        };
        events.emit(GameplayEvent::ItemCollected {
            id,
            kind,
            value,
            points_awarded,
        });
    }

    earned
}

/// Applies enemy contact damage to the player. The hit is fully discarded
/// while invincibility is counting down; a hit that lands opens a fresh
/// invincibility window. Returns whether the hit landed.
pub(crate) fn damage_player(
    world: &mut ArenaWorld,
    state: &mut PlayerState,
    amount: i32,
    invincibility_seconds: f32,
    events: &mut EventBus,
) -> bool {
    if state.is_invincible() {
        events.emit(GameplayEvent::PlayerHitIgnored { amount });
        return false;
    }
    let Some(player) = world.find_actor_mut(state.id) else {
        warn!(id = state.id.0, "player_actor_missing");
        return false;
    };
    player.apply_damage(amount);
    let health_after = player.health;
    state.invincibility_remaining = invincibility_seconds;
    events.emit(GameplayEvent::PlayerDamaged {
        amount,
        health_after,
    });
    true
}

fn movement_delta(input: &InputSnapshot, fixed_dt_seconds: f32, speed: f32) -> Vec2 {
    let mut x = 0.0f32;
    let mut y = 0.0f32;

    if input.is_down(InputAction::MoveRight) {
        x += 1.0;
    }
    if input.is_down(InputAction::MoveLeft) {
        x -= 1.0;
    }
    if input.is_down(InputAction::MoveUp) {
        y += 1.0;
    }
    if input.is_down(InputAction::MoveDown) {
        y -= 1.0;
    }

    let direction = normalize_or_zero(x, y);
    Vec2 {
        x: direction.x * speed * fixed_dt_seconds,
        y: direction.y * speed * fixed_dt_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Actor, ActorKind, EnemyKind};

    fn setup() -> (ArenaWorld, PlayerState, GameTuning, EventBus) {
        let tuning = GameTuning::default();
        let mut world = ArenaWorld::default();
        let id = world.spawn_actor(
            ActorKind::Player,
            Vec2::default(),
            tuning.player.max_health,
            tuning.player.move_speed,
            0,
        );
        world.apply_pending();
        (world, PlayerState::new(id), tuning, EventBus::default())
    }

    fn spawn_enemy_at(world: &mut ArenaWorld, position: Vec2, max_health: i32) -> EntityId {
        let id = world.spawn_actor(
            ActorKind::Enemy(EnemyKind::Basic),
            position,
            max_health,
            3.0,
            10,
        );
        world.apply_pending();
        id
    }

    fn player_actor<'a>(world: &'a ArenaWorld, state: &PlayerState) -> &'a Actor {
        world.find_actor(state.id).expect("player actor")
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let (mut world, mut state, tuning, mut events) = setup();
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveUp, true)
            .with_action_down(InputAction::MoveRight, true);

        run_player_phase(&mut world, &mut state, &input, &tuning, 1.0, 1.0, &mut events);

        let position = player_actor(&world, &state).position;
        let traveled = (position.x * position.x + position.y * position.y).sqrt();
        assert!((traveled - tuning.player.move_speed).abs() < 0.001);
    }

    #[test]
    fn movement_is_clamped_to_arena_bounds() {
        let (mut world, mut state, tuning, mut events) = setup();
        let input = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);

        for _ in 0..600 {
            run_player_phase(
                &mut world,
                &mut state,
                &input,
                &tuning,
                1.0,
                1.0 / 60.0,
                &mut events,
            );
        }

        let position = player_actor(&world, &state).position;
        assert!((position.x - tuning.arena.half_extent).abs() < 0.0001);
    }

    #[test]
    fn damage_is_discarded_during_invincibility_window() {
        let (mut world, mut state, tuning, mut events) = setup();

        let window = tuning.player.invincibility_seconds;
        assert!(damage_player(&mut world, &mut state, 30, window, &mut events));
        assert_eq!(player_actor(&world, &state).health, 70);

        // All hits inside the window are fully discarded, not reduced.
        assert!(!damage_player(&mut world, &mut state, 90, window, &mut events));
        assert!(!damage_player(&mut world, &mut state, 5, window, &mut events));
        assert_eq!(player_actor(&world, &state).health, 70);

        let drained = events.drain_current_tick();
        assert_eq!(
            drained
                .iter()
                .filter(|event| matches!(event, GameplayEvent::PlayerHitIgnored { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn invincibility_clears_exactly_at_the_configured_duration() {
        let (mut world, mut state, tuning, mut events) = setup();
        damage_player(&mut world, &mut state, 10, 1.0, &mut events);

        // 0.99 s elapsed: still inside the window.
        for _ in 0..99 {
            run_player_phase(
                &mut world,
                &mut state,
                &InputSnapshot::empty(),
                &tuning,
                1.0,
                0.01,
                &mut events,
            );
        }
        assert!(state.is_invincible());
        assert!(!damage_player(&mut world, &mut state, 10, 1.0, &mut events));

        // The tick that reaches the full duration closes the window.
        run_player_phase(
            &mut world,
            &mut state,
            &InputSnapshot::empty(),
            &tuning,
            1.0,
            0.01,
            &mut events,
        );
        assert!(!state.is_invincible());
        assert!(damage_player(&mut world, &mut state, 10, 1.0, &mut events));
        assert_eq!(player_actor(&world, &state).health, 80);
    }

    #[test]
    fn attack_is_gated_by_cooldown_and_spent_on_empty_swings() {
        let (mut world, mut state, tuning, mut events) = setup();
        let input = InputSnapshot::empty().with_attack_pressed(true);

        // Timer starts at zero; the first press inside the cooldown is ignored.
        state.attack_timer = 0.0;
        run_player_phase(
            &mut world,
            &mut state,
            &input,
            &tuning,
            1.0,
            0.1,
            &mut events,
        );
        assert!((state.attack_timer - 0.1).abs() < 0.0001);

        // Once accrued past the cooldown the swing fires and resets the timer,
        // even with no enemy in range.
        state.attack_timer = tuning.player.attack_cooldown_seconds;
        run_player_phase(
            &mut world,
            &mut state,
            &input,
            &tuning,
            1.0,
            0.1,
            &mut events,
        );
        assert_eq!(state.attack_timer, 0.0);
    }

    #[test]
    fn attack_hits_every_enemy_in_range_and_awards_kills_once() {
        let (mut world, mut state, tuning, mut events) = setup();
        let near = spawn_enemy_at(&mut world, Vec2 { x: 1.0, y: 0.0 }, tuning.player.attack_damage);
        let also_near = spawn_enemy_at(&mut world, Vec2 { x: 0.0, y: 1.5 }, 50);
        let far = spawn_enemy_at(&mut world, Vec2 { x: 8.0, y: 0.0 }, 50);

        state.attack_timer = tuning.player.attack_cooldown_seconds;
        let earned = run_player_phase(
            &mut world,
            &mut state,
            &InputSnapshot::empty().with_attack_pressed(true),
            &tuning,
            1.0,
            0.01,
            &mut events,
        );
        world.apply_pending();

        // `near` had exactly lethal health: killed, awarded once, despawned.
        assert_eq!(earned, 10);
        assert_eq!(state.enemies_defeated, 1);
        assert!(world.find_actor(near).is_none());
        assert_eq!(
            world.find_actor(also_near).expect("in range").health,
            50 - tuning.player.attack_damage
        );
        assert_eq!(world.find_actor(far).expect("out of range").health, 50);
    }

    #[test]
    fn overkill_still_awards_the_score_value_once() {
        let (mut world, mut state, tuning, mut events) = setup();
        spawn_enemy_at(&mut world, Vec2 { x: 0.5, y: 0.0 }, 1);

        state.attack_timer = tuning.player.attack_cooldown_seconds;
        let earned = run_player_phase(
            &mut world,
            &mut state,
            &InputSnapshot::empty().with_attack_pressed(true),
            &tuning,
            1.0,
            0.01,
            &mut events,
        );

        assert_eq!(earned, 10);
        assert_eq!(state.enemies_defeated, 1);
    }

    #[test]
    fn score_item_pickup_applies_the_multiplier_rounded() {
        let (mut world, mut state, tuning, mut events) = setup();
        world.spawn_item(ItemKind::Score, 5, Vec2 { x: 0.5, y: 0.0 }, 15.0);
        world.apply_pending();

        let earned = run_player_phase(
            &mut world,
            &mut state,
            &InputSnapshot::empty(),
            &tuning,
            2.0,
            0.01,
            &mut events,
        );

        assert_eq!(earned, 10);
        assert_eq!(state.items_collected, 1);
        assert!(matches!(
            events.drain_current_tick().as_slice(),
            [GameplayEvent::ItemCollected {
                kind: ItemKind::Score,
                value: 5,
                points_awarded: 10,
                ..
            }]
        ));
    }

    #[test]
    fn health_item_pickup_heals_with_clamp_and_awards_no_points() {
        let (mut world, mut state, tuning, mut events) = setup();
        world
            .find_actor_mut(state.id)
            .expect("player")
            .apply_damage(10);
        world.spawn_item(ItemKind::Health, 30, Vec2 { x: 0.5, y: 0.0 }, 15.0);
        world.apply_pending();

        let earned = run_player_phase(
            &mut world,
            &mut state,
            &InputSnapshot::empty(),
            &tuning,
            2.0,
            0.01,
            &mut events,
        );

        assert_eq!(earned, 0);
        assert_eq!(
            player_actor(&world, &state).health,
            tuning.player.max_health
        );
        world.apply_pending();
        assert_eq!(world.item_count(), 0);
        assert_eq!(state.items_collected, 1);
    }

    #[test]
    fn out_of_radius_items_are_left_alone() {
        let (mut world, mut state, tuning, mut events) = setup();
        world.spawn_item(ItemKind::Score, 5, Vec2 { x: 3.0, y: 0.0 }, 15.0);
        world.apply_pending();

        let earned = run_player_phase(
            &mut world,
            &mut state,
            &InputSnapshot::empty(),
            &tuning,
            2.0,
            0.01,
            &mut events,
        );

        assert_eq!(earned, 0);
        assert_eq!(world.item_count(), 1);
        assert_eq!(state.items_collected, 0);
    }
}
