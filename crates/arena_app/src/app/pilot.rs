//! Deterministic input source for headless runs: closes on the best target,
//! swings when an enemy is in reach, and quits once the run is decided.

use arena_core::math::distance;
use arena_core::{GameSession, InputAction, InputSnapshot, ItemKind, Vec2};

const AXIS_DEADZONE: f32 = 0.1;
const LOW_HEALTH_FRACTION: f32 = 0.5;

#[derive(Debug, Default)]
pub(crate) struct Pilot;

impl Pilot {
    pub(crate) fn snapshot_for_tick(&mut self, session: &GameSession) -> InputSnapshot {
        if session.phase().is_terminal() {
            return InputSnapshot::empty().with_quit_requested(true);
        }
        if !session.phase().is_running() {
            return InputSnapshot::empty();
        }
        let Some(player) = session.player() else {
            return InputSnapshot::empty();
        };

        let attack = session.world().actors().iter().any(|actor| {
            actor.kind.is_enemy()
                && distance(actor.position, player.position)
                    <= session.tuning().player.attack_range
        });

        let mut snapshot = InputSnapshot::empty().with_attack_pressed(attack);
        if let Some(target) = pick_target(session, player.position, player.health_fraction()) {
            let dx = target.x - player.position.x;
            let dy = target.y - player.position.y;
            snapshot = snapshot
                .with_action_down(InputAction::MoveRight, dx > AXIS_DEADZONE)
                .with_action_down(InputAction::MoveLeft, dx < -AXIS_DEADZONE)
                .with_action_down(InputAction::MoveUp, dy > AXIS_DEADZONE)
                .with_action_down(InputAction::MoveDown, dy < -AXIS_DEADZONE);
        }
        snapshot
    }
}

/// Health items first when hurt, then any item for the score, then the
/// nearest enemy to force a fight.
fn pick_target(session: &GameSession, from: Vec2, health_fraction: f32) -> Option<Vec2> {
    if health_fraction < LOW_HEALTH_FRACTION {
        if let Some(target) = nearest_item(session, from, Some(ItemKind::Health)) {
            return Some(target);
        }
    }
    nearest_item(session, from, None).or_else(|| nearest_enemy(session, from))
}

fn nearest_item(session: &GameSession, from: Vec2, kind: Option<ItemKind>) -> Option<Vec2> {
    session
        .world()
        .items()
        .iter()
        .filter(|item| kind.map_or(true, |kind| item.kind == kind))
        .min_by(|a, b| {
            distance(a.position, from).total_cmp(&distance(b.position, from))
        })
        .map(|item| item.position)
}

fn nearest_enemy(session: &GameSession, from: Vec2) -> Option<Vec2> {
    session
        .world()
        .actors()
        .iter()
        .filter(|actor| actor.kind.is_enemy())
        .min_by(|a, b| {
            distance(a.position, from).total_cmp(&distance(b.position, from))
        })
        .map(|actor| actor.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::GameTuning;

    #[test]
    fn idle_session_gets_empty_input() {
        let session = GameSession::new(GameTuning::default(), Some(1));
        let mut pilot = Pilot;
        let snapshot = pilot.snapshot_for_tick(&session);

        assert!(!snapshot.quit_requested());
        assert!(!snapshot.attack_pressed());
        assert!(!snapshot.is_down(InputAction::MoveUp));
        assert!(!snapshot.is_down(InputAction::MoveDown));
        assert!(!snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn empty_arena_means_no_movement_or_attack() {
        let mut session = GameSession::new(GameTuning::default(), Some(1));
        session.start();
        let mut pilot = Pilot;
        let snapshot = pilot.snapshot_for_tick(&session);

        assert!(!snapshot.attack_pressed());
        assert!(!snapshot.is_down(InputAction::MoveRight));
        assert!(!snapshot.is_down(InputAction::MoveLeft));
    }

    #[test]
    fn terminal_session_requests_quit() {
        let mut tuning = GameTuning::default();
        tuning.session.time_limit_seconds = 0.01;
        let mut session = GameSession::new(tuning, Some(1));
        session.start();
        session.tick(1.0 / 60.0, &InputSnapshot::empty());
        assert!(session.phase().is_terminal());

        let mut pilot = Pilot;
        assert!(pilot.snapshot_for_tick(&session).quit_requested());
    }

    #[test]
    fn pilot_moves_toward_spawned_targets() {
        let mut session = GameSession::new(GameTuning::default(), Some(9));
        session.start();
        let mut pilot = Pilot;

        // Run past the first spawn interval so a target exists.
        for _ in 0..200 {
            let input = pilot.snapshot_for_tick(&session);
            session.tick(1.0 / 60.0, &input);
        }
        assert!(session.world().item_count() + session.world().enemy_count() > 0);

        let snapshot = pilot.snapshot_for_tick(&session);
        let moving = snapshot.is_down(InputAction::MoveUp)
            || snapshot.is_down(InputAction::MoveDown)
            || snapshot.is_down(InputAction::MoveLeft)
            || snapshot.is_down(InputAction::MoveRight);
        assert!(moving || snapshot.attack_pressed() || session.phase().is_terminal());
    }
}
