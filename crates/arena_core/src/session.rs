//! Session orchestration: owns the world, the RNG, the difficulty table and
//! the phase machine, and drives the fixed-order tick pipeline.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::enemy::{run_enemy_phase, EnemyAgent};
use crate::events::{EventBus, GameplayEvent};
use crate::input::InputSnapshot;
use crate::items::run_item_phase;
use crate::math::Vec2;
use crate::player::{run_player_phase, PlayerState};
use crate::spawn::SpawnDirector;
use crate::tuning::{clamp_difficulty_level, DifficultySettings, GameTuning};
use crate::world::{Actor, ActorKind, ArenaWorld, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoseReason {
    TimeUp,
    PlayerDied,
}

impl LoseReason {
    pub fn message(self) -> &'static str {
        match self {
            LoseReason::TimeUp => "Time's up!",
            LoseReason::PlayerDied => "You died!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Running,
    Won,
    Lost(LoseReason),
}

impl SessionPhase {
    pub fn is_running(self) -> bool {
        matches!(self, SessionPhase::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Won | SessionPhase::Lost(_))
    }
}

pub struct GameSession {
    tuning: GameTuning,
    world: ArenaWorld,
    rng: ChaCha8Rng,
    events: EventBus,
    phase: SessionPhase,
    elapsed_seconds: f32,
    score: i32,
    difficulty_level: u8,
    difficulty: DifficultySettings,
    spawn: SpawnDirector,
    player: Option<PlayerState>,
    enemy_agents: HashMap<EntityId, EnemyAgent>,
}

impl GameSession {
    /// A `None` seed draws one from the OS for ordinary play; a fixed seed
    /// replays the same run tick for tick.
    pub fn new(tuning: GameTuning, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Self {
            tuning,
            world: ArenaWorld::default(),
            rng,
            events: EventBus::default(),
            phase: SessionPhase::Idle,
            elapsed_seconds: 0.0,
            score: 0,
            difficulty_level: 1,
            difficulty: DifficultySettings::for_level(1),
            spawn: SpawnDirector::default(),
            player: None,
            enemy_agents: HashMap::new(),
        }
    }

    pub fn start(&mut self) {
        if self.phase.is_running() {
            warn!("session_start_ignored_already_running");
            return;
        }

        match &mut self.player {
            Some(state) => {
                // The player actor outlives the run: same id, same position,
                // health and counters back to defaults.
                self.world.clear_spawned(Some(state.id));
                state.reset();
                if let Some(actor) = self.world.find_actor_mut(state.id) {
                    actor.health = actor.max_health;
                }
            }
            None => {
                self.world.clear_spawned(None);
                let id = self.world.spawn_actor(
                    ActorKind::Player,
                    Vec2::default(),
                    self.tuning.player.max_health,
                    self.tuning.player.move_speed,
                    0,
                );
                self.world.apply_pending();
                self.player = Some(PlayerState::new(id));
            }
        }

        self.enemy_agents.clear();
        self.spawn.reset();
        self.events.drain_current_tick();
        self.elapsed_seconds = 0.0;
        self.score = 0;
        self.phase = SessionPhase::Running;
        info!(
            difficulty_level = self.difficulty_level,
            score_target = self.difficulty.score_target,
            "session_started"
        );
    }

    /// Halts the run without declaring an outcome. Score and elapsed time
    /// stay frozen for inspection; everything spawned is removed.
    pub fn stop(&mut self) {
        let keep = self.player.as_ref().map(|state| state.id);
        self.world.clear_spawned(keep);
        self.enemy_agents.clear();
        self.phase = SessionPhase::Idle;
        info!(
            score = self.score,
            elapsed_seconds = self.elapsed_seconds,
            "session_stopped"
        );
    }

    /// Full reset back to a fresh level 1 run.
    pub fn restart(&mut self) {
        self.stop();
        self.set_difficulty(1);
        self.start();
    }

    pub fn set_difficulty(&mut self, level: i32) {
        let clamped = clamp_difficulty_level(level);
        self.difficulty_level = clamped;
        self.difficulty = DifficultySettings::for_level(clamped);
        info!(
            level = clamped,
            score_target = self.difficulty.score_target,
            "difficulty_set"
        );
    }

    pub fn add_score(&mut self, points: i32) {
        if !self.phase.is_running() {
            warn!(points, "score_ignored_not_running");
            return;
        }
        if points < 0 {
            warn!(points, "score_rejected_negative");
            return;
        }
        self.score = self.score.saturating_add(points);
    }

    /// Adds `round(points * multiplier)`, the form used for multiplied
    /// item collection scoring by external callers.
    pub fn add_score_scaled(&mut self, points: i32, multiplier: f32) {
        self.add_score((points as f32 * multiplier).round() as i32);
    }

    /// Time bonus for banking points early: 2x at the start, tapering to 1x
    /// as the clock runs out.
    pub fn score_multiplier(&self) -> f32 {
        let limit = self.tuning.session.time_limit_seconds;
        if limit <= 0.0 {
            return 1.0;
        }
        let remaining = (limit - self.elapsed_seconds).max(0.0);
        (1.0 + remaining / limit).clamp(1.0, 2.0)
    }

    /// One fixed simulation step. Ticks only run while the session is in the
    /// running phase; terminal and idle sessions are frozen.
    pub fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        if !self.phase.is_running() {
            return;
        }
        self.elapsed_seconds += fixed_dt_seconds;
        let multiplier = self.score_multiplier();

        let Some(player) = self.player.as_mut() else {
            warn!("session_tick_without_player");
            return;
        };

        let earned = run_player_phase(
            &mut self.world,
            player,
            input,
            &self.tuning,
            multiplier,
            fixed_dt_seconds,
            &mut self.events,
        );
        self.score = self.score.saturating_add(earned.max(0));
        self.world.apply_pending();
        self.enemy_agents
            .retain(|id, _| self.world.find_actor(*id).is_some());

        run_enemy_phase(
            &mut self.world,
            &mut self.enemy_agents,
            player,
            &self.tuning,
            fixed_dt_seconds,
            &mut self.rng,
            &mut self.events,
        );
        self.world.apply_pending();

        run_item_phase(&mut self.world, fixed_dt_seconds, &mut self.events);
        self.world.apply_pending();

        self.spawn.tick(
            &mut self.world,
            &mut self.enemy_agents,
            &self.tuning,
            &self.difficulty,
            fixed_dt_seconds,
            &mut self.rng,
            &mut self.events,
        );
        self.world.apply_pending();

        // Win is checked before either lose condition, so reaching the
        // target on the final tick still counts.
        if self.score >= self.difficulty.score_target {
            self.phase = SessionPhase::Won;
            self.events.emit(GameplayEvent::SessionWon);
            info!(
                score = self.score,
                elapsed_seconds = self.elapsed_seconds,
                "session_won"
            );
            return;
        }
        if self.elapsed_seconds >= self.tuning.session.time_limit_seconds {
            self.lose(LoseReason::TimeUp);
            return;
        }
        let player_dead = self
            .player
            .as_ref()
            .and_then(|state| self.world.find_actor(state.id))
            .map_or(true, |actor| actor.is_dead());
        if player_dead {
            self.lose(LoseReason::PlayerDied);
        }
    }

    fn lose(&mut self, reason: LoseReason) {
        self.phase = SessionPhase::Lost(reason);
        self.events.emit(GameplayEvent::SessionLost { reason });
        info!(
            reason = reason.message(),
            score = self.score,
            "session_lost"
        );
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn score_target(&self) -> i32 {
        self.difficulty.score_target
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn remaining_seconds(&self) -> f32 {
        (self.tuning.session.time_limit_seconds - self.elapsed_seconds).max(0.0)
    }

    pub fn difficulty_level(&self) -> u8 {
        self.difficulty_level
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn world(&self) -> &ArenaWorld {
        &self.world
    }

    pub fn player(&self) -> Option<&Actor> {
        self.player
            .as_ref()
            .and_then(|state| self.world.find_actor(state.id))
    }

    pub fn items_collected(&self) -> u32 {
        self.player.as_ref().map_or(0, |state| state.items_collected)
    }

    pub fn enemies_defeated(&self) -> u32 {
        self.player.as_ref().map_or(0, |state| state.enemies_defeated)
    }

    /// Hands the caller everything emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameplayEvent> {
        self.events.drain_current_tick()
    }

    #[cfg(test)]
    pub(crate) fn force_player_health(&mut self, health: i32) {
        if let Some(state) = &self.player {
            if let Some(actor) = self.world.find_actor_mut(state.id) {
                actor.health = health.min(actor.max_health);
            }
        }
    }
}
