//! Deterministic fixed-timestep arena survival simulation.
//!
//! The crate is frontend-agnostic: callers feed [`InputSnapshot`]s into a
//! [`GameSession`], tick it at a fixed rate, and read the results back
//! through [`HudSnapshot`] and drained [`GameplayEvent`]s.

mod enemy;
mod items;
mod player;
mod spawn;

pub mod events;
pub mod hud;
pub mod input;
pub mod math;
pub mod session;
pub mod tuning;
pub mod world;

pub use events::GameplayEvent;
pub use hud::{format_clock, present, DisplaySink, HudPanel, HudSnapshot};
pub use input::{InputAction, InputSnapshot};
pub use math::Vec2;
pub use session::{GameSession, LoseReason, SessionPhase};
pub use tuning::{
    clamp_difficulty_level, ArenaTuning, DifficultySettings, EnemyKindStats, EnemyTuning,
    GameTuning, ItemTuning, PlayerTuning, SessionTuning, TuningError,
};
pub use world::{Actor, ActorKind, ArenaWorld, EnemyKind, EntityId, ItemKind, ItemPickup};
