//! Gameplay tuning tables. Defaults live in code; a frontend may deserialize
//! overrides from JSON and must call [`GameTuning::validate`] before handing
//! the table to a session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::EnemyKind;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TuningError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} value range is empty: {min}..{max}")]
    EmptyValueRange {
        field: &'static str,
        min: i32,
        max: i32,
    },
    #[error("spawn extent {spawn_extent} exceeds arena half extent {half_extent}")]
    SpawnExtentOutsideArena {
        spawn_extent: f32,
        half_extent: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub time_limit_seconds: f32,
    pub spawn_interval_seconds: f32,
    pub max_enemies: usize,
    pub max_items: usize,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            time_limit_seconds: 60.0,
            spawn_interval_seconds: 3.0,
            max_enemies: 5,
            max_items: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub move_speed: f32,
    pub max_health: i32,
    pub invincibility_seconds: f32,
    pub attack_damage: i32,
    pub attack_range: f32,
    pub attack_cooldown_seconds: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            max_health: 100,
            invincibility_seconds: 1.0,
            attack_damage: 10,
            attack_range: 2.0,
            attack_cooldown_seconds: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyKindStats {
    pub move_speed: f32,
    pub max_health: i32,
    pub score_value: i32,
}

impl Default for EnemyKindStats {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            max_health: 50,
            score_value: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub detection_range: f32,
    /// Chasing ends only past `detection_range * chase_exit_factor`; the gap
    /// between the two bounds keeps the state from flapping at the boundary.
    pub chase_exit_factor: f32,
    pub wander_radius: f32,
    pub wander_interval_seconds: f32,
    pub wander_arrival_threshold: f32,
    pub attack_reach: f32,
    pub attack_cooldown_seconds: f32,
    pub contact_damage: i32,
    pub basic: EnemyKindStats,
    pub fast: EnemyKindStats,
    pub tank: EnemyKindStats,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            chase_exit_factor: 1.5,
            wander_radius: 5.0,
            wander_interval_seconds: 3.0,
            wander_arrival_threshold: 0.5,
            attack_reach: 2.0,
            attack_cooldown_seconds: 1.0,
            contact_damage: 90,
            basic: EnemyKindStats {
                move_speed: 3.0,
                max_health: 50,
                score_value: 10,
            },
            fast: EnemyKindStats {
                move_speed: 5.0,
                max_health: 30,
                score_value: 15,
            },
            tank: EnemyKindStats {
                move_speed: 2.0,
                max_health: 100,
                score_value: 20,
            },
        }
    }
}

impl EnemyTuning {
    pub fn stats_for(&self, kind: EnemyKind) -> &EnemyKindStats {
        match kind {
            EnemyKind::Basic => &self.basic,
            EnemyKind::Fast => &self.fast,
            EnemyKind::Tank => &self.tank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTuning {
    /// Value rolls are upper-exclusive integer ranges.
    pub score_value_min: i32,
    pub score_value_max: i32,
    pub health_value_min: i32,
    pub health_value_max: i32,
    pub lifetime_seconds: f32,
    pub pickup_radius: f32,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            score_value_min: 5,
            score_value_max: 15,
            health_value_min: 10,
            health_value_max: 30,
            lifetime_seconds: 15.0,
            pickup_radius: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    /// Movement clamp on both axes; the arena walls.
    pub half_extent: f32,
    /// Spawn positions are rolled within `[-spawn_extent, spawn_extent]`.
    pub spawn_extent: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            half_extent: 10.0,
            spawn_extent: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    pub session: SessionTuning,
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub items: ItemTuning,
    pub arena: ArenaTuning,
}

impl GameTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_positive("session.time_limit_seconds", self.session.time_limit_seconds)?;
        require_positive(
            "session.spawn_interval_seconds",
            self.session.spawn_interval_seconds,
        )?;
        require_positive("player.move_speed", self.player.move_speed)?;
        require_positive("player.max_health", self.player.max_health as f32)?;
        require_positive("player.attack_damage", self.player.attack_damage as f32)?;
        require_positive("player.attack_range", self.player.attack_range)?;
        require_positive(
            "player.attack_cooldown_seconds",
            self.player.attack_cooldown_seconds,
        )?;
        require_positive(
            "player.invincibility_seconds",
            self.player.invincibility_seconds,
        )?;
        require_positive("enemy.detection_range", self.enemy.detection_range)?;
        require_positive("enemy.chase_exit_factor", self.enemy.chase_exit_factor)?;
        require_positive("enemy.wander_radius", self.enemy.wander_radius)?;
        require_positive(
            "enemy.wander_interval_seconds",
            self.enemy.wander_interval_seconds,
        )?;
        require_positive(
            "enemy.wander_arrival_threshold",
            self.enemy.wander_arrival_threshold,
        )?;
        require_positive("enemy.attack_reach", self.enemy.attack_reach)?;
        require_positive(
            "enemy.attack_cooldown_seconds",
            self.enemy.attack_cooldown_seconds,
        )?;
        require_positive("enemy.contact_damage", self.enemy.contact_damage as f32)?;
        for (field, stats) in [
            ("enemy.basic", &self.enemy.basic),
            ("enemy.fast", &self.enemy.fast),
            ("enemy.tank", &self.enemy.tank),
        ] {
            if stats.move_speed <= 0.0 {
                return Err(TuningError::NonPositive {
                    field,
                    value: stats.move_speed,
                });
            }
            if stats.max_health <= 0 {
                return Err(TuningError::NonPositive {
                    field,
                    value: stats.max_health as f32,
                });
            }
        }
        require_value_range(
            "items.score_value",
            self.items.score_value_min,
            self.items.score_value_max,
        )?;
        require_value_range(
            "items.health_value",
            self.items.health_value_min,
            self.items.health_value_max,
        )?;
        require_positive("items.lifetime_seconds", self.items.lifetime_seconds)?;
        require_positive("items.pickup_radius", self.items.pickup_radius)?;
        require_positive("arena.half_extent", self.arena.half_extent)?;
        require_positive("arena.spawn_extent", self.arena.spawn_extent)?;
        if self.arena.spawn_extent > self.arena.half_extent {
            return Err(TuningError::SpawnExtentOutsideArena {
                spawn_extent: self.arena.spawn_extent,
                half_extent: self.arena.half_extent,
            });
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NonPositive { field, value })
    }
}

fn require_value_range(field: &'static str, min: i32, max: i32) -> Result<(), TuningError> {
    if min < max && min > 0 {
        Ok(())
    } else {
        Err(TuningError::EmptyValueRange { field, min, max })
    }
}

/// Difficulty table keyed by level 1-3. Levels outside the table are clamped
/// onto it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultySettings {
    pub enemy_speed_multiplier: f32,
    pub spawn_rate_multiplier: f32,
    pub score_target: i32,
}

pub fn clamp_difficulty_level(level: i32) -> u8 {
    level.clamp(1, 3) as u8
}

impl DifficultySettings {
    pub fn for_level(level: u8) -> Self {
        match level {
            2 => Self {
                enemy_speed_multiplier: 1.5,
                spawn_rate_multiplier: 1.3,
                score_target: 15,
            },
            3 => Self {
                enemy_speed_multiplier: 2.0,
                spawn_rate_multiplier: 1.6,
                score_target: 20,
            },
            _ => Self {
                enemy_speed_multiplier: 1.0,
                spawn_rate_multiplier: 1.0,
                score_target: 10,
            },
        }
    }
}
