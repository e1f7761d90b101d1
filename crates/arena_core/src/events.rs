//! Gameplay events emitted by the session during a tick. The owning loop
//! drains the bus once per tick and projects the events into its logs or UI.

use crate::session::LoseReason;
use crate::world::{EnemyKind, EntityId, ItemKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameplayEvent {
    EnemySpawned {
        id: EntityId,
        kind: EnemyKind,
    },
    EnemyDied {
        id: EntityId,
        score_awarded: i32,
    },
    ItemSpawned {
        id: EntityId,
        kind: ItemKind,
        value: i32,
    },
    ItemCollected {
        id: EntityId,
        kind: ItemKind,
        value: i32,
        points_awarded: i32,
    },
    ItemExpired {
        id: EntityId,
    },
    PlayerDamaged {
        amount: i32,
        health_after: i32,
    },
    /// A hit that arrived during the invincibility window; fully discarded.
    PlayerHitIgnored {
        amount: i32,
    },
    SessionWon,
    SessionLost {
        reason: LoseReason,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<GameplayEvent>,
}

impl EventBus {
    pub fn emit(&mut self, event: GameplayEvent) {
        self.events.push(event);
    }

    pub fn drain_current_tick(&mut self) -> Vec<GameplayEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
