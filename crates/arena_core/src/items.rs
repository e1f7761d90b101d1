//! Item phase: lifetime decay for pickups and the value roll used when
//! spawning new ones.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::events::{EventBus, GameplayEvent};
use crate::tuning::ItemTuning;
use crate::world::{ArenaWorld, EntityId, ItemKind};

pub(crate) fn run_item_phase(world: &mut ArenaWorld, fixed_dt_seconds: f32, events: &mut EventBus) {
    let mut expired: Vec<EntityId> = Vec::new();
    for item in world.items_mut() {
        item.remaining_lifetime -= fixed_dt_seconds;
        if item.remaining_lifetime <= 0.0 {
            expired.push(item.id);
        }
    }
    for id in expired {
        world.despawn(id);
        events.emit(GameplayEvent::ItemExpired { id });
    }
}

/// Even split between the two kinds; values are drawn from the tuned
/// half-open ranges.
pub(crate) fn roll_item(rng: &mut ChaCha8Rng, tuning: &ItemTuning) -> (ItemKind, i32) {
    if rng.random_range(0.0..1.0f32) < 0.5 {
        (
            ItemKind::Score,
            rng.random_range(tuning.score_value_min..tuning.score_value_max),
        )
    } else {
        (
            ItemKind::Health,
            rng.random_range(tuning.health_value_min..tuning.health_value_max),
        )
    }
}
