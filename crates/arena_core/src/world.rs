//! Id-indexed entity registry for actors and item pickups. Spawns and
//! despawns requested mid-phase are queued and applied at one point per
//! phase, so systems never mutate the collection they are iterating.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Basic,
    Fast,
    Tank,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Basic, EnemyKind::Fast, EnemyKind::Tank];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Health,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Enemy(EnemyKind),
}

impl ActorKind {
    pub fn is_enemy(self) -> bool {
        matches!(self, ActorKind::Enemy(_))
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: EntityId,
    pub kind: ActorKind,
    pub position: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub move_speed: f32,
    /// Points awarded on death; zero for the player.
    pub score_value: i32,
}

impl Actor {
    pub fn apply_damage(&mut self, amount: i32) {
        self.health = (self.health - amount.max(0)).max(0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount.max(0)).min(self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}

#[derive(Debug, Clone)]
pub struct ItemPickup {
    pub id: EntityId,
    pub kind: ItemKind,
    pub value: i32,
    pub position: Vec2,
    pub remaining_lifetime: f32,
}

#[derive(Debug, Default)]
struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct ArenaWorld {
    allocator: EntityIdAllocator,
    actors: Vec<Actor>,
    items: Vec<ItemPickup>,
    pending_actor_spawns: Vec<Actor>,
    pending_item_spawns: Vec<ItemPickup>,
    pending_despawns: Vec<EntityId>,
}

impl ArenaWorld {
    pub fn spawn_actor(
        &mut self,
        kind: ActorKind,
        position: Vec2,
        max_health: i32,
        move_speed: f32,
        score_value: i32,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_actor_spawns.push(Actor {
            id,
            kind,
            position,
            health: max_health,
            max_health,
            move_speed,
            score_value,
        });
        debug!(id = id.0, ?kind, "actor_spawn_queued");
        id
    }

    pub fn spawn_item(
        &mut self,
        kind: ItemKind,
        value: i32,
        position: Vec2,
        lifetime_seconds: f32,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_item_spawns.push(ItemPickup {
            id,
            kind,
            value,
            position,
            remaining_lifetime: lifetime_seconds,
        });
        debug!(id = id.0, ?kind, value, "item_spawn_queued");
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists = self.actors.iter().any(|actor| actor.id == id)
            || self.items.iter().any(|item| item.id == id)
            || self.pending_actor_spawns.iter().any(|actor| actor.id == id)
            || self.pending_item_spawns.iter().any(|item| item.id == id);
        if !exists {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.actors.retain(|actor| {
                pending
                    .binary_search_by_key(&actor.id.0, |id| id.0)
                    .is_err()
            });
            self.items
                .retain(|item| pending.binary_search_by_key(&item.id.0, |id| id.0).is_err());
            self.pending_actor_spawns.retain(|actor| {
                pending
                    .binary_search_by_key(&actor.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_item_spawns
                .retain(|item| pending.binary_search_by_key(&item.id.0, |id| id.0).is_err());
            self.pending_despawns.clear();
        }

        self.actors.append(&mut self.pending_actor_spawns);
        self.items.append(&mut self.pending_item_spawns);
    }

    /// Removes every spawned entity except `keep` (the player, which is
    /// created once and survives stop/restart). The id allocator is left
    /// untouched so ids are never reused within a process.
    pub fn clear_spawned(&mut self, keep: Option<EntityId>) {
        self.actors.retain(|actor| Some(actor.id) == keep);
        self.items.clear();
        self.pending_actor_spawns.clear();
        self.pending_item_spawns.clear();
        self.pending_despawns.clear();
    }

    pub fn enemy_count(&self) -> usize {
        self.actors
            .iter()
            .filter(|actor| actor.kind.is_enemy())
            .count()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn items(&self) -> &[ItemPickup] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [ItemPickup] {
        &mut self.items
    }

    pub fn find_actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn find_actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.id == id)
    }

    pub fn find_item(&self, id: EntityId) -> Option<&ItemPickup> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_enemy(world: &mut ArenaWorld) -> EntityId {
        world.spawn_actor(
            ActorKind::Enemy(EnemyKind::Basic),
            Vec2 { x: 1.0, y: 2.0 },
            50,
            3.0,
            10,
        )
    }

    #[test]
    fn ids_are_never_reused() {
        let mut world = ArenaWorld::default();
        let first = spawn_enemy(&mut world);
        world.apply_pending();
        world.despawn(first);
        world.apply_pending();

        let second = spawn_enemy(&mut world);
        assert_ne!(first, second);
        assert!(second.0 > first.0);
    }

    #[test]
    fn spawn_and_despawn_update_counts() {
        let mut world = ArenaWorld::default();
        let enemy = spawn_enemy(&mut world);
        let item = world.spawn_item(ItemKind::Score, 5, Vec2::default(), 15.0);
        world.apply_pending();
        assert_eq!(world.enemy_count(), 1);
        assert_eq!(world.item_count(), 1);

        assert!(world.despawn(enemy));
        assert!(world.despawn(item));
        world.apply_pending();
        assert_eq!(world.enemy_count(), 0);
        assert_eq!(world.item_count(), 0);
    }

    #[test]
    fn duplicate_pending_despawns_are_safe() {
        let mut world = ArenaWorld::default();
        let doomed = spawn_enemy(&mut world);
        let survivor = spawn_enemy(&mut world);
        world.apply_pending();

        assert!(world.despawn(doomed));
        assert!(world.despawn(doomed));
        assert!(world.despawn(doomed));
        world.apply_pending();

        assert!(world.find_actor(doomed).is_none());
        assert!(world.find_actor(survivor).is_some());
        assert_eq!(world.enemy_count(), 1);
    }

    #[test]
    fn despawn_of_unknown_id_reports_false() {
        let mut world = ArenaWorld::default();
        assert!(!world.despawn(EntityId(999)));
    }

    #[test]
    fn despawn_reaches_entities_still_pending_spawn() {
        let mut world = ArenaWorld::default();
        let queued = spawn_enemy(&mut world);
        assert!(world.despawn(queued));
        world.apply_pending();
        assert_eq!(world.enemy_count(), 0);
    }

    #[test]
    fn clear_spawned_keeps_only_the_kept_actor() {
        let mut world = ArenaWorld::default();
        let player = world.spawn_actor(ActorKind::Player, Vec2::default(), 100, 5.0, 0);
        spawn_enemy(&mut world);
        world.spawn_item(ItemKind::Health, 20, Vec2::default(), 15.0);
        world.apply_pending();

        world.clear_spawned(Some(player));

        assert!(world.find_actor(player).is_some());
        assert_eq!(world.enemy_count(), 0);
        assert_eq!(world.item_count(), 0);
    }

    #[test]
    fn damage_and_heal_clamp_to_bounds() {
        let mut world = ArenaWorld::default();
        let id = world.spawn_actor(ActorKind::Player, Vec2::default(), 100, 5.0, 0);
        world.apply_pending();
        let actor = world.find_actor_mut(id).expect("actor");

        actor.apply_damage(250);
        assert_eq!(actor.health, 0);
        assert!(actor.is_dead());

        actor.heal(40);
        assert_eq!(actor.health, 40);
        actor.heal(1_000);
        assert_eq!(actor.health, 100);
    }

    #[test]
    fn negative_damage_and_heal_amounts_are_ignored() {
        let mut world = ArenaWorld::default();
        let id = world.spawn_actor(ActorKind::Player, Vec2::default(), 100, 5.0, 0);
        world.apply_pending();
        let actor = world.find_actor_mut(id).expect("actor");

        actor.apply_damage(-30);
        assert_eq!(actor.health, 100);
        actor.apply_damage(10);
        actor.heal(-50);
        assert_eq!(actor.health, 90);
    }

    #[test]
    fn health_fraction_handles_degenerate_max() {
        let actor = Actor {
            id: EntityId(0),
            kind: ActorKind::Player,
            position: Vec2::default(),
            health: 10,
            max_health: 0,
            move_speed: 1.0,
            score_value: 0,
        };
        assert_eq!(actor.health_fraction(), 0.0);
    }
}
