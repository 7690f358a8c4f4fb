//! Per-tick snapshots handed to render sinks

use serde::Serialize;

use super::entity::{EntityId, EntityKind, EntityTag};
use super::state::SimulationState;

/// One live entity as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub tag: EntityTag,
    pub x: f32,
    pub y: f32,
}

/// Builds render snapshots from simulation state
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Live entities in spawn order
    ///
    /// Guns have no position of their own and report their owner's.
    pub fn build(state: &SimulationState) -> Vec<EntitySnapshot> {
        state
            .entities()
            .iter()
            .map(|e| {
                let (x, y) = match e.kind {
                    EntityKind::Gun(g) => state.get(g.owner).map_or(e.position(), |o| o.position()),
                    _ => e.position(),
                };
                EntitySnapshot {
                    id: e.id,
                    tag: e.tag(),
                    x,
                    y,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::GunState;

    #[test]
    fn snapshot_preserves_order_and_gun_follows_owner() {
        let mut state = SimulationState::new(0);
        let player = state.spawn(EntityKind::Player, 10.0, 20.0);
        state.spawn(EntityKind::Gun(GunState::new(player, 30)), 0.0, 0.0);
        state.spawn(EntityKind::Enemy { speed: 0.7 }, 50.0, 4.0);
        state.get_mut(player).unwrap().translate(2.0, -1.0);

        let snap = SnapshotBuilder::build(&state);
        let tags: Vec<EntityTag> = snap.iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![EntityTag::Player, EntityTag::Gun, EntityTag::Enemy]);
        assert_eq!((snap[1].x, snap[1].y), (12.0, 19.0));
    }

    #[test]
    fn snapshot_serializes_tags() {
        let mut state = SimulationState::new(0);
        state.spawn(EntityKind::Bullet, 1.5, 2.0);
        let json = serde_json::to_value(SnapshotBuilder::build(&state)).unwrap();
        assert_eq!(json[0]["tag"], "bullet");
        assert_eq!(json[0]["x"], 1.5);
        assert_eq!(json[0]["id"], 0);
    }
}
