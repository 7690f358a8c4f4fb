//! Entity records and their variants

use serde::Serialize;

/// Identifier handed out by [`SimulationState::spawn`](super::SimulationState::spawn)
pub type EntityId = u64;

/// Variant tag, used for render dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTag {
    Player,
    Gun,
    Enemy,
    Bullet,
}

/// Gun bound to a player; fires from the owner's position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GunState {
    /// Player the gun fires from
    pub owner: EntityId,
    /// Ticks the gun stays frozen after firing
    pub freeze_ticks: u32,
    /// Ticks left before the next shot (0 = ready)
    pub cooldown: u32,
}

impl GunState {
    pub fn new(owner: EntityId, freeze_ticks: u32) -> Self {
        Self {
            owner,
            freeze_ticks,
            cooldown: 0,
        }
    }
}

/// Per-variant data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Player,
    Gun(GunState),
    /// Moves left by `speed` every tick
    Enemy {
        speed: f32,
    },
    Bullet,
}

impl EntityKind {
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Player => EntityTag::Player,
            EntityKind::Gun(_) => EntityTag::Gun,
            EntityKind::Enemy { .. } => EntityTag::Enemy,
            EntityKind::Bullet => EntityTag::Bullet,
        }
    }
}

/// A live entity
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub kind: EntityKind,
}

impl Entity {
    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}
