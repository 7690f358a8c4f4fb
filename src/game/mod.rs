//! Game simulation modules

pub mod combat;
pub mod entity;
pub mod physics;
pub mod simulation;
pub mod snapshot;
pub mod state;

pub use entity::{Entity, EntityId, EntityKind, EntityTag, GunState};
pub use physics::ScreenSize;
pub use simulation::Simulation;
pub use snapshot::EntitySnapshot;
pub use state::{SimPhase, SimulationState};

use crate::util::time::TARGET_TPS;

/// Simulation tunables
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Ticks per second of the run loop
    pub tick_rate: u32,
    /// Ticks a gun stays frozen after firing
    pub gun_freeze_ticks: u32,
    /// An enemy spawns on every tick divisible by this (0 disables spawning)
    pub enemy_spawn_interval: u64,
    pub enemy_speed: f32,
    /// Enemy speed varies uniformly by up to this much either way
    pub enemy_speed_jitter: f32,
    /// Contact distance for player/enemy and bullet/enemy
    pub collision_radius: f32,
    pub player_start: (f32, f32),
    /// Fixed RNG seed; a random one is drawn when unset
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: TARGET_TPS,
            gun_freeze_ticks: 30,
            enemy_spawn_interval: 20,
            enemy_speed: 0.7,
            enemy_speed_jitter: 0.25,
            collision_radius: 2.0,
            player_start: (10.0, 20.0),
            seed: None,
        }
    }
}
