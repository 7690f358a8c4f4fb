//! Simulation state: the live entity set, velocities, score and phase

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::entity::{Entity, EntityId, EntityKind};

/// Simulation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// Ticking normally
    Running,
    /// The player collided with an enemy; absorbing
    Terminated,
}

/// State owned by the simulation task
pub struct SimulationState {
    pub seed: u64,
    pub phase: SimPhase,
    pub tick: u64,
    pub score: u32,
    pub rng: ChaCha8Rng,
    entities: Vec<Entity>,
    velocities: HashMap<EntityId, (f32, f32)>,
    next_id: EntityId,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: SimPhase::Running,
            tick: 0,
            score: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            entities: Vec::new(),
            velocities: HashMap::new(),
            next_id: 0,
        }
    }

    /// Append a new entity to the live set
    pub fn spawn(&mut self, kind: EntityKind, x: f32, y: f32) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(Entity { id, x, y, kind });
        id
    }

    /// Remove an entity and its velocity entry
    ///
    /// Returns false if the entity was already gone.
    pub fn kill(&mut self, id: EntityId) -> bool {
        self.velocities.remove(&id);
        match self.entities.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entities.remove(index);
                true
            }
            None => false,
        }
    }

    /// Set a constant per-tick velocity; `(0, 0)` clears it
    pub fn set_velocity(&mut self, id: EntityId, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            self.velocities.remove(&id);
        } else if self.contains(id) {
            self.velocities.insert(id, (dx, dy));
        }
    }

    pub fn velocity(&self, id: EntityId) -> Option<(f32, f32)> {
        self.velocities.get(&id).copied()
    }

    /// Translate every entity that has a velocity
    pub fn apply_velocities(&mut self) {
        if self.velocities.is_empty() {
            return;
        }
        for entity in &mut self.entities {
            if let Some(&(dx, dy)) = self.velocities.get(&entity.id) {
                entity.translate(dx, dy);
            }
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Live entities in spawn order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    pub fn count(&self, pred: impl Fn(&EntityKind) -> bool) -> usize {
        self.entities.iter().filter(|e| pred(&e.kind)).count()
    }
}
