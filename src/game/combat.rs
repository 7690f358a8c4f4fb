//! Combat system - gun cooldowns, bullet spawning, bullet/enemy hits

use super::entity::{EntityId, EntityKind};
use super::physics::PhysicsSystem;
use super::state::SimulationState;

/// Outcome of a bullet striking an enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub enemy: EntityId,
    pub bullet: EntityId,
}

/// Combat rules for guns and bullets
pub struct CombatSystem;

impl CombatSystem {
    /// Check if a gun can fire (cooldown check)
    pub fn can_fire(cooldown: u32) -> bool {
        cooldown == 0
    }

    /// One tick of cooldown
    pub fn update_cooldown(cooldown: u32) -> u32 {
        cooldown.saturating_sub(1)
    }

    /// Fire `gun` in direction `(dx, dy)` if it is ready
    ///
    /// The bullet spawns on the owner's current position and is given the
    /// direction as its velocity. Returns the bullet id when a shot was fired.
    pub fn try_fire(state: &mut SimulationState, gun: EntityId, dx: f32, dy: f32) -> Option<EntityId> {
        let (owner, freeze_ticks) = match state.get(gun).map(|e| e.kind) {
            Some(EntityKind::Gun(g)) if Self::can_fire(g.cooldown) => (g.owner, g.freeze_ticks),
            _ => return None,
        };
        let (x, y) = state.get(owner)?.position();

        let bullet = state.spawn(EntityKind::Bullet, x, y);
        state.set_velocity(bullet, dx, dy);

        if let Some(EntityKind::Gun(g)) = state.get_mut(gun).map(|e| &mut e.kind) {
            g.cooldown = freeze_ticks;
        }
        Some(bullet)
    }

    /// Per-tick gun logic
    pub fn cool_down(state: &mut SimulationState, gun: EntityId) {
        if let Some(EntityKind::Gun(g)) = state.get_mut(gun).map(|e| &mut e.kind) {
            g.cooldown = Self::update_cooldown(g.cooldown);
        }
    }

    /// First live bullet within `radius` of `enemy`, in entity order
    pub fn find_hit(state: &SimulationState, enemy: EntityId, radius: f32) -> Option<HitResult> {
        let target = state.get(enemy)?.position();
        state
            .entities()
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Bullet))
            .find(|b| PhysicsSystem::check_collision(b.position(), target, radius))
            .map(|b| HitResult {
                enemy,
                bullet: b.id,
            })
    }

    /// Resolve at most one hit for `enemy`: both die and the score goes up
    pub fn resolve_enemy_hit(state: &mut SimulationState, enemy: EntityId, radius: f32) -> Option<HitResult> {
        let hit = Self::find_hit(state, enemy, radius)?;
        state.kill(hit.bullet);
        state.kill(hit.enemy);
        state.score += 1;
        Some(hit)
    }
}
