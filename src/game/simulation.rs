//! Simulation task and the fixed-rate tick loop

use rand::Rng;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::input::Joystick;
use crate::render::{RenderBoundary, RenderSink};
use crate::util::time::{tick_duration, Timer};

use super::combat::CombatSystem;
use super::entity::{EntityId, EntityKind, GunState};
use super::physics::{PhysicsSystem, ScreenSize};
use super::snapshot::{EntitySnapshot, SnapshotBuilder};
use super::state::{SimPhase, SimulationState};
use super::SimulationConfig;

/// The arena: one player, its gun, and whatever enemies and bullets are alive
pub struct Simulation {
    state: SimulationState,
    config: SimulationConfig,
    /// (device, entity) pairs in registration order
    controllers: Vec<(Joystick, EntityId)>,
    player: EntityId,
    gun: EntityId,
}

impl Simulation {
    /// Spawn the player and its gun, steered by `left` and aimed by `right`
    pub fn new(config: SimulationConfig, left: Joystick, right: Joystick) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut state = SimulationState::new(seed);

        let (x, y) = config.player_start;
        let player = state.spawn(EntityKind::Player, x, y);
        let gun = state.spawn(EntityKind::Gun(GunState::new(player, config.gun_freeze_ticks)), x, y);

        Self {
            state,
            config,
            controllers: vec![(left, player), (right, gun)],
            player,
            gun,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn gun(&self) -> EntityId {
        self.gun
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn phase(&self) -> SimPhase {
        self.state.phase
    }

    /// Add an entity outside the normal spawn rules
    pub fn spawn(&mut self, kind: EntityKind, x: f32, y: f32) -> EntityId {
        self.state.spawn(kind, x, y)
    }

    pub fn kill(&mut self, id: EntityId) -> bool {
        self.state.kill(id)
    }

    pub fn set_velocity(&mut self, id: EntityId, dx: f32, dy: f32) {
        self.state.set_velocity(id, dx, dy);
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        SnapshotBuilder::build(&self.state)
    }

    /// Advance one tick inside `area`
    ///
    /// A terminated simulation no longer changes.
    pub fn tick(&mut self, area: ScreenSize) -> SimPhase {
        if self.state.phase == SimPhase::Terminated {
            return SimPhase::Terminated;
        }

        // Each device is read exactly once per tick.
        let inputs: Vec<(EntityId, (f32, f32))> = self
            .controllers
            .iter()
            .map(|(stick, id)| (*id, stick.read()))
            .collect();
        for (id, (dx, dy)) in inputs {
            if dx != 0.0 || dy != 0.0 {
                self.controller_react(id, dx, dy, area);
            }
        }

        self.state.apply_velocities();

        for id in self.state.ids() {
            if self.state.contains(id) {
                self.tick_logic(id, area);
            }
        }

        self.state.tick += 1;
        self.state.phase
    }

    fn controller_react(&mut self, id: EntityId, dx: f32, dy: f32, area: ScreenSize) {
        let Some(kind) = self.state.get(id).map(|e| e.kind) else {
            return;
        };

        match kind {
            EntityKind::Player => {
                if let Some(player) = self.state.get_mut(id) {
                    player.translate(dx, dy);
                    (player.x, player.y) = PhysicsSystem::clamp_to_play_area(player.x, player.y, area);
                }
            }
            EntityKind::Gun(_) => {
                if let Some(bullet) = CombatSystem::try_fire(&mut self.state, id, dx, dy) {
                    debug!(tick = self.state.tick, bullet, dx, dy, "Gun fired");
                }
            }
            EntityKind::Enemy { .. } | EntityKind::Bullet => {}
        }
    }

    fn tick_logic(&mut self, id: EntityId, area: ScreenSize) {
        let Some(kind) = self.state.get(id).map(|e| e.kind) else {
            return;
        };

        match kind {
            EntityKind::Player => self.player_logic(id, area),
            EntityKind::Gun(_) => CombatSystem::cool_down(&mut self.state, id),
            EntityKind::Enemy { speed } => self.enemy_logic(id, speed, area),
            EntityKind::Bullet => {
                let out = self
                    .state
                    .get(id)
                    .is_some_and(|b| PhysicsSystem::is_out_of_bounds(b.x, b.y, area));
                if out {
                    self.state.kill(id);
                }
            }
        }
    }

    fn player_logic(&mut self, id: EntityId, area: ScreenSize) {
        let Some(player) = self.state.get_mut(id) else {
            return;
        };
        (player.x, player.y) = PhysicsSystem::clamp_to_play_area(player.x, player.y, area);
        let position = player.position();

        let every = self.config.enemy_spawn_interval;
        if every > 0 && self.state.tick % every == 0 {
            self.spawn_enemy(area);
        }

        let radius = self.config.collision_radius;
        let collided = self.state.entities().iter().any(|e| {
            matches!(e.kind, EntityKind::Enemy { .. })
                && PhysicsSystem::check_collision(e.position(), position, radius)
        });
        if collided {
            info!(tick = self.state.tick, score = self.state.score, "Player hit by enemy");
            self.state.phase = SimPhase::Terminated;
        }
    }

    fn spawn_enemy(&mut self, area: ScreenSize) {
        let y = self.state.rng.gen::<f32>() * area.height;
        let jitter = self.config.enemy_speed_jitter;
        let offset = if jitter > 0.0 {
            self.state.rng.gen_range(-jitter..jitter)
        } else {
            0.0
        };
        let speed = self.config.enemy_speed + offset;

        let enemy = self.state.spawn(EntityKind::Enemy { speed }, area.spawn_column(), y);
        debug!(tick = self.state.tick, enemy, y, speed, "Enemy spawned");
    }

    fn enemy_logic(&mut self, id: EntityId, speed: f32, area: ScreenSize) {
        let Some(enemy) = self.state.get_mut(id) else {
            return;
        };
        enemy.x -= speed;

        if PhysicsSystem::is_out_of_bounds(enemy.x, enemy.y, area) {
            self.state.kill(id);
            return;
        }

        if let Some(hit) = CombatSystem::resolve_enemy_hit(&mut self.state, id, self.config.collision_radius) {
            info!(
                tick = self.state.tick,
                enemy = hit.enemy,
                bullet = hit.bullet,
                score = self.state.score,
                "Enemy destroyed"
            );
        }
    }

    /// Run the tick loop until the player dies or `stop` fires
    ///
    /// The boundary is queried once per tick and every tick's entities go to
    /// `sink`. Render failures are logged and never touch the simulation.
    /// Returns the final score.
    pub async fn run<B, S>(&mut self, boundary: &B, sink: &mut S, mut stop: watch::Receiver<bool>) -> u32
    where
        B: RenderBoundary + ?Sized,
        S: RenderSink + ?Sized,
    {
        info!(seed = self.state.seed, tick_rate = self.config.tick_rate, "Simulation started");

        let budget = tick_duration(self.config.tick_rate);
        let mut tick_interval = interval(budget);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *stop.borrow() {
                info!(tick = self.state.tick, "Stop requested");
                break;
            }

            tokio::select! {
                _ = tick_interval.tick() => {}
                changed = stop.changed() => {
                    // A dropped sender counts as a stop.
                    if changed.is_err() {
                        info!(tick = self.state.tick, "Stop channel closed");
                        break;
                    }
                    continue;
                }
            }

            let timer = Timer::new();
            let area = boundary.screen_size();
            let phase = self.tick(area);

            if let Err(e) = sink.render(&self.snapshot()) {
                warn!(tick = self.state.tick, error = %e, "Render failed");
            }

            if timer.elapsed() > budget {
                debug!(tick = self.state.tick, elapsed_us = timer.elapsed_micros(), "Tick overran budget");
            }

            if phase == SimPhase::Terminated {
                info!(tick = self.state.tick, score = self.state.score, "Simulation terminated");
                break;
            }
        }

        self.state.score
    }
}
