//! Arena orchestration: entity ownership, the per-tick simulation, lifecycle
//!
//! The arena owns the memory pool, every entity and constraint handle, the
//! listener list and the seeded RNG. `update_physics` is the single entry
//! point the embedding frame loop calls; later phases assume the earlier
//! ones already ran this tick, so the order is fixed:
//!
//! 1. constraint forces, so orbital corrections precede motion
//! 2. integration (celestial bodies, player, NPC ships, projectiles)
//! 3. boundary handling, policy per entity kind
//! 4. projectile-vs-ship collisions
//! 5. celestial-body collisions and cascades
//! 6. sweep of dead ships
//! 7. player respawn
//!
//! Destruction always cascades: constraints referencing a dying entity go
//! first, orphaned orbiters fall back to the dead body's own center, and
//! listeners hear about every step before any pool slot is reused.

use glam::DVec3;
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::config::ArenaConfig;
use crate::consts::*;
use crate::events::GameArenaListener;
use crate::pool::{Handle, PagedPool, SlotSize};
use crate::random_unit_vector;
use crate::sim::body::{SpatialBody, SphereBody};
use crate::sim::constraint::Constraint;
use crate::sim::entity::{
    ArenaItem, BodyKind, CelestialBody, Projectile, ProjectileKind, SpaceShip, orbital_state,
};

/// Recoverable arena-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The entity can never fit in a pool page; nothing was spawned
    #[error("entity of {size} bytes exceeds the pool page size of {page_size}")]
    EntityTooLarge { size: u32, page_size: u32 },
    /// The handle does not refer to a live entity of the expected kind.
    /// Destruction with an unknown handle means earlier bookkeeping went
    /// wrong; it is reported loudly instead of silently ignored.
    #[error("unknown or stale entity handle {0:?}")]
    UnknownHandle(Handle),
}

/// The simulation world: a bounded cube of space and everything inside it
pub struct GameArena {
    bounds: f64,
    pool: PagedPool<ArenaItem>,
    player: Option<Handle>,
    npc_ships: Vec<Handle>,
    projectiles: Vec<Handle>,
    bodies: Vec<Handle>,
    constraints: Vec<Handle>,
    listeners: Vec<Box<dyn GameArenaListener>>,
    rng: Pcg32,
}

impl GameArena {
    pub fn new(config: ArenaConfig) -> Self {
        info!(
            "arena initialized: bounds={}, page_size={}, seed={}",
            config.bounds, config.page_size, config.seed
        );
        Self {
            bounds: config.bounds,
            pool: PagedPool::new(config.page_size, config.initial_pages),
            player: None,
            npc_ships: Vec::new(),
            projectiles: Vec::new(),
            bodies: Vec::new(),
            constraints: Vec::new(),
            listeners: Vec::new(),
            rng: Pcg32::seed_from_u64(config.seed),
        }
    }

    /// Register a lifecycle observer
    pub fn add_listener(&mut self, listener: Box<dyn GameArenaListener>) {
        self.listeners.push(listener);
    }

    /// Half-extent of the play volume
    pub fn bounds(&self) -> f64 {
        self.bounds
    }

    pub fn player(&self) -> Option<Handle> {
        self.player
    }

    pub fn npc_ships(&self) -> &[Handle] {
        &self.npc_ships
    }

    pub fn projectiles(&self) -> &[Handle] {
        &self.projectiles
    }

    pub fn bodies(&self) -> &[Handle] {
        &self.bodies
    }

    pub fn constraints(&self) -> &[Handle] {
        &self.constraints
    }

    /// Bytes currently allocated for live entities
    pub fn allocated_bytes(&self) -> usize {
        self.pool.allocated_bytes()
    }

    /// Resolve any live entity
    pub fn entity(&self, handle: Handle) -> Option<&ArenaItem> {
        self.pool.get(handle)
    }

    /// Resolve any live entity, mutably (ship control goes through here)
    pub fn entity_mut(&mut self, handle: Handle) -> Option<&mut ArenaItem> {
        self.pool.get_mut(handle)
    }

    pub fn ship_mut(&mut self, handle: Handle) -> Option<&mut SpaceShip> {
        match self.pool.get_mut(handle) {
            Some(ArenaItem::Ship(ship)) => Some(ship),
            _ => None,
        }
    }

    pub fn player_ship(&self) -> Option<&SpaceShip> {
        self.entity(self.player?)?.as_ship()
    }

    pub fn player_ship_mut(&mut self) -> Option<&mut SpaceShip> {
        let handle = self.player?;
        self.ship_mut(handle)
    }

    // ------------------------------------------------------------------
    // Entity addition
    // ------------------------------------------------------------------

    /// Install the player ship, replacing (and cascading out) any previous
    /// one.
    pub fn set_player_ship(&mut self, ship: SpaceShip) -> Result<Handle, ArenaError> {
        if let Some(old) = self.player {
            self.destroy_entity(old);
        }
        let handle = self.store_item(ArenaItem::Ship(ship))?;
        self.player = Some(handle);
        self.notify_created(handle);
        info!("player ship spawned");
        Ok(handle)
    }

    pub fn add_npc_ship(&mut self, ship: SpaceShip) -> Result<Handle, ArenaError> {
        let handle = self.store_item(ArenaItem::Ship(ship))?;
        self.npc_ships.push(handle);
        self.notify_created(handle);
        Ok(handle)
    }

    pub fn add_projectile(&mut self, projectile: Projectile) -> Result<Handle, ArenaError> {
        let handle = self.store_item(ArenaItem::Projectile(projectile))?;
        self.projectiles.push(handle);
        self.notify_created(handle);
        Ok(handle)
    }

    /// Spawn a celestial body with no orbital center
    pub fn add_static_body(
        &mut self,
        kind: BodyKind,
        mass: f64,
        radius: f64,
        position: DVec3,
    ) -> Result<Handle, ArenaError> {
        let body = CelestialBody::fixed(kind, mass, radius, position);
        let handle = self.store_item(ArenaItem::Body(body))?;
        self.bodies.push(handle);
        self.notify_created(handle);
        Ok(handle)
    }

    /// Spawn a celestial body on a sampled orbit around `center`, together
    /// with the rigid constraint that maintains it (1:1, co-destroyed).
    pub fn add_orbiting_body(
        &mut self,
        center: Handle,
        kind: BodyKind,
        mass: f64,
        radius: f64,
        distance: f64,
        speed: f64,
    ) -> Result<Handle, ArenaError> {
        let center_sphere = *self
            .entity_sphere(center)
            .ok_or(ArenaError::UnknownHandle(center))?;
        let (position, velocity) = orbital_state(&mut self.rng, &center_sphere, radius, distance, speed);

        let mut body = CelestialBody::fixed(kind, mass, radius, position);
        body.object.sphere.body.velocity = velocity;
        body.center = Some(center);

        let handle = self.store_item(ArenaItem::Body(body))?;
        self.bodies.push(handle);
        self.notify_created(handle);
        self.add_constraint(handle, center, true)?;
        Ok(handle)
    }

    /// Attach a constraint from `origin` to `target`, sampling the current
    /// separation and relative speed as its rest state.
    pub fn add_constraint(
        &mut self,
        origin: Handle,
        target: Handle,
        rigid: bool,
    ) -> Result<Handle, ArenaError> {
        let origin_body = self
            .entity_sphere(origin)
            .ok_or(ArenaError::UnknownHandle(origin))?
            .body;
        let target_body = self
            .entity_sphere(target)
            .ok_or(ArenaError::UnknownHandle(target))?
            .body;
        let constraint = Constraint::new(origin, target, &origin_body, &target_body, rigid);
        let handle = self.store_item(ArenaItem::Constraint(constraint))?;
        self.constraints.push(handle);
        self.notify_created(handle);
        Ok(handle)
    }

    /// Fire a ship's weapon. `Ok(false)` means a gate failed (still
    /// reloading, or not enough energy): nothing happened, nothing spawned.
    pub fn fire_weapon(&mut self, ship: Handle, index: usize) -> Result<bool, ArenaError> {
        let ship_entry = match self.pool.get_mut(ship) {
            Some(ArenaItem::Ship(s)) => s,
            _ => return Err(ArenaError::UnknownHandle(ship)),
        };
        let Some(shot) = ship_entry.fire_weapon(index) else {
            return Ok(false);
        };
        let projectile = Projectile::from_shot(&shot, ship);
        let handle = self.store_item(ArenaItem::Projectile(projectile))?;
        self.projectiles.push(handle);
        self.notify_created(handle);
        Ok(true)
    }

    /// Populate the arena with a star, planets and moons in rigid orbits.
    /// Returns the star's handle.
    pub fn generate_solar_system(&mut self) -> Result<Handle, ArenaError> {
        let star = self.add_static_body(BodyKind::Star, STAR_MASS, STAR_RADIUS, DVec3::ZERO)?;

        let planet_count = self.rng.random_range(PLANET_COUNT_MIN..=PLANET_COUNT_MAX);
        for _ in 0..planet_count {
            let radius = self.rng.random_range(PLANET_RADIUS_MIN..=PLANET_RADIUS_MAX);
            let distance = self.rng.random_range(PLANET_DISTANCE_MIN..=PLANET_DISTANCE_MAX);
            let speed = self.rng.random_range(PLANET_SPEED_MIN..=PLANET_SPEED_MAX);
            let planet =
                self.add_orbiting_body(star, BodyKind::Planet, PLANET_MASS, radius, distance, speed)?;

            let moons = self.rng.random_range(0..=MOONS_MAX);
            for _ in 0..moons {
                let moon_radius = self.rng.random_range(MOON_RADIUS_MIN..=MOON_RADIUS_MAX);
                let moon_distance = self.rng.random_range(MOON_DISTANCE_MIN..=MOON_DISTANCE_MAX);
                let moon_speed = self.rng.random_range(MOON_SPEED_MIN..=MOON_SPEED_MAX);
                self.add_orbiting_body(
                    planet,
                    BodyKind::Moon,
                    MOON_MASS,
                    moon_radius,
                    moon_distance,
                    moon_speed,
                )?;
            }
        }
        info!("generated solar system with {planet_count} planets");
        Ok(star)
    }

    // ------------------------------------------------------------------
    // Entity destruction
    // ------------------------------------------------------------------

    pub fn destroy_ship(&mut self, handle: Handle) -> Result<(), ArenaError> {
        if self.player == Some(handle) || self.npc_ships.contains(&handle) {
            self.destroy_entity(handle);
            Ok(())
        } else {
            Err(ArenaError::UnknownHandle(handle))
        }
    }

    pub fn destroy_projectile(&mut self, handle: Handle) -> Result<(), ArenaError> {
        if self.projectiles.contains(&handle) {
            self.destroy_entity(handle);
            Ok(())
        } else {
            Err(ArenaError::UnknownHandle(handle))
        }
    }

    pub fn destroy_body(&mut self, handle: Handle) -> Result<(), ArenaError> {
        if self.bodies.contains(&handle) {
            self.destroy_entity(handle);
            Ok(())
        } else {
            Err(ArenaError::UnknownHandle(handle))
        }
    }

    pub fn destroy_constraint(&mut self, handle: Handle) -> Result<(), ArenaError> {
        if self.constraints.contains(&handle) {
            self.destroy_entity(handle);
            Ok(())
        } else {
            Err(ArenaError::UnknownHandle(handle))
        }
    }

    // ------------------------------------------------------------------
    // The simulation tick
    // ------------------------------------------------------------------

    /// Advance the whole arena by `dt` seconds
    pub fn update_physics(&mut self, dt: f64) {
        self.apply_constraints(dt);
        self.integrate(dt);
        self.handle_boundary(dt);
        self.collide_projectiles();
        self.collide_celestials();
        self.sweep_dead_ships();
        self.respawn_player();
    }

    /// Phase 1: constraint corrections, before anything moves
    fn apply_constraints(&mut self, dt: f64) {
        for i in 0..self.constraints.len() {
            let handle = self.constraints[i];
            let Some(ArenaItem::Constraint(constraint)) = self.pool.get(handle) else {
                continue;
            };
            let constraint = *constraint;
            let Some(target) = self.entity_sphere(constraint.target).map(|s| s.body) else {
                continue;
            };
            if let Some(origin) = self.entity_sphere_mut(constraint.origin) {
                constraint.apply(&mut origin.body, &target, dt);
            }
        }
    }

    /// Phase 2: integration. Celestial bodies first, then the player, NPC
    /// ships and projectiles; ships recharge and advance weapons alongside.
    fn integrate(&mut self, dt: f64) {
        for &handle in &self.bodies {
            if let Some(ArenaItem::Body(body)) = self.pool.get_mut(handle) {
                body.object.sphere.body.update_physics(dt);
            }
        }
        if let Some(handle) = self.player {
            if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(handle) {
                ship.update(dt);
            }
        }
        for &handle in &self.npc_ships {
            if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(handle) {
                ship.update(dt);
            }
        }
        for &handle in &self.projectiles {
            if let Some(ArenaItem::Projectile(projectile)) = self.pool.get_mut(handle) {
                projectile.object.sphere.body.update_physics(dt);
            }
        }
    }

    /// Phase 3: the cube boundary. NPC ships bounce; the player takes hull
    /// damage while outside; bodies ignore it; projectiles are culled in
    /// phase 4.
    fn handle_boundary(&mut self, dt: f64) {
        let bounds = self.bounds;
        for &handle in &self.npc_ships {
            if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(handle) {
                reflect_into_bounds(&mut ship.object.sphere.body, bounds);
            }
        }
        if let Some(handle) = self.player {
            if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(handle) {
                if outside_bounds(ship.object.sphere.body.position, bounds) {
                    ship.object.inflict_damage(BOUNDARY_DAMAGE_RATE * dt);
                }
            }
        }
    }

    /// Phase 4: projectiles against NPC ships and the boundary. Each
    /// projectile is destroyed at most once per tick: the first matching
    /// ship wins, and boundary exit is checked first.
    fn collide_projectiles(&mut self) {
        let bounds = self.bounds;
        let mut i = 0;
        while i < self.projectiles.len() {
            let handle = self.projectiles[i];
            let Some(ArenaItem::Projectile(projectile)) = self.pool.get(handle) else {
                i += 1;
                continue;
            };
            let sphere = projectile.object.sphere;
            let damage = projectile.damage;

            if outside_bounds(sphere.body.position, bounds) {
                self.destroy_entity(handle);
                continue;
            }

            let mut hit = None;
            for &ship_handle in &self.npc_ships {
                if let Some(target) = self.entity_sphere(ship_handle) {
                    if sphere.collides_with(target) {
                        hit = Some(ship_handle);
                        break;
                    }
                }
            }
            if let Some(ship_handle) = hit {
                if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(ship_handle) {
                    ship.object.inflict_damage(damage);
                }
                self.destroy_entity(handle);
                continue;
            }
            i += 1;
        }
    }

    /// Phase 5: celestial bodies against everything else
    fn collide_celestials(&mut self) {
        // The player is battered, not destroyed
        if let Some(player_handle) = self.player {
            if let Some(player_sphere) = self.entity_sphere(player_handle).copied() {
                let mut damage = 0.0;
                for &body_handle in &self.bodies {
                    if let Some(body) = self.entity_sphere(body_handle) {
                        if player_sphere.collides_with(body) {
                            damage += CELESTIAL_IMPACT_DAMAGE;
                        }
                    }
                }
                if damage > 0.0 {
                    if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(player_handle) {
                        ship.object.inflict_damage(damage);
                    }
                }
            }
        }

        // Projectiles burn up on impact; anchor rounds attach their tether
        // first
        let mut i = 0;
        while i < self.projectiles.len() {
            let handle = self.projectiles[i];
            let Some(ArenaItem::Projectile(projectile)) = self.pool.get(handle) else {
                i += 1;
                continue;
            };
            let sphere = projectile.object.sphere;
            let kind = projectile.kind;
            let shooter = projectile.shooter;

            let mut hit = None;
            for &body_handle in &self.bodies {
                if let Some(body) = self.entity_sphere(body_handle) {
                    if sphere.collides_with(body) {
                        hit = Some(body_handle);
                        break;
                    }
                }
            }
            if let Some(body_handle) = hit {
                if kind == ProjectileKind::Anchor {
                    if let Some(shooter) = shooter.filter(|&s| self.pool.contains(s)) {
                        match self.add_constraint(shooter, body_handle, false) {
                            Ok(_) => info!("anchor tether attached"),
                            Err(e) => warn!("anchor tether failed: {e}"),
                        }
                    }
                }
                self.destroy_entity(handle);
                continue;
            }
            i += 1;
        }

        // NPC ships are crushed outright
        let mut i = 0;
        while i < self.npc_ships.len() {
            let handle = self.npc_ships[i];
            let Some(ship_sphere) = self.entity_sphere(handle).copied() else {
                i += 1;
                continue;
            };
            let crushed = self
                .bodies
                .iter()
                .any(|&b| self.entity_sphere(b).is_some_and(|s| ship_sphere.collides_with(s)));
            if crushed {
                info!("ship crushed by celestial body");
                self.destroy_entity(handle);
                continue;
            }
            i += 1;
        }

        // Body against body: the smaller one shatters. The scan restarts
        // from the beginning after every destruction - at most one
        // destructive collision is resolved per pass.
        'rescan: loop {
            for i in 0..self.bodies.len() {
                for j in (i + 1)..self.bodies.len() {
                    let (first, second) = (self.bodies[i], self.bodies[j]);
                    let (Some(a), Some(b)) =
                        (self.entity_sphere(first), self.entity_sphere(second))
                    else {
                        continue;
                    };
                    if a.collides_with(b) {
                        let loser = if a.radius < b.radius { first } else { second };
                        info!("celestial collision; smaller body shattered");
                        self.destroy_entity(loser);
                        continue 'rescan;
                    }
                }
            }
            break;
        }
    }

    /// Phase 6: remove NPC ships whose health is gone
    fn sweep_dead_ships(&mut self) {
        let mut i = 0;
        while i < self.npc_ships.len() {
            let handle = self.npc_ships[i];
            let dead = matches!(
                self.pool.get(handle),
                Some(ArenaItem::Ship(ship)) if ship.object.is_dead()
            );
            if dead {
                info!("ship destroyed");
                self.destroy_entity(handle);
            } else {
                i += 1;
            }
        }
    }

    /// Phase 7: the player never dies for good - health and motion reset at
    /// the safe point instead.
    fn respawn_player(&mut self) {
        let Some(handle) = self.player else { return };
        if let Some(ArenaItem::Ship(ship)) = self.pool.get_mut(handle) {
            if ship.object.is_dead() {
                ship.object.health = ship.object.max_health;
                ship.object.sphere.body.position = RESPAWN_POSITION;
                ship.object.sphere.body.velocity = DVec3::ZERO;
                info!("player respawned");
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn store_item(&mut self, item: ArenaItem) -> Result<Handle, ArenaError> {
        let size = item.slot_size();
        match self.pool.store(item) {
            Some(handle) => Ok(handle),
            None => {
                let page_size = self.pool.page_size();
                warn!("entity not spawned: {size} bytes does not fit a {page_size}-byte page");
                Err(ArenaError::EntityTooLarge { size, page_size })
            }
        }
    }

    fn entity_sphere(&self, handle: Handle) -> Option<&SphereBody> {
        self.pool.get(handle).and_then(ArenaItem::sphere)
    }

    fn entity_sphere_mut(&mut self, handle: Handle) -> Option<&mut SphereBody> {
        self.pool.get_mut(handle).and_then(ArenaItem::sphere_mut)
    }

    fn notify_created(&mut self, handle: Handle) {
        let Some(item) = self.pool.get(handle) else {
            return;
        };
        match item {
            ArenaItem::Constraint(constraint) => {
                for listener in self.listeners.iter_mut() {
                    listener.constraint_created(handle, constraint);
                }
            }
            other => {
                for listener in self.listeners.iter_mut() {
                    listener.object_created(handle, other);
                }
            }
        }
    }

    /// Cascading removal. Order matters: constraints referencing the entity
    /// go first, orphaned orbiters are re-parented, then the entity leaves
    /// its collection and the pool, and only then are listeners told - with
    /// the released value still readable.
    fn destroy_entity(&mut self, handle: Handle) {
        let mut i = 0;
        while i < self.constraints.len() {
            let constraint_handle = self.constraints[i];
            let references = matches!(
                self.pool.get(constraint_handle),
                Some(ArenaItem::Constraint(c)) if c.references(handle)
            );
            if references {
                self.destroy_entity(constraint_handle);
            } else {
                i += 1;
            }
        }

        if let Some(ArenaItem::Body(body)) = self.pool.get(handle) {
            let fallback_center = body.center;
            self.reparent_orbiters(handle, fallback_center);
        }

        self.remove_from_collections(handle);
        let Some(item) = self.pool.release(handle) else {
            panic!("arena collections held stale handle {handle:?}");
        };

        match &item {
            ArenaItem::Constraint(constraint) => {
                for listener in self.listeners.iter_mut() {
                    listener.constraint_destroyed(handle, constraint);
                }
            }
            other => {
                for listener in self.listeners.iter_mut() {
                    listener.object_destroyed(handle, other);
                }
            }
        }

        if let ArenaItem::Body(body) = &item {
            let position = body.object.sphere.body.position;
            let radius = body.object.sphere.radius;
            self.scatter_debris(position, radius);
        }
    }

    /// Re-home every body orbiting `dead` onto `new_center`, recreating the
    /// rigid constraint against the new anchor (or leaving the body free if
    /// there is none).
    fn reparent_orbiters(&mut self, dead: Handle, new_center: Option<Handle>) {
        let children: Vec<Handle> = self
            .bodies
            .iter()
            .copied()
            .filter(|&b| {
                b != dead
                    && matches!(
                        self.pool.get(b),
                        Some(ArenaItem::Body(body)) if body.center == Some(dead)
                    )
            })
            .collect();

        for child in children {
            if let Some(ArenaItem::Body(body)) = self.pool.get_mut(child) {
                body.center = new_center;
            }
            if let Some(center) = new_center {
                if let Err(e) = self.add_constraint(child, center, true) {
                    warn!("re-parented orbit lost its constraint: {e}");
                }
            }
        }
    }

    fn remove_from_collections(&mut self, handle: Handle) {
        if self.player == Some(handle) {
            self.player = None;
        }
        for list in [
            &mut self.npc_ships,
            &mut self.projectiles,
            &mut self.bodies,
            &mut self.constraints,
        ] {
            if let Some(position) = list.iter().position(|&h| h == handle) {
                list.remove(position);
            }
        }
    }

    /// Scatter debris projectiles through a shattered body's former volume
    fn scatter_debris(&mut self, center: DVec3, radius: f64) {
        for _ in 0..DEBRIS_COUNT {
            let direction = random_unit_vector(&mut self.rng);
            let position = center + direction * self.rng.random_range(0.0..=radius);
            let speed = self.rng.random_range(DEBRIS_SPEED_MIN..=DEBRIS_SPEED_MAX);
            let debris = Projectile::debris(position, direction * speed);
            match self.store_item(ArenaItem::Projectile(debris)) {
                Ok(handle) => {
                    self.projectiles.push(handle);
                    self.notify_created(handle);
                }
                Err(e) => warn!("debris fragment dropped: {e}"),
            }
        }
    }
}

fn outside_bounds(position: DVec3, bounds: f64) -> bool {
    position.x.abs() > bounds || position.y.abs() > bounds || position.z.abs() > bounds
}

/// Clamp a body back inside the cube, reflecting the velocity component
/// along every axis it crossed.
fn reflect_into_bounds(body: &mut SpatialBody, bounds: f64) {
    for axis in 0..3 {
        if body.position[axis] > bounds {
            body.position[axis] = bounds;
            body.velocity[axis] = -body.velocity[axis].abs();
        } else if body.position[axis] < -bounds {
            body.position[axis] = -bounds;
            body.velocity[axis] = body.velocity[axis].abs();
        }
    }
}
