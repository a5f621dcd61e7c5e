//! Game entities: ships, projectiles, celestial bodies
//!
//! The shared health/energy core lives in [`GameObject`]; kind-specific data
//! hangs off the [`ArenaItem`] sum type the memory pool stores. Energy
//! doubles as a shield: damage drains it before touching health.

use glam::DVec3;
use rand::Rng;

use crate::consts::*;
use crate::pool::{Handle, SlotSize};
use crate::sim::body::SphereBody;
use crate::sim::constraint::Constraint;

/// Health, shield energy and the collision sphere shared by every entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameObject {
    pub sphere: SphereBody,
    pub max_health: f64,
    pub health: f64,
    pub max_energy: f64,
    pub energy: f64,
    /// Energy regained per second
    pub energy_recharge: f64,
}

impl GameObject {
    /// New object at full health and energy
    pub fn new(sphere: SphereBody, max_health: f64, max_energy: f64, energy_recharge: f64) -> Self {
        Self {
            sphere,
            max_health,
            health: max_health,
            max_energy,
            energy: max_energy,
            energy_recharge,
        }
    }

    /// Apply `amount` damage: energy absorbs what it can, only the excess
    /// reaches health. Both stay clamped at zero, in one atomic step.
    pub fn inflict_damage(&mut self, amount: f64) {
        let absorbed = amount.min(self.energy);
        self.energy -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
    }

    /// Regain shield energy, clamped at the maximum
    pub fn recharge(&mut self, dt: f64) {
        self.energy = (self.energy + self.energy_recharge * dt).min(self.max_energy);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Ship armament kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponKind {
    PlasmaCannon,
    AnchorLauncher,
}

impl WeaponKind {
    pub fn reload_time(&self) -> f64 {
        match self {
            WeaponKind::PlasmaCannon => PLASMA_RELOAD,
            WeaponKind::AnchorLauncher => ANCHOR_RELOAD,
        }
    }

    pub fn energy_cost(&self) -> f64 {
        match self {
            WeaponKind::PlasmaCannon => PLASMA_ENERGY_COST,
            WeaponKind::AnchorLauncher => ANCHOR_ENERGY_COST,
        }
    }

    pub fn muzzle_speed(&self) -> f64 {
        match self {
            WeaponKind::PlasmaCannon => PLASMA_SPEED,
            WeaponKind::AnchorLauncher => ANCHOR_SPEED,
        }
    }

    pub fn projectile_radius(&self) -> f64 {
        match self {
            WeaponKind::PlasmaCannon => PLASMA_RADIUS,
            WeaponKind::AnchorLauncher => ANCHOR_RADIUS,
        }
    }

    pub fn projectile_mass(&self) -> f64 {
        match self {
            WeaponKind::PlasmaCannon => PLASMA_MASS,
            WeaponKind::AnchorLauncher => ANCHOR_MASS,
        }
    }

    pub fn damage(&self) -> f64 {
        match self {
            WeaponKind::PlasmaCannon => PLASMA_DAMAGE,
            // Anchor rounds tether instead of hurting
            WeaponKind::AnchorLauncher => 0.0,
        }
    }

    fn projectile_kind(&self) -> ProjectileKind {
        match self {
            WeaponKind::PlasmaCannon => ProjectileKind::Plasma,
            WeaponKind::AnchorLauncher => ProjectileKind::Anchor,
        }
    }
}

/// A mounted weapon: Loaded -> (fire) -> Cooling -> (cooldown elapsed) -> Loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub reload_time: f64,
    /// Seconds elapsed since the last shot
    pub cooldown: f64,
    pub ready: bool,
    pub energy_cost: f64,
}

impl Weapon {
    /// New weapon, loaded and ready
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            reload_time: kind.reload_time(),
            cooldown: kind.reload_time(),
            ready: true,
            energy_cost: kind.energy_cost(),
        }
    }

    /// Advance the reload cooldown
    pub fn update(&mut self, dt: f64) {
        if !self.ready {
            self.cooldown += dt;
            if self.cooldown >= self.reload_time {
                self.ready = true;
            }
        }
    }
}

/// Everything the arena needs to spawn the projectile for one shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub kind: ProjectileKind,
    pub position: DVec3,
    pub velocity: DVec3,
    pub radius: f64,
    pub mass: f64,
    pub damage: f64,
}

/// A ship: shared core plus its weapon rack
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceShip {
    pub object: GameObject,
    pub weapons: Vec<Weapon>,
}

impl SpaceShip {
    /// Ship with the standard loadout: plasma cannon and anchor launcher
    pub fn new(mass: f64, radius: f64, position: DVec3) -> Self {
        Self {
            object: GameObject::new(
                SphereBody::new(mass, radius, position),
                SHIP_MAX_HEALTH,
                SHIP_MAX_ENERGY,
                SHIP_ENERGY_RECHARGE,
            ),
            weapons: vec![
                Weapon::new(WeaponKind::PlasmaCannon),
                Weapon::new(WeaponKind::AnchorLauncher),
            ],
        }
    }

    /// Advance weapons, recharge the shield, integrate motion
    pub fn update(&mut self, dt: f64) {
        for weapon in &mut self.weapons {
            weapon.update(dt);
        }
        self.object.recharge(dt);
        self.object.sphere.body.update_physics(dt);
    }

    /// Attempt to fire the weapon at `index`.
    ///
    /// Two independent gates: the weapon must have finished reloading and
    /// the ship must hold enough energy. A failed gate is a silent no-op
    /// (`None`). A successful shot resets the cooldown and drains energy in
    /// the same step, and describes the projectile to spawn.
    pub fn fire_weapon(&mut self, index: usize) -> Option<Shot> {
        let energy = self.object.energy;
        let weapon = self.weapons.get_mut(index)?;
        if !weapon.ready || energy < weapon.energy_cost {
            return None;
        }
        weapon.ready = false;
        weapon.cooldown = 0.0;
        self.object.energy -= weapon.energy_cost;

        let body = &self.object.sphere.body;
        let heading = body.heading();
        let muzzle_offset = self.object.sphere.radius + weapon.kind.projectile_radius() + 2.0;
        Some(Shot {
            kind: weapon.kind.projectile_kind(),
            position: body.position + heading * muzzle_offset,
            velocity: body.velocity + heading * weapon.kind.muzzle_speed(),
            radius: weapon.kind.projectile_radius(),
            mass: weapon.kind.projectile_mass(),
            damage: weapon.kind.damage(),
        })
    }
}

/// Projectile payload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    /// Plain damage-on-contact round (also used for debris)
    Plasma,
    /// Tether round: attaches a rope constraint to the body it strikes
    Anchor,
}

/// A fired round in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub object: GameObject,
    pub kind: ProjectileKind,
    pub damage: f64,
    /// Ship that fired it, if any (debris has no shooter)
    pub shooter: Option<Handle>,
}

impl Projectile {
    pub fn new(
        kind: ProjectileKind,
        sphere: SphereBody,
        damage: f64,
        shooter: Option<Handle>,
    ) -> Self {
        Self {
            object: GameObject::new(sphere, 1.0, 0.0, 0.0),
            kind,
            damage,
            shooter,
        }
    }

    /// Materialize the projectile a ship's shot describes
    pub fn from_shot(shot: &Shot, shooter: Handle) -> Self {
        let mut sphere = SphereBody::new(shot.mass, shot.radius, shot.position);
        sphere.body.velocity = shot.velocity;
        Self::new(shot.kind, sphere, shot.damage, Some(shooter))
    }

    /// A debris fragment from a shattered celestial body
    pub fn debris(position: DVec3, velocity: DVec3) -> Self {
        let mut sphere = SphereBody::new(DEBRIS_MASS, DEBRIS_RADIUS, position);
        sphere.body.velocity = velocity;
        Self::new(ProjectileKind::Plasma, sphere, DEBRIS_DAMAGE, None)
    }
}

/// Celestial body kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
}

/// A star, planet or moon. Bodies with a `center` orbit it under a rigid
/// constraint the arena co-creates and co-destroys with them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialBody {
    pub object: GameObject,
    pub kind: BodyKind,
    pub center: Option<Handle>,
}

impl CelestialBody {
    /// A free body at rest with no orbital center
    pub fn fixed(kind: BodyKind, mass: f64, radius: f64, position: DVec3) -> Self {
        Self {
            object: GameObject::new(SphereBody::new(mass, radius, position), 1.0, 0.0, 0.0),
            kind,
            center: None,
        }
    }
}

/// Sample an orbital starting state around `center`.
///
/// Picks a uniformly random direction on a thin band about the equator
/// (avoids clustering every orbit in the exact equatorial plane), places the
/// body at `distance` plus both radii, and points it along the tangent
/// (radial direction crossed with world up, random sign) at `speed` - so the
/// state already satisfies the rigid-orbit invariant before any constraint
/// is attached.
pub fn orbital_state<R: Rng>(
    rng: &mut R,
    center: &SphereBody,
    own_radius: f64,
    distance: f64,
    speed: f64,
) -> (DVec3, DVec3) {
    let azimuth = rng.random_range(0.0..std::f64::consts::TAU);
    let elevation = rng.random_range(-ORBIT_BAND..=ORBIT_BAND);
    let direction = DVec3::new(
        elevation.cos() * azimuth.cos(),
        elevation.sin(),
        elevation.cos() * azimuth.sin(),
    );

    let orbit_radius = distance + own_radius + center.radius;
    let position = center.body.position + direction * orbit_radius;

    let mut tangent = direction.cross(DVec3::Y).normalize();
    if rng.random::<bool>() {
        tangent = -tangent;
    }
    let velocity = center.body.velocity + tangent * speed;
    (position, velocity)
}

/// The one fixed entity type the memory pool holds
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaItem {
    Ship(SpaceShip),
    Projectile(Projectile),
    Body(CelestialBody),
    Constraint(Constraint),
}

impl ArenaItem {
    /// Collision sphere, for everything that has one
    pub fn sphere(&self) -> Option<&SphereBody> {
        match self {
            ArenaItem::Ship(s) => Some(&s.object.sphere),
            ArenaItem::Projectile(p) => Some(&p.object.sphere),
            ArenaItem::Body(b) => Some(&b.object.sphere),
            ArenaItem::Constraint(_) => None,
        }
    }

    pub fn sphere_mut(&mut self) -> Option<&mut SphereBody> {
        match self {
            ArenaItem::Ship(s) => Some(&mut s.object.sphere),
            ArenaItem::Projectile(p) => Some(&mut p.object.sphere),
            ArenaItem::Body(b) => Some(&mut b.object.sphere),
            ArenaItem::Constraint(_) => None,
        }
    }

    pub fn game_object(&self) -> Option<&GameObject> {
        match self {
            ArenaItem::Ship(s) => Some(&s.object),
            ArenaItem::Projectile(p) => Some(&p.object),
            ArenaItem::Body(b) => Some(&b.object),
            ArenaItem::Constraint(_) => None,
        }
    }

    pub fn as_ship(&self) -> Option<&SpaceShip> {
        match self {
            ArenaItem::Ship(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_body(&self) -> Option<&CelestialBody> {
        match self {
            ArenaItem::Body(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_constraint(&self) -> Option<&Constraint> {
        match self {
            ArenaItem::Constraint(c) => Some(c),
            _ => None,
        }
    }
}

impl SlotSize for ArenaItem {
    /// Pool bytes charged per entity: the payload's size, so mixed kinds
    /// pack heterogeneously.
    fn slot_size(&self) -> u32 {
        (match self {
            ArenaItem::Ship(_) => size_of::<SpaceShip>(),
            ArenaItem::Projectile(_) => size_of::<Projectile>(),
            ArenaItem::Body(_) => size_of::<CelestialBody>(),
            ArenaItem::Constraint(_) => size_of::<Constraint>(),
        }) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn test_ship() -> SpaceShip {
        SpaceShip::new(SHIP_MASS, SHIP_RADIUS, DVec3::ZERO)
    }

    #[test]
    fn test_damage_absorbed_by_energy() {
        let mut object = test_ship().object;
        object.inflict_damage(35.0);
        assert_eq!(object.energy, 65.0);
        assert_eq!(object.health, 100.0);
    }

    #[test]
    fn test_damage_excess_reaches_health() {
        let mut object = test_ship().object;
        object.energy = 20.0;
        object.inflict_damage(50.0);
        assert_eq!(object.energy, 0.0);
        assert_eq!(object.health, 70.0);
    }

    #[test]
    fn test_damage_never_goes_negative() {
        let mut object = test_ship().object;
        object.energy = 0.0;
        object.inflict_damage(1000.0);
        assert_eq!(object.energy, 0.0);
        assert_eq!(object.health, 0.0);
        assert!(object.is_dead());
    }

    #[test]
    fn test_recharge_clamps_at_max() {
        let mut object = test_ship().object;
        object.energy = 99.0;
        object.recharge(10.0);
        assert_eq!(object.energy, 100.0);
    }

    #[test]
    fn test_fire_drains_energy_and_starts_cooldown() {
        let mut ship = test_ship();
        let shot = ship.fire_weapon(0).expect("loaded weapon should fire");
        assert_eq!(shot.kind, ProjectileKind::Plasma);
        assert_eq!(shot.damage, PLASMA_DAMAGE);
        assert_eq!(ship.object.energy, SHIP_MAX_ENERGY - PLASMA_ENERGY_COST);
        assert!(!ship.weapons[0].ready);

        // Still cooling: the second attempt is a silent no-op
        assert!(ship.fire_weapon(0).is_none());
        assert_eq!(ship.object.energy, SHIP_MAX_ENERGY - PLASMA_ENERGY_COST);

        // After the reload time it fires again
        ship.update(PLASMA_RELOAD);
        assert!(ship.weapons[0].ready);
        assert!(ship.fire_weapon(0).is_some());
    }

    #[test]
    fn test_fire_gated_on_energy() {
        let mut ship = test_ship();
        ship.object.energy = PLASMA_ENERGY_COST - 1.0;
        assert!(ship.fire_weapon(0).is_none());
        // Energy untouched by the failed attempt, weapon still loaded
        assert_eq!(ship.object.energy, PLASMA_ENERGY_COST - 1.0);
        assert!(ship.weapons[0].ready);
    }

    #[test]
    fn test_fire_unknown_slot_is_a_no_op() {
        let mut ship = test_ship();
        assert!(ship.fire_weapon(99).is_none());
    }

    #[test]
    fn test_shot_leaves_from_the_muzzle() {
        let mut ship = test_ship();
        let shot = ship.fire_weapon(0).unwrap();
        // Default heading is -Z
        let expected_offset = SHIP_RADIUS + PLASMA_RADIUS + 2.0;
        assert!((shot.position.z + expected_offset).abs() < 1e-9);
        assert!((shot.velocity.z + PLASMA_SPEED).abs() < 1e-9);
    }

    #[test]
    fn test_orbital_state_distance_and_tangency() {
        let mut rng = Pcg32::seed_from_u64(11);
        let center = SphereBody::new(STAR_MASS, 400.0, DVec3::new(10.0, -5.0, 3.0));
        for _ in 0..50 {
            let (position, velocity) = orbital_state(&mut rng, &center, 75.0, 600.0, 90.0);
            let offset = position - center.body.position;
            assert!((offset.length() - 1075.0).abs() < 1e-9);
            // Velocity is tangential: no radial component, full speed
            let relative = velocity - center.body.velocity;
            assert!(relative.dot(offset.normalize()).abs() < 1e-9);
            assert!((relative.length() - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_slot_sizes_track_variant_payloads() {
        let ship = ArenaItem::Ship(test_ship());
        let projectile = ArenaItem::Projectile(Projectile::debris(DVec3::ZERO, DVec3::ZERO));
        assert_eq!(ship.slot_size() as usize, size_of::<SpaceShip>());
        assert_eq!(projectile.slot_size() as usize, size_of::<Projectile>());
        assert!(ship.slot_size() > 0);
    }
}
