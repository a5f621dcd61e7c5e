//! Astral Arena - simulation core for a multi-body space-combat game
//!
//! Core modules:
//! - `pool`: paged, first-fit memory pool backing all entity storage
//! - `sim`: deterministic simulation (physics, constraints, collisions, lifecycle)
//! - `events`: entity lifecycle notifications for the presentation layer
//! - `config`: data-driven arena configuration
//!
//! The crate is a library with no process boundary of its own: a render/input
//! layer owns a [`sim::GameArena`], drives it with `update_physics(dt)` once
//! per frame, and mirrors entity lifecycle through [`events::GameArenaListener`].

pub mod config;
pub mod events;
pub mod pool;
pub mod sim;

pub use config::ArenaConfig;
pub use events::GameArenaListener;
pub use pool::{Handle, PagedPool, SlotSize};
pub use sim::{ArenaError, ArenaItem, GameArena};

use glam::DVec3;
use rand::Rng;

/// Simulation constants
pub mod consts {
    use glam::DVec3;

    /// Half-extent of the cubic play volume
    pub const ARENA_BOUNDS: f64 = 4000.0;

    /// Memory pool page size in bytes
    pub const PAGE_SIZE: u32 = 4096;
    /// Pages batch-allocated up front
    pub const INITIAL_PAGES: u32 = 4;

    /// Ship defaults
    pub const SHIP_MASS: f64 = 10.0;
    pub const SHIP_RADIUS: f64 = 50.0;
    pub const SHIP_MAX_HEALTH: f64 = 100.0;
    pub const SHIP_MAX_ENERGY: f64 = 100.0;
    /// Energy regained per second
    pub const SHIP_ENERGY_RECHARGE: f64 = 5.0;

    /// Plasma cannon tuning
    pub const PLASMA_SPEED: f64 = 900.0;
    pub const PLASMA_DAMAGE: f64 = 35.0;
    pub const PLASMA_RADIUS: f64 = 10.0;
    pub const PLASMA_MASS: f64 = 1.0;
    pub const PLASMA_RELOAD: f64 = 0.25;
    pub const PLASMA_ENERGY_COST: f64 = 10.0;

    /// Anchor launcher tuning
    pub const ANCHOR_SPEED: f64 = 600.0;
    pub const ANCHOR_RADIUS: f64 = 12.0;
    pub const ANCHOR_MASS: f64 = 2.0;
    pub const ANCHOR_RELOAD: f64 = 1.5;
    pub const ANCHOR_ENERGY_COST: f64 = 25.0;

    /// Health lost per second while the player is outside the boundary
    pub const BOUNDARY_DAMAGE_RATE: f64 = 20.0;
    /// Flat damage per tick while a celestial body overlaps the player
    pub const CELESTIAL_IMPACT_DAMAGE: f64 = 40.0;

    /// Debris scattered when a celestial body is destroyed
    pub const DEBRIS_COUNT: u32 = 8;
    pub const DEBRIS_SPEED_MIN: f64 = 50.0;
    pub const DEBRIS_SPEED_MAX: f64 = 250.0;
    pub const DEBRIS_DAMAGE: f64 = 5.0;
    pub const DEBRIS_RADIUS: f64 = 8.0;
    pub const DEBRIS_MASS: f64 = 0.5;

    /// Where the player reappears after a respawn
    pub const RESPAWN_POSITION: DVec3 = DVec3::new(0.0, 0.0, 3000.0);

    /// Half-height (radians of elevation) of the orbital spawn band
    pub const ORBIT_BAND: f64 = 0.35;

    /// Solar system generation
    pub const STAR_RADIUS: f64 = 400.0;
    pub const STAR_MASS: f64 = 1.0e6;
    pub const PLANET_COUNT_MIN: u32 = 3;
    pub const PLANET_COUNT_MAX: u32 = 6;
    pub const PLANET_RADIUS_MIN: f64 = 75.0;
    pub const PLANET_RADIUS_MAX: f64 = 150.0;
    pub const PLANET_MASS: f64 = 1.0e4;
    pub const PLANET_DISTANCE_MIN: f64 = 600.0;
    pub const PLANET_DISTANCE_MAX: f64 = 2800.0;
    pub const PLANET_SPEED_MIN: f64 = 40.0;
    pub const PLANET_SPEED_MAX: f64 = 120.0;
    pub const MOONS_MAX: u32 = 2;
    pub const MOON_RADIUS_MIN: f64 = 25.0;
    pub const MOON_RADIUS_MAX: f64 = 55.0;
    pub const MOON_MASS: f64 = 1.0e2;
    pub const MOON_DISTANCE_MIN: f64 = 120.0;
    pub const MOON_DISTANCE_MAX: f64 = 400.0;
    pub const MOON_SPEED_MIN: f64 = 30.0;
    pub const MOON_SPEED_MAX: f64 = 80.0;
}

/// Uniformly random direction on the unit sphere
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> DVec3 {
    let z: f64 = rng.random_range(-1.0..=1.0);
    let theta: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    let r = (1.0 - z * z).sqrt();
    DVec3::new(r * theta.cos(), z, r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_unit_vector_is_unit_length() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-12);
        }
    }
}
