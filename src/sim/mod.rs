//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Single-threaded, one tick runs to completion
//! - Seeded RNG only, owned by the arena
//! - No rendering or platform dependencies
//!
//! Layering, leaf first: `body` (physics state and integration),
//! `constraint` (orbit/rigid solver), `entity` (the game-object sum type),
//! `arena` (ownership, tick orchestration, lifecycle).

pub mod arena;
pub mod body;
pub mod constraint;
pub mod entity;

pub use arena::{ArenaError, GameArena};
pub use body::{SphereBody, SpatialBody};
pub use constraint::Constraint;
pub use entity::{
    ArenaItem, BodyKind, CelestialBody, GameObject, Projectile, ProjectileKind, Shot, SpaceShip,
    Weapon, WeaponKind, orbital_state,
};
