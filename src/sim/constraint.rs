//! Two-body distance constraints: soft tethers and rigid orbits
//!
//! A constraint is directed: it only ever corrects the origin body, using
//! the target as the reference frame. Rest distance and orbital speed are
//! sampled once at creation, so a body spawned on a valid orbit keeps
//! exactly that orbit. Constraints reference bodies by pool handle and own
//! neither; the arena manages their lifetime.

use glam::DVec3;

use crate::pool::Handle;
use crate::sim::body::SpatialBody;

/// A distance relationship between two bodies.
///
/// Non-rigid constraints behave like a rope: slack inside the rest
/// distance, taut beyond it. Rigid constraints pin the origin to an exact
/// circular orbit by correcting position and speed every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    /// The body this constraint corrects
    pub origin: Handle,
    /// The body it is anchored to
    pub target: Handle,
    /// Separation sampled at creation
    pub rest_distance: f64,
    /// Relative speed sampled at creation; rigid mode preserves it exactly
    pub rigid_speed: f64,
    pub rigid: bool,
}

impl Constraint {
    /// Build a constraint between two live bodies, sampling the current
    /// separation and relative speed as the rest state.
    pub fn new(
        origin: Handle,
        target: Handle,
        origin_body: &SpatialBody,
        target_body: &SpatialBody,
        rigid: bool,
    ) -> Self {
        Self {
            origin,
            target,
            rest_distance: origin_body.position.distance(target_body.position),
            rigid_speed: (origin_body.velocity - target_body.velocity).length(),
            rigid,
        }
    }

    /// Whether either endpoint is `id`
    #[inline]
    pub fn references(&self, id: Handle) -> bool {
        self.origin == id || self.target == id
    }

    /// Apply this tick's correction to the origin body.
    ///
    /// A zero `dt` is a no-op: the corrective force is sized to reach the
    /// desired velocity within one tick, which divides by `dt`.
    pub fn apply(&self, origin: &mut SpatialBody, target: &SpatialBody, dt: f64) {
        if dt == 0.0 {
            return;
        }
        let offset = origin.position - target.position;
        let distance = offset.length();
        let Some(direction) = offset.try_normalize() else {
            // Coincident bodies have no separation direction to correct along
            return;
        };

        if self.rigid {
            // Hard positional correction keeps the orbit circular instead of
            // letting spring error accumulate.
            origin.position = target.position + direction * self.rest_distance;
            let relative = origin.velocity - target.velocity;
            let tangential = relative - direction * relative.dot(direction);
            let desired = target.velocity + tangential.normalize_or_zero() * self.rigid_speed;
            let force = (desired - origin.velocity) * origin.mass() / dt;
            origin.apply_transient_force(force);
        } else {
            // Rope behavior: only intervene once the leash is taut
            if distance <= self.rest_distance {
                return;
            }
            let relative = origin.velocity - target.velocity;
            let tangential = relative - direction * relative.dot(direction);
            let desired = target.velocity + tangential;
            let force = (desired - origin.velocity) * origin.mass() / dt;
            origin.apply_transient_force(force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(n: u32) -> Handle {
        Handle {
            page: 0,
            offset: n,
            generation: n,
        }
    }

    fn orbit_pair(distance: f64, speed: f64) -> (SpatialBody, SpatialBody) {
        let target = SpatialBody::new(1000.0, DVec3::ZERO);
        let mut origin = SpatialBody::new(1.0, DVec3::new(distance, 0.0, 0.0));
        origin.velocity = DVec3::new(0.0, 0.0, speed);
        (origin, target)
    }

    #[test]
    fn test_rigid_restores_rest_distance() {
        let (mut origin, target) = orbit_pair(100.0, 10.0);
        let constraint = Constraint::new(handle(1), handle(2), &origin, &target, true);

        // Knock the origin well off its orbit
        origin.position = DVec3::new(250.0, 40.0, -3.0);
        constraint.apply(&mut origin, &target, 0.016);
        let distance = origin.position.distance(target.position);
        assert!((distance - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rigid_preserves_orbital_speed() {
        let (mut origin, target) = orbit_pair(100.0, 10.0);
        let constraint = Constraint::new(handle(1), handle(2), &origin, &target, true);

        // Radial drift plus a slowed tangential component
        origin.velocity = DVec3::new(5.0, 0.0, 3.0);
        let dt = 0.016;
        constraint.apply(&mut origin, &target, dt);
        origin.update_physics(dt);
        let relative_speed = (origin.velocity - target.velocity).length();
        assert!((relative_speed - 10.0).abs() < 1e-9);
        // The radial (x) component is gone; all speed is tangential
        assert!(origin.velocity.x.abs() < 1e-9);
        assert!((origin.velocity.z - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_soft_constraint_slack_inside_rest() {
        let (mut origin, target) = orbit_pair(100.0, 10.0);
        let constraint = Constraint::new(handle(1), handle(2), &origin, &target, false);

        origin.position = DVec3::new(50.0, 0.0, 0.0);
        constraint.apply(&mut origin, &target, 0.016);
        assert_eq!(origin.transient_force(), DVec3::ZERO);
    }

    #[test]
    fn test_soft_constraint_cancels_radial_velocity_when_taut() {
        let (mut origin, target) = orbit_pair(100.0, 0.0);
        let constraint = Constraint::new(handle(1), handle(2), &origin, &target, false);

        // Beyond the leash and still moving away
        origin.position = DVec3::new(150.0, 0.0, 0.0);
        origin.velocity = DVec3::new(7.0, 0.0, 4.0);
        let dt = 0.016;
        constraint.apply(&mut origin, &target, dt);
        origin.update_physics(dt);
        // Outward (x) motion removed, tangential (z) motion kept
        assert!(origin.velocity.x.abs() < 1e-9);
        assert!((origin.velocity.z - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        let (mut origin, target) = orbit_pair(100.0, 10.0);
        let constraint = Constraint::new(handle(1), handle(2), &origin, &target, true);
        origin.position = DVec3::new(300.0, 0.0, 0.0);
        let before = origin;
        constraint.apply(&mut origin, &target, 0.0);
        assert_eq!(origin, before);
    }

    #[test]
    fn test_references_either_endpoint() {
        let (origin, target) = orbit_pair(100.0, 10.0);
        let constraint = Constraint::new(handle(1), handle(2), &origin, &target, true);
        assert!(constraint.references(handle(1)));
        assert!(constraint.references(handle(2)));
        assert!(!constraint.references(handle(3)));
    }
}
