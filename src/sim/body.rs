//! Physics bodies: force integration and quaternion orientation
//!
//! A [`SpatialBody`] carries two force accumulators: persistent forces stay
//! applied until explicitly cleared (engines, gravity wells), transient
//! forces are consumed by the next `update_physics` call (impulses,
//! constraint corrections). Orientation is a unit quaternion, renormalized
//! after every mutation so drift never accumulates between checks.

use glam::{DQuat, DVec3};

/// Forward axis of an unrotated body
pub const FORWARD: DVec3 = DVec3::new(0.0, 0.0, -1.0);
/// Up axis of an unrotated body
pub const UP: DVec3 = DVec3::new(0.0, 1.0, 0.0);

/// A point mass with position, orientation and two force accumulators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialBody {
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    orientation: DQuat,
    force: DVec3,
    transient_force: DVec3,
    mass: f64,
}

impl SpatialBody {
    /// Create a body at rest. `mass` must be positive: integration divides
    /// by it.
    pub fn new(mass: f64, position: DVec3) -> Self {
        assert!(mass > 0.0, "body mass must be positive, got {mass}");
        Self {
            position,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            force: DVec3::ZERO,
            transient_force: DVec3::ZERO,
            mass,
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn orientation(&self) -> DQuat {
        self.orientation
    }

    /// Unit vector the body is pointing along
    pub fn heading(&self) -> DVec3 {
        self.orientation * FORWARD
    }

    /// Unit vector out of the body's top
    pub fn normal(&self) -> DVec3 {
        self.orientation * UP
    }

    /// Replace the orientation, renormalizing against floating-point drift
    pub fn set_orientation(&mut self, orientation: DQuat) {
        self.orientation = orientation.normalize();
    }

    /// Rotate about the body-local up axis (positive yaws right)
    pub fn yaw(&mut self, radians: f64) {
        self.set_orientation(self.orientation * DQuat::from_rotation_y(radians));
    }

    /// Rotate about the body-local side axis (positive pitches forward)
    pub fn pitch(&mut self, radians: f64) {
        self.set_orientation(self.orientation * DQuat::from_rotation_x(radians));
    }

    /// Rotate about the body-local forward axis
    pub fn roll(&mut self, radians: f64) {
        self.set_orientation(self.orientation * DQuat::from_rotation_z(radians));
    }

    /// Sum of persistent forces on the body
    pub fn force(&self) -> DVec3 {
        self.force
    }

    /// Sum of forces that will be cleared by the next physics update
    pub fn transient_force(&self) -> DVec3 {
        self.transient_force
    }

    /// Add a force that persists across ticks until cleared
    pub fn apply_force(&mut self, force: DVec3) {
        self.force += force;
    }

    /// Add a force consumed by the next physics update
    pub fn apply_transient_force(&mut self, force: DVec3) {
        self.transient_force += force;
    }

    /// Cancel all persistent force on the body
    pub fn clear_forces(&mut self) {
        self.force = DVec3::ZERO;
    }

    /// Advance velocity and position by `dt` seconds, then consume the
    /// transient accumulator.
    pub fn update_physics(&mut self, dt: f64) {
        self.acceleration = (self.force + self.transient_force) / self.mass;
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.transient_force = DVec3::ZERO;
    }
}

/// A [`SpatialBody`] with a bounding sphere for collision tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereBody {
    pub body: SpatialBody,
    pub radius: f64,
}

impl SphereBody {
    pub fn new(mass: f64, radius: f64, position: DVec3) -> Self {
        Self {
            body: SpatialBody::new(mass, position),
            radius,
        }
    }

    /// Sphere-sphere intersection. Squared distances keep the test cheap
    /// and exact at the boundary.
    #[inline]
    pub fn collides_with(&self, other: &SphereBody) -> bool {
        let reach = self.radius + other.radius;
        self.body.position.distance_squared(other.body.position) <= reach * reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_force_integration() {
        // v after n ticks of constant F is (F/m) * n * dt
        let mut body = SpatialBody::new(4.0, DVec3::ZERO);
        body.apply_force(DVec3::new(8.0, 0.0, 0.0));
        let dt = 0.01;
        for _ in 0..100 {
            body.update_physics(dt);
        }
        assert!((body.velocity.x - 2.0).abs() < 1e-9);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_transient_force_cleared_each_tick() {
        let mut body = SpatialBody::new(2.0, DVec3::ZERO);
        body.apply_transient_force(DVec3::new(4.0, 0.0, 0.0));
        body.update_physics(1.0);
        assert!((body.velocity.x - 2.0).abs() < 1e-12);
        assert_eq!(body.transient_force(), DVec3::ZERO);
        // Second tick adds nothing
        body.update_physics(1.0);
        assert!((body.velocity.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_persistent_force_keeps_accelerating() {
        let mut body = SpatialBody::new(1.0, DVec3::ZERO);
        body.apply_force(DVec3::new(1.0, 0.0, 0.0));
        body.update_physics(1.0);
        body.update_physics(1.0);
        assert!((body.velocity.x - 2.0).abs() < 1e-12);
        body.clear_forces();
        body.update_physics(1.0);
        assert!((body.velocity.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_stays_normalized() {
        let mut body = SpatialBody::new(1.0, DVec3::ZERO);
        for i in 0..1000 {
            match i % 3 {
                0 => body.yaw(0.37),
                1 => body.pitch(-1.13),
                _ => body.roll(2.71),
            }
            assert!((body.orientation().length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_yaw_turns_heading() {
        let mut body = SpatialBody::new(1.0, DVec3::ZERO);
        assert!(body.heading().abs_diff_eq(FORWARD, 1e-12));
        body.yaw(std::f64::consts::FRAC_PI_2);
        assert!(body.heading().abs_diff_eq(DVec3::new(-1.0, 0.0, 0.0), 1e-9));
        // Up axis is unchanged by yaw
        assert!(body.normal().abs_diff_eq(UP, 1e-9));
    }

    #[test]
    #[should_panic(expected = "mass must be positive")]
    fn test_zero_mass_rejected() {
        let _ = SpatialBody::new(0.0, DVec3::ZERO);
    }

    #[test]
    fn test_sphere_collision_boundary() {
        // r=75 and r=150 at 200 apart collide (200^2 <= 225^2); at 300 they
        // do not.
        let a = SphereBody::new(1.0, 75.0, DVec3::ZERO);
        let b = SphereBody::new(1.0, 150.0, DVec3::new(200.0, 0.0, 0.0));
        assert!(a.collides_with(&b));
        let c = SphereBody::new(1.0, 150.0, DVec3::new(300.0, 0.0, 0.0));
        assert!(!a.collides_with(&c));
        // Exact touch counts as a hit
        let d = SphereBody::new(1.0, 150.0, DVec3::new(225.0, 0.0, 0.0));
        assert!(a.collides_with(&d));
    }
}
