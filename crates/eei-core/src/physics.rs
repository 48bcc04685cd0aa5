//! Physics-lite point mass.
//!
//! Inputs are in SI units (meters, kilograms, newtons); position and
//! velocity are stored in pixels so they can be drawn directly. Integration
//! is explicit Euler, one step per frame.

use bevy::math::Vec2;

/// Global scale: 1 m = 100 px.
pub const PIXELS_PER_METER: f32 = 100.0;

/// Lower bound applied to every mass.
pub const MIN_MASS: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct MassBody {
    /// Position in pixels.
    pub position: Vec2,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
    mass: f32,
    /// Accumulated force in N scaled by `PIXELS_PER_METER`.
    force: Vec2,
}

impl MassBody {
    /// `velocity` is given in m/s.
    pub fn new(position: Vec2, mass: f32, velocity: Vec2) -> Self {
        Self {
            position,
            velocity: velocity * PIXELS_PER_METER,
            mass: mass.max(MIN_MASS),
            force: Vec2::ZERO,
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass.max(MIN_MASS);
    }

    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
    }

    /// Force in newtons.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force * PIXELS_PER_METER;
    }

    /// Acceleration in m/s², e.g. gravity.
    pub fn apply_acceleration(&mut self, acceleration: Vec2) {
        self.force += acceleration * self.mass * PIXELS_PER_METER;
    }

    /// Advance by `dt` seconds. Non-positive steps only clear forces.
    pub fn integrate(&mut self, dt: f32) {
        if dt > 0.0 {
            let acceleration = self.force / self.mass;
            self.velocity += acceleration * dt;
            self.position += self.velocity * dt;
        }
        self.clear_forces();
    }

    /// Clamp the horizontal speed to `max_speed` m/s.
    pub fn clamp_velocity_x(&mut self, max_speed: f32) {
        let vmax = max_speed * PIXELS_PER_METER;
        if self.velocity.x > vmax {
            self.velocity.x = vmax;
        } else if self.velocity.x < -vmax {
            self.velocity.x = -vmax;
        }
    }

    /// Linear friction `F = -m * damping * v` on the x axis (damping in 1/s).
    pub fn apply_damping_x(&mut self, damping: f32) {
        if damping <= 0.0 {
            return;
        }
        let vx = self.velocity.x / PIXELS_PER_METER;
        self.apply_force(Vec2::new(-self.mass * damping * vx, 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_is_clamped() {
        let body = MassBody::new(Vec2::ZERO, 0.0, Vec2::ZERO);
        assert!((body.mass() - MIN_MASS).abs() < 1e-9);
    }

    #[test]
    fn test_gravity_step() {
        let mut body = MassBody::new(Vec2::ZERO, 2.0, Vec2::ZERO);
        body.apply_acceleration(Vec2::new(0.0, 9.8));
        body.integrate(0.5);
        // a = 980 px/s², v = 490 px/s, x = 245 px
        assert!((body.velocity.y - 490.0).abs() < 0.001);
        assert!((body.position.y - 245.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_dt_only_clears_forces() {
        let mut body = MassBody::new(Vec2::new(5.0, 5.0), 1.0, Vec2::ZERO);
        body.apply_force(Vec2::new(10.0, 0.0));
        body.integrate(0.0);
        assert_eq!(body.position, Vec2::new(5.0, 5.0));
        body.integrate(1.0);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_clamp_velocity_x() {
        let mut body = MassBody::new(Vec2::ZERO, 1.0, Vec2::new(-5.0, 1.0));
        body.clamp_velocity_x(2.0);
        assert!((body.velocity.x + 200.0).abs() < 0.001);
        assert!((body.velocity.y - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_damping_opposes_motion() {
        let mut body = MassBody::new(Vec2::ZERO, 1.0, Vec2::new(1.0, 0.0));
        body.apply_damping_x(2.0);
        body.integrate(0.1);
        // F = -2 N -> a = -200 px/s², v = 100 - 20
        assert!((body.velocity.x - 80.0).abs() < 0.001);
    }
}
