//! Movement patterns for mobile objects.
//!
//! Time-based patterns read an explicit simulation clock, so objects with
//! identical parameters stay in phase and any instant can be evaluated (seek,
//! replay). `delta_time` only matters for `linear` and `random`.

use crate::mobile::MobileObject;
use crate::rng::{splitmix64, unit_f64};
use soundscape_common::{MovementType, Vec3};

/// Seconds on the simulation clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: Self = Self(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn advanced(self, delta_seconds: f64) -> Self {
        Self(self.0 + delta_seconds)
    }
}

/// Deterministic uniform sample in `[0, 1)` for one axis of the random walk.
fn jitter_sample(seed: u64, time: SimTime, axis: u64) -> f64 {
    let mixed = seed ^ time.0.to_bits().rotate_left(17) ^ axis.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    unit_f64(splitmix64(mixed))
}

/// Position of `object` after `delta_time` seconds, at clock instant `time`.
pub fn calculate_next_position(object: &MobileObject, delta_time: f32, time: SimTime) -> Vec3 {
    let p = &object.mobile_params;
    let pos = object.transform.position;
    let center = p.center_position;
    let radius = p.radius as f64;
    let t = time.seconds() * p.speed as f64;

    match p.movement_type {
        MovementType::Linear => pos + p.direction * p.speed * delta_time,
        MovementType::Circular => center + vec3(t.cos(), t.sin(), 0.0) * radius as f32,
        MovementType::Polar => {
            let half = (t * 0.5).cos();
            center + vec3(t.cos() * half, t.sin() * half, (t * 0.5).sin()) * radius as f32
        }
        MovementType::Random => {
            let envelope = (time.seconds() * p.frequency as f64).sin() * p.amplitude as f64;
            let step = p.speed as f64 * delta_time as f64 * envelope;
            let offset = vec3(
                (jitter_sample(p.random_seed, time, 0) - 0.5) * step,
                (jitter_sample(p.random_seed, time, 1) - 0.5) * step,
                (jitter_sample(p.random_seed, time, 2) - 0.5) * step,
            );
            pos + offset
        }
        MovementType::Figure8 => center + vec3(t.sin() * radius, (2.0 * t).sin() * radius * 0.5, 0.0),
        MovementType::Spiral => {
            let r = radius * (1.0 - 0.1 * t);
            center + vec3(t.cos() * r, t.sin() * r, t * p.speed as f64 * 0.1)
        }
    }
}

fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobile::MobileParams;
    use soundscape_common::{EntityId, Transform};

    const EPS: f32 = 1e-4;

    fn mobile(movement_type: MovementType, position: Vec3) -> MobileObject {
        MobileObject {
            id: EntityId::new(),
            transform: Transform::at(position),
            mobile_params: MobileParams {
                movement_type,
                random_seed: 99,
                ..MobileParams::anchored_at(position)
            },
            is_selected: false,
            grid_id: None,
        }
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn linear_uses_direction_speed_and_delta() {
        let mut m = mobile(MovementType::Linear, Vec3::new(1.0, 0.0, 0.0));
        m.mobile_params.direction = Vec3::new(0.0, 1.0, 0.0);
        m.mobile_params.speed = 2.0;
        let next = calculate_next_position(&m, 0.5, SimTime(123.0));
        assert!(close(next, Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn circular_orbits_center_in_xy_plane() {
        let m = mobile(MovementType::Circular, Vec3::new(5.0, 5.0, 5.0));
        let at_zero = calculate_next_position(&m, 0.016, SimTime::ZERO);
        assert!(close(at_zero, Vec3::new(7.0, 5.0, 5.0)));

        let quarter = calculate_next_position(&m, 0.016, SimTime(std::f64::consts::FRAC_PI_2));
        assert!(close(quarter, Vec3::new(5.0, 7.0, 5.0)));

        for i in 0..20 {
            let p = calculate_next_position(&m, 0.016, SimTime(i as f64 * 0.37));
            assert!(((p - m.mobile_params.center_position).length() - 2.0).abs() < EPS);
            assert!((p.z - 5.0).abs() < EPS);
        }
    }

    #[test]
    fn polar_starts_on_x_axis() {
        let m = mobile(MovementType::Polar, Vec3::ZERO);
        let p = calculate_next_position(&m, 0.016, SimTime::ZERO);
        assert!(close(p, Vec3::new(2.0, 0.0, 0.0)));
        let later = calculate_next_position(&m, 0.016, SimTime(std::f64::consts::PI));
        assert!(close(later, Vec3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn figure8_crosses_center_at_zero() {
        let m = mobile(MovementType::Figure8, Vec3::new(1.0, 1.0, 1.0));
        let p = calculate_next_position(&m, 0.016, SimTime::ZERO);
        assert!(close(p, Vec3::new(1.0, 1.0, 1.0)));
        let q = calculate_next_position(&m, 0.016, SimTime(std::f64::consts::FRAC_PI_4));
        let expected = Vec3::new(1.0 + 2.0 * std::f32::consts::FRAC_1_SQRT_2, 2.0, 1.0);
        assert!(close(q, expected));
    }

    #[test]
    fn spiral_radius_shrinks_and_rises() {
        let m = mobile(MovementType::Spiral, Vec3::ZERO);
        let p = calculate_next_position(&m, 0.016, SimTime(5.0));
        let planar = Vec3::new(p.x, p.y, 0.0).length();
        assert!((planar - 1.0).abs() < EPS);
        assert!((p.z - 0.5).abs() < EPS);
    }

    #[test]
    fn random_walk_is_bounded_and_replayable() {
        let mut m = mobile(MovementType::Random, Vec3::ZERO);
        m.mobile_params.amplitude = 1.0;
        m.mobile_params.frequency = 1.0;
        let time = SimTime(1.3);
        let a = calculate_next_position(&m, 0.5, time);
        let b = calculate_next_position(&m, 0.5, time);
        assert_eq!(a, b);

        let bound = 0.5 * m.mobile_params.speed * 0.5 * 1.0;
        assert!(a.x.abs() <= bound && a.y.abs() <= bound && a.z.abs() <= bound);
    }

    #[test]
    fn random_walk_stalls_without_delta() {
        let mut m = mobile(MovementType::Random, Vec3::new(3.0, 3.0, 3.0));
        m.mobile_params.amplitude = 1.0;
        let p = calculate_next_position(&m, 0.0, SimTime(0.7));
        assert_eq!(p, Vec3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn identical_params_stay_in_phase() {
        for movement in MovementType::ALL {
            let a = mobile(*movement, Vec3::new(2.0, -1.0, 4.0));
            let mut b = mobile(*movement, Vec3::new(2.0, -1.0, 4.0));
            b.mobile_params.random_seed = a.mobile_params.random_seed;
            let time = SimTime(17.25);
            assert_eq!(
                calculate_next_position(&a, 0.016, time),
                calculate_next_position(&b, 0.016, time),
                "{movement}"
            );
        }
    }
}
