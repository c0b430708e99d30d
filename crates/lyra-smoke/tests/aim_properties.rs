//! Property-based tests for the aim solver.
//!
//! Uses proptest over finite, non-coincident observer/target pairs.

use lyra_smoke::{aim_rotation, Position3, SmokeError};
use proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = f64> {
    -10_000.0..10_000.0_f64
}

fn position() -> impl Strategy<Value = Position3> {
    (coordinate(), coordinate(), coordinate()).prop_map(|(x, y, z)| Position3::new(x, y, z))
}

proptest! {
    /// Pitch stays in [-90, 90], yaw in [-180, 180], roll is zero.
    #[test]
    fn prop_angles_in_range(observer in position(), target in position()) {
        prop_assume!(observer.distance_to(target) > 1e-6);
        let r = aim_rotation(observer, target).unwrap();
        prop_assert!((-90.0..=90.0).contains(&r.pitch), "pitch {}", r.pitch);
        prop_assert!((-180.0..=180.0).contains(&r.yaw), "yaw {}", r.yaw);
        prop_assert_eq!(r.roll, 0.0);
    }

    /// Rotation depends only on direction, not distance.
    #[test]
    fn prop_scale_invariant(observer in position(), target in position(), k in 0.1..100.0_f64) {
        prop_assume!(observer.distance_to(target) > 1e-3);
        let near = aim_rotation(observer, target).unwrap();
        let far_target = observer + (target - observer).scaled(k);
        let far = aim_rotation(observer, far_target).unwrap();
        prop_assert!((near.pitch - far.pitch).abs() < 1e-6);
        prop_assert!(near.yaw_delta(&far) < 1e-6);
    }

    /// Targets above the observer pitch the view up (negative pitch).
    #[test]
    fn prop_higher_target_negative_pitch(observer in position(), rise in 1.0..1_000.0_f64) {
        let above = Position3::new(observer.x + 10.0, observer.y, observer.z + rise);
        prop_assert!(aim_rotation(observer, above).unwrap().pitch < 0.0);
    }

    /// Coincident points are rejected.
    #[test]
    fn prop_same_point_rejected(p in position()) {
        let is_invalid = matches!(aim_rotation(p, p), Err(SmokeError::InvalidInput { .. }));
        prop_assert!(is_invalid);
    }
}
