use nav_core::{round_to_int, Int3, Matrix4, Vec3};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f32> {
    -1000.0f32..1000.0
}

proptest! {
    #[test]
    fn conversion_stays_within_half_a_unit(x in coord(), y in coord(), z in coord()) {
        let v = Vec3::new(x, y, z);
        let back = Int3::from(v).to_vec3();
        // Half a fixed-point unit plus f32 noise at this magnitude.
        prop_assert!((back.x - x).abs() <= 1e-3);
        prop_assert!((back.y - y).abs() <= 1e-3);
        prop_assert!((back.z - z).abs() <= 1e-3);
    }

    #[test]
    fn exact_halves_round_to_even(n in -100_000i32..100_000) {
        let rounded = round_to_int(n as f32 + 0.5);
        prop_assert_eq!(rounded % 2, 0);
        prop_assert!(rounded == n || rounded == n + 1);
    }

    #[test]
    fn fixed_point_is_stable_under_reconversion(x in -1_000_000i32..1_000_000) {
        let p = Int3::new(x, 0, -x);
        prop_assert_eq!(Int3::from(p.to_vec3()), p);
    }

    #[test]
    fn translation_then_inverse_restores_positions(
        x in coord(), z in coord(), tx in coord(), tz in coord()
    ) {
        let p = Int3::from(Vec3::new(x, 0.0, z));
        let m = Matrix4::translation(Vec3::new(tx, 0.0, tz));
        let moved = Int3::from(m.multiply_point3x4(p.to_vec3()));
        let back = Int3::from(m.inverse().multiply_point3x4(moved.to_vec3()));
        // Two conversions through f32 at up to 2000 units.
        prop_assert!((back.x - p.x).abs() <= 2);
        prop_assert!((back.z - p.z).abs() <= 2);
    }
}
