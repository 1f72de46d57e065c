use std::f64::consts;

use approx::assert_relative_eq;
use kepcore::kepler::anomaly::{
    e2f, e2m, f2e, f2m, f2n, h2n, m2e, m2f, m2e_v, n2f, n2h, n2zeta, zeta2n,
};
use proptest::prelude::*;

fn mean_anomaly() -> impl Strategy<Value = f64> {
    // (-π, π]
    (-consts::PI..=consts::PI).prop_filter("open at -π", |m| *m > -consts::PI)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn mean_eccentric_round_trip(m in mean_anomaly(), ecc in 0.0..0.999f64) {
        let e = m2e(m, ecc).unwrap();
        prop_assert!((e2m(e, ecc).unwrap() - m).abs() < 1e-12);
    }

    #[test]
    fn true_eccentric_round_trip(e in mean_anomaly(), ecc in 0.0..0.99f64) {
        let f = e2f(e, ecc).unwrap();
        prop_assert!((f2e(f, ecc).unwrap() - e).abs() < 1e-12);
    }

    #[test]
    fn mean_true_round_trip(m in mean_anomaly(), ecc in 0.0..0.9f64) {
        let f = m2f(m, ecc).unwrap();
        prop_assert!((f2m(f, ecc).unwrap() - m).abs() < 1e-11);
    }

    #[test]
    fn eccentric_anomaly_is_monotonic(
        a in mean_anomaly(),
        b in mean_anomaly(),
        ecc in 0.0..0.999f64,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(m2e(lo, ecc).unwrap() <= m2e(hi, ecc).unwrap());
    }

    #[test]
    fn hyperbolic_round_trip(n in -60.0..60.0f64, ecc in 1.001..20.0f64) {
        let h = n2h(n, ecc).unwrap();
        let back = h2n(h, ecc).unwrap();
        prop_assert!((back - n).abs() <= 1e-12 * n.abs().max(1.0));
    }

    #[test]
    fn hyperbolic_true_round_trip(n in -20.0..20.0f64, ecc in 1.05..10.0f64) {
        let f = n2f(n, ecc).unwrap();
        let back = f2n(f, ecc).unwrap();
        prop_assert!((back - n).abs() <= 1e-9 * n.abs().max(1.0));
    }

    #[test]
    fn gudermannian_round_trip(n in -1e3..1e3f64, ecc in 1.01..10.0f64) {
        let zeta = n2zeta(n, ecc).unwrap();
        prop_assert!(zeta.abs() < consts::FRAC_PI_2);
        let back = zeta2n(zeta, ecc).unwrap();
        prop_assert!((back - n).abs() <= 1e-9 * n.abs().max(1.0));
    }

    #[test]
    fn vectorized_matches_scalar(
        ms in prop::collection::vec(mean_anomaly(), 0..64),
        ecc in 0.0..0.99f64,
    ) {
        let v = m2e_v(&ms, ecc).unwrap();
        prop_assert_eq!(v.len(), ms.len());
        for (m, e) in ms.iter().zip(&v) {
            prop_assert_eq!(*e, m2e(*m, ecc).unwrap());
        }
    }
}

#[test]
fn periapsis_and_apoapsis_are_fixed_points() {
    for ecc in [0.0, 0.3, 0.9, 0.999] {
        assert_eq!(m2e(0.0, ecc).unwrap(), 0.0);
        assert_eq!(m2f(0.0, ecc).unwrap(), 0.0);
        assert_relative_eq!(m2e(consts::PI, ecc).unwrap(), consts::PI, epsilon = 1e-12);
    }
    for ecc in [1.001, 2.0, 50.0] {
        assert_eq!(n2h(0.0, ecc).unwrap(), 0.0);
        assert_eq!(n2f(0.0, ecc).unwrap(), 0.0);
    }
}
