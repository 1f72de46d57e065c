//! Math utilities.
use std::f64::consts;

/// The hypergeometric function `₂F₁(3, 1, 5/2, x)`.
///
/// Summed until the partial sum stops changing, so the result carries
/// full double precision for `x < 1`. Diverges (returns infinity) for
/// `x >= 1`.
pub fn hyp2f1(x: f64) -> f64 {
    if x >= 1.0 {
        f64::INFINITY
    } else {
        let mut res = 1.0;
        let mut term = 1.0;
        let mut i = 0;
        loop {
            let ii = i as f64;
            term = term * (3.0 + ii) * (1.0 + ii) / (5.0 / 2.0 + ii) * x / (ii + 1.0);
            let res_old = res;
            res += term;
            if res_old == res {
                return res;
            }
            i += 1;
        }
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(x: f64) -> f64 {
    let r = x.rem_euclid(2.0 * consts::PI);
    if r > consts::PI {
        r - 2.0 * consts::PI
    } else {
        r
    }
}

/// The Gudermannian function, `gd(x) = atan(sinh(x))`.
pub fn gd(x: f64) -> f64 {
    libm::atan(libm::sinh(x))
}

/// The inverse Gudermannian function, `gd⁻¹(x) = atanh(sin(x))`.
pub fn gd_inv(x: f64) -> f64 {
    libm::atanh(libm::sin(x))
}
