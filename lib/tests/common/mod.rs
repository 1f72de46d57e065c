//! Two-body propagation with universal variables, used to check that
//! Lambert solutions actually reach their targets.
#![allow(dead_code)]

use std::f64::consts;

use nalgebra::Vector3;

const TOL: f64 = 1e-12;
const MAX_ITER: u32 = 200;

fn calc_c2c3(psi: f64) -> (f64, f64) {
    if psi > 1e-6 {
        let sq = psi.sqrt();
        ((1.0 - sq.cos()) / psi, (sq - sq.sin()) / (psi * sq))
    } else if psi < -1e-6 {
        let sq = (-psi).sqrt();
        ((1.0 - sq.cosh()) / psi, (sq.sinh() - sq) / (-psi).powf(1.5))
    } else {
        (1.0 / 2.0 - psi / 24.0, 1.0 / 6.0 - psi / 120.0)
    }
}

/// Advance `(r0, v0)` by `dt` around a body with parameter `mu`.
pub fn propagate(r0: Vector3<f64>, v0: Vector3<f64>, dt: f64, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
    let norm_r0 = r0.norm();
    let sqrt_mu = mu.sqrt();
    let dot_r0v0 = r0.dot(&v0);
    let alpha = -v0.norm_squared() / mu + 2.0 / norm_r0;
    // scale-free measure of the conic type
    let kind = alpha * norm_r0;

    let mut dt = dt;
    if kind > 1e-6 {
        // whole periods change nothing
        let period = 2.0 * consts::PI / (mu * alpha.powi(3)).sqrt();
        dt = dt.rem_euclid(period);
    }

    let mut xn_new = if kind > 1e-6 {
        sqrt_mu * dt * alpha
    } else if kind < -1e-6 {
        let a = 1.0 / alpha;
        dt.signum()
            * (-a).sqrt()
            * ((-2.0 * mu * alpha * dt)
                / (dot_r0v0 + dt.signum() * (-mu * a).sqrt() * (1.0 - norm_r0 * alpha)))
                .ln()
    } else {
        let h = r0.cross(&v0);
        let p = h.norm_squared() / mu;
        let s = 1.0_f64.atan2(3.0 * dt * (mu / p.powi(3)).sqrt());
        let w = s.tan().cbrt().atan();
        p.sqrt() * 2.0 / (2.0 * w).tan()
    };

    if !xn_new.is_finite() {
        xn_new = sqrt_mu * dt / norm_r0;
    }

    let (mut xn, mut c2, mut c3, mut r, mut psi);
    let mut iter = 0;
    loop {
        xn = xn_new;
        psi = xn * xn * alpha;
        (c2, c3) = calc_c2c3(psi);
        r = xn * xn * c2 + dot_r0v0 / sqrt_mu * xn * (1.0 - psi * c3) + norm_r0 * (1.0 - psi * c2);
        xn_new = xn
            + (sqrt_mu * dt
                - xn.powi(3) * c3
                - dot_r0v0 / sqrt_mu * xn * xn * c2
                - norm_r0 * xn * (1.0 - psi * c3))
                / r;
        iter += 1;
        if (xn_new - xn).abs() < TOL * xn.abs().max(1.0) {
            break;
        }
        assert!(iter < MAX_ITER, "propagate({r0}, {v0}, {dt}, {mu}) failed to converge");
    }

    let f = 1.0 - xn * xn / norm_r0 * c2;
    let g = dt - xn.powi(3) / sqrt_mu * c3;
    let gdot = 1.0 - xn * xn / r * c2;
    let fdot = sqrt_mu / (r * norm_r0) * xn * (psi * c3 - 1.0);

    (f * r0 + g * v0, fdot * r0 + gdot * v0)
}

/// Relative distance between two vectors.
pub fn rel_err(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm() / b.norm()
}
