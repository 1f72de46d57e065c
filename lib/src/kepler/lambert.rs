//! A relatively quick and robust multi-revolution Lambert's problem
//! solver.
//!
//! This solver is based on ["Revisiting Lambert's Problem" (Izzo
//! 2014)][1]. The problem is reduced to a single non-dimensional
//! unknown `x` per solution, with the geometry folded into `λ` and the
//! time of flight into `T`. For `N` complete revolutions there are two
//! solutions (the left and right branches around the minimum time of
//! flight for that `N`) whenever `T` exceeds that minimum.
//!
//! The time of flight is evaluated with Lagrange's expression, Battin's
//! hypergeometric series close to the parabola (`x = 1`), and Lancaster's
//! expression everywhere else. Roots are found with Householder
//! iterations from Izzo's published starting values, which converge
//! quartically; the minimum time of flight is found with Halley
//! iterations on `dT/dx = 0`.
//!
//! [1]: https://arxiv.org/abs/1403.2705

use std::{f64::consts, fmt};

use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::solve::{self, Tolerance};
use crate::{
    bodies::Planet,
    error::{KepError, Result},
    math::hyp2f1,
    time::Epoch,
};

/// Below this `|r̂0 × r̂1|` the transfer plane is undefined.
const COLLINEARITY_TOL: f64 = 1e-12;

/// Below this distance from the parabola (`x = 1`) the time of flight is
/// evaluated with Battin's series.
const BATTIN_RANGE: f64 = 0.01;
/// Below this distance (and above [`BATTIN_RANGE`]) Lagrange's expression
/// is used.
const LAGRANGE_RANGE: f64 = 0.2;

const HOUSEHOLDER_TOL: Tolerance = Tolerance {
    step: 1e-11,
    residual: 0.0,
    max_iter: 50,
};

const TMIN_TOL: Tolerance = Tolerance {
    step: 1e-13,
    residual: 0.0,
    max_iter: 50,
};

/// Which root of the time-of-flight equation a solution is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// The only solution with zero revolutions.
    Single,
    /// The multi-revolution solution with `x` below the minimum time of
    /// flight point.
    Left,
    /// The multi-revolution solution with `x` above the minimum time of
    /// flight point.
    Right,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Single => write!(f, "single"),
            Branch::Left => write!(f, "left"),
            Branch::Right => write!(f, "right"),
        }
    }
}

/// One transfer orbit.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LambertSolution {
    /// Velocity at `r0`.
    pub v0: Vector3<f64>,
    /// Velocity at `r1`.
    pub v1: Vector3<f64>,
    /// Number of complete revolutions.
    pub revolutions: u32,
    pub branch: Branch,
    /// Izzo's non-dimensional `x`.
    pub x: f64,
    /// Householder iterations spent on this root.
    pub iterations: u32,
}

/// The non-dimensional time of flight `T(x)` for a given `λ`.
#[derive(Copy, Clone, Debug)]
struct TofCurve {
    lambda: f64,
}

impl TofCurve {
    fn y(&self, x: f64) -> f64 {
        (1.0 - self.lambda.powi(2) * (1.0 - x.powi(2))).sqrt()
    }

    /// `T(x)` for `n` complete revolutions.
    fn tof(&self, x: f64, n: u32) -> f64 {
        let lambda = self.lambda;
        let dist = (x - 1.0).abs();
        if dist < LAGRANGE_RANGE && dist > BATTIN_RANGE {
            return self.tof_lagrange(x, n);
        }

        let k = lambda.powi(2);
        let e = x.powi(2) - 1.0;
        let rho = e.abs();
        let z = (1.0 + k * e).sqrt();
        if dist < BATTIN_RANGE {
            let eta = z - lambda * x;
            let s1 = 0.5 * (1.0 - lambda - x * eta);
            let q = 4.0 / 3.0 * hyp2f1(s1);
            let revs = if n == 0 {
                0.0
            } else {
                n as f64 * consts::PI / rho.powf(1.5)
            };
            (eta.powi(3) * q + 4.0 * lambda * eta) / 2.0 + revs
        } else {
            let y = rho.sqrt();
            let g = x * z - lambda * e;
            let d = if e < 0.0 {
                n as f64 * consts::PI + g.acos()
            } else {
                let f = y * (z - lambda * x);
                (f + g).ln()
            };
            (x - lambda * z - d / y) / e
        }
    }

    fn tof_lagrange(&self, x: f64, n: u32) -> f64 {
        let lambda = self.lambda;
        let a = 1.0 / (1.0 - x.powi(2));
        if a > 0.0 {
            let alpha = 2.0 * x.acos();
            let beta = (2.0 * (lambda.powi(2) / a).sqrt().asin()).copysign(lambda);
            a * a.sqrt() * ((alpha - alpha.sin()) - (beta - beta.sin()) + 2.0 * consts::PI * n as f64)
                / 2.0
        } else {
            let alpha = 2.0 * x.acosh();
            let beta = (2.0 * (-lambda.powi(2) / a).sqrt().asinh()).copysign(lambda);
            -a * (-a).sqrt() * ((beta - beta.sinh()) - (alpha - alpha.sinh())) / 2.0
        }
    }

    /// `(T′, T″, T‴)` at `x`, given `t = T(x)`.
    fn derivatives(&self, x: f64, t: f64) -> (f64, f64, f64) {
        let l2 = self.lambda.powi(2);
        let l3 = l2 * self.lambda;
        let umx2 = 1.0 - x.powi(2);
        let y = self.y(x);
        let y2 = y * y;
        let y3 = y2 * y;
        let dt = (3.0 * t * x - 2.0 + 2.0 * l3 * x / y) / umx2;
        let ddt = (3.0 * t + 5.0 * x * dt + 2.0 * (1.0 - l2) * l3 / y3) / umx2;
        let dddt = (7.0 * x * ddt + 8.0 * dt - 6.0 * (1.0 - l2) * l2 * l3 * x / y3 / y2) / umx2;
        (dt, ddt, dddt)
    }

    /// The point `(x, T)` of minimum time of flight for `n >= 1`
    /// revolutions.
    fn tmin(&self, n: u32) -> Result<(f64, f64)> {
        let root = solve::halley(0.0, (-1.0, 1.0), TMIN_TOL, |x| {
            self.derivatives(x, self.tof(x, n))
        })?;
        Ok((root.x, self.tof(root.x, n)))
    }

    /// Solve `T(x) = t` from `x0`.
    fn find_x(&self, t: f64, x0: f64, n: u32) -> Result<solve::Root> {
        solve::householder(x0, HOUSEHOLDER_TOL, |x| {
            let tof = self.tof(x, n);
            let (dt, ddt, dddt) = self.derivatives(x, tof);
            (tof - t, dt, ddt, dddt)
        })
    }
}

/// A solved Lambert's problem: its inputs, its geometry and every
/// admissible transfer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LambertProblem {
    r0: Vector3<f64>,
    r1: Vector3<f64>,
    tof: f64,
    mu: f64,
    retrograde: bool,
    max_revolutions: u32,
    chord: f64,
    semi_perimeter: f64,
    lambda: f64,
    t: f64,
    n_max: u32,
    solutions: Vec<LambertSolution>,
}

fn check_position(name: &'static str, r: &Vector3<f64>) -> Result<f64> {
    let norm = r.norm();
    if !norm.is_finite() || norm == 0.0 {
        return Err(KepError::domain(
            name,
            format!("position must be finite and non-zero, got {r:?}"),
        ));
    }
    Ok(norm)
}

impl LambertProblem {
    /// Solve Lambert's problem.
    ///
    /// Given position vectors `r0` and `r1`, time-of-flight `tof`, and
    /// gravitational parameter `mu`, find every orbit that goes from `r0`
    /// to `r1` in `tof` with at most `max_revolutions` complete
    /// revolutions. With `retrograde` set the transfer runs clockwise as
    /// seen from +z.
    ///
    /// This function is unit-agnostic, however the distance units of the
    /// position vectors and the time unit of `tof` must match the
    /// respective units of `mu`.
    ///
    /// Revolution counts that `tof` is too short for contribute no
    /// solutions; `max_revolutions` is only an upper bound.
    pub fn new(
        r0: Vector3<f64>,
        r1: Vector3<f64>,
        tof: f64,
        mu: f64,
        retrograde: bool,
        max_revolutions: u32,
    ) -> Result<Self> {
        if !(tof.is_finite() && tof > 0.0) {
            return Err(KepError::domain(
                "tof",
                format!("time of flight must be positive, got {tof}"),
            ));
        }
        if !(mu.is_finite() && mu > 0.0) {
            return Err(KepError::domain(
                "mu",
                format!("gravitational parameter must be positive, got {mu}"),
            ));
        }
        let r0n = check_position("r0", &r0)?;
        let r1n = check_position("r1", &r1)?;

        let ir0 = r0 / r0n;
        let ir1 = r1 / r1n;
        let ih = ir0.cross(&ir1);
        if ih.norm() <= COLLINEARITY_TOL {
            return Err(KepError::domain(
                "r1",
                "r0 and r1 are collinear, the transfer plane is undefined",
            ));
        }
        let ih = ih.normalize();

        let chord = (r1 - r0).norm();
        let s = (r0n + r1n + chord) / 2.0;
        let lambda2 = (1.0 - chord / s).max(0.0);
        let mut lambda = lambda2.sqrt();

        // transfer angle above π as seen from +z
        let (mut it0, mut it1) = if ih.z < 0.0 {
            lambda = -lambda;
            (ir0.cross(&ih), ir1.cross(&ih))
        } else {
            (ih.cross(&ir0), ih.cross(&ir1))
        };
        if retrograde {
            lambda = -lambda;
            it0 = -it0;
            it1 = -it1;
        }

        let t = (2.0 * mu / s.powi(3)).sqrt() * tof;
        let curve = TofCurve { lambda };

        // Maximum number of revolutions for which a solution exists,
        // capped to what was asked for.
        let t00 = lambda.acos() + lambda * (1.0 - lambda2).sqrt();
        let mut n_max = ((t / consts::PI).floor() as u32).min(max_revolutions);
        if n_max > 0 && t < t00 + n_max as f64 * consts::PI {
            let (x_min, t_min) = curve.tmin(n_max)?;
            if t_min > t {
                debug!(n_max, t, t_min, x_min, "time of flight below minimum, dropping revolution");
                n_max -= 1;
            }
        }

        let mut roots = Vec::with_capacity(2 * n_max as usize + 1);

        let t1 = 2.0 / 3.0 * (1.0 - lambda2 * lambda);
        let x0 = if t >= t00 {
            -(t - t00) / (t - t00 + 4.0)
        } else if t <= t1 {
            t1 * (t1 - t) / (2.0 / 5.0 * (1.0 - lambda2 * lambda2 * lambda) * t) + 1.0
        } else {
            (t / t00).powf(consts::LN_2 / (t1 / t00).ln()) - 1.0
        };
        roots.push((0, Branch::Single, curve.find_x(t, x0, 0)?));

        for n in 1..=n_max {
            let nf = n as f64;
            let tmp = ((nf * consts::PI + consts::PI) / (8.0 * t)).powf(2.0 / 3.0);
            let x0l = (tmp - 1.0) / (tmp + 1.0);
            roots.push((n, Branch::Left, curve.find_x(t, x0l, n)?));

            let tmp = ((8.0 * t) / (nf * consts::PI)).powf(2.0 / 3.0);
            let x0r = (tmp - 1.0) / (tmp + 1.0);
            roots.push((n, Branch::Right, curve.find_x(t, x0r, n)?));
        }

        let gamma = (mu * s / 2.0).sqrt();
        let rho = (r0n - r1n) / chord;
        let sigma = (1.0 - rho.powi(2)).max(0.0).sqrt();
        let solutions = roots
            .into_iter()
            .map(|(revolutions, branch, root)| {
                let x = root.x;
                let y = curve.y(x);
                let vr0 = gamma * ((lambda * y - x) - rho * (lambda * y + x)) / r0n;
                let vr1 = -gamma * ((lambda * y - x) + rho * (lambda * y + x)) / r1n;
                let vt = gamma * sigma * (y + lambda * x);
                trace!(revolutions, %branch, x, iterations = root.iterations, "lambert root");
                LambertSolution {
                    v0: vr0 * ir0 + vt / r0n * it0,
                    v1: vr1 * ir1 + vt / r1n * it1,
                    revolutions,
                    branch,
                    x,
                    iterations: root.iterations,
                }
            })
            .collect::<Vec<_>>();
        debug!(
            lambda,
            t,
            n_max,
            solutions = solutions.len(),
            "solved Lambert's problem"
        );

        Ok(Self {
            r0,
            r1,
            tof,
            mu,
            retrograde,
            max_revolutions,
            chord,
            semi_perimeter: s,
            lambda,
            t,
            n_max,
            solutions,
        })
    }

    /// Solve Lambert's problem between two planets.
    ///
    /// Positions are taken from each planet's ephemerides at the given
    /// epochs and the time of flight is their difference in seconds, so
    /// `mu` must be in `distance³/s²`. Without `mu` the departure
    /// planet's central body is used.
    pub fn between(
        departure: (&dyn Planet, Epoch),
        arrival: (&dyn Planet, Epoch),
        mu: Option<f64>,
        retrograde: bool,
        max_revolutions: u32,
    ) -> Result<Self> {
        let (from, t0) = departure;
        let (to, t1) = arrival;
        if t1 <= t0 {
            return Err(KepError::domain(
                "arrival",
                format!("arrival {t1} must come after departure {t0}"),
            ));
        }
        let mu = match mu {
            Some(mu) => mu,
            None => from.mu_central_body().ok_or_else(|| KepError::NotImplemented {
                what: "central body gravitational parameter",
                planet: from.name(),
            })?,
        };
        let [r0, _] = from.eph(t0);
        let [r1, _] = to.eph(t1);
        Self::new(
            r0,
            r1,
            (t1 - t0).as_seconds_f64(),
            mu,
            retrograde,
            max_revolutions,
        )
    }

    pub fn r0(&self) -> Vector3<f64> {
        self.r0
    }

    pub fn r1(&self) -> Vector3<f64> {
        self.r1
    }

    pub fn tof(&self) -> f64 {
        self.tof
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn retrograde(&self) -> bool {
        self.retrograde
    }

    pub fn max_revolutions(&self) -> u32 {
        self.max_revolutions
    }

    /// Maximum number of revolutions with a solution, capped to
    /// [`Self::max_revolutions`].
    pub fn n_max(&self) -> u32 {
        self.n_max
    }

    /// Izzo's `λ`; negative for transfers longer than half a revolution.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// The non-dimensional time of flight `T`.
    pub fn nondimensional_tof(&self) -> f64 {
        self.t
    }

    /// Solutions ordered by revolutions, then left before right.
    pub fn solutions(&self) -> &[LambertSolution] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<LambertSolution> {
        self.solutions
    }

    pub fn v0s(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.solutions.iter().map(|s| s.v0)
    }

    pub fn v1s(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.solutions.iter().map(|s| s.v1)
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.solutions.iter().map(|s| s.x)
    }

    pub fn iterations(&self) -> impl Iterator<Item = u32> + '_ {
        self.solutions.iter().map(|s| s.iterations)
    }
}

fn fmt_vec(v: &Vector3<f64>) -> String {
    format!("[{}]", v.iter().format(", "))
}

impl fmt::Display for LambertProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lambert's problem:")?;
        writeln!(f, "mu = {}", self.mu)?;
        writeln!(f, "r0 = {}", fmt_vec(&self.r0))?;
        writeln!(f, "r1 = {}", fmt_vec(&self.r1))?;
        writeln!(f, "Time of flight: {}", self.tof)?;
        writeln!(f, "retrograde: {}", self.retrograde)?;
        writeln!(f)?;
        writeln!(f, "chord = {}", self.chord)?;
        writeln!(f, "semiperimeter = {}", self.semi_perimeter)?;
        writeln!(f, "lambda = {}", self.lambda)?;
        writeln!(f, "non dimensional time of flight = {}", self.t)?;
        writeln!(f)?;
        writeln!(f, "Maximum number of revolutions: {}", self.n_max)?;
        writeln!(f, "Solutions:")?;
        for sol in &self.solutions {
            let a = self.semi_perimeter / 2.0 / (1.0 - sol.x.powi(2));
            writeln!(
                f,
                "{} revs, {} branch, iters: {}, x: {}, a: {}",
                sol.revolutions, sol.branch, sol.iterations, sol.x, a
            )?;
            writeln!(f, "\tv0 = {} v1 = {}", fmt_vec(&sol.v0), fmt_vec(&sol.v1))?;
        }
        Ok(())
    }
}

/// Solve Lambert's problem, returning only the solutions.
///
/// See [`LambertProblem::new`].
pub fn solve(
    r0: Vector3<f64>,
    r1: Vector3<f64>,
    tof: f64,
    mu: f64,
    retrograde: bool,
    max_revolutions: u32,
) -> Result<Vec<LambertSolution>> {
    LambertProblem::new(r0, r1, tof, mu, retrograde, max_revolutions)
        .map(LambertProblem::into_solutions)
}
