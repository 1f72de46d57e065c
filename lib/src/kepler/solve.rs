//! Root finding for Kepler's equation and its relatives.
//!
//! Two iteration schemes are provided: a bounded third-order Halley
//! iteration, used for the Kepler family and for the minimum
//! time-of-flight search in [`super::lambert`], and a fourth-order
//! Householder iteration used for the Lambert time-of-flight equation.
//! Both stop on a step or residual tolerance and give up with
//! [`KepError::Convergence`] once the iteration cap is reached.

use std::f64::consts;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::{KepError, Result},
    math,
};

/// Stopping rules for an iteration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// A step `Δx` is converged once `|Δx| <= step * max(1, |x|)`.
    pub step: f64,
    /// The iteration also stops once the residual satisfies
    /// `|f(x)| <= residual`.
    pub residual: f64,
    /// Iteration cap.
    pub max_iter: u32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            step: 1e-14,
            residual: 0.0,
            max_iter: 100,
        }
    }
}

impl Tolerance {
    #[must_use]
    pub fn with_residual(self, residual: f64) -> Self {
        Self { residual, ..self }
    }

    fn step_converged(&self, dx: f64, x: f64) -> bool {
        dx.abs() <= self.step * x.abs().max(1.0)
    }

    fn residual_converged(&self, f: f64) -> bool {
        f == 0.0 || f.abs() <= self.residual
    }
}

/// A converged root.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Root {
    pub x: f64,
    pub iterations: u32,
}

/// Halley's method, `x ← x − 2ff′ / (2f′² − ff″)`.
///
/// `eval(x)` returns `(f, f′, f″)`. An iterate falling outside
/// `bracket` is replaced by the midpoint between the current point and
/// the violated bound.
pub fn halley(
    mut x: f64,
    bracket: (f64, f64),
    tol: Tolerance,
    mut eval: impl FnMut(f64) -> (f64, f64, f64),
) -> Result<Root> {
    let (lo, hi) = bracket;
    let mut step = f64::NAN;
    for iter in 1..=tol.max_iter {
        let (f, df, d2f) = eval(x);
        if tol.residual_converged(f) {
            return Ok(Root {
                x,
                iterations: iter - 1,
            });
        }

        let denom = 2.0 * df * df - f * d2f;
        step = if denom == 0.0 {
            f / df
        } else {
            2.0 * f * df / denom
        };
        if !step.is_finite() {
            return Err(KepError::Convergence {
                iterations: iter,
                step,
            });
        }

        let mut next = x - step;
        if next < lo {
            next = (x + lo) / 2.0;
        } else if next > hi {
            next = (x + hi) / 2.0;
        }

        let dx = next - x;
        x = next;
        if tol.step_converged(dx, x) {
            return Ok(Root {
                x,
                iterations: iter,
            });
        }
    }

    Err(KepError::Convergence {
        iterations: tol.max_iter,
        step,
    })
}

/// Householder's fourth-order method.
///
/// `eval(x)` returns `(f, f′, f″, f‴)`.
pub fn householder(
    mut x: f64,
    tol: Tolerance,
    mut eval: impl FnMut(f64) -> (f64, f64, f64, f64),
) -> Result<Root> {
    let mut step = f64::NAN;
    for iter in 1..=tol.max_iter {
        let (f, df, d2f, d3f) = eval(x);
        if tol.residual_converged(f) {
            return Ok(Root {
                x,
                iterations: iter - 1,
            });
        }

        let df2 = df * df;
        step = f * (df2 - f * d2f / 2.0) / (df * (df2 - f * d2f) + d3f * f * f / 6.0);
        if !step.is_finite() {
            return Err(KepError::Convergence {
                iterations: iter,
                step,
            });
        }

        x -= step;
        if tol.step_converged(step, x) {
            return Ok(Root {
                x,
                iterations: iter,
            });
        }
    }

    Err(KepError::Convergence {
        iterations: tol.max_iter,
        step,
    })
}

/// The members of the Kepler equation family.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeplerEquation {
    /// `M = E − e sin E`, unknown `E`, `0 <= e < 1`.
    Elliptic,
    /// `N = e sinh H − H`, unknown `H`, `e > 1`.
    Hyperbolic,
    /// `N = e tan ζ − gd⁻¹(ζ)`, unknown `ζ`, `e > 1`.
    Gudermannian,
}

/// Past this, `gd(H)` is within `1e-8` of `π/2` and the Gudermannian form
/// can no longer resolve the root.
const GD_SATURATION: f64 = 19.0;

impl KeplerEquation {
    /// Check that `ecc` belongs to this equation's domain.
    pub fn check_eccentricity(self, ecc: f64) -> Result<()> {
        match self {
            Self::Elliptic => {
                if (0.0..1.0).contains(&ecc) {
                    Ok(())
                } else {
                    Err(KepError::domain(
                        "ecc",
                        format!("elliptic anomalies need 0 <= ecc < 1, got {ecc}"),
                    ))
                }
            }
            Self::Hyperbolic | Self::Gudermannian => {
                // written so NaN fails
                if ecc > 1.0 && ecc.is_finite() {
                    Ok(())
                } else {
                    Err(KepError::domain(
                        "ecc",
                        format!("hyperbolic anomalies need ecc > 1, got {ecc}"),
                    ))
                }
            }
        }
    }

    /// Residual of the equation at `x`, with its first two derivatives.
    pub fn eval(self, x: f64, target: f64, ecc: f64) -> (f64, f64, f64) {
        match self {
            Self::Elliptic => {
                let (s, c) = x.sin_cos();
                (x - ecc * s - target, 1.0 - ecc * c, ecc * s)
            }
            Self::Hyperbolic => {
                let sh = libm::sinh(x);
                (ecc * sh - x - target, ecc * libm::cosh(x) - 1.0, ecc * sh)
            }
            Self::Gudermannian => {
                let sec = 1.0 / libm::cos(x);
                let tan = libm::tan(x);
                (
                    ecc * tan - math::gd_inv(x) - target,
                    ecc * sec * sec - sec,
                    2.0 * ecc * sec * sec * tan - sec * tan,
                )
            }
        }
    }

    /// Solve the equation for the anomaly matching `target`.
    ///
    /// For [`KeplerEquation::Elliptic`] the target is wrapped into
    /// `(-π, π]` and so is the result.
    pub fn solve(self, target: f64, ecc: f64, tol: Tolerance) -> Result<f64> {
        self.check_eccentricity(ecc)?;
        if !target.is_finite() {
            return Err(KepError::domain(
                "value",
                format!("expected a finite value, got {target}"),
            ));
        }

        let root = match self {
            Self::Elliptic => {
                let m = math::wrap_angle(target);
                let tol = tol.with_residual(tol.residual.max(noise_floor(m)));
                let lo = (m - ecc).max(-consts::PI);
                let hi = (m + ecc).min(consts::PI);
                // Danby's starting value
                let guess = (m + 0.85 * ecc * sign(libm::sin(m))).clamp(lo, hi);
                halley(guess, (lo, hi), tol, |x| self.eval(x, m, ecc))?
            }
            Self::Hyperbolic => {
                let (lo, hi) = hyperbolic_bracket(target.abs(), ecc);
                let tol = tol.with_residual(tol.residual.max(noise_floor(target)));
                let root = halley(hi, (lo, hi), tol, |x| self.eval(x, target.abs(), ecc))?;
                Root {
                    x: root.x.copysign(target),
                    ..root
                }
            }
            Self::Gudermannian => {
                let (lo, hi) = hyperbolic_bracket(target.abs(), ecc);
                let tol = tol.with_residual(tol.residual.max(noise_floor(target)));
                let root = if hi > GD_SATURATION {
                    let root = Self::Hyperbolic.solve(target.abs(), ecc, tol)?;
                    Root {
                        x: math::gd(root),
                        iterations: 0,
                    }
                } else {
                    let (lo, hi) = (math::gd(lo), math::gd(hi));
                    halley(hi, (lo, hi), tol, |x| self.eval(x, target.abs(), ecc))?
                };
                Root {
                    x: root.x.copysign(target),
                    ..root
                }
            }
        };

        trace!(equation = ?self, value = target, ecc, iterations = root.iterations, "solved");
        Ok(root.x)
    }
}

fn sign(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

/// Residual below which `E − e sin E − M` (and its hyperbolic siblings)
/// is indistinguishable from rounding noise.
fn noise_floor(target: f64) -> f64 {
    4.0 * f64::EPSILON * (1.0 + target.abs())
}

/// Bounds on the root `H >= 0` of `e sinh H − H = n` for `n >= 0`.
///
/// `sinh H >= H` gives `(e − 1) sinh H <= n` and `e sinh H >= n`, while
/// `sinh H − H >= H³/6` gives `H <= ∛(6n)`. The function is increasing and
/// convex on `H >= 0`, so starting at the upper bound never overshoots.
fn hyperbolic_bracket(n: f64, ecc: f64) -> (f64, f64) {
    let lo = libm::asinh(n / ecc);
    let hi = libm::asinh(n / (ecc - 1.0)).min(libm::cbrt(6.0 * n));
    (lo, hi.max(lo))
}
