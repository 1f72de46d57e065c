//! Conversions between anomalies.
//!
//! The two-letter names follow the usual shorthand: `m` mean anomaly,
//! `e` eccentric anomaly, `f` true anomaly, `h` hyperbolic anomaly, `n`
//! hyperbolic mean anomaly and `zeta` the Gudermannian. Every conversion
//! checks the eccentricity before doing anything else: elliptic
//! conversions require `0 <= ecc < 1`, hyperbolic ones `ecc > 1`.
//!
//! Angular outputs are wrapped into `(-π, π]`. Mean and hyperbolic
//! anomalies are left unbounded.
//!
//! Each scalar conversion has a vectorized sibling with a `_v` suffix,
//! which maps it over a slice with either one broadcast eccentricity or
//! one eccentricity per element. A vectorized call fails as a whole: the
//! error returned is the one at the lowest failing index, wrapped in
//! [`KepError::Batch`].

use std::f64::consts;

use rayon::prelude::*;

use super::solve::{KeplerEquation, Tolerance};
use crate::{
    error::{KepError, Result},
    math::{self, wrap_angle},
};

fn elliptic(ecc: f64) -> Result<()> {
    KeplerEquation::Elliptic.check_eccentricity(ecc)
}

fn hyperbolic(ecc: f64) -> Result<()> {
    KeplerEquation::Hyperbolic.check_eccentricity(ecc)
}

fn finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(KepError::domain(
            "value",
            format!("expected a finite value, got {value}"),
        ))
    }
}

/// `β = e / (1 + √(1 − e²))`, so that `tan(f/2 − E/2) = β sin E / (1 − β cos E)`.
fn beta(ecc: f64) -> f64 {
    ecc / (1.0 + libm::sqrt(1.0 - ecc.powi(2)))
}

/// Mean anomaly to eccentric anomaly.
pub fn m2e(ma: f64, ecc: f64) -> Result<f64> {
    KeplerEquation::Elliptic.solve(ma, ecc, Tolerance::default())
}

/// Eccentric anomaly to mean anomaly.
pub fn e2m(ea: f64, ecc: f64) -> Result<f64> {
    elliptic(ecc)?;
    let ea = finite(ea)?;
    Ok(ea - ecc * libm::sin(ea))
}

/// Eccentric anomaly to true anomaly.
pub fn e2f(ea: f64, ecc: f64) -> Result<f64> {
    elliptic(ecc)?;
    let ea = finite(ea)?;
    let beta = beta(ecc);
    Ok(wrap_angle(
        ea + 2.0 * libm::atan2(beta * libm::sin(ea), 1.0 - beta * libm::cos(ea)),
    ))
}

/// True anomaly to eccentric anomaly.
pub fn f2e(ta: f64, ecc: f64) -> Result<f64> {
    elliptic(ecc)?;
    let ta = finite(ta)?;
    let beta = beta(ecc);
    Ok(wrap_angle(
        ta - 2.0 * libm::atan2(beta * libm::sin(ta), 1.0 + beta * libm::cos(ta)),
    ))
}

/// True anomaly to mean anomaly.
pub fn f2m(ta: f64, ecc: f64) -> Result<f64> {
    e2m(f2e(ta, ecc)?, ecc)
}

/// Mean anomaly to true anomaly.
pub fn m2f(ma: f64, ecc: f64) -> Result<f64> {
    e2f(m2e(ma, ecc)?, ecc)
}

/// Hyperbolic anomaly to hyperbolic mean anomaly.
pub fn h2n(ha: f64, ecc: f64) -> Result<f64> {
    hyperbolic(ecc)?;
    let ha = finite(ha)?;
    Ok(ecc * libm::sinh(ha) - ha)
}

/// Hyperbolic mean anomaly to hyperbolic anomaly.
pub fn n2h(na: f64, ecc: f64) -> Result<f64> {
    KeplerEquation::Hyperbolic.solve(na, ecc, Tolerance::default())
}

/// Hyperbolic anomaly to true anomaly.
pub fn h2f(ha: f64, ecc: f64) -> Result<f64> {
    hyperbolic(ecc)?;
    let ha = finite(ha)?;
    Ok(2.0 * libm::atan(libm::sqrt((ecc + 1.0) / (ecc - 1.0)) * libm::tanh(ha / 2.0)))
}

/// True anomaly to hyperbolic anomaly.
///
/// The true anomaly must lie strictly between the asymptotes,
/// `|f| < acos(−1/e)`.
pub fn f2h(ta: f64, ecc: f64) -> Result<f64> {
    hyperbolic(ecc)?;
    let ta = wrap_angle(finite(ta)?);
    let asymptote = libm::acos(-1.0 / ecc);
    if ta.abs() >= asymptote {
        return Err(KepError::domain(
            "f",
            format!("true anomaly {ta} is beyond the asymptote at ±{asymptote} for ecc {ecc}"),
        ));
    }
    Ok(2.0 * libm::atanh(libm::sqrt((ecc - 1.0) / (ecc + 1.0)) * libm::tan(ta / 2.0)))
}

/// True anomaly to hyperbolic mean anomaly.
pub fn f2n(ta: f64, ecc: f64) -> Result<f64> {
    h2n(f2h(ta, ecc)?, ecc)
}

/// Hyperbolic mean anomaly to true anomaly.
pub fn n2f(na: f64, ecc: f64) -> Result<f64> {
    h2f(n2h(na, ecc)?, ecc)
}

/// Gudermannian to true anomaly.
///
/// See Battin, "An Introduction to the Mathematics and Methods of
/// Astrodynamics", for the definition of ζ.
pub fn zeta2f(zeta: f64, ecc: f64) -> Result<f64> {
    hyperbolic(ecc)?;
    let zeta = finite(zeta)?;
    Ok(2.0 * libm::atan(libm::sqrt((1.0 + ecc) / (ecc - 1.0)) * libm::tan(zeta / 2.0)))
}

/// True anomaly to Gudermannian.
pub fn f2zeta(ta: f64, ecc: f64) -> Result<f64> {
    hyperbolic(ecc)?;
    let ta = finite(ta)?;
    Ok(2.0 * libm::atan(libm::sqrt((ecc - 1.0) / (1.0 + ecc)) * libm::tan(ta / 2.0)))
}

/// Hyperbolic mean anomaly to Gudermannian.
pub fn n2zeta(na: f64, ecc: f64) -> Result<f64> {
    KeplerEquation::Gudermannian.solve(na, ecc, Tolerance::default())
}

/// Gudermannian to hyperbolic mean anomaly. Requires `|ζ| < π/2`.
pub fn zeta2n(zeta: f64, ecc: f64) -> Result<f64> {
    hyperbolic(ecc)?;
    let zeta = finite(zeta)?;
    if zeta.abs() >= consts::FRAC_PI_2 {
        return Err(KepError::domain(
            "zeta",
            format!("the Gudermannian must lie in (-π/2, π/2), got {zeta}"),
        ));
    }
    Ok(ecc * libm::tan(zeta) - math::gd_inv(zeta))
}

/// Eccentricities for a vectorized conversion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Eccentricities<'a> {
    /// One eccentricity used for every element.
    Broadcast(f64),
    /// One eccentricity per element.
    PerElement(&'a [f64]),
}

impl Eccentricities<'_> {
    fn at(&self, i: usize) -> f64 {
        match self {
            Self::Broadcast(ecc) => *ecc,
            Self::PerElement(eccs) => eccs[i],
        }
    }
}

impl From<f64> for Eccentricities<'_> {
    fn from(ecc: f64) -> Self {
        Self::Broadcast(ecc)
    }
}

impl<'a> From<&'a [f64]> for Eccentricities<'a> {
    fn from(eccs: &'a [f64]) -> Self {
        Self::PerElement(eccs)
    }
}

impl<'a> From<&'a Vec<f64>> for Eccentricities<'a> {
    fn from(eccs: &'a Vec<f64>) -> Self {
        Self::PerElement(eccs)
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for Eccentricities<'a> {
    fn from(eccs: &'a [f64; N]) -> Self {
        Self::PerElement(eccs)
    }
}

/// Map a scalar conversion over `values`.
pub fn map_v<'a>(
    values: &[f64],
    ecc: impl Into<Eccentricities<'a>>,
    convert: fn(f64, f64) -> Result<f64>,
) -> Result<Vec<f64>> {
    let ecc = ecc.into();
    if let Eccentricities::PerElement(eccs) = ecc {
        if eccs.len() != values.len() {
            return Err(KepError::LengthMismatch {
                values: values.len(),
                eccentricities: eccs.len(),
            });
        }
    }

    let results: Vec<Result<f64>> = values
        .par_iter()
        .enumerate()
        .map(|(i, &value)| convert(value, ecc.at(i)))
        .collect();

    results
        .into_iter()
        .enumerate()
        .map(|(index, res)| {
            res.map_err(|source| KepError::Batch {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

macro_rules! vectorized {
    ($($name_v:ident => $name:ident),* $(,)?) => {$(
        #[doc = concat!("Vectorized [`", stringify!($name), "`].")]
        pub fn $name_v<'a>(values: &[f64], ecc: impl Into<Eccentricities<'a>>) -> Result<Vec<f64>> {
            map_v(values, ecc, $name)
        }
    )*};
}

vectorized! {
    m2e_v => m2e,
    e2m_v => e2m,
    e2f_v => e2f,
    f2e_v => f2e,
    f2m_v => f2m,
    m2f_v => m2f,
    h2n_v => h2n,
    n2h_v => n2h,
    h2f_v => h2f,
    f2h_v => f2h,
    f2n_v => f2n,
    n2f_v => n2f,
    zeta2f_v => zeta2f,
    f2zeta_v => f2zeta,
    n2zeta_v => n2zeta,
    zeta2n_v => zeta2n,
}
