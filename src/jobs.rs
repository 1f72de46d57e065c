//! Job files: what to solve, read from TOML.

use color_eyre::eyre::{self, eyre, WrapErr};
use kepcore::{
    bodies,
    kepler::{
        anomaly::{self, Eccentricities},
        LambertProblem, LambertSolution,
    },
};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Jobs {
    #[serde(default)]
    pub lambert: Vec<LambertJob>,
    #[serde(default)]
    pub anomaly: Vec<AnomalyJob>,
}

/// A gravitational parameter, given directly or by body name.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Mu {
    Value(f64),
    Body(String),
}

impl Mu {
    fn resolve(&self) -> eyre::Result<f64> {
        match self {
            Mu::Value(mu) => Ok(*mu),
            Mu::Body(name) => {
                bodies::mu_by_name(name).ok_or_else(|| eyre!("unknown body '{name}'"))
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LambertJob {
    pub name: Option<String>,
    pub r0: [f64; 3],
    pub r1: [f64; 3],
    pub tof: f64,
    pub mu: Mu,
    #[serde(default)]
    pub retrograde: bool,
    #[serde(default)]
    pub max_revolutions: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    M2e,
    E2m,
    E2f,
    F2e,
    F2m,
    M2f,
    H2n,
    N2h,
    H2f,
    F2h,
    F2n,
    N2f,
    Zeta2f,
    F2zeta,
    N2zeta,
    Zeta2n,
}

impl Conversion {
    fn scalar(self) -> fn(f64, f64) -> kepcore::Result<f64> {
        match self {
            Conversion::M2e => anomaly::m2e,
            Conversion::E2m => anomaly::e2m,
            Conversion::E2f => anomaly::e2f,
            Conversion::F2e => anomaly::f2e,
            Conversion::F2m => anomaly::f2m,
            Conversion::M2f => anomaly::m2f,
            Conversion::H2n => anomaly::h2n,
            Conversion::N2h => anomaly::n2h,
            Conversion::H2f => anomaly::h2f,
            Conversion::F2h => anomaly::f2h,
            Conversion::F2n => anomaly::f2n,
            Conversion::N2f => anomaly::n2f,
            Conversion::Zeta2f => anomaly::zeta2f,
            Conversion::F2zeta => anomaly::f2zeta,
            Conversion::N2zeta => anomaly::n2zeta,
            Conversion::Zeta2n => anomaly::zeta2n,
        }
    }
}

/// One eccentricity for every value, or one each.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Ecc {
    One(f64),
    Each(Vec<f64>),
}

impl<'a> From<&'a Ecc> for Eccentricities<'a> {
    fn from(ecc: &'a Ecc) -> Self {
        match ecc {
            Ecc::One(e) => Eccentricities::Broadcast(*e),
            Ecc::Each(es) => Eccentricities::PerElement(es),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnomalyJob {
    pub conversion: Conversion,
    pub values: Vec<f64>,
    pub ecc: Ecc,
}

#[derive(Clone, Debug, Serialize)]
pub struct LambertReport {
    pub name: String,
    pub n_max: u32,
    pub solutions: Vec<LambertSolution>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnomalyReport {
    pub conversion: Conversion,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub lambert: Vec<LambertReport>,
    pub anomaly: Vec<AnomalyReport>,
}

impl LambertJob {
    fn run(&self, index: usize) -> eyre::Result<LambertReport> {
        let name = self.name.clone().unwrap_or_else(|| format!("lambert-{index}"));
        let mu = self.mu.resolve().wrap_err_with(|| format!("in job '{name}'"))?;
        let lp = LambertProblem::new(
            Vector3::from(self.r0),
            Vector3::from(self.r1),
            self.tof,
            mu,
            self.retrograde,
            self.max_revolutions,
        )
        .wrap_err_with(|| format!("in job '{name}'"))?;
        info!(job = %name, solutions = lp.solutions().len(), "lambert job done");
        Ok(LambertReport {
            name,
            n_max: lp.n_max(),
            solutions: lp.into_solutions(),
        })
    }
}

impl AnomalyJob {
    fn run(&self, index: usize) -> eyre::Result<AnomalyReport> {
        let values = anomaly::map_v(&self.values, &self.ecc, self.conversion.scalar())
            .wrap_err_with(|| format!("in anomaly job {index} ({:?})", self.conversion))?;
        Ok(AnomalyReport {
            conversion: self.conversion,
            values,
        })
    }
}

impl Jobs {
    pub fn parse(text: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Run every job. Lambert jobs are independent and run in parallel.
    pub fn run(&self) -> eyre::Result<Report> {
        let lambert = self
            .lambert
            .par_iter()
            .enumerate()
            .map(|(i, job)| job.run(i))
            .collect::<eyre::Result<Vec<_>>>()?;
        let anomaly = self
            .anomaly
            .iter()
            .enumerate()
            .map(|(i, job)| job.run(i))
            .collect::<eyre::Result<Vec<_>>>()?;
        Ok(Report { lambert, anomaly })
    }
}
