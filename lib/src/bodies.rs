//! Definitions of celestial bodies.
//!
//! A [`Planet`] is anything that can report its position and velocity
//! at an epoch. The remaining capabilities are optional and default to
//! "unknown".

use std::f64::consts;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{KepError, Result},
    time::Epoch,
};

/// Sun gravitational parameter (`m^3/s^2`)
pub const MU_SUN: f64 = 1.327_124_400_18e20;
/// Mercury gravitational parameter (`m^3/s^2`)
pub const MU_MERCURY: f64 = 2.203_2e13;
/// Venus gravitational parameter (`m^3/s^2`)
pub const MU_VENUS: f64 = 3.248_59e14;
/// Earth gravitational parameter (`m^3/s^2`)
pub const MU_EARTH: f64 = 3.986_004_418e14;
/// Moon gravitational parameter (`m^3/s^2`)
pub const MU_MOON: f64 = 4.904_869_5e12;
/// Mars gravitational parameter (`m^3/s^2`)
pub const MU_MARS: f64 = 4.282_837e13;
/// Jupiter gravitational parameter (`m^3/s^2`)
pub const MU_JUPITER: f64 = 1.266_865_34e17;
/// Saturn gravitational parameter (`m^3/s^2`)
pub const MU_SATURN: f64 = 3.793_118_7e16;
/// Uranus gravitational parameter (`m^3/s^2`)
pub const MU_URANUS: f64 = 5.793_939e15;
/// Neptune gravitational parameter (`m^3/s^2`)
pub const MU_NEPTUNE: f64 = 6.836_529e15;
/// Pluto gravitational parameter (`m^3/s^2`)
pub const MU_PLUTO: f64 = 8.71e11;

static MU_TABLE: &[(&str, f64)] = &[
    ("sun", MU_SUN),
    ("mercury", MU_MERCURY),
    ("venus", MU_VENUS),
    ("earth", MU_EARTH),
    ("moon", MU_MOON),
    ("mars", MU_MARS),
    ("jupiter", MU_JUPITER),
    ("saturn", MU_SATURN),
    ("uranus", MU_URANUS),
    ("neptune", MU_NEPTUNE),
    ("pluto", MU_PLUTO),
];

/// Look up a gravitational parameter (`m^3/s^2`) by body name, ignoring
/// case.
pub fn mu_by_name(name: &str) -> Option<f64> {
    MU_TABLE
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, mu)| mu)
}

/// Orbital period from the two-body energy of a state.
pub fn period_from_energy(r: &Vector3<f64>, v: &Vector3<f64>, mu: f64) -> Result<f64> {
    let energy = v.norm_squared() / 2.0 - mu / r.norm();
    if energy.is_nan() || energy >= 0.0 {
        return Err(KepError::domain(
            "r",
            format!("state is not on a closed orbit (specific energy {energy})"),
        ));
    }
    let a = -mu / (2.0 * energy);
    Ok(2.0 * consts::PI * (a.powi(3) / mu).sqrt())
}

/// A celestial body with ephemerides.
pub trait Planet: Send + Sync {
    /// Position and velocity at `when`.
    fn eph(&self, when: Epoch) -> [Vector3<f64>; 2];

    fn name(&self) -> String {
        std::any::type_name::<Self>().to_owned()
    }

    /// Gravitational parameter of the body this one orbits.
    fn mu_central_body(&self) -> Option<f64> {
        None
    }

    fn mu_self(&self) -> Option<f64> {
        None
    }

    fn radius(&self) -> Option<f64> {
        None
    }

    /// Minimum safe distance from the center, e.g. for flybys.
    fn safe_radius(&self) -> Option<f64> {
        None
    }

    fn extra_info(&self) -> String {
        String::new()
    }

    /// Orbital period at `when`. Without an override this comes from the
    /// energy of [`Planet::eph`], which needs [`Planet::mu_central_body`].
    fn period(&self, when: Epoch) -> Result<f64> {
        let mu = self.mu_central_body().ok_or_else(|| KepError::NotImplemented {
            what: "period",
            planet: self.name(),
        })?;
        let [r, v] = self.eph(when);
        period_from_energy(&r, &v, mu)
    }

    fn eph_v(&self, when: &[Epoch]) -> Vec<[Vector3<f64>; 2]> {
        when.iter().map(|&t| self.eph(t)).collect()
    }
}

/// A body on a circular orbit in the reference xy-plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircularPlanet {
    pub name: String,
    /// Orbit radius
    pub orbit_radius: f64,
    /// Gravitational parameter of the central body
    pub mu_central_body: f64,
    /// Longitude at `epoch` (`rad`)
    pub longitude: f64,
    pub epoch: Epoch,
}

impl CircularPlanet {
    fn mean_motion(&self) -> f64 {
        (self.mu_central_body / self.orbit_radius.powi(3)).sqrt()
    }
}

impl Planet for CircularPlanet {
    fn eph(&self, when: Epoch) -> [Vector3<f64>; 2] {
        let n = self.mean_motion();
        let theta = self.longitude + n * (when - self.epoch).as_seconds_f64();
        let (sin, cos) = theta.sin_cos();
        let speed = n * self.orbit_radius;
        [
            Vector3::new(cos, sin, 0.0) * self.orbit_radius,
            Vector3::new(-sin, cos, 0.0) * speed,
        ]
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn mu_central_body(&self) -> Option<f64> {
        Some(self.mu_central_body)
    }

    fn period(&self, _when: Epoch) -> Result<f64> {
        Ok(2.0 * consts::PI / self.mean_motion())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use time::Duration;

    use super::*;

    struct Fixed;

    impl Planet for Fixed {
        fn eph(&self, _when: Epoch) -> [Vector3<f64>; 2] {
            [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]
        }
    }

    fn earth_like() -> CircularPlanet {
        CircularPlanet {
            name: "earth".into(),
            orbit_radius: 1.495_978_707e11,
            mu_central_body: MU_SUN,
            longitude: 0.0,
            epoch: Epoch::default(),
        }
    }

    #[test]
    fn mu_lookup_ignores_case() {
        assert_eq!(mu_by_name("Earth"), Some(MU_EARTH));
        assert_eq!(mu_by_name("SUN"), Some(MU_SUN));
        assert_eq!(mu_by_name("vulcan"), None);
    }

    #[test]
    fn defaults_are_unknown() {
        let p = Fixed;
        assert!(p.name().ends_with("Fixed"));
        assert_eq!(p.mu_self(), None);
        assert_eq!(p.radius(), None);
        assert_eq!(p.safe_radius(), None);
        assert_eq!(p.extra_info(), "");
        let err = p.period(Epoch::default()).unwrap_err();
        assert!(matches!(err, KepError::NotImplemented { what: "period", .. }));
    }

    #[test]
    fn period_falls_back_to_energy() {
        struct Unit;
        impl Planet for Unit {
            fn eph(&self, _when: Epoch) -> [Vector3<f64>; 2] {
                [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]
            }
            fn mu_central_body(&self) -> Option<f64> {
                Some(1.0)
            }
        }
        assert_relative_eq!(Unit.period(Epoch::default()).unwrap(), 2.0 * consts::PI);
    }

    #[test]
    fn escape_state_has_no_period() {
        let r = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, 2.0, 0.0);
        assert!(period_from_energy(&r, &v, 1.0).unwrap_err().is_domain());
    }

    #[test]
    fn circular_planet_moves() {
        let p = earth_like();
        let year = p.period(Epoch::default()).unwrap();
        assert_relative_eq!(year / 86400.0, 365.25, max_relative = 1e-3);

        let later = Epoch::default() + Duration::seconds_f64(year / 4.0);
        let [r, v] = p.eph(later);
        assert_relative_eq!(r.x, 0.0, epsilon = 1.0);
        assert_relative_eq!(r.y, p.orbit_radius, max_relative = 1e-12);
        assert!((r.dot(&v) / (r.norm() * v.norm())).abs() < 1e-12);

        let states = p.eph_v(&[Epoch::default(), later]);
        assert_eq!(states.len(), 2);
        assert_eq!(states[1][0], r);
    }
}
