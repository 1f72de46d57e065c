//! Epochs, as a duration since 2000-01-01T00:00:00.

use std::{fmt, ops};

use serde::{Deserialize, Serialize};
use time::{
    format_description::FormatItem,
    macros::{datetime, format_description},
    Duration, PrimitiveDateTime,
};

use crate::error::{KepError, Result};

const SECONDS_PER_DAY: f64 = 86400.0;
/// MJD of the MJD2000 origin.
const MJD_OFFSET: f64 = 51544.0;
/// JD of the MJD2000 origin.
const JD_OFFSET: f64 = 2_451_544.5;
/// Keeps `Duration::seconds_f64` well inside `i64` seconds.
const MAX_DAYS: f64 = 1e12;

const ORIGIN: PrimitiveDateTime = datetime!(2000-01-01 0:00);

const ISO_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]");

/// The day count an [`Epoch`] is given in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JulianType {
    /// Modified Julian Date 2000, days since 2000-01-01T00:00:00.
    #[default]
    Mjd2000,
    /// Modified Julian Date.
    Mjd,
    /// Julian Date.
    Jd,
}

impl JulianType {
    fn offset(self) -> f64 {
        match self {
            JulianType::Mjd2000 => 0.0,
            JulianType::Mjd => MJD_OFFSET,
            JulianType::Jd => JD_OFFSET,
        }
    }
}

#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Epoch(Duration);

impl Epoch {
    /// An epoch from a fractional day count.
    pub fn from_julian(days: f64, kind: JulianType) -> Result<Self> {
        let days = days - kind.offset();
        if !days.is_finite() || days.abs() > MAX_DAYS {
            return Err(KepError::domain(
                "days",
                format!("day count must be finite and representable, got {days}"),
            ));
        }
        Ok(Self(Duration::seconds_f64(days * SECONDS_PER_DAY)))
    }

    pub fn from_datetime(datetime: PrimitiveDateTime) -> Self {
        Self(datetime - ORIGIN)
    }

    /// The calendar date, or `None` outside the years `time` can
    /// represent.
    pub fn to_datetime(self) -> Option<PrimitiveDateTime> {
        ORIGIN.checked_add(self.0)
    }

    pub fn mjd2000(self) -> f64 {
        self.0.as_seconds_f64() / SECONDS_PER_DAY
    }

    pub fn mjd(self) -> f64 {
        self.mjd2000() + MJD_OFFSET
    }

    pub fn jd(self) -> f64 {
        self.mjd2000() + JD_OFFSET
    }

    pub fn into_duration(self) -> Duration {
        self.0
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }
}

impl ops::Sub<Epoch> for Epoch {
    type Output = Duration;

    fn sub(self, rhs: Epoch) -> Self::Output {
        self.0 - rhs.0
    }
}

impl ops::Sub<Duration> for Epoch {
    type Output = Epoch;

    fn sub(self, rhs: Duration) -> Self::Output {
        Epoch(self.0 - rhs)
    }
}

impl ops::Add<Duration> for Epoch {
    type Output = Epoch;

    fn add(self, rhs: Duration) -> Self::Output {
        Epoch(self.0 + rhs)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format(ISO_FORMAT).map_err(|_| fmt::Error)?),
            None => write!(f, "MJD2000({})", self.mjd2000()),
        }
    }
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch({self})")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn julian_offsets() {
        let zero = Epoch::default();
        assert_eq!(zero.mjd2000(), 0.0);
        assert_eq!(zero.mjd(), 51544.0);
        assert_eq!(zero.jd(), 2_451_544.5);
        assert_eq!(Epoch::from_julian(51544.0, JulianType::Mjd).unwrap(), zero);
        assert_eq!(Epoch::from_julian(2_451_544.5, JulianType::Jd).unwrap(), zero);
        assert_relative_eq!(
            Epoch::from_julian(123.456, JulianType::Mjd2000).unwrap().mjd2000(),
            123.456,
            max_relative = 1e-12
        );
    }

    #[test]
    fn datetime_round_trip() {
        let dt = datetime!(2034-05-17 12:30:00);
        let ep = Epoch::from_datetime(dt);
        assert_eq!(ep.to_datetime(), Some(dt));
        assert_eq!(ep.to_string(), "2034-05-17T12:30:00.000");
        assert_eq!(Epoch::default().to_string(), "2000-01-01T00:00:00.000");
    }

    #[test]
    fn arithmetic() {
        let a = Epoch::from_julian(10.0, JulianType::Mjd2000).unwrap();
        let b = a + Duration::days(3);
        assert_eq!(b - a, Duration::days(3));
        assert_eq!(b - Duration::days(3), a);
        assert!(a < b);
    }

    #[test]
    fn non_finite_days_are_rejected() {
        let err = Epoch::from_julian(f64::NAN, JulianType::Jd).unwrap_err();
        assert_eq!(err.argument(), Some("days"));
        assert!(Epoch::from_julian(f64::INFINITY, JulianType::Mjd2000).is_err());
    }
}
