//! Two-body problem solvers.

pub mod anomaly;
pub mod lambert;
pub mod solve;

pub use lambert::{Branch, LambertProblem, LambertSolution};
pub use solve::{KeplerEquation, Tolerance};
