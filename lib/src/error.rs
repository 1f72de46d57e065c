//! Errors reported by the solvers.

use thiserror::Error;

pub type Result<T, E = KepError> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum KepError {
    /// An argument is outside the domain of the requested operation.
    #[error("invalid `{argument}`: {reason}")]
    Domain {
        argument: &'static str,
        reason: String,
    },
    /// Vectorized inputs whose lengths do not match.
    #[error("got {values} values but {eccentricities} eccentricities")]
    LengthMismatch {
        values: usize,
        eccentricities: usize,
    },
    /// An iteration hit its cap (or produced a non-finite step) before
    /// reaching tolerance.
    #[error("root finding did not converge after {iterations} iterations (last step {step:e})")]
    Convergence { iterations: u32, step: f64 },
    /// A vectorized call failed at element `index`.
    #[error("element {index}: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<KepError>,
    },
    /// A planet does not provide a capability and no fallback applies.
    #[error("{what} is not available for planet '{planet}'")]
    NotImplemented { what: &'static str, planet: String },
}

impl KepError {
    pub(crate) fn domain(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::Domain {
            argument,
            reason: reason.into(),
        }
    }

    /// Whether this is a precondition violation, looking through
    /// [`KepError::Batch`].
    pub fn is_domain(&self) -> bool {
        match self {
            Self::Domain { .. } | Self::LengthMismatch { .. } => true,
            Self::Batch { source, .. } => source.is_domain(),
            _ => false,
        }
    }

    /// Whether this is a numerical non-convergence, looking through
    /// [`KepError::Batch`].
    pub fn is_convergence(&self) -> bool {
        match self {
            Self::Convergence { .. } => true,
            Self::Batch { source, .. } => source.is_convergence(),
            _ => false,
        }
    }

    /// The argument named by a domain error, if any.
    pub fn argument(&self) -> Option<&'static str> {
        match self {
            Self::Domain { argument, .. } => Some(*argument),
            Self::Batch { source, .. } => source.argument(),
            _ => None,
        }
    }
}
