//! Error kinds shared by every stage of a drift study.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::solver::Algorithm;

/// Errors that can occur while building an oscillator, a step schedule,
/// running an integrator or writing its output.
#[derive(Error, Debug)]
pub enum Error {
    /// A physical or numerical parameter is out of range or malformed
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the invalid parameter
        message: String,
    },

    /// Step size is not a positive finite number
    #[error("Invalid step size dt = {dt}: must be positive and finite")]
    InvalidStep {
        /// Offending step size
        dt: f64,
    },

    /// Initial energy is zero, so the relative drift has no meaning
    #[error("Energy drift undefined: initial mechanical energy is zero")]
    UndefinedDrift,

    /// Algorithm index outside the supported table
    #[error("Unknown algorithm index {index}")]
    UnknownAlgorithm {
        /// Index that was requested
        index: i64,
    },

    /// An output destination could not be opened or written
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        /// Destination being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A sweep stopped part-way; the first `completed_runs` runs were fully written
    #[error(
        "{} sweep aborted at dt = {dt} after {completed_runs} completed run(s): {source}",
        algorithm.name()
    )]
    SweepAborted {
        /// Algorithm being swept
        algorithm: Algorithm,
        /// Step size of the run that failed
        dt: f64,
        /// Number of runs whose output is complete
        completed_runs: usize,
        /// Cause of the failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if output written before the failure may be incomplete.
    pub fn is_partial_output(&self) -> bool {
        matches!(self, Error::SweepAborted { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = Error::InvalidStep { dt: -0.5 };
        assert!(err.to_string().contains("-0.5"));

        let err = Error::UnknownAlgorithm { index: 7 };
        assert_eq!(err.to_string(), "Unknown algorithm index 7");
    }

    #[test]
    fn test_sweep_aborted_keeps_source() {
        let inner = Error::io("csv/leapfrog.csv", io::Error::other("disk full"));
        let err = Error::SweepAborted {
            algorithm: Algorithm::Leapfrog,
            dt: 0.05,
            completed_runs: 1,
            source: Box::new(inner),
        };

        assert!(err.is_partial_output());
        let message = err.to_string();
        assert!(message.contains("Leapfrog"), "message: {}", message);
        assert!(message.contains("disk full"), "message: {}", message);
        assert!(std::error::Error::source(&err).is_some());
    }
}
