//! # harmonic-drift: Energy Drift of Explicit Integrators
//!
//! Integrates the one-dimensional simple harmonic oscillator
//!
//!   m x'' = -k x
//!
//! with five explicit fixed-step schemes and measures how well each one
//! conserves the mechanical energy as a function of the step size.
//!
//! ## Features
//!
//! - Explicit Euler, Euler-Cromer, Leapfrog, Velocity Verlet and Position
//!   Verlet, dispatched from a single [`Algorithm`] enum
//! - Relative energy drift `|E - E0| / E0` sampled at every step
//! - Step-size sweeps over a harmonic schedule `dt_i = dtMax / (i + 1)`
//! - CSV trajectory and recap output compatible with gnuplot-style block files
//! - Optional parallel sweeps (`parallel` feature)
//!
//! ## Basic Usage
//!
//! ```rust
//! use harmonic_drift::{Algorithm, Integrator, Oscillator};
//!
//! // m = 1, k = 1, released from rest at x = 1: E0 = 0.5
//! let osc = Oscillator::new(1.0, 1.0, 0.0, 1.0).unwrap();
//!
//! // One period with dt = 0.1
//! let euler = Integrator::new(Algorithm::ExplicitEuler)
//!     .integrate(&osc, 6.283185, 0.1)
//!     .unwrap();
//! let verlet = Integrator::new(Algorithm::VelocityVerlet)
//!     .integrate(&osc, 6.283185, 0.1)
//!     .unwrap();
//!
//! assert!(euler.final_sample.drift > 0.5);
//! assert!(verlet.final_sample.drift < 0.02);
//! ```
//!
//! ## Sweeps
//!
//! ```rust
//! use harmonic_drift::{sweep, Algorithm, Integrator, MemoryRecorder, Oscillator, StepSchedule};
//!
//! let osc = Oscillator::new(1.0, 1.0, 0.0, 1.0).unwrap();
//! let schedule = StepSchedule::generate(0.1, 3).unwrap();
//! let mut recorder = MemoryRecorder::new();
//!
//! let result = sweep(
//!     &Integrator::new(Algorithm::Leapfrog),
//!     &osc,
//!     6.283185,
//!     &schedule,
//!     &mut recorder,
//!     "leapfrog.csv",
//! )
//! .unwrap();
//!
//! assert_eq!(result.rows.len(), 3);
//! assert_eq!(recorder.runs().len(), 3);
//! ```
//!
//! ## Final Sample Alignment
//!
//! Every run samples the state before advancing it. After the last
//! iteration the stored state is one step past the last sample, and by
//! default ([`FinalSampleAlignment::PostLoop`]) the final sample pairs that
//! post-loop state with the drift of the last recorded sample, which is what
//! the reference recap files contain. [`FinalSampleAlignment::LastRecorded`]
//! returns the last recorded sample unchanged instead.
//!
//! ## References
//!
//! 1. Hairer, E., Lubich, C., & Wanner, G. (2003). "Geometric numerical
//!    integration illustrated by the Störmer-Verlet method". Acta Numerica.
//!
//! 2. Cromer, A. (1981). "Stable solutions using the Euler approximation".
//!    American Journal of Physics 49, 455.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod oscillator;
pub mod output;
pub mod recorder;
pub mod schedule;
pub mod schemes;
pub mod solver;
pub mod sweep;

pub use config::{OscillatorParams, SweepConfig, DEFAULT_EXPORT_DIR, EXPORT_DIR_ENV};
pub use error::{Error, Result};
pub use oscillator::Oscillator;
pub use output::{sweep_to_files, OutputLayout};
pub use recorder::{CsvTrajectoryWriter, MemoryRecorder, RecordedRun, TrajectoryRecorder};
pub use schedule::StepSchedule;
pub use solver::{
    Algorithm, AlgorithmSelection, FinalSampleAlignment, Integrator, RunOutcome, Sample, Stats,
};
#[cfg(feature = "parallel")]
pub use sweep::sweep_parallel_with;
pub use sweep::{sweep, sweep_with, RecapRow, RecapWriter, SweepResult};
