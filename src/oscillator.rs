//! One-dimensional simple harmonic oscillator
//!
//! The oscillator is described by its mass `m`, spring constant `k` and
//! initial conditions `(x0, v0)`. Its equation of motion is
//!
//!   x'' = -w² x,    w² = k / m
//!
//! and its mechanical energy
//!
//!   E(x, v) = (m/2) (v² + w² x²)
//!
//! is conserved exactly by the continuous dynamics, so any change measured
//! along a numerical trajectory is integration error.

use std::fmt;

use crate::config::OscillatorParams;
use crate::error::{Error, Result};

/// Simple harmonic oscillator with derived `w²` and initial energy `E0`.
///
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    m: f64,
    k: f64,
    v0: f64,
    x0: f64,
    w2: f64,
    e0: f64,
}

impl Oscillator {
    /// Build an oscillator from mass, spring constant and initial conditions.
    ///
    /// # Errors
    /// `InvalidParameter` if `m <= 0`, `k < 0` or any value is not finite.
    /// A zero initial energy is accepted here; it is rejected when a run
    /// needs the relative drift.
    pub fn new(m: f64, k: f64, v0: f64, x0: f64) -> Result<Self> {
        for (name, value) in [("m", m), ("k", k), ("v0", v0), ("x0", x0)] {
            if !value.is_finite() {
                return Err(Error::invalid(format!("{} must be finite, got {}", name, value)));
            }
        }
        if m <= 0.0 {
            return Err(Error::invalid(format!("mass must be positive, got m = {}", m)));
        }
        if k < 0.0 {
            return Err(Error::invalid(format!(
                "spring constant must be non-negative, got k = {}",
                k
            )));
        }

        let w2 = k / m;
        let e0 = mechanical_energy(m, w2, v0, x0);

        Ok(Self {
            m,
            k,
            v0,
            x0,
            w2,
            e0,
        })
    }

    /// Mass
    pub fn mass(&self) -> f64 {
        self.m
    }

    /// Spring constant
    pub fn spring_constant(&self) -> f64 {
        self.k
    }

    /// Initial velocity
    pub fn v0(&self) -> f64 {
        self.v0
    }

    /// Initial position
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// Angular frequency squared, `k / m`
    pub fn w2(&self) -> f64 {
        self.w2
    }

    /// Mechanical energy of the initial state
    pub fn initial_energy(&self) -> f64 {
        self.e0
    }

    /// Period of the exact motion, `2π / w` (infinite when `k = 0`)
    pub fn period(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.w2.sqrt()
    }

    /// Mechanical energy `(m/2)(v² + w² x²)`
    pub fn energy(&self, v: f64, x: f64) -> f64 {
        mechanical_energy(self.m, self.w2, v, x)
    }

    /// Acceleration `-w² x`.
    ///
    /// Unscaled: integrators multiply by whatever fraction of `dt` their
    /// update rule needs.
    pub fn acceleration(&self, x: f64) -> f64 {
        -self.w2 * x
    }

    /// Relative energy drift `|E(x, v) - E0| / E0`.
    ///
    /// # Errors
    /// `UndefinedDrift` when `E0 = 0`.
    pub fn energy_drift(&self, v: f64, x: f64) -> Result<f64> {
        self.ensure_drift_defined()?;
        Ok(self.relative_drift(v, x))
    }

    pub(crate) fn ensure_drift_defined(&self) -> Result<()> {
        if self.e0 == 0.0 {
            return Err(Error::UndefinedDrift);
        }
        Ok(())
    }

    /// Drift without the `E0` check; callers validate once per run.
    pub(crate) fn relative_drift(&self, v: f64, x: f64) -> f64 {
        (self.energy(v, x) - self.e0).abs() / self.e0
    }
}

impl TryFrom<OscillatorParams> for Oscillator {
    type Error = Error;

    fn try_from(params: OscillatorParams) -> Result<Self> {
        Oscillator::new(params.m, params.k, params.v0, params.x0)
    }
}

impl fmt::Display for Oscillator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Oscillator: m={:.6}, k={:.6}, v0={:.6}, x0={:.6}, E0={:.6}, w2={:.6}",
            self.m, self.k, self.v0, self.x0, self.e0, self.w2
        )
    }
}

fn mechanical_energy(m: f64, w2: f64, v: f64, x: f64) -> f64 {
    (m / 2.0) * (v * v + w2 * x * x)
}
