//! Step-size schedule for convergence sweeps
//!
//! A schedule holds `ndt` step sizes `dt_i = dt_max / (i + 1)`, which is
//! strictly decreasing by construction: the harmonic sequence never repeats
//! a value, so successive runs always refine the previous one.

use std::ops::Index;

use crate::error::{Error, Result};

/// Ordered, strictly decreasing sequence of positive step sizes
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchedule {
    steps: Vec<f64>,
}

impl StepSchedule {
    /// Generate `ndt` step sizes `dt_max / (i + 1)` for `i = 0..ndt`.
    ///
    /// # Errors
    /// `InvalidParameter` if `dt_max` is not positive and finite, or if
    /// `ndt < 1`.
    pub fn generate(dt_max: f64, ndt: usize) -> Result<Self> {
        if !dt_max.is_finite() || dt_max <= 0.0 {
            return Err(Error::invalid(format!(
                "dtMax must be positive and finite, got {}",
                dt_max
            )));
        }
        if ndt < 1 {
            return Err(Error::invalid("number of step sizes must be at least 1"));
        }

        let steps: Vec<f64> = (0..ndt).map(|i| dt_max / (i + 1) as f64).collect();

        // Deep in the harmonic tail two neighbours could round to the same
        // double or underflow; refuse rather than hand out a non-refining sweep.
        if let Some(i) = steps.windows(2).position(|w| w[1] >= w[0]) {
            return Err(Error::invalid(format!(
                "step sizes {} and {} are not strictly decreasing",
                steps[i],
                steps[i + 1]
            )));
        }
        if let Some(&last) = steps.last() {
            if last <= 0.0 {
                return Err(Error::invalid("step sizes underflow to zero"));
            }
        }

        log::info!(
            "Creating dt steps: {}",
            steps
                .iter()
                .map(|dt| format!("{:.6}", dt))
                .collect::<Vec<_>>()
                .join(" ")
        );

        Ok(Self { steps })
    }

    /// Largest step size (the first entry)
    pub fn dt_max(&self) -> f64 {
        self.steps[0]
    }

    /// Number of step sizes
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`: a schedule holds at least one step size
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step sizes in schedule order
    pub fn as_slice(&self) -> &[f64] {
        &self.steps
    }

    /// Iterate over step sizes in schedule order
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.steps.iter()
    }
}

impl Index<usize> for StepSchedule {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.steps[index]
    }
}

impl<'a> IntoIterator for &'a StepSchedule {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
