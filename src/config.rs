//! Run configuration
//!
//! Oscillator parameters are read as four `key=value` lines:
//!
//! ```text
//! m=1.0
//! k=1.0
//! v0=0.0
//! x0=1.0
//! ```
//!
//! Blank lines and whitespace around keys and values are ignored. Every key
//! must appear exactly once; anything else is rejected.

use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::solver::FinalSampleAlignment;

/// Default directory all output files are written to
pub const DEFAULT_EXPORT_DIR: &str = "csv";

/// Environment variable overriding the export directory in the binary
pub const EXPORT_DIR_ENV: &str = "HARMONIC_DRIFT_EXPORT_DIR";

/// Raw oscillator parameters as read from input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParams {
    /// Mass
    pub m: f64,
    /// Spring constant
    pub k: f64,
    /// Initial velocity
    pub v0: f64,
    /// Initial position
    pub x0: f64,
}

impl OscillatorParams {
    /// Parse `m`, `k`, `v0` and `x0` from `key=value` lines.
    ///
    /// # Errors
    /// `InvalidParameter` for unknown, duplicate or missing keys and for
    /// values that are not floating-point numbers; `Io` if reading fails.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut values: [Option<f64>; 4] = [None; 4];

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io("<input>", e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                Error::invalid(format!("line {}: expected key=value, got '{}'", line_no + 1, line))
            })?;
            let key = key.trim();
            let slot = match key {
                "m" => 0,
                "k" => 1,
                "v0" => 2,
                "x0" => 3,
                _ => {
                    return Err(Error::invalid(format!(
                        "line {}: unknown key '{}'",
                        line_no + 1,
                        key
                    )))
                }
            };
            if values[slot].is_some() {
                return Err(Error::invalid(format!("duplicate key '{}'", key)));
            }
            let value = value.trim().parse::<f64>().map_err(|_| {
                Error::invalid(format!(
                    "line {}: '{}' is not a number for {}",
                    line_no + 1,
                    value.trim(),
                    key
                ))
            })?;
            values[slot] = Some(value);
        }

        let get = |slot: usize, key: &str| {
            values[slot].ok_or_else(|| Error::invalid(format!("missing key '{}'", key)))
        };

        Ok(Self {
            m: get(0, "m")?,
            k: get(1, "k")?,
            v0: get(2, "v0")?,
            x0: get(3, "x0")?,
        })
    }
}

impl FromStr for OscillatorParams {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}

/// Settings shared by every sweep of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Directory receiving trajectory and recap files
    pub export_dir: PathBuf,
    /// Final-sample convention for recap rows
    pub alignment: FinalSampleAlignment,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            alignment: FinalSampleAlignment::PostLoop,
        }
    }
}

impl SweepConfig {
    /// Default configuration with the export directory taken from
    /// `HARMONIC_DRIFT_EXPORT_DIR` when it is set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(EXPORT_DIR_ENV).filter(|d| !d.is_empty()) {
            config.export_dir = PathBuf::from(dir);
        }
        config
    }
}
