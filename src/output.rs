//! File output for sweeps
//!
//! Each algorithm writes two files into the export directory:
//!
//! - its trajectory file (`eulero.csv`, `leapfrog.csv`, ...), holding one
//!   `#t,x,v,dE` block per step size
//! - its recap file `RECAP_<trajectory file>`, holding the `#dt,t,x,v,dE`
//!   summary table
//!
//! Both are truncated when a sweep starts. Recap rows are appended and
//! flushed as each run completes, so an aborted sweep leaves every finished
//! run on disk.

use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::oscillator::Oscillator;
use crate::recorder::CsvTrajectoryWriter;
use crate::schedule::StepSchedule;
use crate::solver::{Algorithm, Integrator};
use crate::sweep::{self, RecapWriter, SweepResult};

/// Paths of the output files inside an export directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Export directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir/<trajectory file>`
    pub fn trajectory_path(&self, algorithm: Algorithm) -> PathBuf {
        self.dir.join(algorithm.trajectory_file_name())
    }

    /// `dir/RECAP_<trajectory file>`
    pub fn recap_path(&self, algorithm: Algorithm) -> PathBuf {
        self.dir.join(algorithm.recap_file_name())
    }

    /// Create the export directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.is_dir() {
            log::info!("Creating export directory {}", self.dir.display());
        }
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }

    fn create(&self, path: &Path) -> Result<BufWriter<File>> {
        log::info!("Writing on: {}", path.display());
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map(BufWriter::new)
            .map_err(|e| Error::io(path, e))
    }
}

/// Sweep `algorithm` over `schedule`, writing its trajectory and recap files
/// into `config.export_dir`.
///
/// # Errors
/// Setup failures (directory, file creation) are returned as `Io`. A failure
/// during the sweep is returned as `SweepAborted`; the recap file then holds
/// one row per completed run.
pub fn sweep_to_files(
    algorithm: Algorithm,
    osc: &Oscillator,
    t_total: f64,
    schedule: &StepSchedule,
    config: &SweepConfig,
) -> Result<SweepResult> {
    let layout = OutputLayout::new(&config.export_dir);
    layout.ensure_dir()?;

    let trajectory_path = layout.trajectory_path(algorithm);
    let recap_path = layout.recap_path(algorithm);

    let mut trajectory =
        CsvTrajectoryWriter::new(layout.create(&trajectory_path)?, &trajectory_path);
    let recap_error = |e: csv::Error| Error::io(&recap_path, e.into());
    let mut recap = RecapWriter::new(layout.create(&recap_path)?).map_err(recap_error)?;
    recap.flush().map_err(recap_error)?;

    let integrator = Integrator::new(algorithm).with_alignment(config.alignment);
    let name = algorithm.trajectory_file_name();

    let mut write_row = |row: &sweep::RecapRow| -> Result<()> {
        recap.write_row(row).map_err(recap_error)?;
        recap.flush().map_err(recap_error)
    };

    #[cfg(feature = "parallel")]
    let result = sweep::sweep_parallel_with(
        &integrator,
        osc,
        t_total,
        schedule,
        &mut trajectory,
        name,
        &mut write_row,
    );
    #[cfg(not(feature = "parallel"))]
    let result = sweep::sweep_with(
        &integrator,
        osc,
        t_total,
        schedule,
        &mut trajectory,
        name,
        &mut write_row,
    );

    // Keep whatever was written before a failure
    let flushed = trajectory.into_inner().map(|_| ());
    let result = result?;
    flushed?;

    log::info!(
        "{}: {} run(s) written to {} and {}",
        algorithm,
        result.rows.len(),
        trajectory_path.display(),
        recap_path.display()
    );
    Ok(result)
}
