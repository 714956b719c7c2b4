//! Trajectory recording
//!
//! A [`TrajectoryRecorder`] observes integration runs: it is opened once per
//! run with the trajectory name and step size, receives every sample in step
//! order tagged with its index, and is closed when the run completes.
//!
//! Two recorders are provided:
//!
//! - [`MemoryRecorder`] keeps every run in memory, for analysis and tests
//!   and as the per-run partition of a parallel sweep
//! - [`CsvTrajectoryWriter`] streams runs to any `Write` as blocks of
//!   `#t,x,v,dE` CSV, each followed by a blank separator line

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::solver::Sample;

/// Header line of every trajectory block
pub const TRAJECTORY_HEADER: [&str; 4] = ["#t", "x", "v", "dE"];

/// Observer of per-step samples.
pub trait TrajectoryRecorder {
    /// Called once before the first sample of a run.
    fn begin_run(&mut self, name: &str, dt: f64) -> Result<()>;

    /// Called for every sample, in step order, starting with index 0.
    fn record(&mut self, index: usize, sample: &Sample) -> Result<()>;

    /// Called once after the last sample of a run.
    fn end_run(&mut self) -> Result<()>;
}

/// One recorded run
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRun {
    /// Trajectory name the run was tagged with
    pub name: String,
    /// Step size of the run
    pub dt: f64,
    /// Samples in step order
    pub samples: Vec<Sample>,
    /// Whether `end_run` was reached
    pub complete: bool,
}

impl RecordedRun {
    /// Replay this run into another recorder
    pub fn replay(&self, recorder: &mut dyn TrajectoryRecorder) -> Result<()> {
        recorder.begin_run(&self.name, self.dt)?;
        for (index, sample) in self.samples.iter().enumerate() {
            recorder.record(index, sample)?;
        }
        recorder.end_run()
    }
}

/// Recorder keeping every run in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    runs: Vec<RecordedRun>,
}

impl MemoryRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs in the order they were begun
    pub fn runs(&self) -> &[RecordedRun] {
        &self.runs
    }

    /// Take ownership of the recorded runs
    pub fn into_runs(self) -> Vec<RecordedRun> {
        self.runs
    }
}

impl TrajectoryRecorder for MemoryRecorder {
    fn begin_run(&mut self, name: &str, dt: f64) -> Result<()> {
        self.runs.push(RecordedRun {
            name: name.to_string(),
            dt,
            samples: Vec::new(),
            complete: false,
        });
        Ok(())
    }

    fn record(&mut self, index: usize, sample: &Sample) -> Result<()> {
        let run = self
            .runs
            .last_mut()
            .ok_or_else(|| Error::invalid("sample recorded before begin_run"))?;
        debug_assert_eq!(index, run.samples.len(), "samples must arrive in step order");
        run.samples.push(*sample);
        Ok(())
    }

    fn end_run(&mut self) -> Result<()> {
        if let Some(run) = self.runs.last_mut() {
            run.complete = true;
        }
        Ok(())
    }
}

/// Streams runs as CSV blocks to a writer.
///
/// Each run produces:
///
/// ```text
/// #t,x,v,dE
/// 0.000000,1.000000,0.000000,0.000000
/// ...
///
///
/// ```
///
/// Rows use six decimals. The block is closed by two newline characters,
/// which leaves a blank line between consecutive blocks.
pub struct CsvTrajectoryWriter<W: Write> {
    target: PathBuf,
    idle: Option<W>,
    active: Option<csv::Writer<W>>,
    runs_written: usize,
}

impl<W: Write> CsvTrajectoryWriter<W> {
    /// Wrap `writer`. `target` names the destination in error messages.
    pub fn new(writer: W, target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            idle: Some(writer),
            active: None,
            runs_written: 0,
        }
    }

    /// Destination label used in errors
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Number of runs whose block was fully written
    pub fn runs_written(&self) -> usize {
        self.runs_written
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    /// `InvalidParameter` if a run is still open.
    pub fn into_inner(mut self) -> Result<W> {
        if self.active.is_some() {
            return Err(Error::invalid("trajectory block still open"));
        }
        let mut writer = self
            .idle
            .take()
            .ok_or_else(|| Error::invalid("trajectory writer already consumed"))?;
        writer.flush().map_err(|e| Error::io(&self.target, e))?;
        Ok(writer)
    }

    fn active(&mut self) -> Result<&mut csv::Writer<W>> {
        self.active
            .as_mut()
            .ok_or_else(|| Error::invalid("sample recorded before begin_run"))
    }
}

impl<W: Write> TrajectoryRecorder for CsvTrajectoryWriter<W> {
    fn begin_run(&mut self, name: &str, dt: f64) -> Result<()> {
        let writer = self
            .idle
            .take()
            .ok_or_else(|| Error::invalid("trajectory block already open"))?;
        log::debug!(
            "{}: begin block '{}' (dt = {:.6})",
            self.target.display(),
            name,
            dt
        );

        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        csv.write_record(TRAJECTORY_HEADER)
            .map_err(|e| Error::io(&self.target, e.into()))?;
        self.active = Some(csv);
        Ok(())
    }

    fn record(&mut self, _index: usize, sample: &Sample) -> Result<()> {
        let target = self.target.clone();
        self.active()?
            .write_record(sample.to_record())
            .map_err(|e| Error::io(target, e.into()))
    }

    fn end_run(&mut self) -> Result<()> {
        let csv = self
            .active
            .take()
            .ok_or_else(|| Error::invalid("end_run without begin_run"))?;
        let mut writer = csv
            .into_inner()
            .map_err(|e| Error::io(&self.target, e.into_error()))?;
        writer
            .write_all(b"\n\n")
            .map_err(|e| Error::io(&self.target, e))?;
        self.idle = Some(writer);
        self.runs_written += 1;
        log::debug!("{}: closed block {}", self.target.display(), self.runs_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, x: f64) -> Sample {
        Sample {
            t,
            x,
            v: -x,
            drift: 0.0,
        }
    }

    #[test]
    fn test_memory_recorder_keeps_runs_in_order() {
        let mut recorder = MemoryRecorder::new();
        recorder.begin_run("a", 0.1).unwrap();
        recorder.record(0, &sample(0.0, 1.0)).unwrap();
        recorder.record(1, &sample(0.1, 0.9)).unwrap();
        recorder.end_run().unwrap();
        recorder.begin_run("a", 0.05).unwrap();
        recorder.record(0, &sample(0.0, 1.0)).unwrap();

        let runs = recorder.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].samples.len(), 2);
        assert!(runs[0].complete);
        assert_eq!(runs[1].dt, 0.05);
        assert!(!runs[1].complete);
    }

    #[test]
    fn test_record_without_run_fails() {
        let mut recorder = MemoryRecorder::new();
        assert!(recorder.record(0, &sample(0.0, 1.0)).is_err());

        let mut writer = CsvTrajectoryWriter::new(Vec::new(), "<memory>");
        assert!(writer.record(0, &sample(0.0, 1.0)).is_err());
        assert!(writer.end_run().is_err());
    }

    #[test]
    fn test_csv_blocks() {
        let mut writer = CsvTrajectoryWriter::new(Vec::new(), "<memory>");
        for dt in [0.1, 0.05] {
            writer.begin_run("leapfrog.csv", dt).unwrap();
            writer.record(0, &sample(0.0, 1.0)).unwrap();
            writer.record(1, &sample(dt, 0.5)).unwrap();
            writer.end_run().unwrap();
        }
        assert_eq!(writer.runs_written(), 2);

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "#t,x,v,dE\n\
             0.000000,1.000000,-1.000000,0.000000\n\
             0.100000,0.500000,-0.500000,0.000000\n\
             \n\n\
             #t,x,v,dE\n\
             0.000000,1.000000,-1.000000,0.000000\n\
             0.050000,0.500000,-0.500000,0.000000\n\
             \n\n"
        );
    }

    #[test]
    fn test_replay_reproduces_csv() {
        let mut memory = MemoryRecorder::new();
        memory.begin_run("x", 0.2).unwrap();
        memory.record(0, &sample(0.0, 1.0)).unwrap();
        memory.record(1, &sample(0.2, 0.8)).unwrap();
        memory.end_run().unwrap();

        let mut direct = CsvTrajectoryWriter::new(Vec::new(), "direct");
        direct.begin_run("x", 0.2).unwrap();
        direct.record(0, &sample(0.0, 1.0)).unwrap();
        direct.record(1, &sample(0.2, 0.8)).unwrap();
        direct.end_run().unwrap();

        let mut replayed = CsvTrajectoryWriter::new(Vec::new(), "replayed");
        memory.runs()[0].replay(&mut replayed).unwrap();

        assert_eq!(
            direct.into_inner().unwrap(),
            replayed.into_inner().unwrap()
        );
    }

    #[test]
    fn test_into_inner_with_open_block_fails() {
        let mut writer = CsvTrajectoryWriter::new(Vec::new(), "<memory>");
        writer.begin_run("x", 0.1).unwrap();
        assert!(writer.into_inner().is_err());
    }
}
