//! Step-size sweeps
//!
//! A sweep runs one integrator once per entry of a [`StepSchedule`], in
//! schedule order, with recording enabled, and collects the final sample of
//! every run into a [`SweepResult`]. Runs share nothing but the read-only
//! oscillator, so with the `parallel` feature they can be computed
//! concurrently; their recorded output and summary rows are still emitted in
//! schedule order.

use std::io::Write;

use crate::error::{Error, Result};
use crate::oscillator::Oscillator;
use crate::recorder::TrajectoryRecorder;
use crate::schedule::StepSchedule;
use crate::solver::{Algorithm, Integrator, Sample, Stats};

/// Header line of a recap file
pub const RECAP_HEADER: [&str; 5] = ["#dt", "t", "x", "v", "dE"];

/// Summary of one run of a sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecapRow {
    /// Step size of the run
    pub dt: f64,
    /// Final sample of the run
    pub sample: Sample,
    /// Counters of the run
    pub stats: Stats,
}

impl RecapRow {
    /// Fields formatted with six decimals, in `dt,t,x,v,dE` column order
    pub fn to_record(&self) -> [String; 5] {
        let [t, x, v, de] = self.sample.to_record();
        [format!("{:.6}", self.dt), t, x, v, de]
    }
}

/// Per-step-size summaries of one algorithm, in schedule order
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    /// Algorithm that was swept
    pub algorithm: Algorithm,
    /// One row per schedule entry
    pub rows: Vec<RecapRow>,
}

impl SweepResult {
    /// `(dt, final sample)` pairs in schedule order
    pub fn pairs(&self) -> impl Iterator<Item = (f64, Sample)> + '_ {
        self.rows.iter().map(|row| (row.dt, row.sample))
    }

    /// Final drift of each run, in schedule order
    pub fn drifts(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.sample.drift).collect()
    }

    /// Write the recap table (`#dt,t,x,v,dE` header, then one row per run).
    pub fn write_recap<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut recap = RecapWriter::new(writer)?;
        for row in &self.rows {
            recap.write_row(row)?;
        }
        recap.flush()?;
        Ok(())
    }
}

/// Incremental recap table writer
pub struct RecapWriter<W: Write> {
    csv: csv::Writer<W>,
}

impl<W: Write> RecapWriter<W> {
    /// Start a table and write its header
    pub fn new(writer: W) -> csv::Result<Self> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        csv.write_record(RECAP_HEADER)?;
        Ok(Self { csv })
    }

    /// Append one row
    pub fn write_row(&mut self, row: &RecapRow) -> csv::Result<()> {
        self.csv.write_record(row.to_record())
    }

    /// Flush buffered rows to the underlying writer
    pub fn flush(&mut self) -> csv::Result<()> {
        self.csv.flush()?;
        Ok(())
    }
}

/// Run `integrator` once per step size, recording every run under `name`.
pub fn sweep(
    integrator: &Integrator,
    osc: &Oscillator,
    t_total: f64,
    schedule: &StepSchedule,
    recorder: &mut dyn TrajectoryRecorder,
    name: &str,
) -> Result<SweepResult> {
    sweep_with(integrator, osc, t_total, schedule, recorder, name, |_| Ok(()))
}

/// Like [`sweep`], calling `on_row` with each summary row as soon as its run
/// completes.
///
/// # Errors
/// A failing run (or `on_row`) stops the sweep with `SweepAborted`, which
/// records how many runs had completed.
pub fn sweep_with<F>(
    integrator: &Integrator,
    osc: &Oscillator,
    t_total: f64,
    schedule: &StepSchedule,
    recorder: &mut dyn TrajectoryRecorder,
    name: &str,
    mut on_row: F,
) -> Result<SweepResult>
where
    F: FnMut(&RecapRow) -> Result<()>,
{
    let algorithm = integrator.algorithm();
    let mut rows = Vec::with_capacity(schedule.len());

    for (i, &dt) in schedule.iter().enumerate() {
        let abort = |source: Error| Error::SweepAborted {
            algorithm,
            dt,
            completed_runs: i,
            source: Box::new(source),
        };

        let outcome = integrator
            .integrate_recorded(osc, t_total, dt, recorder, name)
            .map_err(abort)?;
        let row = RecapRow {
            dt,
            sample: outcome.final_sample,
            stats: outcome.stats,
        };
        on_row(&row).map_err(abort)?;
        rows.push(row);
    }

    Ok(SweepResult { algorithm, rows })
}

/// Parallel variant of [`sweep_with`].
///
/// Every run records into its own in-memory partition. Once all runs are
/// done, partitions are replayed into `recorder` and rows are passed to
/// `on_row` in schedule order, so the output is identical to the sequential
/// sweep. On failure, everything before the first failing run is still
/// emitted.
#[cfg(feature = "parallel")]
pub fn sweep_parallel_with<F>(
    integrator: &Integrator,
    osc: &Oscillator,
    t_total: f64,
    schedule: &StepSchedule,
    recorder: &mut dyn TrajectoryRecorder,
    name: &str,
    mut on_row: F,
) -> Result<SweepResult>
where
    F: FnMut(&RecapRow) -> Result<()>,
{
    use crate::recorder::MemoryRecorder;
    use rayon::prelude::*;

    let algorithm = integrator.algorithm();

    let runs: Vec<_> = schedule
        .as_slice()
        .par_iter()
        .map(|&dt| {
            let mut partition = MemoryRecorder::new();
            let outcome = integrator.integrate_recorded(osc, t_total, dt, &mut partition, name);
            (dt, partition, outcome)
        })
        .collect();

    let mut rows = Vec::with_capacity(runs.len());
    for (i, (dt, partition, outcome)) in runs.into_iter().enumerate() {
        let abort = |source: Error| Error::SweepAborted {
            algorithm,
            dt,
            completed_runs: i,
            source: Box::new(source),
        };

        let outcome = outcome.map_err(abort)?;
        for run in partition.runs() {
            run.replay(recorder).map_err(abort)?;
        }
        let row = RecapRow {
            dt,
            sample: outcome.final_sample,
            stats: outcome.stats,
        };
        on_row(&row).map_err(abort)?;
        rows.push(row);
    }

    Ok(SweepResult { algorithm, rows })
}
