//! Fixed-step integrator engine
//!
//! Runs one of the five explicit schemes for a fixed step `dt` over a total
//! duration `T`, evaluating the relative energy drift at every step.
//!
//! A run takes `N = floor(T/dt + 0.5)` steps and visits step indices
//! `0..=N`, so `N + 1` samples are produced and the last one sits at
//! `t = N·dt`, which may differ slightly from `T`. Each iteration first
//! samples the current state (time, on-grid position and velocity, drift),
//! hands the sample to the recorder if one is attached, and only then
//! advances the state.

use std::fmt;

use crate::error::{Error, Result};
use crate::oscillator::Oscillator;
use crate::recorder::TrajectoryRecorder;
use crate::schemes::SchemeState;

/// The integration schemes, in their fixed table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Forward Euler: first order, not symplectic, energy grows every step
    ExplicitEuler,
    /// Semi-implicit Euler: first order, symplectic
    EulerCromer,
    /// Staggered-velocity leapfrog: second order, symplectic
    Leapfrog,
    /// Velocity Verlet: second order, symplectic
    VelocityVerlet,
    /// Position (Störmer) Verlet with central-difference velocity
    PositionVerlet,
}

struct AlgorithmInfo {
    name: &'static str,
    code: &'static str,
    file_name: &'static str,
    symplectic: bool,
}

const TABLE: [AlgorithmInfo; 5] = [
    AlgorithmInfo {
        name: "Explicit Euler",
        code: "E",
        file_name: "eulero.csv",
        symplectic: false,
    },
    AlgorithmInfo {
        name: "Euler-Cromer",
        code: "EC",
        file_name: "eulerocromer.csv",
        symplectic: true,
    },
    AlgorithmInfo {
        name: "Leapfrog",
        code: "LF",
        file_name: "leapfrog.csv",
        symplectic: true,
    },
    AlgorithmInfo {
        name: "Velocity Verlet",
        code: "VV",
        file_name: "VerletVelocity.csv",
        symplectic: true,
    },
    AlgorithmInfo {
        name: "Position Verlet",
        code: "VP",
        file_name: "VerletPosition.csv",
        symplectic: true,
    },
];

impl Algorithm {
    /// Every algorithm in table order
    pub const ALL: [Algorithm; 5] = [
        Algorithm::ExplicitEuler,
        Algorithm::EulerCromer,
        Algorithm::Leapfrog,
        Algorithm::VelocityVerlet,
        Algorithm::PositionVerlet,
    ];

    /// Look up an algorithm by its table index (0..=4).
    ///
    /// # Errors
    /// `UnknownAlgorithm` for any other index.
    pub fn from_index(index: i64) -> Result<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(Error::UnknownAlgorithm { index })
    }

    /// Position in the table
    pub fn index(self) -> usize {
        self as usize
    }

    fn info(self) -> &'static AlgorithmInfo {
        &TABLE[self.index()]
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Short code used on the command line (`E`, `EC`, `LF`, `VV`, `VP`)
    pub fn code(self) -> &'static str {
        self.info().code
    }

    /// Name of the per-step trajectory file
    pub fn trajectory_file_name(self) -> &'static str {
        self.info().file_name
    }

    /// Name of the per-step-size summary file, `RECAP_<trajectory file>`
    pub fn recap_file_name(self) -> String {
        format!("RECAP_{}", self.trajectory_file_name())
    }

    /// Whether the scheme is symplectic (bounded long-term energy error)
    pub fn is_symplectic(self) -> bool {
        self.info().symplectic
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which algorithms a command-line index selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmSelection {
    /// A single algorithm
    One(Algorithm),
    /// All five, in table order
    All,
}

impl AlgorithmSelection {
    /// Negative indices select every algorithm; 0..=4 select one.
    ///
    /// # Errors
    /// `UnknownAlgorithm` for indices above the table.
    pub fn from_index(index: i64) -> Result<Self> {
        if index < 0 {
            Ok(AlgorithmSelection::All)
        } else {
            Algorithm::from_index(index).map(AlgorithmSelection::One)
        }
    }

    /// Selected algorithms in table order
    pub fn algorithms(self) -> Vec<Algorithm> {
        match self {
            AlgorithmSelection::One(algorithm) => vec![algorithm],
            AlgorithmSelection::All => Algorithm::ALL.to_vec(),
        }
    }
}

/// State of the oscillator at one step index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time `i·dt`
    pub t: f64,
    /// Position
    pub x: f64,
    /// Velocity
    pub v: f64,
    /// Relative energy drift `|E - E0| / E0`
    pub drift: f64,
}

impl Sample {
    /// Fields formatted with six decimals, in `t,x,v,dE` column order
    pub fn to_record(&self) -> [String; 4] {
        [
            format!("{:.6}", self.t),
            format!("{:.6}", self.x),
            format!("{:.6}", self.v),
            format!("{:.6}", self.drift),
        ]
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.t, self.x, self.v, self.drift
        )
    }
}

/// What the final sample of a run reports.
///
/// The loop samples before it advances, so after the last iteration the
/// state has moved one step past the last recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalSampleAlignment {
    /// `t = N·dt` and the drift of the last recorded sample, paired with the
    /// stored `(x, v)` after the loop (one step later; Leapfrog's velocity is
    /// the raw half-step value). Reproduces the reference recap files.
    #[default]
    PostLoop,
    /// Exactly the last recorded sample `(N·dt, x_N, v_N, dE_N)`.
    LastRecorded,
}

/// Integration statistics for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of state updates, `N + 1`
    pub steps: u64,
    /// Number of samples produced, `N + 1`
    pub samples: u64,
    /// Number of acceleration evaluations, including start-up
    pub acceleration_evals: u64,
}

/// Result of one integration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    /// Final sample, aligned per [`FinalSampleAlignment`]
    pub final_sample: Sample,
    /// Counters for this run
    pub stats: Stats,
}

/// Fixed-step integrator for one algorithm
///
/// # Example
/// ```
/// use harmonic_drift::{Algorithm, Integrator, Oscillator};
///
/// let osc = Oscillator::new(1.0, 1.0, 0.0, 1.0).unwrap();
/// let integrator = Integrator::new(Algorithm::VelocityVerlet);
/// let outcome = integrator.integrate(&osc, 6.283185, 0.1).unwrap();
///
/// assert_eq!(outcome.stats.samples, 64);
/// assert!(outcome.final_sample.drift < 0.02);
/// ```
#[derive(Debug, Clone)]
pub struct Integrator {
    algorithm: Algorithm,
    /// Final-sample convention
    pub alignment: FinalSampleAlignment,
    /// Maximum number of steps a single run may take
    pub max_steps: u64,
}

impl Integrator {
    /// Create an integrator with the default alignment and step limit
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            alignment: FinalSampleAlignment::default(),
            max_steps: 100_000_000,
        }
    }

    /// Builder-style alignment override
    pub fn with_alignment(mut self, alignment: FinalSampleAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Algorithm this integrator runs
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Number of steps `N = floor(T/dt + 0.5)` a run of length `t_total` takes.
    ///
    /// # Errors
    /// `InvalidStep` unless `dt` is positive and finite; `InvalidParameter`
    /// for a negative or non-finite `t_total`, or when `N` exceeds
    /// `max_steps`.
    pub fn step_count(&self, t_total: f64, dt: f64) -> Result<u64> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(Error::InvalidStep { dt });
        }
        if !t_total.is_finite() || t_total < 0.0 {
            return Err(Error::invalid(format!(
                "T must be non-negative and finite, got {}",
                t_total
            )));
        }
        let n = (t_total / dt + 0.5).floor();
        if n > self.max_steps as f64 {
            return Err(Error::invalid(format!(
                "T/dt = {:.0} exceeds the limit of {} steps",
                n, self.max_steps
            )));
        }
        Ok(n as u64)
    }

    /// Run without recording intermediate samples.
    pub fn integrate(&self, osc: &Oscillator, t_total: f64, dt: f64) -> Result<RunOutcome> {
        self.run(osc, t_total, dt, None)
    }

    /// Run and hand every sample, tagged with its step index, to `recorder`
    /// under the trajectory name `name`.
    pub fn integrate_recorded(
        &self,
        osc: &Oscillator,
        t_total: f64,
        dt: f64,
        recorder: &mut dyn TrajectoryRecorder,
        name: &str,
    ) -> Result<RunOutcome> {
        self.run(osc, t_total, dt, Some((recorder, name)))
    }

    fn run(
        &self,
        osc: &Oscillator,
        t_total: f64,
        dt: f64,
        mut recorder: Option<(&mut dyn TrajectoryRecorder, &str)>,
    ) -> Result<RunOutcome> {
        let n = self.step_count(t_total, dt)?;
        osc.ensure_drift_defined()?;

        log::info!(
            "START {}: T={:.6}, dt={:.6}, record={}",
            self.algorithm,
            t_total,
            dt,
            recorder.is_some()
        );
        let t_final = n as f64 * dt;
        log::debug!("{}: N={} steps, final time {:.6}", self.algorithm, n, t_final);
        if (t_final - t_total).abs() > 1e-12 {
            log::debug!(
                "{}: final time {} differs from requested T={}",
                self.algorithm,
                t_final,
                t_total
            );
        }

        if let Some((rec, name)) = recorder.as_mut() {
            rec.begin_run(*name, dt)?;
        }

        let mut state = SchemeState::start(self.algorithm, osc, dt);
        let mut stats = Stats {
            acceleration_evals: SchemeState::start_evals(self.algorithm),
            ..Stats::default()
        };
        let mut last = Sample {
            t: 0.0,
            x: osc.x0(),
            v: osc.v0(),
            drift: 0.0,
        };

        for i in 0..=n {
            let (x, v) = state.on_grid(osc, dt);
            last = Sample {
                t: i as f64 * dt,
                x,
                v,
                drift: osc.relative_drift(v, x),
            };
            stats.samples += 1;

            if let Some((rec, _)) = recorder.as_mut() {
                rec.record(i as usize, &last)?;
            }

            stats.acceleration_evals += state.advance(osc, dt);
            stats.steps += 1;
        }

        if let Some((rec, _)) = recorder.as_mut() {
            rec.end_run()?;
        }

        let final_sample = match self.alignment {
            FinalSampleAlignment::PostLoop => {
                let (x, v) = state.raw();
                Sample {
                    t: t_final,
                    x,
                    v,
                    drift: last.drift,
                }
            }
            FinalSampleAlignment::LastRecorded => last,
        };

        log::info!(
            "END {}: T={:.6}, x={:.6}, v={:.6}, dE={:.6}",
            self.algorithm,
            final_sample.t,
            final_sample.x,
            final_sample.v,
            final_sample.drift
        );

        Ok(RunOutcome {
            final_sample,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MemoryRecorder;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const ONE_PERIOD: f64 = 6.283185;

    fn unit_oscillator() -> Oscillator {
        Oscillator::new(1.0, 1.0, 0.0, 1.0).unwrap()
    }

    fn recorded_run(algorithm: Algorithm, osc: &Oscillator, t_total: f64, dt: f64) -> Vec<Sample> {
        let mut recorder = MemoryRecorder::new();
        Integrator::new(algorithm)
            .integrate_recorded(osc, t_total, dt, &mut recorder, "test")
            .unwrap();
        recorder.runs().last().unwrap().samples.clone()
    }

    #[test]
    fn test_table_order_and_names() {
        let names: Vec<_> = Algorithm::ALL.iter().map(|a| a.trajectory_file_name()).collect();
        assert_eq!(
            names,
            [
                "eulero.csv",
                "eulerocromer.csv",
                "leapfrog.csv",
                "VerletVelocity.csv",
                "VerletPosition.csv"
            ]
        );
        assert_eq!(Algorithm::Leapfrog.recap_file_name(), "RECAP_leapfrog.csv");
        for (i, algorithm) in Algorithm::ALL.iter().enumerate() {
            assert_eq!(algorithm.index(), i);
            assert_eq!(Algorithm::from_index(i as i64).unwrap(), *algorithm);
        }
        assert!(!Algorithm::ExplicitEuler.is_symplectic());
        assert!(Algorithm::PositionVerlet.is_symplectic());
    }

    #[test]
    fn test_unknown_algorithm_index() {
        assert!(matches!(
            Algorithm::from_index(5),
            Err(Error::UnknownAlgorithm { index: 5 })
        ));
        assert!(matches!(
            Algorithm::from_index(-1),
            Err(Error::UnknownAlgorithm { index: -1 })
        ));
        assert!(matches!(
            AlgorithmSelection::from_index(9),
            Err(Error::UnknownAlgorithm { index: 9 })
        ));
    }

    #[test]
    fn test_selection() {
        assert_eq!(AlgorithmSelection::from_index(-1).unwrap().algorithms().len(), 5);
        assert_eq!(AlgorithmSelection::from_index(-7).unwrap(), AlgorithmSelection::All);
        assert_eq!(
            AlgorithmSelection::from_index(2).unwrap().algorithms(),
            vec![Algorithm::Leapfrog]
        );
    }

    #[test]
    fn test_sample_formatting() {
        let sample = Sample {
            t: 0.1,
            x: -1.0,
            v: 0.5,
            drift: 1.0 / 3.0,
        };
        assert_eq!(sample.to_string(), "0.100000,-1.000000,0.500000,0.333333");
        assert_eq!(sample.to_record()[3], "0.333333");
    }

    #[test]
    fn test_one_period_drift() {
        let osc = unit_oscillator();
        for algorithm in Algorithm::ALL {
            let outcome = Integrator::new(algorithm)
                .integrate(&osc, ONE_PERIOD, 0.1)
                .unwrap();
            let drift = outcome.final_sample.drift;
            if algorithm == Algorithm::ExplicitEuler {
                assert!(drift > 0.5, "Euler drift {} should exceed 0.5", drift);
            } else {
                assert!(drift < 0.02, "{} drift {} should stay below 0.02", algorithm, drift);
            }
        }
    }

    #[test]
    fn test_euler_energy_growth_is_geometric() {
        // Each Euler step multiplies the energy by exactly (1 + w²dt²)
        let osc = unit_oscillator();
        let dt = 0.1;
        let samples = recorded_run(Algorithm::ExplicitEuler, &osc, ONE_PERIOD, dt);
        for (i, sample) in samples.iter().enumerate() {
            let expected = (1.0 + dt * dt).powi(i as i32) - 1.0;
            assert_relative_eq!(sample.drift, expected, max_relative = 1e-9, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_sample_count_and_final_time() {
        let osc = unit_oscillator();
        for algorithm in Algorithm::ALL {
            let samples = recorded_run(algorithm, &osc, 1.0, 0.3);
            // round(1.0 / 0.3) = 3 steps, 4 samples
            assert_eq!(samples.len(), 4);
            assert_eq!(samples[0].t, 0.0);
            assert_relative_eq!(samples[3].t, 0.9, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_first_sample_is_initial_state() {
        let osc = Oscillator::new(2.0, 0.5, 0.3, -0.4).unwrap();
        for algorithm in Algorithm::ALL {
            let samples = recorded_run(algorithm, &osc, 1.0, 0.05);
            let first = samples[0];
            assert_eq!(first.t, 0.0);
            assert_eq!(first.x, -0.4);
            assert_relative_eq!(first.v, 0.3, max_relative = 1e-14);
            assert!(first.drift < 1e-14, "{}: {}", algorithm, first.drift);
        }
    }

    #[test]
    fn test_post_loop_alignment_pairs_stale_drift() {
        let osc = unit_oscillator();
        let dt = 0.1;
        for algorithm in Algorithm::ALL {
            let samples = recorded_run(algorithm, &osc, ONE_PERIOD, dt);
            let last = *samples.last().unwrap();

            let post = Integrator::new(algorithm)
                .integrate(&osc, ONE_PERIOD, dt)
                .unwrap()
                .final_sample;
            let consistent = Integrator::new(algorithm)
                .with_alignment(FinalSampleAlignment::LastRecorded)
                .integrate(&osc, ONE_PERIOD, dt)
                .unwrap()
                .final_sample;

            assert_eq!(consistent, last);
            assert_eq!(post.t, last.t);
            assert_eq!(post.drift, last.drift);
            // The state has moved one step past the last sample
            assert_ne!(post.x, last.x, "{}", algorithm);
        }
    }

    #[test]
    fn test_leapfrog_post_loop_velocity_is_half_step() {
        // Leapfrog and velocity Verlet share positions; the post-loop Leapfrog
        // velocity is the raw staggered value v(t + dt/2) = v(t) + a(x) dt/2
        let osc = unit_oscillator();
        let dt = 0.1;
        let lf = Integrator::new(Algorithm::Leapfrog)
            .integrate(&osc, ONE_PERIOD, dt)
            .unwrap()
            .final_sample;
        let vv = Integrator::new(Algorithm::VelocityVerlet)
            .integrate(&osc, ONE_PERIOD, dt)
            .unwrap()
            .final_sample;

        assert_relative_eq!(lf.x, vv.x, epsilon = 1e-12);
        assert_relative_eq!(lf.v, vv.v + osc.acceleration(vv.x) * (dt / 2.0), epsilon = 1e-12);
        assert!((lf.v - vv.v).abs() > 1e-3);
    }

    #[test]
    fn test_stats() {
        let osc = unit_oscillator();
        let outcome = Integrator::new(Algorithm::VelocityVerlet)
            .integrate(&osc, 1.0, 0.1)
            .unwrap();
        assert_eq!(outcome.stats.steps, 11);
        assert_eq!(outcome.stats.samples, 11);
        assert_eq!(outcome.stats.acceleration_evals, 22);

        let outcome = Integrator::new(Algorithm::Leapfrog)
            .integrate(&osc, 1.0, 0.1)
            .unwrap();
        assert_eq!(outcome.stats.acceleration_evals, 12);
    }

    #[test]
    fn test_zero_duration_runs_once() {
        let osc = unit_oscillator();
        let samples = recorded_run(Algorithm::EulerCromer, &osc, 0.0, 0.1);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].t, 0.0);
    }

    #[test]
    fn test_invalid_step_rejected() {
        let osc = unit_oscillator();
        let integrator = Integrator::new(Algorithm::ExplicitEuler);
        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let result = integrator.integrate(&osc, 1.0, dt);
            assert!(matches!(result, Err(Error::InvalidStep { .. })), "dt = {}", dt);
        }
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let osc = unit_oscillator();
        let integrator = Integrator::new(Algorithm::Leapfrog);
        for t_total in [-1.0, f64::NAN] {
            let result = integrator.integrate(&osc, t_total, 0.1);
            assert!(matches!(result, Err(Error::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_step_limit_enforced() {
        let osc = unit_oscillator();
        let mut integrator = Integrator::new(Algorithm::ExplicitEuler);
        integrator.max_steps = 100;
        assert!(integrator.integrate(&osc, 10.0, 0.1).is_ok());
        assert!(matches!(
            integrator.integrate(&osc, 10.0, 0.01),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rest_at_origin_fails_before_recording() {
        let osc = Oscillator::new(1.0, 1.0, 0.0, 0.0).unwrap();
        let mut recorder = MemoryRecorder::new();
        let result = Integrator::new(Algorithm::VelocityVerlet).integrate_recorded(
            &osc,
            1.0,
            0.1,
            &mut recorder,
            "rest",
        );
        assert!(matches!(result, Err(Error::UndefinedDrift)));
        assert!(recorder.runs().is_empty());
    }

    #[test]
    fn test_symplectic_drift_stays_bounded() {
        // Fifty periods: Euler blows up, the symplectic schemes keep the same
        // drift amplitude in the last period as in the first
        let osc = unit_oscillator();
        let dt = 0.1;
        let period_steps = (2.0 * std::f64::consts::PI / dt) as usize;
        let t_total = 50.0 * 2.0 * std::f64::consts::PI;

        for algorithm in Algorithm::ALL {
            let samples = recorded_run(algorithm, &osc, t_total, dt);
            let max_over = |s: &[Sample]| s.iter().map(|s| s.drift).fold(0.0, f64::max);
            let first = max_over(&samples[..period_steps]);
            let last = max_over(&samples[samples.len() - period_steps..]);

            if algorithm.is_symplectic() {
                assert!(
                    last < 1.1 * first,
                    "{}: drift grew from {} to {}",
                    algorithm,
                    first,
                    last
                );
            } else {
                assert!(last > 1e6 * first, "Euler drift should grow without bound");
            }
        }
    }

    #[test]
    fn test_euler_drift_grows_within_a_period() {
        let osc = unit_oscillator();
        let samples = recorded_run(Algorithm::ExplicitEuler, &osc, ONE_PERIOD, 0.05);
        for pair in samples.windows(2) {
            assert!(pair[1].drift >= pair[0].drift);
        }
    }

    proptest! {
        #[test]
        fn sample_count_is_rounded_steps_plus_one(
            t_total in 0.0..20.0_f64,
            dt in 0.01..1.0_f64,
            index in 0usize..5,
        ) {
            let osc = Oscillator::new(1.0, 2.0, 0.5, 1.0).unwrap();
            let algorithm = Algorithm::ALL[index];
            let samples = recorded_run(algorithm, &osc, t_total, dt);
            let n = (t_total / dt + 0.5).floor();

            prop_assert_eq!(samples.len(), n as usize + 1);
            prop_assert_eq!(samples.last().unwrap().t, n * dt);
            for (i, sample) in samples.iter().enumerate() {
                prop_assert_eq!(sample.t, i as f64 * dt);
            }
        }
    }
}
