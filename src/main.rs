//! Command-line driver.
//!
//! ```text
//! harmonic-drift <algo> <T> <dtMax> <numDt> < oscillator.txt
//! ```
//!
//! `algo` selects the scheme (0=E, 1=EC, 2=LF, 3=VV, 4=VP, negative = all).
//! Oscillator parameters are read from stdin as `m=`, `k=`, `v0=`, `x0=`
//! lines. Output goes to `./csv` unless `HARMONIC_DRIFT_EXPORT_DIR` is set.

use std::io;
use std::process::ExitCode;
use std::str::FromStr;

use harmonic_drift::{
    sweep_to_files, AlgorithmSelection, Error, Oscillator, OscillatorParams, Result,
    StepSchedule, SweepConfig,
};

fn usage(program: &str) -> String {
    format!(
        "usage: {} | algo(0=E,1=EC,2=LF,3=VV,4=VP,-1=ALL_ALGO) | T | dtMax | num_dt",
        program
    )
}

fn parse_arg<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidParameter {
        message: format!("{} must be a number, got '{}'", name, value),
    })
}

fn run(args: &[String]) -> Result<()> {
    let selection = AlgorithmSelection::from_index(parse_arg(&args[1], "algo")?)?;
    let t_total: f64 = parse_arg(&args[2], "T")?;
    let dt_max: f64 = parse_arg(&args[3], "dtMax")?;
    let num_dt: usize = parse_arg(&args[4], "num_dt")?;

    let params = OscillatorParams::from_reader(io::stdin().lock())?;
    let osc = Oscillator::try_from(params)?;
    log::info!("{}", osc);

    log::info!(
        "Input recap: algo={:?}, T={:.6}, dtMax={:.6}, num_dt={}",
        selection,
        t_total,
        dt_max,
        num_dt
    );

    let schedule = StepSchedule::generate(dt_max, num_dt)?;
    let config = SweepConfig::from_env();

    for algorithm in selection.algorithms() {
        sweep_to_files(algorithm, &osc, t_total, &schedule, &config)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        let program = args.first().map(String::as_str).unwrap_or("harmonic-drift");
        eprintln!("{}", usage(program));
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            if err.is_partial_output() {
                log::warn!("output files hold only the runs completed before the failure");
            }
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
