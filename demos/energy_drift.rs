//! Energy drift of every scheme over one period.
//!
//! Sweeps each algorithm over `dt = 0.2, 0.1, 0.0667, ...` and prints the
//! final relative drift |E - E0| / E0 per step size, without writing files.
//!
//! Run with:
//!   cargo run --example energy_drift

use harmonic_drift::{
    sweep, Algorithm, FinalSampleAlignment, Integrator, MemoryRecorder, Oscillator, StepSchedule,
};

fn main() {
    // m = 1, k = 4: omega = 2, released from rest at x = 1
    let osc = Oscillator::new(1.0, 4.0, 0.0, 1.0).unwrap();
    let period = osc.period();
    let schedule = StepSchedule::generate(0.2, 6).unwrap();

    println!("{osc}");
    println!("  Period: {period:.6} s");
    println!();

    print!("{:<16}", "dt");
    for dt in &schedule {
        print!("{dt:>12.6}");
    }
    println!();

    for algorithm in Algorithm::ALL {
        let integrator =
            Integrator::new(algorithm).with_alignment(FinalSampleAlignment::LastRecorded);
        let mut recorder = MemoryRecorder::new();
        let result = sweep(
            &integrator,
            &osc,
            period,
            &schedule,
            &mut recorder,
            algorithm.trajectory_file_name(),
        )
        .unwrap();

        print!("{:<16}", algorithm.name());
        for drift in result.drifts() {
            print!("{drift:>12.2e}");
        }
        println!();

        // Peak drift over the finest run shows whether the energy error stays bounded
        if let Some(finest) = recorder.runs().last() {
            let peak = finest
                .samples
                .iter()
                .map(|s| s.drift)
                .fold(0.0_f64, f64::max);
            println!("{:<16}{:>12} peak drift at finest dt: {peak:.2e}", "", "");
        }
    }
}
