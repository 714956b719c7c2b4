//! Update rules of the five explicit integrators
//!
//! Each scheme is a pure function from the state at step `i` to the state
//! at step `i + 1`. Accelerations come unscaled from the oscillator; every
//! rule applies its own `dt` factors.
//!
//! | Scheme          | Update                                                     |
//! |-----------------|------------------------------------------------------------|
//! | Explicit Euler  | x' = x + v dt,  v' = v + a(x) dt                            |
//! | Euler-Cromer    | v' = v + a(x) dt,  x' = x + v' dt                           |
//! | Leapfrog        | x' = x + v½ dt,  v½' = v½ + a(x') dt                        |
//! | Velocity Verlet | x' = x + v dt + a(x) dt²/2,  v' = v + (a(x) + a(x')) dt/2   |
//! | Position Verlet | x'' = 2x' - x + a(x') dt²,  v' = (x'' - x) / 2dt            |
//!
//! Leapfrog carries its velocity half a step ahead of the position and the
//! Position Verlet scheme carries the next position. Both keep that
//! auxiliary value separate from the on-grid `(x, v)` they report.

use crate::oscillator::Oscillator;
use crate::solver::Algorithm;

/// Explicit (forward) Euler step. Acceleration is taken at the old position.
pub fn explicit_euler(osc: &Oscillator, x: f64, v: f64, dt: f64) -> (f64, f64) {
    let a = osc.acceleration(x);
    (x + v * dt, v + a * dt)
}

/// Euler-Cromer (semi-implicit Euler) step: velocity first, then position
/// with the new velocity.
pub fn euler_cromer(osc: &Oscillator, x: f64, v: f64, dt: f64) -> (f64, f64) {
    let v_new = v + osc.acceleration(x) * dt;
    (x + v_new * dt, v_new)
}

/// Leapfrog drift-kick with a staggered velocity `v_half = v(t + dt/2)`.
pub fn leapfrog(osc: &Oscillator, x: f64, v_half: f64, dt: f64) -> (f64, f64) {
    let x_new = x + v_half * dt;
    (x_new, v_half + osc.acceleration(x_new) * dt)
}

/// Velocity Verlet step.
pub fn velocity_verlet(osc: &Oscillator, x: f64, v: f64, dt: f64) -> (f64, f64) {
    let a_old = osc.acceleration(x);
    let x_new = x + v * dt + a_old * (dt * dt) / 2.0;
    let a_new = osc.acceleration(x_new);
    (x_new, v + (a_old * dt + a_new * dt) / 2.0)
}

/// Position (Störmer) Verlet step from the pair `(x_prev, x)`.
///
/// Returns the next position and the central-difference velocity at `x`.
pub fn position_verlet(osc: &Oscillator, x_prev: f64, x: f64, dt: f64) -> (f64, f64) {
    let x_next = 2.0 * x - x_prev + osc.acceleration(x) * (dt * dt);
    (x_next, (x_next - x_prev) / (2.0 * dt))
}

/// Offset between Leapfrog's staggered velocity and the on-grid velocity:
/// `v(t ± dt/2) = v(t) ± a(x) dt/2`.
fn half_kick(osc: &Oscillator, x: f64, dt: f64) -> f64 {
    osc.acceleration(x) * (dt / 2.0)
}

/// Running state of one integration run.
///
/// `x`/`v` are the values at the current step index. Leapfrog's `v_half`
/// lives at `t + dt/2`; Position Verlet's `x_next` at `t + dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SchemeState {
    ExplicitEuler { x: f64, v: f64 },
    EulerCromer { x: f64, v: f64 },
    Leapfrog { x: f64, v_half: f64 },
    VelocityVerlet { x: f64, v: f64 },
    PositionVerlet { x: f64, v: f64, x_next: f64 },
}

impl SchemeState {
    /// Initial state at `t = 0`, including any bootstrap of auxiliary values.
    pub(crate) fn start(algorithm: Algorithm, osc: &Oscillator, dt: f64) -> Self {
        let (x, v) = (osc.x0(), osc.v0());
        match algorithm {
            Algorithm::ExplicitEuler => SchemeState::ExplicitEuler { x, v },
            Algorithm::EulerCromer => SchemeState::EulerCromer { x, v },
            Algorithm::Leapfrog => SchemeState::Leapfrog {
                x,
                v_half: v + half_kick(osc, x, dt),
            },
            Algorithm::VelocityVerlet => SchemeState::VelocityVerlet { x, v },
            Algorithm::PositionVerlet => SchemeState::PositionVerlet {
                x,
                v,
                x_next: x + v * dt + osc.acceleration(x) * (dt * dt) / 2.0,
            },
        }
    }

    /// Acceleration evaluations spent by `start`
    pub(crate) fn start_evals(algorithm: Algorithm) -> u64 {
        match algorithm {
            Algorithm::Leapfrog | Algorithm::PositionVerlet => 1,
            _ => 0,
        }
    }

    /// Position and velocity at the current step index.
    ///
    /// For Leapfrog the half-step offset is backed out of the velocity.
    pub(crate) fn on_grid(&self, osc: &Oscillator, dt: f64) -> (f64, f64) {
        match *self {
            SchemeState::ExplicitEuler { x, v }
            | SchemeState::EulerCromer { x, v }
            | SchemeState::VelocityVerlet { x, v }
            | SchemeState::PositionVerlet { x, v, .. } => (x, v),
            SchemeState::Leapfrog { x, v_half } => (x, v_half - half_kick(osc, x, dt)),
        }
    }

    /// Position and velocity exactly as stored, without any on-grid correction.
    pub(crate) fn raw(&self) -> (f64, f64) {
        match *self {
            SchemeState::ExplicitEuler { x, v }
            | SchemeState::EulerCromer { x, v }
            | SchemeState::VelocityVerlet { x, v }
            | SchemeState::PositionVerlet { x, v, .. } => (x, v),
            SchemeState::Leapfrog { x, v_half } => (x, v_half),
        }
    }

    /// Advance one step. Returns the number of acceleration evaluations.
    pub(crate) fn advance(&mut self, osc: &Oscillator, dt: f64) -> u64 {
        match self {
            SchemeState::ExplicitEuler { x, v } => {
                (*x, *v) = explicit_euler(osc, *x, *v, dt);
                1
            }
            SchemeState::EulerCromer { x, v } => {
                (*x, *v) = euler_cromer(osc, *x, *v, dt);
                1
            }
            SchemeState::Leapfrog { x, v_half } => {
                (*x, *v_half) = leapfrog(osc, *x, *v_half, dt);
                1
            }
            SchemeState::VelocityVerlet { x, v } => {
                (*x, *v) = velocity_verlet(osc, *x, *v, dt);
                2
            }
            SchemeState::PositionVerlet { x, v, x_next } => {
                let x_prev = *x;
                *x = *x_next;
                (*x_next, *v) = position_verlet(osc, x_prev, *x, dt);
                1
            }
        }
    }
}
