//! Fixed-step Runge-Kutta integration.
//!
//! The SEQIAHR rate equations are smooth between quarantine breakpoints, so
//! a classical 4th-order scheme with a conservative substep count is
//! sufficient; the driver in `model::seqiahr` restarts integration at the
//! breakpoints rather than stepping over them.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EpiError, EpiResult};

/// Options controlling the numerical integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SolverOptions {
    /// RK4 substeps per simulated day.
    #[validate(range(min = 1))]
    #[serde(default = "default_steps_per_day")]
    pub steps_per_day: u32,
    /// Absolute tolerance for the population-conservation guard.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_conservation_tolerance")]
    pub conservation_tolerance: f64,
}

const fn default_steps_per_day() -> u32 {
    32
}

const fn default_conservation_tolerance() -> f64 {
    1e-6
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            steps_per_day: default_steps_per_day(),
            conservation_tolerance: default_conservation_tolerance(),
        }
    }
}

/// Advance `y` by one RK4 step of size `dt`.
///
/// `f(t, y)` returns the derivative vector.
pub fn rk4_step<const N: usize, F>(y: &mut [f64; N], t: f64, dt: f64, mut f: F)
where
    F: FnMut(f64, &[f64; N]) -> [f64; N],
{
    let k1 = f(t, y);

    let mut ytmp = *y;
    for i in 0..N {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    let k2 = f(t + 0.5 * dt, &ytmp);

    for i in 0..N {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    let k3 = f(t + 0.5 * dt, &ytmp);

    for i in 0..N {
        ytmp[i] = y[i] + dt * k3[i];
    }
    let k4 = f(t + dt, &ytmp);

    for i in 0..N {
        y[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

/// Reject non-finite state values.
///
/// # Errors
///
/// Returns [`EpiError::IntegrationFailure`] naming the first non-finite
/// component.
pub fn check_finite<const N: usize>(t: f64, y: &[f64; N]) -> EpiResult<()> {
    for (i, v) in y.iter().enumerate() {
        if !v.is_finite() {
            return Err(EpiError::integration(
                t,
                format!("non-finite value in state component {i}"),
            ));
        }
    }
    Ok(())
}
