//! SEQIAHR integrator: right-hand side, quarantine switching, and the
//! day-by-day RK4 driver with stability guards.

use crate::error::{EpiError, EpiResult};
use crate::model::{ModelParameters, ModelVariant, SeqiahrState, TimeRange, Trajectory};
use crate::solver::{check_finite, rk4_step, SolverOptions};

/// State-vector layout (see [`crate::model::Compartment::ALL`]).
const S: usize = 0;
const E: usize = 1;
const I: usize = 2;
const A: usize = 3;
const H: usize = 4;
const R: usize = 5;
const D: usize = 7;

const STATE_DIM: usize = 8;

/// Fractions this far below zero trip the stability guard; smaller
/// excursions are ordinary floating-point noise.
const NEGATIVITY_GUARD: f64 = 1e-6;

/// Validated SEQIAHR model: parameters, variant flags, and solver options.
///
/// The model is stateless between calls; [`SeqiahrModel::simulate`] is a
/// pure function of its arguments.
#[derive(Debug, Clone)]
pub struct SeqiahrModel {
    params: ModelParameters,
    variant: ModelVariant,
    solver: SolverOptions,
}

impl SeqiahrModel {
    /// Create a model, rejecting out-of-domain parameters up front.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::InvalidParameter`] for the first rate outside
    /// its documented domain.
    pub fn new(params: ModelParameters, variant: ModelVariant) -> EpiResult<Self> {
        params.check()?;
        Ok(Self {
            params,
            variant,
            solver: SolverOptions::default(),
        })
    }

    /// Replace the solver options.
    #[must_use]
    pub const fn with_solver_options(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    /// Model parameters.
    #[must_use]
    pub const fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Variant flags.
    #[must_use]
    pub const fn variant(&self) -> &ModelVariant {
        &self.variant
    }

    /// Solver options.
    #[must_use]
    pub const fn solver_options(&self) -> &SolverOptions {
        &self.solver
    }

    /// Right-hand side with χ held constant over one integration segment.
    ///
    /// The quarantine step function is resolved per segment by the driver,
    /// so the system is smooth wherever this is evaluated.
    fn deriv(&self, y: &[f64; STATE_DIM], chi: f64) -> [f64; STATE_DIM] {
        let p = &self.params;

        let lambda = if self.variant.hospitalized_transmission {
            p.beta * (y[I] + y[A] + (1.0 - p.rho) * y[H])
        } else {
            p.beta * (y[I] + y[A])
        };
        let exposure = lambda * (1.0 - chi) * y[S];

        let a_recovery_rate = if self.variant.distinct_asymptomatic_recovery {
            p.gamma
        } else {
            p.delta
        };
        let asymptomatic_recovery = a_recovery_rate * y[A];
        let hospital_inflow = p.phi * p.delta * y[I];

        [
            -exposure,
            exposure - p.alpha * y[E],
            (1.0 - p.p) * p.alpha * y[E] - p.delta * y[I],
            p.p * p.alpha * y[E] - asymptomatic_recovery,
            hospital_inflow - (p.rho + p.mu) * y[H],
            (1.0 - p.phi) * p.delta * y[I] + p.rho * y[H] + asymptomatic_recovery,
            hospital_inflow,
            p.mu * y[H],
        ]
    }

    /// Integrate from `initial` and sample at every integer day in `range`
    /// (inclusive).
    ///
    /// The first sample is the initial state stamped at `range.start`; the
    /// D channel is always integrated so the conservation guard holds in
    /// every variant.
    ///
    /// # Errors
    ///
    /// [`EpiError::Config`] for a malformed range, initial state, or zero
    /// substep count; [`EpiError::IntegrationFailure`] if any state value
    /// becomes non-finite, meaningfully negative, or the closed-population
    /// total drifts beyond the configured tolerance.
    pub fn simulate(&self, initial: &SeqiahrState, range: TimeRange) -> EpiResult<Trajectory> {
        if range.end < range.start {
            return Err(EpiError::config(format!(
                "time range end {} precedes start {}",
                range.end, range.start
            )));
        }
        if self.solver.steps_per_day == 0 {
            return Err(EpiError::config("steps_per_day must be at least 1"));
        }
        self.check_initial(initial)?;

        let mut y = initial.to_array();
        let conserved = y[S] + y[E] + y[I] + y[A] + y[H] + y[R] + y[D];

        let mut states = Vec::with_capacity(range.samples());
        states.push(SeqiahrState::from_array(f64::from(range.start), y));

        for day in range.start..range.end {
            let d0 = f64::from(day);
            let d1 = f64::from(day + 1);
            for (a, b) in self.segments(d0, d1) {
                let chi = if self.params.quarantine.contains(0.5 * (a + b)) {
                    self.params.chi
                } else {
                    0.0
                };
                let n_steps = ((b - a) * f64::from(self.solver.steps_per_day)).ceil() as usize;
                let n_steps = n_steps.max(1);
                let dt = (b - a) / n_steps as f64;
                let mut t = a;
                for _ in 0..n_steps {
                    rk4_step(&mut y, t, dt, |_, yy| self.deriv(yy, chi));
                    t += dt;
                }
            }
            self.guard(d1, &y, conserved)?;
            states.push(SeqiahrState::from_array(d1, y));
        }

        Ok(Trajectory::from_states(states, self.params.quarantine))
    }

    /// Split `[a, b]` at quarantine breakpoints so each returned piece has
    /// a constant χ regime.
    fn segments(&self, a: f64, b: f64) -> Vec<(f64, f64)> {
        let mut cuts = vec![a];
        for bp in self.params.quarantine.breakpoints() {
            if bp > a && bp < b {
                cuts.push(bp);
            }
        }
        cuts.push(b);
        cuts.sort_by(f64::total_cmp);
        cuts.windows(2)
            .map(|w| (w[0], w[1]))
            .filter(|(lo, hi)| hi - lo > 1e-12)
            .collect()
    }

    fn check_initial(&self, initial: &SeqiahrState) -> EpiResult<()> {
        let y = initial.to_array();
        for (i, v) in y.iter().enumerate() {
            if !v.is_finite() || *v < 0.0 {
                return Err(EpiError::config(format!(
                    "initial fraction {} = {v} must be finite and non-negative",
                    crate::model::Compartment::ALL[i].symbol()
                )));
            }
        }
        let living = initial.living_total();
        if living > 1.0 + 1e-9 {
            return Err(EpiError::config(format!(
                "initial fractions sum to {living}, exceeding the population"
            )));
        }
        Ok(())
    }

    fn guard(&self, t: f64, y: &[f64; STATE_DIM], conserved: f64) -> EpiResult<()> {
        check_finite(t, y)?;
        for (i, v) in y.iter().enumerate() {
            if *v < -NEGATIVITY_GUARD {
                return Err(EpiError::integration(
                    t,
                    format!(
                        "negative fraction {} in compartment {}",
                        v,
                        crate::model::Compartment::ALL[i].symbol()
                    ),
                ));
            }
        }
        let total = y[S] + y[E] + y[I] + y[A] + y[H] + y[R] + y[D];
        if (total - conserved).abs() > self.solver.conservation_tolerance {
            return Err(EpiError::integration(
                t,
                format!(
                    "population conservation violated: {total} != {conserved}",
                ),
            ));
        }
        Ok(())
    }
}
