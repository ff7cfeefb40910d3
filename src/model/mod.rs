//! SEQIAHR model types: parameters, variants, state, and trajectory.
//!
//! All rates are per day; all compartment values are fractions of the
//! population at risk. Absolute counts appear only in the `output` layer.

pub mod seqiahr;

pub use seqiahr::SeqiahrModel;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::EpiResult;

/// Named compartments of the SEQIAHR system.
///
/// `CumulativeHospitalizations` and `CumulativeDeaths` are bookkeeping
/// channels (inflow accumulators), not sub-populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    /// S: never infected, at risk.
    Susceptible,
    /// E: infected, incubating, not yet infectious.
    Exposed,
    /// I: symptomatic and infectious.
    Infectious,
    /// A: asymptomatic and infectious.
    Asymptomatic,
    /// H: hospitalized.
    Hospitalized,
    /// R: recovered or discharged.
    Recovered,
    /// C: cumulative hospital admissions.
    CumulativeHospitalizations,
    /// D: cumulative disease deaths.
    CumulativeDeaths,
}

impl Compartment {
    /// All compartments in state-vector order.
    pub const ALL: [Self; 8] = [
        Self::Susceptible,
        Self::Exposed,
        Self::Infectious,
        Self::Asymptomatic,
        Self::Hospitalized,
        Self::Recovered,
        Self::CumulativeHospitalizations,
        Self::CumulativeDeaths,
    ];

    /// One-letter model notation.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Susceptible => "S",
            Self::Exposed => "E",
            Self::Infectious => "I",
            Self::Asymptomatic => "A",
            Self::Hospitalized => "H",
            Self::Recovered => "R",
            Self::CumulativeHospitalizations => "C",
            Self::CumulativeDeaths => "D",
        }
    }

    /// Human-readable default label.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Susceptible => "Susceptible",
            Self::Exposed => "Exposed",
            Self::Infectious => "Infectious",
            Self::Asymptomatic => "Asymptomatic",
            Self::Hospitalized => "Hospitalized",
            Self::Recovered => "Recovered",
            Self::CumulativeHospitalizations => "Cumulative hospitalizations",
            Self::CumulativeDeaths => "Cumulative deaths",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Susceptible => 0,
            Self::Exposed => 1,
            Self::Infectious => 2,
            Self::Asymptomatic => 3,
            Self::Hospitalized => 4,
            Self::Recovered => 5,
            Self::CumulativeHospitalizations => 6,
            Self::CumulativeDeaths => 7,
        }
    }
}

impl std::fmt::Display for Compartment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Quarantine intervention window `[start, start + duration)` in days.
///
/// A missing duration means the quarantine never ends once started; a zero
/// duration means it never engages at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuarantineWindow {
    /// Day the quarantine begins (q).
    pub start: u32,
    /// Quarantine duration in days (r); `None` for open-ended.
    #[serde(default)]
    pub duration: Option<u32>,
}

impl QuarantineWindow {
    /// Window starting at day `start` and lasting `duration` days.
    #[must_use]
    pub const fn new(start: u32, duration: u32) -> Self {
        Self {
            start,
            duration: Some(duration),
        }
    }

    /// Window starting at day `start` with no scheduled end.
    #[must_use]
    pub const fn open_ended(start: u32) -> Self {
        Self {
            start,
            duration: None,
        }
    }

    /// Whether the intervention is active at time `t` (days).
    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        let start = f64::from(self.start);
        match self.duration {
            Some(0) => false,
            Some(r) => t >= start && t < start + f64::from(r),
            None => t >= start,
        }
    }

    /// Day the window closes, if it ever does.
    #[must_use]
    pub fn end(&self) -> Option<f64> {
        self.duration
            .map(|r| f64::from(self.start) + f64::from(r))
    }

    /// Times at which the step function switches value.
    pub(crate) fn breakpoints(&self) -> Vec<f64> {
        let mut cuts = vec![f64::from(self.start)];
        if let Some(end) = self.end() {
            cuts.push(end);
        }
        cuts
    }
}

impl Default for QuarantineWindow {
    fn default() -> Self {
        Self::new(35, 80)
    }
}

/// Epidemiological rate parameters of the SEQIAHR system.
///
/// Field names follow the model notation; all rates are per day. Domains
/// mirror the documented parameter ranges and are enforced both by
/// `validator` (YAML path) and by [`ModelParameters::check`] (programmatic
/// path, via [`SeqiahrModel::new`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// χ: fraction of susceptibles quarantined while the window is active.
    #[validate(range(min = 0.0, max = 1.0))]
    pub chi: f64,
    /// φ: fraction of recovering symptomatic cases that are hospitalized.
    #[validate(range(min = 0.0, max = 0.5))]
    pub phi: f64,
    /// β: transmission rate.
    #[validate(range(min = 0.0, max = 1.0))]
    pub beta: f64,
    /// ρ: hospital discharge rate. Under
    /// [`ModelVariant::attenuated_hospital_transmission`] it also damps the
    /// contribution of H to the force of infection.
    #[validate(range(min = 0.0, max = 1.0))]
    pub rho: f64,
    /// δ: symptomatic recovery rate.
    #[validate(range(min = 0.0, max = 1.0))]
    pub delta: f64,
    /// γ: asymptomatic recovery rate (used when the variant recovers A
    /// distinctly; otherwise A recovers at δ).
    #[validate(range(min = 0.0, max = 1.0))]
    pub gamma: f64,
    /// α: incubation rate.
    #[validate(range(min = 0.0, max = 10.0))]
    pub alpha: f64,
    /// μ: disease mortality rate of hospitalized cases.
    #[validate(range(min = 0.0, max = 1.0))]
    pub mu: f64,
    /// p: fraction of exposed individuals who become asymptomatic.
    #[validate(range(min = 0.0, max = 1.0))]
    pub p: f64,
    /// Quarantine window.
    pub quarantine: QuarantineWindow,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            chi: 0.76,
            phi: 0.005,
            beta: 0.6,
            rho: 0.12,
            delta: 0.1,
            gamma: 0.05,
            alpha: 0.37,
            mu: 0.01,
            p: 0.63,
            quarantine: QuarantineWindow::default(),
        }
    }
}

impl ModelParameters {
    /// Reject any rate outside its documented domain.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EpiError::InvalidParameter`] naming the first
    /// offending field.
    pub fn check(&self) -> EpiResult<()> {
        check_range("chi", self.chi, 0.0, 1.0)?;
        check_range("phi", self.phi, 0.0, 0.5)?;
        check_range("beta", self.beta, 0.0, 1.0)?;
        check_range("rho", self.rho, 0.0, 1.0)?;
        check_range("delta", self.delta, 0.0, 1.0)?;
        check_range("gamma", self.gamma, 0.0, 1.0)?;
        check_range("alpha", self.alpha, 0.0, 10.0)?;
        check_range("mu", self.mu, 0.0, 1.0)?;
        check_range("p", self.p, 0.0, 1.0)?;
        Ok(())
    }

    /// Effective reproduction number, `R0 = -(βχ' - β)/δ` with χ' = χ
    /// inside the quarantine window and 0 outside.
    #[must_use]
    pub fn reproduction_number(&self, in_quarantine: bool) -> f64 {
        let chi = if in_quarantine { self.chi } else { 0.0 };
        -(self.beta * chi - self.beta) / self.delta
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> EpiResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(crate::EpiError::parameter(name, value, min, max))
    }
}

/// Feature flags resolving the revision differences between the SEQIAHR
/// model variants.
///
/// The source revisions disagree on two points: whether ρ only discharges H
/// or also attenuates its transmission, and whether H contributes to the
/// force of infection at all. Neither reading is authoritative, so both are
/// preserved here; use the named presets to pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelVariant {
    /// Report the cumulative-death channel D.
    #[serde(default)]
    pub track_deaths: bool,
    /// Recover asymptomatic cases at γ instead of δ.
    #[serde(default)]
    pub distinct_asymptomatic_recovery: bool,
    /// Include a `(1-ρ)·H` term in the force of infection.
    #[serde(default)]
    pub hospitalized_transmission: bool,
}

impl ModelVariant {
    /// Seven-channel form:
    ///
    /// ```text
    /// dS = -λ(1-χ)S          dH = φδI - (ρ+μ)H
    /// dE =  λ(1-χ)S - αE     dR = (1-φ)δI + ρH + δA
    /// dI = (1-p)αE - δI      dC = φδI
    /// dA =  pαE - δA         λ  = β(I+A)
    /// ```
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            track_deaths: false,
            distinct_asymptomatic_recovery: false,
            hospitalized_transmission: false,
        }
    }

    /// Eight-channel form: classic plus `dD = μH`, with A recovering at γ
    /// (so `dA = pαE - γA` and γA feeds R).
    #[must_use]
    pub const fn extended() -> Self {
        Self {
            track_deaths: true,
            distinct_asymptomatic_recovery: true,
            hospitalized_transmission: false,
        }
    }

    /// Extended form with hospitalized cases contributing to transmission:
    /// `λ = β(I + A + (1-ρ)H)`.
    #[must_use]
    pub const fn attenuated_hospital_transmission() -> Self {
        Self {
            track_deaths: true,
            distinct_asymptomatic_recovery: true,
            hospitalized_transmission: true,
        }
    }

    /// All channels this variant reports.
    #[must_use]
    pub fn compartments(&self) -> Vec<Compartment> {
        let mut set = vec![
            Compartment::Susceptible,
            Compartment::Exposed,
            Compartment::Infectious,
            Compartment::Asymptomatic,
            Compartment::Hospitalized,
            Compartment::Recovered,
            Compartment::CumulativeHospitalizations,
        ];
        if self.track_deaths {
            set.push(Compartment::CumulativeDeaths);
        }
        set
    }

    /// The default chart selection: active infection channels and the
    /// cumulative counters, without S and R.
    #[must_use]
    pub fn default_display_compartments(&self) -> Vec<Compartment> {
        let mut set = vec![
            Compartment::Exposed,
            Compartment::Infectious,
            Compartment::Asymptomatic,
            Compartment::Hospitalized,
            Compartment::CumulativeHospitalizations,
        ];
        if self.track_deaths {
            set.push(Compartment::CumulativeDeaths);
        }
        set
    }
}

/// Compartment fractions of the population at risk at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeqiahrState {
    /// Time in days.
    pub time: f64,
    /// S fraction.
    pub susceptible: f64,
    /// E fraction.
    pub exposed: f64,
    /// I fraction.
    pub infectious: f64,
    /// A fraction.
    pub asymptomatic: f64,
    /// H fraction.
    pub hospitalized: f64,
    /// R fraction.
    pub recovered: f64,
    /// C accumulator.
    pub cumulative_hospitalizations: f64,
    /// D accumulator.
    pub cumulative_deaths: f64,
}

impl SeqiahrState {
    /// Fully susceptible population seeded with a fraction of infectious
    /// cases at time zero.
    #[must_use]
    pub fn seeded(initial_infectious: f64) -> Self {
        Self {
            time: 0.0,
            susceptible: 1.0 - initial_infectious,
            exposed: 0.0,
            infectious: initial_infectious,
            asymptomatic: 0.0,
            hospitalized: 0.0,
            recovered: 0.0,
            cumulative_hospitalizations: 0.0,
            cumulative_deaths: 0.0,
        }
    }

    /// Value of one compartment.
    #[must_use]
    pub const fn get(&self, compartment: Compartment) -> f64 {
        match compartment {
            Compartment::Susceptible => self.susceptible,
            Compartment::Exposed => self.exposed,
            Compartment::Infectious => self.infectious,
            Compartment::Asymptomatic => self.asymptomatic,
            Compartment::Hospitalized => self.hospitalized,
            Compartment::Recovered => self.recovered,
            Compartment::CumulativeHospitalizations => self.cumulative_hospitalizations,
            Compartment::CumulativeDeaths => self.cumulative_deaths,
        }
    }

    /// Sum of the living sub-populations (S+E+I+A+H+R).
    #[must_use]
    pub fn living_total(&self) -> f64 {
        self.susceptible
            + self.exposed
            + self.infectious
            + self.asymptomatic
            + self.hospitalized
            + self.recovered
    }

    /// Conserved total of the closed system (living plus cumulative deaths).
    #[must_use]
    pub fn closed_total(&self) -> f64 {
        self.living_total() + self.cumulative_deaths
    }

    pub(crate) fn to_array(self) -> [f64; 8] {
        [
            self.susceptible,
            self.exposed,
            self.infectious,
            self.asymptomatic,
            self.hospitalized,
            self.recovered,
            self.cumulative_hospitalizations,
            self.cumulative_deaths,
        ]
    }

    pub(crate) const fn from_array(time: f64, y: [f64; 8]) -> Self {
        Self {
            time,
            susceptible: y[0],
            exposed: y[1],
            infectious: y[2],
            asymptomatic: y[3],
            hospitalized: y[4],
            recovered: y[5],
            cumulative_hospitalizations: y[6],
            cumulative_deaths: y[7],
        }
    }
}

/// Simulated day range; trajectories are sampled at every integer day in
/// `[start, end]` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeRange {
    /// First sampled day.
    pub start: u32,
    /// Last sampled day; must exceed `start`.
    pub end: u32,
}

impl TimeRange {
    /// Range covering `[start, end]`.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of sampled days.
    #[must_use]
    pub const fn samples(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new(0, 365)
    }
}

/// Ordered day-by-day samples of the simulated system, annotated with the
/// quarantine window it was produced under.
///
/// A pure function of its inputs: repeated simulation with identical inputs
/// yields a bit-identical trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    states: Vec<SeqiahrState>,
    quarantine: QuarantineWindow,
}

impl Trajectory {
    pub(crate) fn from_states(states: Vec<SeqiahrState>, quarantine: QuarantineWindow) -> Self {
        Self { states, quarantine }
    }

    /// Sampled states in time order.
    #[must_use]
    pub fn states(&self) -> &[SeqiahrState] {
        &self.states
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the trajectory holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Final sampled state.
    #[must_use]
    pub fn last(&self) -> Option<&SeqiahrState> {
        self.states.last()
    }

    /// Quarantine window the trajectory was simulated under.
    #[must_use]
    pub const fn quarantine(&self) -> QuarantineWindow {
        self.quarantine
    }

    /// (time, fraction) series for one compartment.
    pub fn series(&self, compartment: Compartment) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.states
            .iter()
            .map(move |s| (s.time, s.get(compartment)))
    }
}

/// Solve the SEQIAHR system: validates `params`, then integrates from
/// `initial` over `range` with default solver options.
///
/// # Errors
///
/// Returns [`crate::EpiError::InvalidParameter`] for out-of-domain rates and
/// [`crate::EpiError::IntegrationFailure`] if the stability guard trips.
pub fn simulate(
    initial: &SeqiahrState,
    range: TimeRange,
    params: &ModelParameters,
    variant: ModelVariant,
) -> EpiResult<Trajectory> {
    SeqiahrModel::new(params.clone(), variant)?.simulate(initial, range)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quarantine_window_contains() {
        let w = QuarantineWindow::new(35, 80);
        assert!(!w.contains(34.999));
        assert!(w.contains(35.0));
        assert!(w.contains(114.999));
        assert!(!w.contains(115.0));
    }

    #[test]
    fn test_quarantine_window_zero_duration_never_engages() {
        let w = QuarantineWindow::new(35, 0);
        assert!(!w.contains(35.0));
        assert!(!w.contains(100.0));
    }

    #[test]
    fn test_quarantine_window_open_ended() {
        let w = QuarantineWindow::open_ended(10);
        assert!(w.contains(10.0));
        assert!(w.contains(10_000.0));
        assert!(w.end().is_none());
    }

    #[test]
    fn test_parameters_default_in_domain() {
        let params = ModelParameters::default();
        assert!(params.check().is_ok());
    }

    #[test]
    fn test_parameters_check_rejects_out_of_domain() {
        let params = ModelParameters {
            beta: 1.2,
            ..Default::default()
        };
        let err = params.check().unwrap_err();
        assert!(err.to_string().contains("beta"));
    }

    #[test]
    fn test_parameters_check_rejects_non_finite() {
        let params = ModelParameters {
            alpha: f64::NAN,
            ..Default::default()
        };
        assert!(params.check().is_err());
    }

    #[test]
    fn test_reproduction_number_sign_convention() {
        // R0 = -(βχ - β)/δ: 0.864 inside the window, 6.0 outside,
        // with the default β=0.6, χ=0.76, δ=0.1.
        let params = ModelParameters::default();
        assert!((params.reproduction_number(true) - 0.864).abs() < 1e-12);
        assert!((params.reproduction_number(false) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_variant_presets() {
        assert_eq!(ModelVariant::default(), ModelVariant::classic());
        assert!(ModelVariant::extended().track_deaths);
        assert!(!ModelVariant::extended().hospitalized_transmission);
        assert!(ModelVariant::attenuated_hospital_transmission().hospitalized_transmission);
    }

    #[test]
    fn test_variant_compartment_sets() {
        let classic = ModelVariant::classic();
        assert_eq!(classic.compartments().len(), 7);
        assert!(!classic
            .compartments()
            .contains(&Compartment::CumulativeDeaths));

        let extended = ModelVariant::extended();
        assert_eq!(extended.compartments().len(), 8);
        assert_eq!(extended.default_display_compartments().len(), 6);
    }

    #[test]
    fn test_state_seeded() {
        let state = SeqiahrState::seeded(1e-6);
        assert!((state.living_total() - 1.0).abs() < 1e-12);
        assert!((state.infectious - 1e-6).abs() < f64::EPSILON);
        assert!((state.cumulative_hospitalizations).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_array_round_trip() {
        let state = SeqiahrState::seeded(1e-3);
        let back = SeqiahrState::from_array(state.time, state.to_array());
        assert_eq!(state, back);
    }

    #[test]
    fn test_compartment_symbols() {
        let symbols: Vec<&str> = Compartment::ALL.iter().map(|c| c.symbol()).collect();
        assert_eq!(symbols, ["S", "E", "I", "A", "H", "R", "C", "D"]);
        for (i, c) in Compartment::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_time_range_samples() {
        assert_eq!(TimeRange::new(0, 365).samples(), 366);
        assert_eq!(TimeRange::new(10, 12).samples(), 3);
    }

    #[test]
    fn test_parameters_yaml_rejects_unknown_keys() {
        let yaml = r"
chi: 0.5
phi: 0.01
beta: 0.5
rho: 0.1
delta: 0.1
gamma: 0.05
alpha: 0.33
mu: 0.01
p: 0.6
quarantine: { start: 30 }
sigma: 0.2
";
        let parsed: Result<ModelParameters, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err(), "unknown key `sigma` must be rejected");
    }

    #[test]
    fn test_parameters_yaml_open_ended_quarantine() {
        let yaml = r"
chi: 0.5
phi: 0.01
beta: 0.5
rho: 0.1
delta: 0.1
gamma: 0.05
alpha: 0.33
mu: 0.01
p: 0.6
quarantine: { start: 30 }
";
        let parsed: ModelParameters = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.quarantine.duration, None);
        assert!(parsed.quarantine.contains(1e6));
    }
}
