//! Scenario configuration with YAML schema and validation.
//!
//! Mistake-proofing happens in three layers: serde rejects unknown keys,
//! `validator` enforces the documented parameter domains, and semantic
//! validation catches constraints the schema cannot express (initial
//! fractions summing past 1, reversed time ranges).

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{EpiError, EpiResult};
use crate::model::{
    ModelParameters, ModelVariant, SeqiahrModel, SeqiahrState, TimeRange, Trajectory,
};
use crate::solver::SolverOptions;

/// Complete description of a simulation scenario, loadable from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Scenario metadata.
    #[serde(default)]
    pub scenario: ScenarioMeta,

    /// Epidemiological rates and quarantine window.
    #[validate(nested)]
    #[serde(default)]
    pub parameters: ModelParameters,

    /// Model variant flags.
    #[serde(default)]
    pub variant: ModelVariant,

    /// Population at risk (N).
    #[validate(range(min = 1.0))]
    #[serde(default = "default_population")]
    pub population: f64,

    /// Initial compartment fractions.
    #[validate(nested)]
    #[serde(default)]
    pub initial: InitialConditions,

    /// Simulated day range.
    #[serde(default)]
    pub range: TimeRange,

    /// Numerical integration options.
    #[validate(nested)]
    #[serde(default)]
    pub solver: SolverOptions,
}

fn default_population() -> f64 {
    102.3e6
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioMeta::default(),
            parameters: ModelParameters::default(),
            variant: ModelVariant::default(),
            population: default_population(),
            initial: InitialConditions::default(),
            range: TimeRange::default(),
            solver: SolverOptions::default(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> EpiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> EpiResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Create a builder for programmatic construction.
    #[must_use]
    pub fn builder() -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::default()
    }

    /// Build the model and run the scenario.
    ///
    /// # Errors
    ///
    /// Propagates parameter and integration errors from the model.
    pub fn run(&self) -> EpiResult<Trajectory> {
        let model = SeqiahrModel::new(self.parameters.clone(), self.variant)?
            .with_solver_options(self.solver);
        model.simulate(&self.initial.to_state(self.range.start), self.range)
    }

    /// Validate constraints beyond the schema.
    fn validate_semantic(&self) -> EpiResult<()> {
        if self.range.end <= self.range.start {
            return Err(EpiError::config(format!(
                "time range [{}, {}] must span at least one day",
                self.range.start, self.range.end
            )));
        }

        let total = self.initial.total();
        if total > 1.0 + 1e-9 {
            return Err(EpiError::config(format!(
                "initial fractions sum to {total}, exceeding the population"
            )));
        }

        if !self.population.is_finite() {
            return Err(EpiError::config("population must be finite"));
        }

        Ok(())
    }
}

/// Scenario metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioMeta {
    /// Scenario name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Initial compartment fractions; the cumulative channels start at zero.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InitialConditions {
    /// S fraction at the start of the range.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_susceptible")]
    pub susceptible: f64,
    /// E fraction.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub exposed: f64,
    /// I fraction.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_infectious")]
    pub infectious: f64,
    /// A fraction.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub asymptomatic: f64,
    /// H fraction.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub hospitalized: f64,
    /// R fraction.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub recovered: f64,
}

const fn default_susceptible() -> f64 {
    1.0 - 1e-6
}

const fn default_infectious() -> f64 {
    1e-6
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            susceptible: default_susceptible(),
            exposed: 0.0,
            infectious: default_infectious(),
            asymptomatic: 0.0,
            hospitalized: 0.0,
            recovered: 0.0,
        }
    }
}

impl InitialConditions {
    /// Sum of the initial fractions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible
            + self.exposed
            + self.infectious
            + self.asymptomatic
            + self.hospitalized
            + self.recovered
    }

    /// Convert to a simulation state stamped at `start`.
    #[must_use]
    pub fn to_state(&self, start: u32) -> SeqiahrState {
        SeqiahrState {
            time: f64::from(start),
            susceptible: self.susceptible,
            exposed: self.exposed,
            infectious: self.infectious,
            asymptomatic: self.asymptomatic,
            hospitalized: self.hospitalized,
            recovered: self.recovered,
            cumulative_hospitalizations: 0.0,
            cumulative_deaths: 0.0,
        }
    }
}

/// Builder for programmatic scenario construction.
#[derive(Debug, Default)]
pub struct ScenarioConfigBuilder {
    parameters: Option<ModelParameters>,
    variant: Option<ModelVariant>,
    population: Option<f64>,
    initial_infectious: Option<f64>,
    range: Option<TimeRange>,
    solver: Option<SolverOptions>,
}

impl ScenarioConfigBuilder {
    /// Set the model parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: ModelParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set the model variant.
    #[must_use]
    pub const fn variant(mut self, variant: ModelVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Set the population at risk.
    #[must_use]
    pub const fn population(mut self, population: f64) -> Self {
        self.population = Some(population);
        self
    }

    /// Seed the initial state with this infectious fraction (the rest
    /// susceptible).
    #[must_use]
    pub const fn initial_infectious(mut self, fraction: f64) -> Self {
        self.initial_infectious = Some(fraction);
        self
    }

    /// Set the simulated day range.
    #[must_use]
    pub const fn range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Set the solver options.
    #[must_use]
    pub const fn solver(mut self, solver: SolverOptions) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();

        if let Some(parameters) = self.parameters {
            config.parameters = parameters;
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(population) = self.population {
            config.population = population;
        }
        if let Some(fraction) = self.initial_infectious {
            config.initial = InitialConditions {
                susceptible: 1.0 - fraction,
                infectious: fraction,
                ..InitialConditions::default()
            };
        }
        if let Some(range) = self.range {
            config.range = range;
        }
        if let Some(solver) = self.solver {
            config.solver = solver;
        }

        config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SCENARIO_YAML: &str = r"
scenario:
  name: baseline
  description: dashboard defaults
parameters:
  chi: 0.76
  phi: 0.005
  beta: 0.6
  rho: 0.12
  delta: 0.1
  gamma: 0.05
  alpha: 0.37
  mu: 0.01
  p: 0.63
  quarantine:
    start: 35
    duration: 80
variant:
  track_deaths: true
  distinct_asymptomatic_recovery: true
population: 102300000
initial:
  susceptible: 0.999999
  infectious: 0.000001
range:
  start: 0
  end: 365
";

    #[test]
    fn test_from_yaml_full_scenario() {
        let config = ScenarioConfig::from_yaml(SCENARIO_YAML).unwrap();
        assert_eq!(config.scenario.name, "baseline");
        assert!((config.parameters.chi - 0.76).abs() < f64::EPSILON);
        assert!(config.variant.track_deaths);
        assert_eq!(config.range.samples(), 366);
        assert_eq!(config.solver, SolverOptions::default());
    }

    #[test]
    fn test_from_yaml_rejects_unknown_keys() {
        let yaml = "population: 1000\nretries: 3\n";
        assert!(ScenarioConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_yaml_rejects_out_of_domain_rate() {
        let yaml = SCENARIO_YAML.replace("beta: 0.6", "beta: 1.4");
        let err = ScenarioConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, EpiError::Validation(_)));
    }

    #[test]
    fn test_from_yaml_rejects_reversed_range() {
        let yaml = SCENARIO_YAML.replace("end: 365", "end: 0");
        let err = ScenarioConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("at least one day"));
    }

    #[test]
    fn test_from_yaml_rejects_overfull_initial() {
        let yaml =
            SCENARIO_YAML.replace("susceptible: 0.999999", "susceptible: 0.9\n  exposed: 0.2");
        let err = ScenarioConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("exceeding"));
    }

    #[test]
    fn test_defaults_match_dashboard_sliders() {
        let config = ScenarioConfig::default();
        assert!((config.parameters.beta - 0.6).abs() < f64::EPSILON);
        assert!((config.population - 102.3e6).abs() < 1.0);
        assert_eq!(config.parameters.quarantine.start, 35);
        assert_eq!(config.parameters.quarantine.duration, Some(80));
        assert!((config.initial.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_builder() {
        let config = ScenarioConfig::builder()
            .variant(ModelVariant::extended())
            .population(1e6)
            .initial_infectious(1e-4)
            .range(TimeRange::new(0, 120))
            .build();

        assert!(config.variant.track_deaths);
        assert!((config.population - 1e6).abs() < f64::EPSILON);
        assert!((config.initial.infectious - 1e-4).abs() < f64::EPSILON);
        assert!((config.initial.total() - 1.0).abs() < 1e-12);
        assert_eq!(config.range.samples(), 121);
    }

    #[test]
    fn test_run_produces_trajectory() {
        let config = ScenarioConfig::builder()
            .range(TimeRange::new(0, 30))
            .build();
        let trajectory = config.run().unwrap();
        assert_eq!(trajectory.len(), 31);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ScenarioConfig::from_yaml(SCENARIO_YAML).unwrap();
        let serialized = serde_yaml::to_string(&config).unwrap();
        let reparsed = ScenarioConfig::from_yaml(&serialized).unwrap();
        assert!((reparsed.parameters.beta - config.parameters.beta).abs() < f64::EPSILON);
        assert_eq!(reparsed.range, config.range);
    }
}
