//! Reshaping, scaling, summary statistics, and table export.
//!
//! The simulator works in fractions of the population at risk; everything
//! here converts to absolute counts and to the long-form (tidy) layout that
//! charting sinks consume: one row per (time, compartment) pair.

use std::fmt;
use std::io::Write;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{EpiError, EpiResult};
use crate::model::{Compartment, QuarantineWindow, Trajectory};

/// Insertion-ordered mapping from compartment to chart label.
///
/// Defaults to the English display names; callers can override any subset
/// (the dashboards this core was built for label compartments in
/// Portuguese).
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: IndexMap<Compartment, String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        let mut labels = IndexMap::with_capacity(Compartment::ALL.len());
        for c in Compartment::ALL {
            labels.insert(c, c.display_name().to_string());
        }
        Self { labels }
    }
}

impl LabelMap {
    /// Empty map; unlabeled compartments fall back to their display name.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            labels: IndexMap::new(),
        }
    }

    /// Set the label for one compartment.
    pub fn insert(&mut self, compartment: Compartment, label: impl Into<String>) -> &mut Self {
        self.labels.insert(compartment, label.into());
        self
    }

    /// Label for a compartment, falling back to its display name.
    #[must_use]
    pub fn label(&self, compartment: Compartment) -> &str {
        self.labels
            .get(&compartment)
            .map_or_else(|| compartment.display_name(), String::as_str)
    }
}

/// One row of the long-form table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormRow {
    /// Time in days.
    pub time: f64,
    /// Display label of the compartment.
    pub compartment: String,
    /// Absolute individual count (fraction × population).
    pub count: f64,
}

/// Long-form (tidy) table of absolute counts, annotated with the
/// quarantine window for chart shading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormTable {
    /// Rows, grouped by compartment in selection order, each group in time
    /// order.
    pub rows: Vec<LongFormRow>,
    /// Quarantine window of the source trajectory.
    pub quarantine: QuarantineWindow,
}

impl LongFormTable {
    /// Write the table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::Io`] if the writer fails.
    pub fn write_csv<W: Write>(&self, w: &mut W) -> EpiResult<()> {
        writeln!(w, "time,compartment,count")?;
        for row in &self.rows {
            writeln!(w, "{},{},{}", row.time, csv_field(&row.compartment), row.count)?;
        }
        Ok(())
    }

    /// Write the table as JSON lines, one row object per line.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::Io`] if the writer fails or a row cannot be
    /// serialized.
    pub fn write_json_lines<W: Write>(&self, w: &mut W) -> EpiResult<()> {
        for row in &self.rows {
            let line = serde_json::to_string(row)
                .map_err(|e| EpiError::config(format!("row serialization failed: {e}")))?;
            writeln!(w, "{line}")?;
        }
        Ok(())
    }
}

/// Quote a CSV field if it holds a delimiter or quote.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Peak and cumulative reductions over a scaled trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Largest symptomatic-infectious count.
    pub peak_infectious: f64,
    /// Day of the infectious peak.
    pub peak_day_infectious: u32,
    /// Largest hospitalized count.
    pub peak_hospitalized: f64,
    /// Day of the hospitalization peak.
    pub peak_day_hospitalized: u32,
    /// Largest single-day death count.
    pub peak_daily_deaths: f64,
    /// Day of the single-day death peak.
    pub peak_day_daily_deaths: u32,
    /// Total hospital admissions at the end of the horizon.
    pub cumulative_hospitalizations: f64,
    /// Total deaths at the end of the horizon.
    pub cumulative_deaths: f64,
    /// N − R(final) − D(final): everyone the epidemic touched.
    pub total_infected_estimate: f64,
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "peak infectious:             {:>14.0} (day {})",
            self.peak_infectious, self.peak_day_infectious
        )?;
        writeln!(
            f,
            "peak hospitalized:           {:>14.0} (day {})",
            self.peak_hospitalized, self.peak_day_hospitalized
        )?;
        writeln!(
            f,
            "peak daily deaths:           {:>14.0} (day {})",
            self.peak_daily_deaths, self.peak_day_daily_deaths
        )?;
        writeln!(
            f,
            "cumulative hospitalizations: {:>14.0}",
            self.cumulative_hospitalizations
        )?;
        writeln!(f, "cumulative deaths:           {:>14.0}", self.cumulative_deaths)?;
        write!(
            f,
            "total infected estimate:     {:>14.0}",
            self.total_infected_estimate
        )
    }
}

impl Trajectory {
    /// Reshape selected compartments into a long-form table of absolute
    /// counts.
    ///
    /// Row count is exactly `samples × selected compartments`; rows are
    /// grouped by compartment in selection order, each group in time order.
    #[must_use]
    pub fn to_display_table(
        &self,
        compartments: &[Compartment],
        labels: &LabelMap,
        population: f64,
    ) -> LongFormTable {
        let mut rows = Vec::with_capacity(self.len() * compartments.len());
        for &compartment in compartments {
            let label = labels.label(compartment);
            for state in self.states() {
                rows.push(LongFormRow {
                    time: state.time,
                    compartment: label.to_string(),
                    count: state.get(compartment) * population,
                });
            }
        }
        LongFormTable {
            rows,
            quarantine: self.quarantine(),
        }
    }

    /// Compute summary statistics over the scaled (absolute-count) series.
    #[must_use]
    pub fn summary_stats(&self, population: f64) -> SummaryStats {
        let (peak_infectious, peak_day_infectious) =
            self.scaled_peak(Compartment::Infectious, population);
        let (peak_hospitalized, peak_day_hospitalized) =
            self.scaled_peak(Compartment::Hospitalized, population);

        let mut peak_daily_deaths = 0.0;
        let mut peak_day_daily_deaths = 0;
        for pair in self.states().windows(2) {
            let daily = (pair[1].cumulative_deaths - pair[0].cumulative_deaths) * population;
            if daily > peak_daily_deaths {
                peak_daily_deaths = daily;
                peak_day_daily_deaths = pair[1].time as u32;
            }
        }

        let (final_recovered, final_c, final_d) = self.last().map_or((0.0, 0.0, 0.0), |s| {
            (
                s.recovered,
                s.cumulative_hospitalizations,
                s.cumulative_deaths,
            )
        });

        SummaryStats {
            peak_infectious,
            peak_day_infectious,
            peak_hospitalized,
            peak_day_hospitalized,
            peak_daily_deaths,
            peak_day_daily_deaths,
            cumulative_hospitalizations: final_c * population,
            cumulative_deaths: final_d * population,
            total_infected_estimate: population
                - final_recovered * population
                - final_d * population,
        }
    }

    fn scaled_peak(&self, compartment: Compartment, population: f64) -> (f64, u32) {
        let mut peak = 0.0;
        let mut day = 0;
        for state in self.states() {
            let value = state.get(compartment) * population;
            if value > peak {
                peak = value;
                day = state.time as u32;
            }
        }
        (peak, day)
    }
}

/// Free-function form of [`Trajectory::to_display_table`].
#[must_use]
pub fn to_display_table(
    trajectory: &Trajectory,
    compartments: &[Compartment],
    labels: &LabelMap,
    population: f64,
) -> LongFormTable {
    trajectory.to_display_table(compartments, labels, population)
}

/// Free-function form of [`Trajectory::summary_stats`].
#[must_use]
pub fn summary_stats(trajectory: &Trajectory, population: f64) -> SummaryStats {
    trajectory.summary_stats(population)
}
