//! # episim
//!
//! SEQIAHR compartmental epidemic simulator with quarantine-intervention
//! dynamics.
//!
//! The crate solves the SEQIAHR system (Susceptible / Exposed /
//! Quarantined-fraction / Infectious / Asymptomatic / Hospitalized /
//! Recovered, plus cumulative channels) over a range of days, with a
//! step-function quarantine window removing a fraction χ of susceptibles
//! from transmission, and reshapes the fractional trajectories into
//! absolute-count tidy tables for charting.
//!
//! ## Example
//!
//! ```rust
//! use episim::prelude::*;
//!
//! let config = ScenarioConfig::builder()
//!     .population(102.3e6)
//!     .range(TimeRange::new(0, 365))
//!     .build();
//! let trajectory = config.run().unwrap();
//! let stats = trajectory.summary_stats(config.population);
//! assert!(stats.peak_infectious > 0.0);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops, // Numerical code choices are intentional
    clippy::imprecise_flops,
    clippy::missing_const_for_fn,
    clippy::needless_range_loop
)]

pub mod config;
pub mod error;
pub mod memo;
pub mod model;
pub mod output;
pub mod solver;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{InitialConditions, ScenarioConfig, ScenarioConfigBuilder};
    pub use crate::error::{EpiError, EpiResult};
    pub use crate::memo::{ExpiryPolicy, NeverExpire, SimulationCache, Ttl};
    pub use crate::model::{
        simulate, Compartment, ModelParameters, ModelVariant, QuarantineWindow, SeqiahrModel,
        SeqiahrState, TimeRange, Trajectory,
    };
    pub use crate::output::{
        summary_stats, to_display_table, LabelMap, LongFormRow, LongFormTable, SummaryStats,
    };
    pub use crate::solver::SolverOptions;
}

/// Re-export for public API
pub use error::{EpiError, EpiResult};

/// Crate version embedded at build time.
pub const VERSION: &str = env!("EPISIM_VERSION");
