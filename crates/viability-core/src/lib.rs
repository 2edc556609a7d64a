//! Investment financial viability engine.
//!
//! Turns one project's investment and financing parameters into a
//! year-by-year cash-flow projection, capital-budgeting metrics, a
//! two-tranche DSCR schedule, scenario and sensitivity analyses, and an
//! investment grade. Every operation is a pure function of its input.

pub mod amortization;
pub mod analysis;
pub mod cash_flow;
pub mod config;
pub mod dscr;
pub mod error;
pub mod input;
pub mod metrics;
pub mod numeric;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "grading")]
pub mod grading;

pub use analysis::{analyze_investment, evaluate, project_cash_flows, InvestmentResult};
pub use config::EngineConfig;
pub use error::ViabilityError;
pub use input::{InvestmentInput, ScenarioType};
pub use types::*;

/// Standard result type for all engine operations
pub type ViabilityResult<T> = Result<T, ViabilityError>;
