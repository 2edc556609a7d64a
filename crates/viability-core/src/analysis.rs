use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::amortization::AmortizationRow;
use crate::cash_flow::{project, CashFlowRow, Projection};
use crate::config::{EngineConfig, ScenarioAdjustment};
use crate::dscr::{self, DscrAnalysis, DscrRow};
use crate::input::{InvestmentInput, ScenarioType};
use crate::metrics::{self, InvestmentMetrics};
use crate::time_value::IrrStatus;
use crate::types::*;
use crate::ViabilityResult;

#[cfg(feature = "scenarios")]
use crate::scenarios::scenario::{build_comparison, ScenarioComparison};
#[cfg(feature = "scenarios")]
use crate::scenarios::sensitivity::{build_sensitivity, SensitivityReport};

/// One pass of the pipeline: projection, DSCR and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub projection: Projection,
    pub dscr: DscrAnalysis,
    pub metrics: InvestmentMetrics,
}

/// Full result of an analysis request. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub scenario_type: ScenarioType,
    pub cash_flows: Vec<CashFlowRow>,
    pub dscr_data: Vec<DscrRow>,
    pub policy_loan_schedule: Vec<AmortizationRow>,
    pub other_debt_schedule: Vec<AmortizationRow>,
    pub npv: Money,
    pub irr: Rate,
    pub irr_status: IrrStatus,
    pub payback_period: Payback,
    pub discounted_payback_period: Payback,
    pub roi: Rate,
    pub profitability_index: Decimal,
    pub mirr: Rate,
    pub break_even_year: Option<u32>,
    pub min_dscr: Coverage,
    pub average_dscr: Coverage,
    pub years_below_covenant: Vec<u32>,
    pub debt_ratio: Rate,
    #[cfg(feature = "scenarios")]
    pub scenarios: ScenarioComparison,
    #[cfg(feature = "scenarios")]
    pub sensitivity: SensitivityReport,
}

/// Adjustment for a scenario type; neutral leaves the input unchanged.
pub fn scenario_adjustment(scenario: ScenarioType, config: &EngineConfig) -> ScenarioAdjustment {
    match scenario {
        ScenarioType::Pessimistic => config.scenarios.pessimistic.clone(),
        ScenarioType::Neutral => ScenarioAdjustment::neutral(),
        ScenarioType::Optimistic => config.scenarios.optimistic.clone(),
    }
}

/// The input as seen by a run of the given scenario type.
pub fn apply_scenario(
    input: &InvestmentInput,
    scenario: ScenarioType,
    config: &EngineConfig,
) -> InvestmentInput {
    match scenario {
        ScenarioType::Neutral => input.clone(),
        other => input.with_adjustment(&scenario_adjustment(other, config)),
    }
}

/// Run projection, DSCR and metrics for an input as given. No validation,
/// no scenario adjustment.
pub fn evaluate(input: &InvestmentInput, config: &EngineConfig) -> Evaluation {
    let projection = project(input, config);
    let dscr = dscr::analyze(&projection, config);
    let metrics = metrics::calculate(&projection, input, config);
    Evaluation {
        projection,
        dscr,
        metrics,
    }
}

/// Map independent pipeline runs, in parallel when the `parallel` feature
/// is enabled. Output order follows input order either way.
#[cfg(feature = "parallel")]
#[cfg_attr(not(feature = "scenarios"), allow(dead_code))]
pub(crate) fn map_runs<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
#[cfg_attr(not(feature = "scenarios"), allow(dead_code))]
pub(crate) fn map_runs<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}

pub(crate) fn evaluation_warnings(evaluation: &Evaluation, input: &InvestmentInput) -> Vec<String> {
    let mut warnings = Vec::new();
    let m = &evaluation.metrics;

    if evaluation.projection.replaced_values > 0 {
        warn!(
            replaced = evaluation.projection.replaced_values,
            "non-representable values replaced with zero"
        );
        warnings.push(format!(
            "{} intermediate value(s) could not be represented and were treated as 0",
            evaluation.projection.replaced_values
        ));
    }
    match m.irr_solution.status {
        IrrStatus::Converged => {}
        IrrStatus::Undefined => warnings
            .push("IRR undefined: cash flows never change sign; reported as 0".into()),
        IrrStatus::Bounded => warnings.push(format!(
            "IRR lies outside the solver's rate bounds; {} reported",
            m.irr_solution.rate
        )),
        status => warnings.push(format!(
            "IRR solver stopped without converging ({status:?} after {} iterations); \
             best clamped estimate reported",
            m.irr_solution.iterations
        )),
    }
    if m.payback_period == Payback::NotRecoveredWithinHorizon {
        warnings.push(format!(
            "Investment not recovered within the {}-year horizon",
            input.analysis_years
        ));
    }
    if !evaluation.dscr.years_below_covenant.is_empty() {
        warnings.push(format!(
            "DSCR below covenant in year(s) {:?}: lender covenant risk",
            evaluation.dscr.years_below_covenant
        ));
    }
    warnings
}

/// Validate the input and run the complete analysis: the primary
/// evaluation (with the input's scenario type applied), the scenario
/// comparison and the sensitivity report.
pub fn analyze_investment(
    input: &InvestmentInput,
    config: &EngineConfig,
) -> ViabilityResult<ComputationOutput<InvestmentResult>> {
    let start = Instant::now();
    input.validate()?;

    let primary_input = apply_scenario(input, input.scenario_type, config);
    let evaluation = evaluate(&primary_input, config);
    let warnings = evaluation_warnings(&evaluation, &primary_input);

    #[cfg(feature = "scenarios")]
    let scenarios = build_comparison(input, config)?;
    #[cfg(feature = "scenarios")]
    let sensitivity = build_sensitivity(&primary_input, config);

    let Evaluation {
        projection,
        dscr,
        metrics: m,
    } = evaluation;

    let result = InvestmentResult {
        scenario_type: input.scenario_type,
        cash_flows: projection.rows,
        dscr_data: dscr.rows,
        policy_loan_schedule: projection.policy_loan.rows,
        other_debt_schedule: projection.other_debt.rows,
        npv: m.npv,
        irr: m.irr,
        irr_status: m.irr_solution.status,
        payback_period: m.payback_period,
        discounted_payback_period: m.discounted_payback_period,
        roi: m.roi,
        profitability_index: m.profitability_index,
        mirr: m.mirr,
        break_even_year: m.break_even_year,
        min_dscr: dscr.min_dscr,
        average_dscr: dscr.average_dscr,
        years_below_covenant: dscr.years_below_covenant,
        debt_ratio: input.debt_ratio(),
        #[cfg(feature = "scenarios")]
        scenarios,
        #[cfg(feature = "scenarios")]
        sensitivity,
    };

    debug!(
        npv = %result.npv,
        irr = %result.irr,
        warnings = warnings.len(),
        "investment analysis complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Investment Viability Analysis (DCF, bounded Newton-Raphson IRR, two-tranche DSCR)",
        &serde_json::json!({
            "initial_investment": input.initial_investment.to_string(),
            "annual_revenue": input.annual_revenue.to_string(),
            "discount_rate_pct": input.discount_rate.to_string(),
            "analysis_years": input.analysis_years,
            "scenario_type": input.scenario_type,
            "total_debt": input.total_debt().to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Validate and project only the cash-flow table.
pub fn project_cash_flows(
    input: &InvestmentInput,
    config: &EngineConfig,
) -> ViabilityResult<ComputationOutput<Vec<CashFlowRow>>> {
    let start = Instant::now();
    input.validate()?;

    let primary_input = apply_scenario(input, input.scenario_type, config);
    let projection = project(&primary_input, config);
    let mut warnings = Vec::new();
    if projection.replaced_values > 0 {
        warnings.push(format!(
            "{} intermediate value(s) could not be represented and were treated as 0",
            projection.replaced_values
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Free Cash Flow Projection",
        &serde_json::json!({
            "analysis_years": input.analysis_years,
            "scenario_type": input.scenario_type,
        }),
        warnings,
        elapsed,
        projection.rows,
    ))
}
