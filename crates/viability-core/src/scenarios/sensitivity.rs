use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::analysis::{evaluate, map_runs, Evaluation};
use crate::config::{EngineConfig, SensitivityShocks};
use crate::input::InvestmentInput;
use crate::numeric::NumericGuard;
use crate::types::*;
use crate::ViabilityResult;

/// Input driver shocked one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityVariable {
    RevenueGrowth,
    CostInflation,
    DiscountRate,
    DebtRatio,
    DepreciationRate,
}

impl SensitivityVariable {
    pub const ALL: [SensitivityVariable; 5] = [
        SensitivityVariable::RevenueGrowth,
        SensitivityVariable::CostInflation,
        SensitivityVariable::DiscountRate,
        SensitivityVariable::DebtRatio,
        SensitivityVariable::DepreciationRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SensitivityVariable::RevenueGrowth => "Revenue growth",
            SensitivityVariable::CostInflation => "Cost inflation",
            SensitivityVariable::DiscountRate => "Discount rate",
            SensitivityVariable::DebtRatio => "Debt ratio",
            SensitivityVariable::DepreciationRate => "Depreciation rate",
        }
    }

    /// Shock size in percentage points.
    pub fn shock(&self, shocks: &SensitivityShocks) -> Decimal {
        match self {
            SensitivityVariable::RevenueGrowth => shocks.revenue_growth_pp,
            SensitivityVariable::CostInflation => shocks.cost_inflation_pp,
            SensitivityVariable::DiscountRate => shocks.discount_rate_pp,
            SensitivityVariable::DebtRatio => shocks.debt_ratio_pp,
            SensitivityVariable::DepreciationRate => shocks.depreciation_rate_pp,
        }
    }

    /// Whether the shock moves debt service or the depreciation shield,
    /// so a DSCR change is worth reporting.
    pub fn reports_dscr(&self) -> bool {
        matches!(
            self,
            SensitivityVariable::DebtRatio | SensitivityVariable::DepreciationRate
        )
    }

    /// The input with this variable moved by `pp` percentage points and
    /// everything else held fixed.
    pub fn apply(&self, input: &InvestmentInput, pp: Decimal) -> InvestmentInput {
        let hundred = dec!(100);
        let mut guard = NumericGuard::new();
        let mut shocked = input.clone();
        match self {
            SensitivityVariable::RevenueGrowth => {
                shocked.revenue_growth_rate =
                    guard.add(input.revenue_growth_rate, pp).max(Decimal::ZERO);
            }
            SensitivityVariable::CostInflation => {
                shocked.cost_inflation_rate =
                    guard.add(input.cost_inflation_rate, pp).max(Decimal::ZERO);
            }
            SensitivityVariable::DiscountRate => {
                shocked.discount_rate = guard
                    .add(input.discount_rate, pp)
                    .max(Decimal::ZERO)
                    .min(hundred);
            }
            SensitivityVariable::DepreciationRate => {
                shocked.depreciation_rate = guard
                    .add(input.depreciation_rate, pp)
                    .max(Decimal::ZERO)
                    .min(hundred);
            }
            SensitivityVariable::DebtRatio => {
                let additional = guard.mul(input.initial_investment, pct(pp));
                let existing = input.total_debt();
                if existing > Decimal::ZERO {
                    let policy_share = guard.div(input.policy_loan_amount, existing);
                    let policy_extra = guard.mul(additional, policy_share);
                    let other_extra = guard.sub(additional, policy_extra);
                    shocked.policy_loan_amount = guard
                        .add(input.policy_loan_amount, policy_extra)
                        .max(Decimal::ZERO);
                    shocked.other_debt_amount = guard
                        .add(input.other_debt_amount, other_extra)
                        .max(Decimal::ZERO);
                } else if additional > Decimal::ZERO {
                    shocked.other_debt_amount = additional;
                    if shocked.other_debt_rate.is_zero() {
                        shocked.other_debt_rate = input.discount_rate;
                    }
                    if shocked.other_debt_repayment_period == 0 {
                        shocked.other_debt_repayment_period = input.analysis_years;
                    }
                }
            }
        }
        shocked
    }
}

/// Base-versus-shocked comparison for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub variable: SensitivityVariable,
    pub perturbation_pp: Decimal,
    pub base_npv: Money,
    pub shocked_npv: Money,
    /// NPV change in percent of |base NPV|; `None` when base NPV is zero
    pub npv_change_pct: Option<Decimal>,
    /// NPV % change per percentage point of shock
    pub npv_elasticity: Option<Decimal>,
    pub base_irr: Rate,
    pub shocked_irr: Rate,
    pub irr_change_pp: Decimal,
    pub irr_elasticity: Decimal,
    /// Change in minimum DSCR, when both runs carry debt service
    pub dscr_change: Option<Decimal>,
    pub dscr_elasticity: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub base_npv: Money,
    pub base_irr: Rate,
    pub base_min_dscr: Coverage,
    pub entries: Vec<SensitivityEntry>,
    /// Variable with the largest |NPV elasticity|
    pub most_sensitive: Option<SensitivityVariable>,
}

impl SensitivityReport {
    pub fn entry(&self, variable: SensitivityVariable) -> Option<&SensitivityEntry> {
        self.entries.iter().find(|e| e.variable == variable)
    }
}

fn per_pp(change: Decimal, pp: Decimal) -> Option<Decimal> {
    change.checked_div(pp)
}

fn compare(
    variable: SensitivityVariable,
    pp: Decimal,
    base: &Evaluation,
    shocked: &Evaluation,
) -> SensitivityEntry {
    let base_npv = base.metrics.npv;
    let shocked_npv = shocked.metrics.npv;
    let npv_change_pct = shocked_npv
        .checked_sub(base_npv)
        .and_then(|change| change.checked_div(base_npv.abs()))
        .and_then(|ratio| ratio.checked_mul(dec!(100)));
    let npv_elasticity = npv_change_pct.and_then(|c| per_pp(c, pp));

    let base_irr = base.metrics.irr;
    let shocked_irr = shocked.metrics.irr;
    let irr_change_pp = (shocked_irr - base_irr) * dec!(100);
    let irr_elasticity = per_pp(irr_change_pp, pp).unwrap_or(Decimal::ZERO);

    let dscr_change = if variable.reports_dscr() {
        match (base.dscr.min_dscr.ratio(), shocked.dscr.min_dscr.ratio()) {
            (Some(b), Some(s)) => s.checked_sub(b),
            _ => None,
        }
    } else {
        None
    };
    let dscr_elasticity = dscr_change.and_then(|c| per_pp(c, pp));

    SensitivityEntry {
        variable,
        perturbation_pp: pp,
        base_npv,
        shocked_npv,
        npv_change_pct,
        npv_elasticity,
        base_irr,
        shocked_irr,
        irr_change_pp,
        irr_elasticity,
        dscr_change,
        dscr_elasticity,
    }
}

/// Shock each variable in turn and rerun the pipeline. The input is taken
/// as-is (any scenario adjustment already applied by the caller).
pub fn build_sensitivity(input: &InvestmentInput, config: &EngineConfig) -> SensitivityReport {
    let base = evaluate(input, config);

    let entries = map_runs(&SensitivityVariable::ALL, |variable| {
        let pp = variable.shock(&config.sensitivity);
        let shocked = evaluate(&variable.apply(input, pp), config);
        compare(*variable, pp, &base, &shocked)
    });

    let most_sensitive = entries
        .iter()
        .filter_map(|e| e.npv_elasticity.map(|el| (e.variable, el.abs())))
        .max_by(|a, b| a.1.cmp(&b.1))
        .map(|(v, _)| v);

    debug!(
        runs = entries.len(),
        most_sensitive = ?most_sensitive,
        "sensitivity analysis complete"
    );

    SensitivityReport {
        base_npv: base.metrics.npv,
        base_irr: base.metrics.irr,
        base_min_dscr: base.dscr.min_dscr,
        entries,
        most_sensitive,
    }
}

/// Validate the input and report single-variable sensitivities.
pub fn analyze_sensitivity(
    input: &InvestmentInput,
    config: &EngineConfig,
) -> ViabilityResult<ComputationOutput<SensitivityReport>> {
    let start = Instant::now();
    input.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let report = build_sensitivity(input, config);
    if report.base_npv.is_zero() {
        warnings.push("Base NPV is zero; NPV elasticities are undefined".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-at-a-time Sensitivity Analysis (NPV / IRR / DSCR elasticity)",
        &config.sensitivity,
        warnings,
        elapsed,
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InvestmentInput {
        serde_json::from_value(serde_json::json!({
            "initial_investment": "1000",
            "annual_revenue": "1000",
            "operating_profit_rate": "30",
            "discount_rate": "8",
            "analysis_years": 10,
            "tax_rate": "20",
            "policy_loan_amount": "300",
            "policy_loan_rate": "3",
            "policy_grace_period": 1,
            "policy_repayment_period": 5
        }))
        .unwrap()
    }

    #[test]
    fn test_one_entry_per_variable() {
        let r = build_sensitivity(&input(), &EngineConfig::default());
        assert_eq!(r.entries.len(), 5);
        for (entry, variable) in r.entries.iter().zip(SensitivityVariable::ALL) {
            assert_eq!(entry.variable, variable);
            assert_eq!(entry.base_npv, r.base_npv);
        }
    }

    #[test]
    fn test_directions() {
        let r = build_sensitivity(&input(), &EngineConfig::default());
        let growth = r.entry(SensitivityVariable::RevenueGrowth).unwrap();
        assert!(growth.shocked_npv > growth.base_npv);
        assert!(growth.npv_elasticity.unwrap() > Decimal::ZERO);

        let inflation = r.entry(SensitivityVariable::CostInflation).unwrap();
        assert!(inflation.shocked_npv < inflation.base_npv);

        let discount = r.entry(SensitivityVariable::DiscountRate).unwrap();
        assert!(discount.shocked_npv < discount.base_npv);
        // Discount rate does not move IRR
        assert_eq!(discount.irr_change_pp, Decimal::ZERO);
        assert!(discount.dscr_change.is_none());
    }

    #[test]
    fn test_more_debt_lowers_coverage() {
        let r = build_sensitivity(&input(), &EngineConfig::default());
        let debt = r.entry(SensitivityVariable::DebtRatio).unwrap();
        assert!(debt.dscr_change.unwrap() < Decimal::ZERO);
        assert!(debt.dscr_elasticity.is_some());
    }

    #[test]
    fn test_debt_shock_without_existing_debt() {
        let mut i = input();
        i.policy_loan_amount = Decimal::ZERO;
        let shocked = SensitivityVariable::DebtRatio.apply(&i, dec!(10));
        assert_eq!(shocked.other_debt_amount, dec!(100));
        assert_eq!(shocked.other_debt_rate, dec!(8));
        assert_eq!(shocked.other_debt_repayment_period, 10);
        assert!(shocked.validate().is_ok());
    }

    #[test]
    fn test_debt_shock_split_proportionally() {
        let mut i = input();
        i.other_debt_amount = dec!(100);
        i.other_debt_rate = dec!(5);
        i.other_debt_repayment_period = 3;
        let shocked = SensitivityVariable::DebtRatio.apply(&i, dec!(10));
        assert_eq!(shocked.policy_loan_amount, dec!(375));
        assert_eq!(shocked.other_debt_amount, dec!(125));
    }

    #[test]
    fn test_debt_shock_on_overflowing_amounts() {
        let mut i = input();
        i.initial_investment = dec!(70_000_000_000_000_000_000_000_000_000);
        i.policy_loan_amount = dec!(70_000_000_000_000_000_000_000_000_000);
        let shocked = SensitivityVariable::DebtRatio.apply(&i, dec!(10));
        assert!(shocked.policy_loan_amount >= Decimal::ZERO);
        assert!(shocked.other_debt_amount >= Decimal::ZERO);
    }

    #[test]
    fn test_largest_accepted_amounts_complete() {
        let mut i = input();
        i.initial_investment = crate::input::MAX_AMOUNT;
        i.annual_revenue = crate::input::MAX_AMOUNT;
        i.policy_loan_amount = crate::input::MAX_AMOUNT;
        assert!(i.validate().is_ok());
        let out = analyze_sensitivity(&i, &EngineConfig::default()).unwrap();
        assert_eq!(out.result.entries.len(), 5);
    }

    #[test]
    fn test_most_sensitive_has_largest_elasticity() {
        let r = build_sensitivity(&input(), &EngineConfig::default());
        let top = r.most_sensitive.unwrap();
        let top_abs = r.entry(top).unwrap().npv_elasticity.unwrap().abs();
        for e in &r.entries {
            if let Some(el) = e.npv_elasticity {
                assert!(el.abs() <= top_abs);
            }
        }
    }

    #[test]
    fn test_envelope_rejects_invalid_input() {
        let mut i = input();
        i.initial_investment = Decimal::ZERO;
        assert!(analyze_sensitivity(&i, &EngineConfig::default()).is_err());
    }
}
