use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::analysis::{apply_scenario, evaluate, map_runs};
use crate::config::EngineConfig;
use crate::error::ViabilityError;
use crate::input::{InvestmentInput, ScenarioType};
use crate::numeric::NumericGuard;
use crate::types::*;
use crate::ViabilityResult;

const SCENARIOS: [ScenarioType; 3] = [
    ScenarioType::Pessimistic,
    ScenarioType::Neutral,
    ScenarioType::Optimistic,
];

/// Metrics of one scenario variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: ScenarioType,
    pub probability: Rate,
    pub annual_revenue: Money,
    pub operating_profit_rate: Percent,
    pub revenue_growth_rate: Percent,
    pub npv: Money,
    pub irr: Rate,
    pub payback_period: Payback,
    pub roi: Rate,
    pub profitability_index: Decimal,
    pub mirr: Rate,
    pub min_dscr: Coverage,
    pub deviation_from_base: Money,
    pub deviation_pct: Rate,
}

/// Pessimistic / base / optimistic side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub outcomes: Vec<ScenarioOutcome>,
    pub probability_weighted_npv: Money,
    /// Optimistic NPV less pessimistic NPV
    pub npv_range: Money,
}

impl ScenarioComparison {
    pub fn outcome(&self, scenario: ScenarioType) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.scenario == scenario)
    }
}

fn weight(scenario: ScenarioType, config: &EngineConfig) -> Rate {
    match scenario {
        ScenarioType::Pessimistic => config.scenarios.pessimistic_weight,
        ScenarioType::Neutral => config.scenarios.base_weight,
        ScenarioType::Optimistic => config.scenarios.optimistic_weight,
    }
}

fn validate_weights(config: &EngineConfig) -> ViabilityResult<()> {
    for scenario in SCENARIOS {
        let w = weight(scenario, config);
        if w < Decimal::ZERO || w > Decimal::ONE {
            return Err(ViabilityError::InvalidInput {
                field: format!("scenario:{scenario:?} weight"),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }
    let total: Decimal = SCENARIOS.iter().map(|s| weight(*s, config)).sum();
    if (total - Decimal::ONE).abs() > dec!(0.001) {
        return Err(ViabilityError::InvalidInput {
            field: "scenario weights".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total})"),
        });
    }
    Ok(())
}

/// Run the three scenario variants of `input` independently.
///
/// The variants are always derived from the input as supplied; its own
/// `scenario_type` does not shift the base case.
pub fn build_comparison(
    input: &InvestmentInput,
    config: &EngineConfig,
) -> ViabilityResult<ScenarioComparison> {
    validate_weights(config)?;

    let runs = map_runs(&SCENARIOS, |scenario| {
        let variant = apply_scenario(input, *scenario, config);
        let evaluation = evaluate(&variant, config);
        (*scenario, variant, evaluation)
    });

    let base_npv = runs
        .iter()
        .find(|(s, _, _)| *s == ScenarioType::Neutral)
        .map(|(_, _, e)| e.metrics.npv)
        .unwrap_or(Decimal::ZERO);

    let mut guard = NumericGuard::new();
    let mut outcomes = Vec::with_capacity(runs.len());
    let mut probability_weighted_npv = Decimal::ZERO;

    for (scenario, variant, evaluation) in runs {
        let m = &evaluation.metrics;
        let deviation = guard.sub(m.npv, base_npv);
        let deviation_pct = if base_npv.is_zero() {
            Decimal::ZERO
        } else {
            guard.div(deviation, base_npv.abs())
        };
        let probability = weight(scenario, config);
        let weighted = guard.mul(probability, m.npv);
        probability_weighted_npv = guard.add(probability_weighted_npv, weighted);

        outcomes.push(ScenarioOutcome {
            scenario,
            probability,
            annual_revenue: variant.annual_revenue,
            operating_profit_rate: variant.operating_profit_rate,
            revenue_growth_rate: variant.revenue_growth_rate,
            npv: m.npv,
            irr: m.irr,
            payback_period: m.payback_period,
            roi: m.roi,
            profitability_index: m.profitability_index,
            mirr: m.mirr,
            min_dscr: evaluation.dscr.min_dscr,
            deviation_from_base: deviation,
            deviation_pct,
        });
    }

    let npv_of = |s: ScenarioType| {
        outcomes
            .iter()
            .find(|o| o.scenario == s)
            .map(|o| o.npv)
            .unwrap_or(Decimal::ZERO)
    };
    let npv_range = guard.sub(
        npv_of(ScenarioType::Optimistic),
        npv_of(ScenarioType::Pessimistic),
    );

    Ok(ScenarioComparison {
        outcomes,
        probability_weighted_npv,
        npv_range,
    })
}

/// Validate the input and compare pessimistic, base and optimistic runs.
pub fn compare_scenarios(
    input: &InvestmentInput,
    config: &EngineConfig,
) -> ViabilityResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    input.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let comparison = build_comparison(input, config)?;

    if let Some(p) = comparison.outcome(ScenarioType::Pessimistic) {
        if p.npv < Decimal::ZERO {
            warnings.push(format!(
                "Pessimistic scenario destroys value (NPV {})",
                p.npv.round_dp(0)
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Pessimistic/Base/Optimistic Scenario Analysis",
        &serde_json::json!({
            "optimistic": config.scenarios.optimistic,
            "pessimistic": config.scenarios.pessimistic,
            "weights": [
                config.scenarios.pessimistic_weight.to_string(),
                config.scenarios.base_weight.to_string(),
                config.scenarios.optimistic_weight.to_string(),
            ],
        }),
        warnings,
        elapsed,
        comparison,
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
            "tax_rate": "20"
        }))
        .unwrap()
    }

    #[test]
    fn test_three_ordered_outcomes() {
        let out = compare_scenarios(&input(), &EngineConfig::default()).unwrap();
        let c = &out.result;
        assert_eq!(c.outcomes.len(), 3);

        let p = c.outcome(ScenarioType::Pessimistic).unwrap();
        let b = c.outcome(ScenarioType::Neutral).unwrap();
        let o = c.outcome(ScenarioType::Optimistic).unwrap();
        assert!(p.npv <= b.npv && b.npv <= o.npv);
        assert_eq!(b.deviation_from_base, Decimal::ZERO);
        assert_eq!(c.npv_range, o.npv - p.npv);
    }

    #[test]
    fn test_base_variant_is_unchanged_input() {
        let c = build_comparison(&input(), &EngineConfig::default()).unwrap();
        let b = c.outcome(ScenarioType::Neutral).unwrap();
        assert_eq!(b.annual_revenue, dec!(1000));
        assert_eq!(b.operating_profit_rate, dec!(30));

        let o = c.outcome(ScenarioType::Optimistic).unwrap();
        assert_eq!(o.annual_revenue, dec!(1200));
        assert_eq!(o.revenue_growth_rate, dec!(3));
    }

    #[test]
    fn test_probability_weighted_npv() {
        let c = build_comparison(&input(), &EngineConfig::default()).unwrap();
        let expected: Decimal = c.outcomes.iter().map(|o| o.probability * o.npv).sum();
        assert_eq!(c.probability_weighted_npv, expected);
    }

    #[test]
    fn test_revenue_near_decimal_limit_completes() {
        let mut i = input();
        i.annual_revenue = dec!(70_000_000_000_000_000_000_000_000_000);
        i.operating_profit_rate = dec!(50);
        let c = build_comparison(&i, &EngineConfig::default()).unwrap();
        assert_eq!(c.outcomes.len(), 3);
        // 20% uplift does not fit; the optimistic variant keeps the base revenue
        let o = c.outcome(ScenarioType::Optimistic).unwrap();
        assert_eq!(o.annual_revenue, i.annual_revenue);
    }

    #[test]
    fn test_bad_weights_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.scenarios.base_weight = dec!(0.9);
        assert!(build_comparison(&input(), &cfg).is_err());
    }

    #[test]
    fn test_scenario_type_does_not_shift_base() {
        let mut i = input();
        i.scenario_type = ScenarioType::Pessimistic;
        let shifted = build_comparison(&i, &EngineConfig::default()).unwrap();
        let plain = build_comparison(&input(), &EngineConfig::default()).unwrap();
        assert_eq!(
            shifted.outcome(ScenarioType::Neutral).unwrap().npv,
            plain.outcome(ScenarioType::Neutral).unwrap().npv
        );
    }
}
