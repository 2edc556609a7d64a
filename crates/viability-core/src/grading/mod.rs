//! Investment grading.
//!
//! Two independent graders score the same metrics: [`AdditiveGrader`]
//! (six factors, 0-10 points each, letters S to C) and
//! [`ScaleWeightedGrader`] (four weighted factors with thresholds and a
//! risk premium that depend on investment scale, letters A to F). Both sit
//! behind [`Grader`]; callers pick the view they need.

pub mod additive;
pub mod scale_weighted;

pub use additive::AdditiveGrader;
pub use scale_weighted::ScaleWeightedGrader;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::analysis::InvestmentResult;
use crate::config::EngineConfig;
use crate::input::InvestmentInput;
use crate::types::*;
use crate::ViabilityResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    S,
    AAA,
    AA,
    A,
    BBB,
    BB,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::S => "S",
            Self::AAA => "AAA",
            Self::AA => "AA",
            Self::A => "A",
            Self::BBB => "BBB",
            Self::BB => "BB",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StronglyRecommended,
    Recommended,
    ConditionallyRecommended,
    ReviewRequired,
    NotRecommended,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StronglyRecommended => "Strongly recommended",
            Self::Recommended => "Recommended",
            Self::ConditionallyRecommended => "Conditionally recommended",
            Self::ReviewRequired => "Review required",
            Self::NotRecommended => "Not recommended",
        };
        write!(f, "{}", s)
    }
}

/// Qualitative risk from leverage (total debt / investment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
    VeryHigh,
    Critical,
}

impl RiskLevel {
    pub fn from_leverage(debt_ratio: Rate) -> Self {
        match debt_ratio {
            r if r <= dec!(0.20) => RiskLevel::Low,
            r if r <= dec!(0.40) => RiskLevel::Moderate,
            r if r <= dec!(0.60) => RiskLevel::Elevated,
            r if r <= dec!(0.80) => RiskLevel::High,
            r if r <= dec!(1.00) => RiskLevel::VeryHigh,
            _ => RiskLevel::Critical,
        }
    }
}

/// Investment-scale tier, measured in `EngineConfig::scale_unit`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleTier {
    Micro,
    Small,
    Medium,
    Large,
    Mega,
}

impl ScaleTier {
    pub fn classify(initial_investment: Money, scale_unit: Money) -> Self {
        let units = if scale_unit > Decimal::ZERO {
            initial_investment
                .checked_div(scale_unit)
                .unwrap_or(Decimal::MAX)
        } else {
            initial_investment
        };
        match units {
            u if u < dec!(25) => ScaleTier::Micro,
            u if u < dec!(50) => ScaleTier::Small,
            u if u < dec!(75) => ScaleTier::Medium,
            u if u < dec!(100) => ScaleTier::Large,
            _ => ScaleTier::Mega,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingFactor {
    Npv,
    Irr,
    Dscr,
    ProfitabilityIndex,
    Payback,
    RiskLevel,
}

/// One factor's contribution to a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: GradingFactor,
    /// The metric as scored; `None` for unconstrained DSCR or an
    /// unrecovered payback.
    pub value: Option<Decimal>,
    pub points: Decimal,
    pub max_points: Decimal,
    /// Share of the composite; equal shares for the additive grader.
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentGrade {
    pub grader: String,
    pub grade: LetterGrade,
    /// Composite score, 0-100
    pub score: Decimal,
    pub risk_premium: Rate,
    /// `score × (1 − risk_premium)`
    pub adjusted_score: Decimal,
    pub recommendation: Recommendation,
    pub description: String,
    pub details: Vec<FactorScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_tier: Option<ScaleTier>,
}

/// Metrics a grader reads. Built from an analysis result, or by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingInput {
    pub initial_investment: Money,
    pub npv: Money,
    pub irr: Rate,
    pub min_dscr: Coverage,
    pub profitability_index: Decimal,
    pub payback_period: Payback,
    pub debt_ratio: Rate,
    pub scale_unit: Money,
}

impl GradingInput {
    pub fn from_result(
        result: &InvestmentResult,
        input: &InvestmentInput,
        config: &EngineConfig,
    ) -> Self {
        Self {
            initial_investment: input.initial_investment,
            npv: result.npv,
            irr: result.irr,
            min_dscr: result.min_dscr,
            profitability_index: result.profitability_index,
            payback_period: result.payback_period,
            debt_ratio: result.debt_ratio,
            scale_unit: config.scale_unit,
        }
    }

    /// NPV per unit of investment, saturating when the ratio does not fit.
    pub fn npv_ratio(&self) -> Decimal {
        match self.npv.checked_div(self.initial_investment) {
            Some(ratio) => ratio,
            None if self.initial_investment.is_zero() => Decimal::ZERO,
            None if self.npv.is_sign_negative() => Decimal::MIN,
            None => Decimal::MAX,
        }
    }
}

/// A grading strategy.
pub trait Grader {
    fn name(&self) -> &'static str;
    fn grade(&self, input: &GradingInput) -> InvestmentGrade;
}

/// Both graders' views of the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub additive: InvestmentGrade,
    pub scale_weighted: InvestmentGrade,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Grade an analysed investment with every grader.
pub fn grade_investment(
    result: &InvestmentResult,
    input: &InvestmentInput,
    config: &EngineConfig,
) -> ViabilityResult<ComputationOutput<GradeReport>> {
    let start = Instant::now();
    input.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let grading_input = GradingInput::from_result(result, input, config);
    let additive = AdditiveGrader.grade(&grading_input);
    let scale_weighted = ScaleWeightedGrader.grade(&grading_input);

    if additive.recommendation == Recommendation::NotRecommended
        || scale_weighted.grade == LetterGrade::F
    {
        warnings.push("At least one grader rates the investment as not viable".into());
    }
    if let Payback::NotRecoveredWithinHorizon = grading_input.payback_period {
        warnings.push("Payback not reached within the horizon; scored as 0".into());
    }

    debug!(
        additive = %additive.grade,
        scale_weighted = %scale_weighted.grade,
        "investment graded"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Additive six-factor and scale-weighted four-factor grading",
        &serde_json::json!({
            "scale_unit": config.scale_unit.to_string(),
            "debt_ratio": grading_input.debt_ratio.to_string(),
        }),
        warnings,
        elapsed,
        GradeReport {
            additive,
            scale_weighted,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_risk_level_from_leverage() {
        assert_eq!(RiskLevel::from_leverage(Decimal::ZERO), RiskLevel::Low);
        assert_eq!(RiskLevel::from_leverage(dec!(0.20)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_leverage(dec!(0.5)), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_leverage(dec!(1.0)), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_leverage(dec!(1.5)), RiskLevel::Critical);
    }

    #[test]
    fn test_scale_tiers() {
        let unit = dec!(100_000_000);
        assert_eq!(ScaleTier::classify(dec!(1_000_000_000), unit), ScaleTier::Micro);
        assert_eq!(ScaleTier::classify(dec!(2_500_000_000), unit), ScaleTier::Small);
        assert_eq!(ScaleTier::classify(dec!(5_000_000_000), unit), ScaleTier::Medium);
        assert_eq!(ScaleTier::classify(dec!(9_999_999_999), unit), ScaleTier::Large);
        assert_eq!(ScaleTier::classify(dec!(10_000_000_000), unit), ScaleTier::Mega);
    }

    #[test]
    fn test_npv_ratio_saturates() {
        let mut input = GradingInput {
            initial_investment: dec!(0.0000000001),
            npv: dec!(70_000_000_000_000_000_000_000_000_000),
            irr: dec!(0.2),
            min_dscr: Coverage::Unconstrained,
            profitability_index: dec!(2),
            payback_period: Payback::Recovered(dec!(1)),
            debt_ratio: Decimal::ZERO,
            scale_unit: dec!(100_000_000),
        };
        assert_eq!(input.npv_ratio(), Decimal::MAX);
        input.npv = -input.npv;
        assert_eq!(input.npv_ratio(), Decimal::MIN);
        assert_eq!(ScaleTier::classify(dec!(1), dec!(0.0000000001)), ScaleTier::Mega);
    }

    #[test]
    fn test_letter_display() {
        assert_eq!(LetterGrade::AAA.to_string(), "AAA");
        assert_eq!(Recommendation::ReviewRequired.to_string(), "Review required");
    }
}
