use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    FactorScore, Grader, GradingFactor, GradingInput, InvestmentGrade, LetterGrade,
    Recommendation, RiskLevel,
};
use crate::types::{Coverage, Payback};

const POINTS: [Decimal; 5] = [dec!(10), dec!(8), dec!(6), dec!(4), dec!(2)];
const MAX_POINTS: Decimal = dec!(10);
const FACTORS: u32 = 6;

const NPV_RATIO_BANDS: [Decimal; 5] = [dec!(1.5), dec!(1.0), dec!(0.5), dec!(0.2), dec!(0)];
const IRR_BANDS: [Decimal; 5] = [dec!(0.25), dec!(0.20), dec!(0.15), dec!(0.10), dec!(0.05)];
const DSCR_BANDS: [Decimal; 5] = [dec!(3.0), dec!(2.0), dec!(1.5), dec!(1.2), dec!(1.0)];
const PI_BANDS: [Decimal; 5] = [dec!(2.5), dec!(2.0), dec!(1.5), dec!(1.2), dec!(1.0)];
const PAYBACK_BANDS: [Decimal; 5] = [dec!(2), dec!(3), dec!(5), dec!(7), dec!(10)];

/// Six factors, each bucketed into 0/2/4/6/8/10 points, summed to a 0-60
/// raw score and normalised to 0-100.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveGrader;

/// Points for the first band `value` reaches, 0 below the last.
fn at_least(value: Decimal, bands: &[Decimal; 5]) -> Decimal {
    bands
        .iter()
        .zip(POINTS)
        .find(|(threshold, _)| value >= **threshold)
        .map(|(_, points)| points)
        .unwrap_or(Decimal::ZERO)
}

/// Points for the first band `value` stays within, 0 beyond the last.
fn at_most(value: Decimal, bands: &[Decimal; 5]) -> Decimal {
    bands
        .iter()
        .zip(POINTS)
        .find(|(threshold, _)| value <= **threshold)
        .map(|(_, points)| points)
        .unwrap_or(Decimal::ZERO)
}

fn risk_points(level: RiskLevel) -> Decimal {
    match level {
        RiskLevel::Low => dec!(10),
        RiskLevel::Moderate => dec!(8),
        RiskLevel::Elevated => dec!(6),
        RiskLevel::High => dec!(4),
        RiskLevel::VeryHigh => dec!(2),
        RiskLevel::Critical => Decimal::ZERO,
    }
}

fn band(score: Decimal) -> (LetterGrade, Recommendation, &'static str) {
    match score {
        s if s >= dec!(90) => (
            LetterGrade::S,
            Recommendation::StronglyRecommended,
            "Exceptional returns with ample coverage; proceed",
        ),
        s if s >= dec!(80) => (
            LetterGrade::AAA,
            Recommendation::StronglyRecommended,
            "Very strong viability across all factors",
        ),
        s if s >= dec!(70) => (
            LetterGrade::AA,
            Recommendation::Recommended,
            "Strong viability with minor weaknesses",
        ),
        s if s >= dec!(60) => (
            LetterGrade::A,
            Recommendation::Recommended,
            "Sound viability; monitor the weaker factors",
        ),
        s if s >= dec!(50) => (
            LetterGrade::BBB,
            Recommendation::ConditionallyRecommended,
            "Adequate viability; proceed subject to risk mitigation",
        ),
        s if s >= dec!(40) => (
            LetterGrade::BB,
            Recommendation::ReviewRequired,
            "Marginal viability; revisit the plan before committing",
        ),
        _ => (
            LetterGrade::C,
            Recommendation::NotRecommended,
            "Insufficient viability at current assumptions",
        ),
    }
}

fn factor(factor: GradingFactor, value: Option<Decimal>, points: Decimal) -> FactorScore {
    FactorScore {
        factor,
        value,
        points,
        max_points: MAX_POINTS,
        weight: Decimal::ONE / Decimal::from(FACTORS),
    }
}

impl Grader for AdditiveGrader {
    fn name(&self) -> &'static str {
        "additive"
    }

    fn grade(&self, input: &GradingInput) -> InvestmentGrade {
        let npv_ratio = input.npv_ratio();
        let dscr_points = match input.min_dscr {
            Coverage::Unconstrained => MAX_POINTS,
            Coverage::Covered(ratio) => at_least(ratio, &DSCR_BANDS),
        };
        let payback_points = match input.payback_period {
            Payback::Recovered(years) => at_most(years, &PAYBACK_BANDS),
            Payback::NotRecoveredWithinHorizon => Decimal::ZERO,
        };
        let risk = RiskLevel::from_leverage(input.debt_ratio);

        let details = vec![
            factor(
                GradingFactor::Npv,
                Some(npv_ratio),
                at_least(npv_ratio, &NPV_RATIO_BANDS),
            ),
            factor(GradingFactor::Irr, Some(input.irr), at_least(input.irr, &IRR_BANDS)),
            factor(GradingFactor::Dscr, input.min_dscr.ratio(), dscr_points),
            factor(
                GradingFactor::ProfitabilityIndex,
                Some(input.profitability_index),
                at_least(input.profitability_index, &PI_BANDS),
            ),
            factor(GradingFactor::Payback, input.payback_period.years(), payback_points),
            factor(GradingFactor::RiskLevel, Some(input.debt_ratio), risk_points(risk)),
        ];

        let raw: Decimal = details.iter().map(|d| d.points).sum();
        let score = (raw / (MAX_POINTS * Decimal::from(FACTORS)) * dec!(100)).round_dp(2);
        let (grade, recommendation, description) = band(score);

        InvestmentGrade {
            grader: self.name().to_string(),
            grade,
            score,
            risk_premium: Decimal::ZERO,
            adjusted_score: score,
            recommendation,
            description: description.to_string(),
            details,
            scale_tier: None,
        }
    }
}
