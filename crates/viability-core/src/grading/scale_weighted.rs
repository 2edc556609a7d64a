use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    FactorScore, Grader, GradingFactor, GradingInput, InvestmentGrade, LetterGrade,
    Recommendation, ScaleTier,
};
use crate::types::{Coverage, Payback, Rate};

const FULL: Decimal = dec!(100);
const PASS_FLOOR: Decimal = dec!(60);

/// Weights and pass / target thresholds for one scale tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProfile {
    pub risk_premium: Rate,
    pub npv_weight: Decimal,
    pub irr_weight: Decimal,
    pub dscr_weight: Decimal,
    pub payback_weight: Decimal,
    pub npv_ratio_target: Decimal,
    pub irr_min: Rate,
    pub irr_target: Rate,
    pub dscr_min: Decimal,
    pub dscr_target: Decimal,
    /// Longest acceptable payback, in years
    pub payback_max: Decimal,
    pub payback_target: Decimal,
}

impl TierProfile {
    pub fn for_tier(tier: ScaleTier) -> Self {
        match tier {
            ScaleTier::Micro => TierProfile {
                risk_premium: dec!(0.05),
                npv_weight: dec!(0.25),
                irr_weight: dec!(0.30),
                dscr_weight: dec!(0.20),
                payback_weight: dec!(0.25),
                npv_ratio_target: dec!(0.50),
                irr_min: dec!(0.10),
                irr_target: dec!(0.15),
                dscr_min: dec!(1.20),
                dscr_target: dec!(1.50),
                payback_max: dec!(5),
                payback_target: dec!(3),
            },
            ScaleTier::Small => TierProfile {
                risk_premium: dec!(0.08),
                npv_weight: dec!(0.25),
                irr_weight: dec!(0.30),
                dscr_weight: dec!(0.25),
                payback_weight: dec!(0.20),
                npv_ratio_target: dec!(0.40),
                irr_min: dec!(0.09),
                irr_target: dec!(0.14),
                dscr_min: dec!(1.25),
                dscr_target: dec!(1.60),
                payback_max: dec!(6),
                payback_target: dec!(4),
            },
            ScaleTier::Medium => TierProfile {
                risk_premium: dec!(0.11),
                npv_weight: dec!(0.30),
                irr_weight: dec!(0.25),
                dscr_weight: dec!(0.25),
                payback_weight: dec!(0.20),
                npv_ratio_target: dec!(0.30),
                irr_min: dec!(0.08),
                irr_target: dec!(0.13),
                dscr_min: dec!(1.30),
                dscr_target: dec!(1.75),
                payback_max: dec!(7),
                payback_target: dec!(5),
            },
            ScaleTier::Large => TierProfile {
                risk_premium: dec!(0.14),
                npv_weight: dec!(0.30),
                irr_weight: dec!(0.25),
                dscr_weight: dec!(0.30),
                payback_weight: dec!(0.15),
                npv_ratio_target: dec!(0.25),
                irr_min: dec!(0.08),
                irr_target: dec!(0.12),
                dscr_min: dec!(1.35),
                dscr_target: dec!(1.90),
                payback_max: dec!(8),
                payback_target: dec!(6),
            },
            ScaleTier::Mega => TierProfile {
                risk_premium: dec!(0.18),
                npv_weight: dec!(0.30),
                irr_weight: dec!(0.20),
                dscr_weight: dec!(0.35),
                payback_weight: dec!(0.15),
                npv_ratio_target: dec!(0.20),
                irr_min: dec!(0.07),
                irr_target: dec!(0.12),
                dscr_min: dec!(1.40),
                dscr_target: dec!(2.00),
                payback_max: dec!(10),
                payback_target: dec!(7),
            },
        }
    }
}

/// Four weighted factors whose thresholds and risk premium depend on the
/// investment's scale tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleWeightedGrader;

/// 100 at or beyond `target`, linear 60-100 between `min` and `target`,
/// 0 below `min`. Higher is better.
fn rising(value: Decimal, min: Decimal, target: Decimal) -> Decimal {
    if value >= target {
        FULL
    } else if value >= min && target > min {
        PASS_FLOOR + (FULL - PASS_FLOOR) * (value - min) / (target - min)
    } else {
        Decimal::ZERO
    }
}

/// Mirror of [`rising`] for metrics where lower is better.
fn falling(value: Decimal, max: Decimal, target: Decimal) -> Decimal {
    if value <= target {
        FULL
    } else if value <= max && max > target {
        PASS_FLOOR + (FULL - PASS_FLOOR) * (max - value) / (max - target)
    } else {
        Decimal::ZERO
    }
}

fn band(adjusted: Decimal) -> (LetterGrade, Recommendation, &'static str) {
    match adjusted {
        s if s >= dec!(80) => (
            LetterGrade::A,
            Recommendation::StronglyRecommended,
            "Meets every target for its scale after the risk premium",
        ),
        s if s >= dec!(65) => (
            LetterGrade::B,
            Recommendation::Recommended,
            "Passes the thresholds for its scale with some headroom",
        ),
        s if s >= dec!(50) => (
            LetterGrade::C,
            Recommendation::ConditionallyRecommended,
            "Borderline for its scale; conditions advised",
        ),
        s if s >= dec!(35) => (
            LetterGrade::D,
            Recommendation::ReviewRequired,
            "Falls short of several thresholds for its scale",
        ),
        _ => (
            LetterGrade::F,
            Recommendation::NotRecommended,
            "Fails the thresholds for its scale",
        ),
    }
}

fn factor(factor: GradingFactor, value: Option<Decimal>, points: Decimal, weight: Decimal) -> FactorScore {
    FactorScore {
        factor,
        value,
        points,
        max_points: FULL,
        weight,
    }
}

impl Grader for ScaleWeightedGrader {
    fn name(&self) -> &'static str {
        "scale_weighted"
    }

    fn grade(&self, input: &GradingInput) -> InvestmentGrade {
        let tier = ScaleTier::classify(input.initial_investment, input.scale_unit);
        let p = TierProfile::for_tier(tier);

        let npv_ratio = input.npv_ratio();
        let dscr_points = match input.min_dscr {
            Coverage::Unconstrained => FULL,
            Coverage::Covered(ratio) => rising(ratio, p.dscr_min, p.dscr_target),
        };
        let payback_points = match input.payback_period {
            Payback::Recovered(years) => falling(years, p.payback_max, p.payback_target),
            Payback::NotRecoveredWithinHorizon => Decimal::ZERO,
        };

        let details = vec![
            factor(
                GradingFactor::Npv,
                Some(npv_ratio),
                rising(npv_ratio, Decimal::ZERO, p.npv_ratio_target),
                p.npv_weight,
            ),
            factor(
                GradingFactor::Irr,
                Some(input.irr),
                rising(input.irr, p.irr_min, p.irr_target),
                p.irr_weight,
            ),
            factor(GradingFactor::Dscr, input.min_dscr.ratio(), dscr_points, p.dscr_weight),
            factor(
                GradingFactor::Payback,
                input.payback_period.years(),
                payback_points,
                p.payback_weight,
            ),
        ];

        let score: Decimal = details
            .iter()
            .map(|d| d.weight * d.points)
            .sum::<Decimal>()
            .round_dp(2);
        let adjusted_score = (score * (Decimal::ONE - p.risk_premium)).round_dp(2);
        let (grade, recommendation, description) = band(adjusted_score);

        InvestmentGrade {
            grader: self.name().to_string(),
            grade,
            score,
            risk_premium: p.risk_premium,
            adjusted_score,
            recommendation,
            description: description.to_string(),
            details,
            scale_tier: Some(tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medium() -> GradingInput {
        GradingInput {
            initial_investment: dec!(5_000_000_000),
            npv: dec!(5_000_000_000),
            irr: dec!(0.27),
            min_dscr: Coverage::Unconstrained,
            profitability_index: dec!(2.1),
            payback_period: Payback::Recovered(dec!(3.5)),
            debt_ratio: Decimal::ZERO,
            scale_unit: dec!(100_000_000),
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        for tier in [
            ScaleTier::Micro,
            ScaleTier::Small,
            ScaleTier::Medium,
            ScaleTier::Large,
            ScaleTier::Mega,
        ] {
            let p = TierProfile::for_tier(tier);
            assert_eq!(
                p.npv_weight + p.irr_weight + p.dscr_weight + p.payback_weight,
                Decimal::ONE
            );
        }
    }

    #[test]
    fn test_sub_score_shapes() {
        assert_eq!(rising(dec!(0.15), dec!(0.10), dec!(0.15)), dec!(100));
        assert_eq!(rising(dec!(0.10), dec!(0.10), dec!(0.15)), dec!(60));
        assert_eq!(rising(dec!(0.125), dec!(0.10), dec!(0.15)), dec!(80));
        assert_eq!(rising(dec!(0.09), dec!(0.10), dec!(0.15)), Decimal::ZERO);
        assert_eq!(falling(dec!(4), dec!(5), dec!(3)), dec!(80));
        assert_eq!(falling(dec!(6), dec!(5), dec!(3)), Decimal::ZERO);
    }

    #[test]
    fn test_full_marks_less_premium() {
        let g = ScaleWeightedGrader.grade(&medium());
        assert_eq!(g.scale_tier, Some(ScaleTier::Medium));
        assert_eq!(g.score, dec!(100));
        assert_eq!(g.risk_premium, dec!(0.11));
        assert_eq!(g.adjusted_score, dec!(89));
        assert_eq!(g.grade, LetterGrade::A);
    }

    #[test]
    fn test_premium_grows_with_scale() {
        let mut mega = medium();
        mega.initial_investment = dec!(20_000_000_000);
        mega.npv = dec!(20_000_000_000);
        let g = ScaleWeightedGrader.grade(&mega);
        assert_eq!(g.scale_tier, Some(ScaleTier::Mega));
        assert_eq!(g.adjusted_score, dec!(82));
    }

    #[test]
    fn test_failing_project() {
        let i = GradingInput {
            npv: dec!(-1),
            irr: dec!(0.03),
            min_dscr: Coverage::Covered(dec!(0.9)),
            payback_period: Payback::NotRecoveredWithinHorizon,
            ..medium()
        };
        let g = ScaleWeightedGrader.grade(&i);
        assert_eq!(g.score, Decimal::ZERO);
        assert_eq!(g.grade, LetterGrade::F);
        assert_eq!(g.recommendation, Recommendation::NotRecommended);
    }

    #[test]
    fn test_partial_pass() {
        let mut i = medium();
        // IRR halfway between 8% and 13% => 80 points, weight 0.25
        i.irr = dec!(0.105);
        let g = ScaleWeightedGrader.grade(&i);
        assert_eq!(g.score, dec!(95));
    }
}
