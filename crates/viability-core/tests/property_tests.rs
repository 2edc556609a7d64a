use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use viability_core::amortization::{build_schedule, TranchePhase, TrancheTerms};
use viability_core::analysis::evaluate;
use viability_core::config::IrrSettings;
use viability_core::grading::{AdditiveGrader, Grader, GradingInput, ScaleWeightedGrader};
use viability_core::time_value::{npv, npv_bounded, solve_irr};
use viability_core::{Coverage, EngineConfig, InvestmentInput, Payback};

fn money(max: i64) -> impl Strategy<Value = Decimal> {
    (1i64..=max).prop_map(Decimal::from)
}

/// Rate with two decimal places, from `lo` to `hi` hundredths.
fn hundredths(lo: i64, hi: i64) -> impl Strategy<Value = Decimal> {
    (lo..=hi).prop_map(|n| Decimal::new(n, 2))
}

fn project_input(
    investment: Decimal,
    revenue: Decimal,
    margin: Decimal,
    policy: Decimal,
    other: Decimal,
    grace: u32,
    repayment: u32,
) -> InvestmentInput {
    serde_json::from_value(serde_json::json!({
        "initial_investment": investment.to_string(),
        "annual_revenue": revenue.to_string(),
        "operating_profit_rate": margin.to_string(),
        "discount_rate": "8",
        "analysis_years": 12,
        "tax_rate": "20",
        "policy_loan_amount": policy.to_string(),
        "policy_loan_rate": "3",
        "policy_grace_period": grace,
        "policy_repayment_period": repayment,
        "other_debt_amount": other.to_string(),
        "other_debt_rate": "6",
        "other_debt_repayment_period": repayment + 1
    }))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn amortization_conserves_principal(
        principal in money(1_000_000_000),
        rate in hundredths(0, 20),
        grace in 0u32..6,
        repayment in 1u32..25,
    ) {
        let terms = TrancheTerms {
            principal,
            annual_rate: rate,
            grace_period_years: grace,
            repayment_period_years: repayment,
        };
        let schedule = build_schedule(&terms, grace + repayment);
        let repaid: Decimal = schedule.rows.iter().map(|r| r.principal_payment).sum();
        prop_assert_eq!(repaid, principal);
        prop_assert_eq!(schedule.total_principal_paid, principal);

        let last = schedule.rows.last().unwrap();
        prop_assert_eq!(last.phase, TranchePhase::Repayment);
        prop_assert_eq!(last.remaining_balance, Decimal::ZERO);

        for pair in schedule.rows.windows(2) {
            prop_assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
        }
        for row in schedule.rows.iter().take(grace as usize) {
            prop_assert_eq!(row.principal_payment, Decimal::ZERO);
        }
    }

    #[test]
    fn npv_strictly_decreasing_in_rate(
        investment in money(10_000),
        inflows in prop::collection::vec(0i64..5_000, 1..12),
        low in hundredths(-40, 80),
        gap in hundredths(1, 15),
    ) {
        let mut flows = vec![-investment];
        flows.extend(inflows.into_iter().map(Decimal::from));
        prop_assume!(flows.iter().skip(1).any(|cf| *cf > Decimal::ZERO));

        let high = (low + gap).min(dec!(1.0));
        prop_assume!(high > low);
        prop_assert!(npv(low, &flows) > npv(high, &flows));
    }

    #[test]
    fn irr_is_a_root_when_converged(
        investment in 100i64..1_000,
        inflows in prop::collection::vec(10i64..500, 2..10),
    ) {
        let mut flows = vec![Decimal::from(-investment)];
        flows.extend(inflows.into_iter().map(Decimal::from));

        let settings = IrrSettings::default();
        let solution = solve_irr(&flows, &settings);
        prop_assert!(solution.rate >= settings.min_rate && solution.rate <= settings.max_rate);
        prop_assert!(solution.iterations <= settings.max_iterations);

        if solution.converged() {
            let residual = npv_bounded(solution.rate, &flows, settings.min_rate, settings.max_rate);
            prop_assert!(
                residual.abs() <= Decimal::from(investment) * dec!(0.001),
                "NPV at IRR {} = {}", solution.rate, residual
            );
        }
    }

    #[test]
    fn dscr_bounded_and_unconstrained_only_without_service(
        investment in money(10_000),
        revenue in money(10_000),
        margin in 1i64..=100,
        policy in 0i64..20_000,
        other in 0i64..5_000,
        grace in 0u32..4,
        repayment in 1u32..8,
    ) {
        let input = project_input(
            investment,
            revenue,
            Decimal::from(margin),
            Decimal::from(policy),
            Decimal::from(other),
            grace,
            repayment,
        );
        prop_assume!(input.validate().is_ok());
        let evaluation = evaluate(&input, &EngineConfig::default());

        prop_assert_eq!(evaluation.dscr.rows.len(), 12);
        for row in &evaluation.dscr.rows {
            match row.dscr {
                Coverage::Unconstrained => prop_assert!(row.total_debt_service <= Decimal::ZERO),
                Coverage::Covered(ratio) => {
                    prop_assert!(row.total_debt_service > Decimal::ZERO);
                    prop_assert!(ratio >= Decimal::ZERO && ratio <= dec!(50));
                }
            }
            let flags = [row.is_grace_period, row.is_repayment_period, row.is_post_repayment];
            prop_assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
    }

    #[test]
    fn grading_never_penalises_better_metrics(
        npv in -2_000i64..4_000,
        irr in hundredths(-10, 40),
        dscr in hundredths(50, 400),
        pi in hundredths(50, 300),
        payback in hundredths(100, 1_200),
        bump in hundredths(1, 100),
        which in 0usize..4,
    ) {
        let base = GradingInput {
            initial_investment: dec!(1_000),
            npv: Decimal::from(npv),
            irr,
            min_dscr: Coverage::Covered(dscr),
            profitability_index: pi,
            payback_period: Payback::Recovered(payback),
            debt_ratio: dec!(0.3),
            scale_unit: dec!(100),
        };
        let mut better = base.clone();
        match which {
            0 => better.npv += bump * dec!(1_000),
            1 => better.irr += bump,
            2 => better.min_dscr = Coverage::Covered(dscr + bump),
            _ => better.profitability_index += bump,
        }

        for grader in [&AdditiveGrader as &dyn Grader, &ScaleWeightedGrader] {
            let before = grader.grade(&base);
            let after = grader.grade(&better);
            prop_assert!(
                after.score >= before.score,
                "{}: {} -> {}", grader.name(), before.score, after.score
            );
        }
    }
}
