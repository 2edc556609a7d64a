use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cash_flow::Projection;
use crate::config::EngineConfig;
use crate::input::InvestmentInput;
use crate::numeric::NumericGuard;
pub use crate::time_value::{mirr, npv, solve_irr};
use crate::time_value::{npv_bounded, IrrSolution, IrrStatus};
use crate::types::{pct, Money, Payback, Rate};

/// Capital-budgeting metrics for one projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    pub npv: Money,
    pub irr: Rate,
    pub irr_solution: IrrSolution,
    pub payback_period: Payback,
    pub discounted_payback_period: Payback,
    pub roi: Rate,
    pub profitability_index: Decimal,
    pub mirr: Rate,
    /// First year whose cumulative NPV turns non-negative
    pub break_even_year: Option<u32>,
}

/// Years until the cumulative operating flows (`flows[1..]`) reach
/// `investment`, interpolated linearly within the recovery year.
pub fn payback_period(investment: Money, flows: &[Money]) -> Payback {
    if investment <= Decimal::ZERO {
        return Payback::Recovered(Decimal::ZERO);
    }

    let mut cumulative = Decimal::ZERO;
    for (i, cf) in flows.iter().enumerate().skip(1) {
        let previous = cumulative;
        cumulative = cumulative.saturating_add(*cf);
        if cumulative >= investment {
            let needed = investment.saturating_sub(previous);
            let fraction = if *cf > Decimal::ZERO {
                needed.checked_div(*cf).unwrap_or(Decimal::ONE).min(Decimal::ONE)
            } else {
                Decimal::ZERO
            };
            return Payback::Recovered(Decimal::from(i as i64 - 1) + fraction);
        }
    }

    Payback::NotRecoveredWithinHorizon
}

/// `(Σ operating flows − investment) / investment`
pub fn roi(investment: Money, flows: &[Money]) -> Rate {
    let mut guard = NumericGuard::new();
    let inflows = flows
        .iter()
        .skip(1)
        .fold(Decimal::ZERO, |acc, cf| guard.add(acc, *cf));
    let gain = guard.sub(inflows, investment);
    guard.div(gain, investment)
}

/// Present value of the operating flows over the investment.
pub fn profitability_index(investment: Money, present_value_of_inflows: Money) -> Decimal {
    NumericGuard::new().div(present_value_of_inflows, investment)
}

/// First year (≥ 1) whose running NPV is non-negative.
pub fn break_even_year(projection: &Projection) -> Option<u32> {
    projection
        .operating_rows()
        .iter()
        .find(|r| r.cumulative_npv >= Decimal::ZERO)
        .map(|r| r.year)
}

/// Compute every metric from a projection.
pub fn calculate(
    projection: &Projection,
    input: &InvestmentInput,
    config: &EngineConfig,
) -> InvestmentMetrics {
    let flows = projection.free_cash_flows();
    let discount_rate = pct(input.discount_rate);
    let investment = input.initial_investment;

    let npv = npv_bounded(
        discount_rate,
        &flows,
        config.min_discount_rate,
        config.max_discount_rate,
    );

    let irr_solution = solve_irr(&flows, &config.irr);
    match irr_solution.status {
        IrrStatus::Converged => {}
        IrrStatus::Undefined => debug!("IRR undefined: cash flows do not change sign"),
        status => warn!(
            ?status,
            iterations = irr_solution.iterations,
            rate = %irr_solution.rate,
            "IRR solver stopped before converging"
        ),
    }

    let discounted: Vec<Money> = projection
        .rows
        .iter()
        .map(|r| r.discounted_cash_flow)
        .collect();
    let present_value_of_inflows = discounted
        .iter()
        .skip(1)
        .fold(Decimal::ZERO, |acc, cf| acc.saturating_add(*cf));

    let finance_rate = config.finance_rate.unwrap_or(discount_rate);
    let reinvestment_rate = config.reinvestment_rate.unwrap_or(discount_rate);

    let metrics = InvestmentMetrics {
        npv,
        irr: irr_solution.rate,
        irr_solution,
        payback_period: payback_period(investment, &flows),
        discounted_payback_period: payback_period(investment, &discounted),
        roi: roi(investment, &flows),
        profitability_index: profitability_index(investment, present_value_of_inflows),
        mirr: mirr(&flows, finance_rate, reinvestment_rate),
        break_even_year: break_even_year(projection),
    };

    debug!(
        npv = %metrics.npv,
        irr = %metrics.irr,
        pi = %metrics.profitability_index,
        "metrics calculated"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash_flow::project;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payback_interpolates() {
        let flows = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        // 800 after two years, 200 of the third year's 400 needed
        assert_eq!(payback_period(dec!(1000), &flows), Payback::Recovered(dec!(2.5)));
    }

    #[test]
    fn test_payback_exact_year() {
        let flows = vec![dec!(-1000), dec!(500), dec!(500)];
        assert_eq!(payback_period(dec!(1000), &flows), Payback::Recovered(dec!(2)));
    }

    #[test]
    fn test_payback_not_recovered() {
        let flows = vec![dec!(-1000), dec!(100), dec!(100)];
        assert_eq!(
            payback_period(dec!(1000), &flows),
            Payback::NotRecoveredWithinHorizon
        );
    }

    #[test]
    fn test_payback_with_saturating_inflows() {
        let big = dec!(70_000_000_000_000_000_000_000_000_000);
        let flows = vec![-big, big, big];
        assert_eq!(payback_period(big, &flows), Payback::Recovered(Decimal::ONE));
        // the inflow total does not fit and counts as zero
        assert_eq!(roi(big, &flows), dec!(-1));
    }

    #[test]
    fn test_roi_and_pi() {
        let flows = vec![dec!(-1000), dec!(600), dec!(600)];
        assert_eq!(roi(dec!(1000), &flows), dec!(0.2));
        assert_eq!(profitability_index(dec!(1000), dec!(1100)), dec!(1.1));
        assert_eq!(profitability_index(Decimal::ZERO, dec!(1100)), Decimal::ZERO);
    }

    #[test]
    fn test_calculate_consistency() {
        let input: InvestmentInput = serde_json::from_value(serde_json::json!({
            "initial_investment": "1000",
            "annual_revenue": "1000",
            "operating_profit_rate": "40",
            "discount_rate": "10",
            "analysis_years": 6,
            "tax_rate": "20"
        }))
        .unwrap();
        let cfg = EngineConfig::default();
        let projection = project(&input, &cfg);
        let m = calculate(&projection, &input, &cfg);

        // NPV equals the final cumulative NPV of the table
        let last = projection.rows.last().unwrap();
        assert!((m.npv - last.cumulative_npv).abs() < dec!(0.000001));
        // PI = (NPV + I) / I
        let expected_pi = (m.npv + dec!(1000)) / dec!(1000);
        assert!((m.profitability_index - expected_pi).abs() < dec!(0.000001));
        // Positive NPV at 10% implies IRR above 10%
        assert!(m.npv > Decimal::ZERO);
        assert!(m.irr > dec!(0.10));
        assert!(m.mirr > dec!(0.10) && m.mirr < m.irr);
        // Discounted payback is never shorter than simple payback
        let simple = m.payback_period.years().unwrap();
        let discounted = m.discounted_payback_period.years().unwrap();
        assert!(discounted >= simple);
        assert_eq!(m.break_even_year.map(Decimal::from), Some(discounted.ceil()));
    }
}
