use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::amortization::{build_schedule, AmortizationSchedule};
use crate::config::EngineConfig;
use crate::input::InvestmentInput;
use crate::numeric::NumericGuard;
use crate::types::{pct, Money};

/// A single year of the projection. Year 0 carries only the investment
/// outflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub year: u32,
    pub revenue: Money,
    pub operating_costs: Money,
    /// Revenue less operating costs, before depreciation.
    pub operating_profit: Money,
    pub depreciation: Money,
    /// Interest on both tranches.
    pub interest_expense: Money,
    pub taxable_income: Money,
    pub tax: Money,
    pub net_income: Money,
    pub working_capital_change: Money,
    /// Residual value plus recovered working capital (final year only).
    pub terminal_value: Money,
    pub free_cash_flow: Money,
    pub discounted_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub cumulative_npv: Money,
}

impl CashFlowRow {
    fn initial(investment: Money) -> Self {
        let outflow = -investment;
        CashFlowRow {
            year: 0,
            revenue: Decimal::ZERO,
            operating_costs: Decimal::ZERO,
            operating_profit: Decimal::ZERO,
            depreciation: Decimal::ZERO,
            interest_expense: Decimal::ZERO,
            taxable_income: Decimal::ZERO,
            tax: Decimal::ZERO,
            net_income: Decimal::ZERO,
            working_capital_change: Decimal::ZERO,
            terminal_value: Decimal::ZERO,
            free_cash_flow: outflow,
            discounted_cash_flow: outflow,
            cumulative_cash_flow: outflow,
            cumulative_npv: outflow,
        }
    }
}

/// Year-by-year projection plus the debt schedules it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    /// Rows for years 0..=analysis_years
    pub rows: Vec<CashFlowRow>,
    pub policy_loan: AmortizationSchedule,
    pub other_debt: AmortizationSchedule,
    /// Values replaced by the fail-soft guard while projecting.
    pub replaced_values: u32,
}

impl Projection {
    /// Free cash flows indexed by year (index 0 = investment).
    pub fn free_cash_flows(&self) -> Vec<Money> {
        self.rows.iter().map(|r| r.free_cash_flow).collect()
    }

    /// Operating years only (1..=N).
    pub fn operating_rows(&self) -> &[CashFlowRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn horizon(&self) -> u32 {
        self.rows.len().saturating_sub(1) as u32
    }
}

/// Project revenue, costs, depreciation, debt interest and tax into a free
/// cash flow series.
///
/// Never fails: any step that cannot be represented is replaced by zero
/// through [`NumericGuard`] and the projection continues, so the caller
/// always receives `analysis_years + 1` rows.
pub fn project(input: &InvestmentInput, config: &EngineConfig) -> Projection {
    let years = input.analysis_years;
    let mut guard = NumericGuard::new();

    let policy_loan = build_schedule(&input.policy_loan_terms(), years);
    let other_debt = build_schedule(&input.other_debt_terms(), years);

    let growth = pct(input.revenue_growth_rate);
    let inflation = pct(input.cost_inflation_rate);
    let tax_rate = pct(input.tax_rate);
    let wc_rate = pct(input.working_capital_rate);
    let discount_rate = pct(input.discount_rate)
        .max(config.min_discount_rate)
        .min(config.max_discount_rate);
    let one_plus_d = Decimal::ONE + discount_rate;

    let base_costs = input.annual_costs();
    let annual_depreciation = guard.mul(input.initial_investment, pct(input.depreciation_rate));
    let residual_value = guard.mul(input.initial_investment, pct(input.residual_value_rate));

    let mut rows = Vec::with_capacity(years as usize + 1);
    let first = CashFlowRow::initial(input.initial_investment);
    let mut cumulative_cash_flow = first.cumulative_cash_flow;
    let mut cumulative_npv = first.cumulative_npv;
    rows.push(first);

    let mut accumulated_depreciation = Decimal::ZERO;
    let mut working_capital = Decimal::ZERO;
    let mut previous_revenue = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for year in 1..=years {
        let periods = u64::from(year - 1);
        let revenue_factor =
            guard.growth_factor(growth, periods, config.min_growth_rate, config.max_growth_rate);
        let cost_factor =
            guard.growth_factor(inflation, periods, config.min_growth_rate, config.max_growth_rate);
        let revenue = guard.mul(input.annual_revenue, revenue_factor);
        let operating_costs = guard.mul(base_costs, cost_factor);
        let operating_profit = guard.sub(revenue, operating_costs);

        // Straight-line, never beyond the asset's cost
        let depreciation = annual_depreciation
            .min(input.initial_investment - accumulated_depreciation)
            .max(Decimal::ZERO);
        accumulated_depreciation += depreciation;

        let interest_expense = [&policy_loan, &other_debt]
            .iter()
            .filter_map(|s| s.row(year))
            .fold(Decimal::ZERO, |acc, r| guard.add(acc, r.interest_payment));

        let ebit = guard.sub(operating_profit, depreciation);
        let taxable_income = guard.sub(ebit, interest_expense);
        let tax = guard.mul(taxable_income, tax_rate).max(Decimal::ZERO);
        let net_income = guard.sub(taxable_income, tax);

        let revenue_change = guard.sub(revenue, previous_revenue);
        let working_capital_change = guard.mul(revenue_change, wc_rate);
        working_capital = guard.add(working_capital, working_capital_change);
        previous_revenue = revenue;

        let terminal_value = if year == years {
            guard.add(residual_value, working_capital)
        } else {
            Decimal::ZERO
        };

        let operating_cash = guard.add(net_income, depreciation);
        let after_working_capital = guard.sub(operating_cash, working_capital_change);
        let free_cash_flow = guard.add(after_working_capital, terminal_value);

        discount = guard.mul(discount, one_plus_d);
        let discounted_cash_flow = guard.div(free_cash_flow, discount);
        cumulative_cash_flow = guard.add(cumulative_cash_flow, free_cash_flow);
        cumulative_npv = guard.add(cumulative_npv, discounted_cash_flow);

        rows.push(CashFlowRow {
            year,
            revenue,
            operating_costs,
            operating_profit,
            depreciation,
            interest_expense,
            taxable_income,
            tax,
            net_income,
            working_capital_change,
            terminal_value,
            free_cash_flow,
            discounted_cash_flow,
            cumulative_cash_flow,
            cumulative_npv,
        });
    }

    debug!(
        years,
        final_cumulative_npv = %cumulative_npv,
        replaced = guard.replaced(),
        "cash flow projection complete"
    );

    let replaced_values = guard
        .replaced()
        .saturating_add(policy_loan.replaced_values)
        .saturating_add(other_debt.replaced_values);

    Projection {
        rows,
        policy_loan,
        other_debt,
        replaced_values,
    }
}
