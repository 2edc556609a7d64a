use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::{AmortizationRow, TranchePhase};
use crate::cash_flow::Projection;
use crate::config::EngineConfig;
use crate::types::{Coverage, Money};

/// Combined repayment state of both tranches in a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtPhase {
    Grace,
    Repayment,
    PostRepayment,
}

impl DebtPhase {
    /// Repayment wins over grace; post-repayment only once both tranches
    /// are repaid.
    fn combine(policy: TranchePhase, other: TranchePhase) -> Self {
        use TranchePhase::*;
        match (policy, other) {
            (Repayment, _) | (_, Repayment) => DebtPhase::Repayment,
            (Grace, _) | (_, Grace) => DebtPhase::Grace,
            (Repaid, Repaid) => DebtPhase::PostRepayment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrRow {
    pub year: u32,
    pub revenue: Money,
    pub operating_profit: Money,
    pub policy_loan_principal: Money,
    pub policy_loan_interest: Money,
    pub other_debt_principal: Money,
    pub other_debt_interest: Money,
    pub total_debt_service: Money,
    pub dscr: Coverage,
    pub phase: DebtPhase,
    pub is_grace_period: bool,
    pub is_repayment_period: bool,
    pub is_post_repayment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrAnalysis {
    pub rows: Vec<DscrRow>,
    /// Lowest coverage over years with debt service
    pub min_dscr: Coverage,
    pub average_dscr: Coverage,
    /// Years whose coverage falls below the configured covenant
    pub years_below_covenant: Vec<u32>,
}

/// Coverage for one year: unconstrained when nothing is due, zero when the
/// project makes no operating profit, otherwise clamped to `[0, cap]`.
pub fn coverage(operating_profit: Money, total_debt_service: Money, cap: Decimal) -> Coverage {
    if total_debt_service <= Decimal::ZERO {
        return Coverage::Unconstrained;
    }
    if operating_profit <= Decimal::ZERO {
        return Coverage::Covered(Decimal::ZERO);
    }
    let ratio = operating_profit
        .checked_div(total_debt_service)
        .unwrap_or(cap);
    Coverage::Covered(ratio.max(Decimal::ZERO).min(cap))
}

fn zero_row(year: u32) -> AmortizationRow {
    AmortizationRow {
        year,
        principal_payment: Decimal::ZERO,
        interest_payment: Decimal::ZERO,
        remaining_balance: Decimal::ZERO,
        phase: TranchePhase::Repaid,
    }
}

/// Per-year debt service coverage from the projection's operating profit
/// and both tranches' schedules.
pub fn analyze(projection: &Projection, config: &EngineConfig) -> DscrAnalysis {
    let mut rows = Vec::with_capacity(projection.operating_rows().len());

    for cf in projection.operating_rows() {
        let policy = projection
            .policy_loan
            .row(cf.year)
            .cloned()
            .unwrap_or_else(|| zero_row(cf.year));
        let other = projection
            .other_debt
            .row(cf.year)
            .cloned()
            .unwrap_or_else(|| zero_row(cf.year));

        let total_debt_service = policy.debt_service().saturating_add(other.debt_service());
        let phase = DebtPhase::combine(policy.phase, other.phase);

        rows.push(DscrRow {
            year: cf.year,
            revenue: cf.revenue,
            operating_profit: cf.operating_profit,
            policy_loan_principal: policy.principal_payment,
            policy_loan_interest: policy.interest_payment,
            other_debt_principal: other.principal_payment,
            other_debt_interest: other.interest_payment,
            total_debt_service,
            dscr: coverage(cf.operating_profit, total_debt_service, config.dscr_cap),
            phase,
            is_grace_period: phase == DebtPhase::Grace,
            is_repayment_period: phase == DebtPhase::Repayment,
            is_post_repayment: phase == DebtPhase::PostRepayment,
        });
    }

    let ratios: Vec<Decimal> = rows.iter().filter_map(|r| r.dscr.ratio()).collect();
    let min_dscr = ratios
        .iter()
        .copied()
        .min()
        .map(Coverage::Covered)
        .unwrap_or(Coverage::Unconstrained);
    let average_dscr = if ratios.is_empty() {
        Coverage::Unconstrained
    } else {
        let sum = ratios
            .iter()
            .fold(Decimal::ZERO, |acc, r| acc.saturating_add(*r));
        Coverage::Covered(sum / Decimal::from(ratios.len() as i64))
    };
    let years_below_covenant = rows
        .iter()
        .filter(|r| matches!(r.dscr, Coverage::Covered(v) if v < config.dscr_covenant))
        .map(|r| r.year)
        .collect();

    DscrAnalysis {
        rows,
        min_dscr,
        average_dscr,
        years_below_covenant,
    }
}
