use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::numeric::NumericGuard;
use crate::types::{Money, Rate};

/// Repayment phase of a tranche in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranchePhase {
    /// Interest only
    Grace,
    /// Equal principal instalments plus interest on the opening balance
    Repayment,
    /// Nothing outstanding
    Repaid,
}

/// Terms of a single debt tranche. The rate is a decimal (0.03 = 3%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub grace_period_years: u32,
    pub repayment_period_years: u32,
}

/// A single year of a tranche's schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub year: u32,
    pub principal_payment: Money,
    pub interest_payment: Money,
    pub remaining_balance: Money,
    pub phase: TranchePhase,
}

impl AmortizationRow {
    pub fn debt_service(&self) -> Money {
        self.principal_payment.saturating_add(self.interest_payment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<AmortizationRow>,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    /// Interest figures that overflowed and were recorded as zero
    #[serde(default)]
    pub replaced_values: u32,
}

impl AmortizationSchedule {
    /// Row for a 1-based year, if it lies within the horizon.
    pub fn row(&self, year: u32) -> Option<&AmortizationRow> {
        year.checked_sub(1).and_then(|i| self.rows.get(i as usize))
    }
}

/// Build a year-by-year equal-principal schedule for one tranche,
/// truncated at `horizon_years`.
///
/// The final instalment repays whatever balance is left, so the principal
/// paid over the full term equals the original principal exactly.
pub fn build_schedule(terms: &TrancheTerms, horizon_years: u32) -> AmortizationSchedule {
    let mut rows = Vec::with_capacity(horizon_years as usize);
    let mut guard = NumericGuard::new();
    let mut total_interest_paid = Decimal::ZERO;
    let mut total_principal_paid = Decimal::ZERO;

    let has_debt = terms.principal > Decimal::ZERO && terms.repayment_period_years > 0;
    let grace = terms.grace_period_years;
    let last_repayment_year = grace.saturating_add(terms.repayment_period_years);
    let instalment = if has_debt {
        guard.div(terms.principal, Decimal::from(terms.repayment_period_years))
    } else {
        Decimal::ZERO
    };

    let mut balance = if has_debt { terms.principal } else { Decimal::ZERO };

    for year in 1..=horizon_years {
        let row = if !has_debt || year > last_repayment_year {
            AmortizationRow {
                year,
                principal_payment: Decimal::ZERO,
                interest_payment: Decimal::ZERO,
                remaining_balance: Decimal::ZERO,
                phase: TranchePhase::Repaid,
            }
        } else if year <= grace {
            AmortizationRow {
                year,
                principal_payment: Decimal::ZERO,
                interest_payment: guard.mul(balance, terms.annual_rate),
                remaining_balance: balance,
                phase: TranchePhase::Grace,
            }
        } else {
            let opening = balance;
            let principal = if year == last_repayment_year {
                opening
            } else {
                instalment.min(opening)
            };
            balance = opening - principal;
            AmortizationRow {
                year,
                principal_payment: principal,
                interest_payment: guard.mul(opening, terms.annual_rate),
                remaining_balance: balance,
                phase: TranchePhase::Repayment,
            }
        };

        total_interest_paid = guard.add(total_interest_paid, row.interest_payment);
        total_principal_paid = guard.add(total_principal_paid, row.principal_payment);
        rows.push(row);
    }

    AmortizationSchedule {
        rows,
        total_interest_paid,
        total_principal_paid,
        replaced_values: guard.replaced(),
    }
}
