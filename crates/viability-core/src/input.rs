use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::TrancheTerms;
use crate::config::ScenarioAdjustment;
use crate::error::ViabilityError;
use crate::numeric::NumericGuard;
use crate::types::{pct, Money, Percent, Rate};
use crate::ViabilityResult;

/// Longest projection horizon accepted, in years.
pub const MAX_ANALYSIS_YEARS: u32 = 100;

/// Largest amount accepted for any money field (10^18 currency units).
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000_000);

/// Corporate tax rate assumed when the caller gives none.
pub const DEFAULT_TAX_RATE: Percent = dec!(22);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Pessimistic,
    #[default]
    Neutral,
    Optimistic,
}

fn default_ten_percent() -> Percent {
    dec!(10)
}

fn default_tax_rate() -> Percent {
    DEFAULT_TAX_RATE
}

/// Investment and financing parameters for a single project.
///
/// Rate fields are percentages (25 = 25%), as the caller enters them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
    pub initial_investment: Money,
    pub annual_revenue: Money,
    pub operating_profit_rate: Percent,
    pub discount_rate: Percent,
    pub analysis_years: u32,
    #[serde(default)]
    pub revenue_growth_rate: Percent,
    #[serde(default)]
    pub cost_inflation_rate: Percent,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Percent,
    #[serde(default)]
    pub policy_loan_amount: Money,
    #[serde(default)]
    pub policy_loan_rate: Percent,
    #[serde(default)]
    pub policy_grace_period: u32,
    #[serde(default)]
    pub policy_repayment_period: u32,
    #[serde(default)]
    pub other_debt_amount: Money,
    #[serde(default)]
    pub other_debt_rate: Percent,
    #[serde(default)]
    pub other_debt_grace_period: u32,
    #[serde(default)]
    pub other_debt_repayment_period: u32,
    #[serde(default)]
    pub scenario_type: ScenarioType,
    /// Straight-line depreciation per year, as % of the investment.
    #[serde(default = "default_ten_percent")]
    pub depreciation_rate: Percent,
    /// Working capital tied up, as % of revenue.
    #[serde(default = "default_ten_percent")]
    pub working_capital_rate: Percent,
    /// Salvage value at the end of the horizon, as % of the investment.
    #[serde(default = "default_ten_percent")]
    pub residual_value_rate: Percent,
}

impl InvestmentInput {
    /// Parse an input document; missing optional fields take their defaults.
    pub fn from_value(value: serde_json::Value) -> ViabilityResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Reject inputs the engine cannot give a meaningful answer for.
    /// Runs before any computation; no partial result is produced.
    pub fn validate(&self) -> ViabilityResult<()> {
        if self.initial_investment <= Decimal::ZERO {
            return Err(ViabilityError::invalid(
                "initial_investment",
                "Initial investment must be positive",
            ));
        }
        if self.annual_revenue <= Decimal::ZERO {
            return Err(ViabilityError::invalid(
                "annual_revenue",
                "Annual revenue must be positive",
            ));
        }
        if self.operating_profit_rate <= Decimal::ZERO {
            return Err(ViabilityError::invalid(
                "operating_profit_rate",
                "Annual costs must be below annual revenue (operating profit rate > 0)",
            ));
        }
        if self.analysis_years == 0 || self.analysis_years > MAX_ANALYSIS_YEARS {
            return Err(ViabilityError::invalid(
                "analysis_years",
                format!("Analysis horizon must be between 1 and {MAX_ANALYSIS_YEARS} years"),
            ));
        }

        let bounded_percentages = [
            ("operating_profit_rate", self.operating_profit_rate),
            ("discount_rate", self.discount_rate),
            ("tax_rate", self.tax_rate),
            ("depreciation_rate", self.depreciation_rate),
            ("working_capital_rate", self.working_capital_rate),
            ("residual_value_rate", self.residual_value_rate),
            ("policy_loan_rate", self.policy_loan_rate),
            ("other_debt_rate", self.other_debt_rate),
        ];
        for (field, value) in bounded_percentages {
            if value < Decimal::ZERO || value > dec!(100) {
                return Err(ViabilityError::invalid(field, "Must be between 0 and 100 (%)"));
            }
        }

        for (field, value) in [
            ("revenue_growth_rate", self.revenue_growth_rate),
            ("cost_inflation_rate", self.cost_inflation_rate),
        ] {
            if value < Decimal::ZERO {
                return Err(ViabilityError::invalid(field, "Cannot be negative"));
            }
        }

        let amounts = [
            ("initial_investment", self.initial_investment),
            ("annual_revenue", self.annual_revenue),
            ("policy_loan_amount", self.policy_loan_amount),
            ("other_debt_amount", self.other_debt_amount),
        ];
        for (field, value) in amounts {
            if value < Decimal::ZERO {
                return Err(ViabilityError::invalid(field, "Cannot be negative"));
            }
            if value > MAX_AMOUNT {
                return Err(ViabilityError::invalid(
                    field,
                    format!("Cannot exceed {MAX_AMOUNT}"),
                ));
            }
        }

        if self.policy_loan_amount > Decimal::ZERO && self.policy_repayment_period == 0 {
            return Err(ViabilityError::invalid(
                "policy_repayment_period",
                "A policy loan needs a repayment period of at least 1 year",
            ));
        }
        if self.other_debt_amount > Decimal::ZERO && self.other_debt_repayment_period == 0 {
            return Err(ViabilityError::invalid(
                "other_debt_repayment_period",
                "Other debt needs a repayment period of at least 1 year",
            ));
        }

        Ok(())
    }

    pub fn annual_costs(&self) -> Money {
        let mut guard = NumericGuard::new();
        let cost_share = guard.sub(Decimal::ONE, pct(self.operating_profit_rate));
        guard.mul(self.annual_revenue, cost_share)
    }

    pub fn total_debt(&self) -> Money {
        NumericGuard::new().add(self.policy_loan_amount, self.other_debt_amount)
    }

    /// Total debt as a fraction of the initial investment.
    pub fn debt_ratio(&self) -> Rate {
        NumericGuard::new().div(self.total_debt(), self.initial_investment)
    }

    pub fn policy_loan_terms(&self) -> TrancheTerms {
        TrancheTerms {
            principal: self.policy_loan_amount,
            annual_rate: pct(self.policy_loan_rate),
            grace_period_years: self.policy_grace_period,
            repayment_period_years: self.policy_repayment_period,
        }
    }

    pub fn other_debt_terms(&self) -> TrancheTerms {
        TrancheTerms {
            principal: self.other_debt_amount,
            annual_rate: pct(self.other_debt_rate),
            grace_period_years: self.other_debt_grace_period,
            repayment_period_years: self.other_debt_repayment_period,
        }
    }

    /// Derive a variant with revenue, costs and growth perturbed.
    ///
    /// Costs are re-expressed through the operating profit rate so the
    /// variant keeps the same shape as a caller-supplied input. Growth is
    /// floored at zero.
    ///
    /// A multiplier that overflows leaves the corresponding figure unchanged.
    pub fn with_adjustment(&self, adj: &ScenarioAdjustment) -> InvestmentInput {
        let revenue = self
            .annual_revenue
            .checked_mul(adj.revenue_multiplier)
            .unwrap_or(self.annual_revenue);
        let base_costs = self.annual_costs();
        let costs = base_costs
            .checked_mul(adj.cost_multiplier)
            .unwrap_or(base_costs);
        let operating_profit_rate = costs
            .checked_div(revenue)
            .and_then(|share| Decimal::ONE.checked_sub(share))
            .and_then(|margin| margin.checked_mul(dec!(100)))
            .unwrap_or(self.operating_profit_rate);
        let revenue_growth_rate = self
            .revenue_growth_rate
            .checked_add(adj.growth_shift_pp)
            .unwrap_or(self.revenue_growth_rate)
            .max(Decimal::ZERO);

        InvestmentInput {
            annual_revenue: revenue,
            operating_profit_rate,
            revenue_growth_rate,
            ..self.clone()
        }
    }
}
