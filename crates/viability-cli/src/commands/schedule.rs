use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use viability_core::amortization::{build_schedule, TrancheTerms};
use viability_core::input::{MAX_AMOUNT, MAX_ANALYSIS_YEARS};
use viability_core::{pct, with_metadata};

/// Arguments for a single tranche's amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate in percent (e.g. 3.5)
    #[arg(long)]
    pub rate: Decimal,

    /// Interest-only years before repayment starts
    #[arg(long, default_value_t = 0)]
    pub grace: u32,

    /// Years of equal principal instalments
    #[arg(long)]
    pub repayment: u32,

    /// Horizon in years; defaults to grace + repayment
    #[arg(long)]
    pub years: Option<u32>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    if args.principal < Decimal::ZERO || args.principal > MAX_AMOUNT {
        return Err(format!("--principal must be between 0 and {MAX_AMOUNT}").into());
    }
    if args.rate < Decimal::ZERO || args.rate > Decimal::ONE_HUNDRED {
        return Err("--rate must be between 0 and 100 (%)".into());
    }
    if args.principal > Decimal::ZERO && args.repayment == 0 {
        return Err("--repayment must be at least 1 year for a positive principal".into());
    }
    let term = args.grace.saturating_add(args.repayment);
    let years = args.years.unwrap_or(term);
    if years == 0 || years > MAX_ANALYSIS_YEARS {
        return Err(format!("--years must be between 1 and {}", MAX_ANALYSIS_YEARS).into());
    }

    let terms = TrancheTerms {
        principal: args.principal,
        annual_rate: pct(args.rate),
        grace_period_years: args.grace,
        repayment_period_years: args.repayment,
    };
    let schedule = build_schedule(&terms, years);

    let mut warnings = Vec::new();
    if term > years {
        warnings.push(format!(
            "Schedule truncated at year {}; {} remains outstanding",
            years,
            schedule
                .rows
                .last()
                .map(|r| r.remaining_balance)
                .unwrap_or_default()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Equal-principal amortization with interest-only grace period",
        &terms,
        warnings,
        elapsed,
        schedule,
    );
    Ok(serde_json::to_value(output)?)
}
