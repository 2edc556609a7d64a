use serde_json::Value;

use viability_core::analysis::{analyze_investment, project_cash_flows};
use viability_core::EngineConfig;

use super::{load_investment, InputArgs};

pub fn run_analyze(args: InputArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(args.input.as_deref())?;
    let result = analyze_investment(&investment, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cashflows(args: InputArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(args.input.as_deref())?;
    let result = project_cash_flows(&investment, config)?;
    Ok(serde_json::to_value(result)?)
}
