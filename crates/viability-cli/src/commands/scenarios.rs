use serde_json::Value;

use viability_core::scenarios::scenario::compare_scenarios;
use viability_core::scenarios::sensitivity::analyze_sensitivity;
use viability_core::EngineConfig;

use super::{load_investment, InputArgs};

pub fn run_scenarios(args: InputArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(args.input.as_deref())?;
    let result = compare_scenarios(&investment, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: InputArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(args.input.as_deref())?;
    let result = analyze_sensitivity(&investment, config)?;
    Ok(serde_json::to_value(result)?)
}
