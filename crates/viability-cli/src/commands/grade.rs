use clap::{Args, ValueEnum};
use serde_json::Value;

use viability_core::analysis::analyze_investment;
use viability_core::grading::grade_investment;
use viability_core::{ComputationOutput, EngineConfig};

use super::load_investment;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GraderChoice {
    Additive,
    ScaleWeighted,
    Both,
}

/// Arguments for investment grading
#[derive(Args)]
pub struct GradeArgs {
    /// Path to JSON investment input (read from piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Which grading view to report
    #[arg(long, value_enum, default_value = "both")]
    pub grader: GraderChoice,
}

pub fn run_grade(args: GradeArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(args.input.as_deref())?;
    let analysis = analyze_investment(&investment, config)?;
    let graded = grade_investment(&analysis.result, &investment, config)?;

    let value = match args.grader {
        GraderChoice::Both => serde_json::to_value(graded)?,
        choice => {
            let ComputationOutput {
                result,
                methodology,
                assumptions,
                warnings,
                metadata,
            } = graded;
            let grade = match choice {
                GraderChoice::Additive => result.additive,
                _ => result.scale_weighted,
            };
            serde_json::to_value(ComputationOutput {
                result: grade,
                methodology,
                assumptions,
                warnings,
                metadata,
            })?
        }
    };
    Ok(value)
}
