pub mod analysis;
pub mod grade;
pub mod scenarios;
pub mod schedule;

use clap::Args;
use viability_core::InvestmentInput;

use crate::input;

/// Arguments shared by every command that takes an investment
#[derive(Args)]
pub struct InputArgs {
    /// Path to JSON investment input (read from piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Read the investment from `--input` or piped stdin.
pub fn load_investment(path: Option<&str>) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    let data = if let Some(path) = path {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file or piped JSON on stdin is required".into());
    };
    Ok(InvestmentInput::from_value(data)?)
}
