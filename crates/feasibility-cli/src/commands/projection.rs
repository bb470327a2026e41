use clap::Args;
use serde_json::Value;

use feasibility_core::engine::{self, FeasibilityInput};

use crate::input;

/// Arguments shared by every calculator command
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to a JSON or YAML project file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Load the project document from `--input` or stdin.
pub fn load_project(args: &ProjectArgs) -> Result<FeasibilityInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input <project.json|project.yaml> or stdin required".into())
    }
}

pub fn run_revenue(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_revenue(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cost(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_costs(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_tax(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_vat(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_profit(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_profit(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_loan(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_loan(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cash_flow(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_cash_flow(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_indicators(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::calculate_indicators(&project)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project = load_project(&args)?;
    let result = engine::build_projection(&project)?;
    Ok(serde_json::to_value(result)?)
}
