use clap::Args;
use serde_json::{json, Value};

use feasibility_core::production_rate::ProductionRateSchedule;

use super::projection::{load_project, ProjectArgs};

/// Arguments for the production-rate curve
#[derive(Args)]
pub struct ProductionRatesArgs {
    /// Number of operation years for the default ramp-up (50%, 75%, then 100%)
    #[arg(long)]
    pub operation_years: Option<u32>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Print the effective rate for every operation year, either from a project
/// file or the default ramp-up.
pub fn run_production_rates(args: ProductionRatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (schedule, years) = match args.operation_years {
        Some(years) if args.project.input.is_none() => {
            (ProductionRateSchedule::ramp_up(years), years)
        }
        _ => {
            let project = load_project(&args.project)?;
            let years = project
                .context
                .as_ref()
                .map(|c| c.operation_years)
                .or(args.operation_years)
                .ok_or("project has no context; pass --operation-years")?;
            (project.production_rates, years)
        }
    };

    let rates: Vec<Value> = schedule
        .series(years)
        .into_iter()
        .enumerate()
        .map(|(i, rate)| json!({ "year_index": i + 1, "rate": rate }))
        .collect();
    Ok(json!({ "result": { "operation_years": years, "rates": rates } }))
}
