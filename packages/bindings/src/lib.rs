use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use feasibility_core::engine::{self, FeasibilityInput};
use feasibility_core::loan::{self, LoanConfig};
use feasibility_core::production_rate::ProductionRateSchedule;
use feasibility_core::ProjectContext;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_project(input_json: &str) -> NapiResult<FeasibilityInput> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

/// Reject operation horizons the calculators would refuse inside a project.
fn check_operation_years(operation_years: u32) -> NapiResult<()> {
    ProjectContext {
        operation_years,
        ..Default::default()
    }
    .validate()
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Full projection
// ---------------------------------------------------------------------------

#[napi]
pub fn build_projection(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::build_projection(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Individual tables
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_revenue(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::calculate_revenue(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_costs(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::calculate_costs(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_vat(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::calculate_vat(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_profit(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::calculate_profit(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_cash_flow(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::calculate_cash_flow(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_indicators(input_json: String) -> NapiResult<String> {
    let input = parse_project(&input_json)?;
    let output = engine::calculate_indicators(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loan and production rates
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoanRequest {
    loan: LoanConfig,
    operation_years: u32,
}

/// Loan schedule on its own: `{"loan": {...}, "operation_years": n}`.
/// Returns `{"schedule": {...}, "warnings": [...]}`.
#[napi]
pub fn schedule_loan(input_json: String) -> NapiResult<String> {
    let request: LoanRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    check_operation_years(request.operation_years)?;
    let mut warnings = Vec::new();
    let schedule = loan::schedule_loan(&request.loan, request.operation_years, &mut warnings)
        .map_err(to_napi_error)?;
    let output = serde_json::json!({ "schedule": schedule, "warnings": warnings });
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// The conventional 50% / 75% / 100% ramp-up.
#[napi]
pub fn default_production_rates(operation_years: u32) -> NapiResult<String> {
    check_operation_years(operation_years)?;
    serde_json::to_string(&ProductionRateSchedule::ramp_up(operation_years)).map_err(to_napi_error)
}
