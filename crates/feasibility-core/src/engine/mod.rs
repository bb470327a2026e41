pub mod input;
pub mod projection;

pub use input::FeasibilityInput;
pub use projection::{
    build_projection, calculate_cash_flow, calculate_costs, calculate_indicators,
    calculate_loan, calculate_profit, calculate_revenue, calculate_vat, FeasibilityOutput,
    FinancialIndicators, LoanOutput,
};
