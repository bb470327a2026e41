pub mod project;

pub use project::{
    build_cash_flow, BenchmarkRates, CashFlowConfig, CashFlowOutput, CashFlowSources,
    InvestmentBreakdown, WorkingCapital,
};
