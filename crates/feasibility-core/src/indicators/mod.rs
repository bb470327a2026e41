pub mod returns;
pub mod summary;

pub use returns::{investment_returns, payback_period, InvestmentReturns, ReturnMetrics};
pub use summary::{build_summary, FinancialSummary, SummarySources};
