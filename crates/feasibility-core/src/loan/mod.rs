pub mod repayment;
pub mod schedule;

pub use repayment::{build_loan_repayment_table, LoanRepaymentOutput, RepaymentSources};
pub use schedule::{schedule_loan, LoanConfig, LoanSchedule, LoanYear, RepaymentMethod};
