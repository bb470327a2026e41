use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FeasibilityError;
use crate::time_value::pmt;
use crate::types::*;
use crate::FeasibilityResult;

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// 等额本息: constant monthly payment
    #[default]
    EqualInstallment,
    /// 等额本金: constant monthly principal
    EqualPrincipal,
}

/// Long-term construction loan, drawn before operation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanConfig {
    pub loan_amount: Money,
    /// Annual nominal rate as a decimal, compounded monthly
    pub annual_interest_rate: Rate,
    pub term_years: u32,
    /// Interest-only years at the start of the term
    #[serde(default)]
    pub grace_period_years: u32,
    #[serde(default)]
    pub repayment_method: RepaymentMethod,
    /// Annual guarantee fee on the opening balance
    #[serde(default)]
    pub guarantee_fee_rate: Rate,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One operation year of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanYear {
    pub year: u32,
    pub beginning_balance: Money,
    pub principal: Money,
    pub interest: Money,
    pub guarantee_fee: Money,
    pub ending_balance: Money,
}

impl LoanYear {
    /// 当期还本付息
    pub fn debt_service(&self) -> Money {
        self.principal + self.interest
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub monthly_rate: Rate,
    /// Fixed payment once amortization starts; `None` for equal-principal loans
    pub monthly_payment: Option<Money>,
    pub years: Vec<LoanYear>,
    pub total_principal: Money,
    pub total_interest: Money,
    /// Balance still owed after the last operation year
    pub outstanding_at_horizon: Money,
}

impl LoanSchedule {
    /// All-zero schedule for projects without debt.
    pub fn none(operation_years: u32) -> Self {
        LoanSchedule {
            monthly_rate: Decimal::ZERO,
            monthly_payment: None,
            years: (1..=operation_years)
                .map(|year| LoanYear {
                    year,
                    beginning_balance: Decimal::ZERO,
                    principal: Decimal::ZERO,
                    interest: Decimal::ZERO,
                    guarantee_fee: Decimal::ZERO,
                    ending_balance: Decimal::ZERO,
                })
                .collect(),
            total_principal: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            outstanding_at_horizon: Decimal::ZERO,
        }
    }

    pub fn interest(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.interest).collect()
    }

    pub fn principal(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.principal).collect()
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Simulate the loan month by month and roll it up into operation years.
///
/// Terms that cannot be scheduled as entered are adjusted with a warning:
/// the term is capped at [`MAX_HORIZON_YEARS`], the grace period is cut to
/// leave one amortizing year and a negative rate is read as zero. Only a
/// zero-year term on a positive amount is an error.
pub fn schedule_loan(
    config: &LoanConfig,
    operation_years: u32,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<LoanSchedule> {
    if config.loan_amount <= Decimal::ZERO {
        return Ok(LoanSchedule::none(operation_years));
    }
    if config.term_years == 0 {
        return Err(FeasibilityError::InvalidInput {
            field: "term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }

    let term_years = if config.term_years > MAX_HORIZON_YEARS {
        warnings.push(format!(
            "Loan term of {} years capped at {MAX_HORIZON_YEARS}",
            config.term_years
        ));
        MAX_HORIZON_YEARS
    } else {
        config.term_years
    };
    let grace_period_years = if config.grace_period_years >= term_years {
        warnings.push(format!(
            "Grace period of {} years leaves no repayment within the {term_years}-year term; using {}",
            config.grace_period_years,
            term_years - 1
        ));
        term_years - 1
    } else {
        config.grace_period_years
    };
    let annual_rate = if config.annual_interest_rate < Decimal::ZERO {
        warnings.push(format!(
            "Negative loan interest rate {} treated as zero",
            config.annual_interest_rate
        ));
        Decimal::ZERO
    } else {
        config.annual_interest_rate
    };

    let monthly_rate = annual_rate / dec!(12);
    let total_months = term_years * MONTHS_PER_YEAR;
    let grace_months = grace_period_years * MONTHS_PER_YEAR;
    let amortizing_months = total_months - grace_months;

    let monthly_payment = match config.repayment_method {
        RepaymentMethod::EqualInstallment => {
            match pmt(monthly_rate, amortizing_months, config.loan_amount, Decimal::ZERO) {
                Ok(payment) => Some(-payment),
                Err(e) => {
                    // the annuity tends to interest only as the compound factor grows
                    warnings.push(format!("Loan payment falls back to interest only: {e}"));
                    Some(config.loan_amount * monthly_rate)
                }
            }
        }
        RepaymentMethod::EqualPrincipal => None,
    };
    let monthly_principal = config.loan_amount / Decimal::from(amortizing_months);

    let mut balance = config.loan_amount;
    let mut years = Vec::with_capacity(operation_years as usize);

    for year in 1..=operation_years {
        let beginning_balance = balance;
        let mut principal = Decimal::ZERO;
        let mut interest = Decimal::ZERO;

        for m in 0..MONTHS_PER_YEAR {
            let month = (year - 1) * MONTHS_PER_YEAR + m;
            if month >= total_months || balance <= Decimal::ZERO {
                break;
            }
            let month_interest = balance * monthly_rate;
            let month_principal = if month < grace_months {
                Decimal::ZERO
            } else if month == total_months - 1 {
                // absorb rounding drift in the final instalment
                balance
            } else {
                let scheduled = match monthly_payment {
                    Some(payment) => payment - month_interest,
                    None => monthly_principal,
                };
                scheduled.min(balance)
            };
            interest += month_interest;
            principal += month_principal;
            balance -= month_principal;
        }

        years.push(LoanYear {
            year,
            beginning_balance,
            principal,
            interest,
            guarantee_fee: beginning_balance * config.guarantee_fee_rate,
            ending_balance: balance.max(Decimal::ZERO),
        });
    }

    let total_principal = years.iter().map(|y| y.principal).sum();
    let total_interest = years.iter().map(|y| y.interest).sum();

    tracing::debug!(
        operation_years,
        amount = %config.loan_amount,
        outstanding = %balance,
        "loan schedule built"
    );

    Ok(LoanSchedule {
        monthly_rate,
        monthly_payment,
        years,
        total_principal,
        total_interest,
        outstanding_at_horizon: balance.max(Decimal::ZERO),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
