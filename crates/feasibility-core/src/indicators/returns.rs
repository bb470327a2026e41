use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cash_flow::{BenchmarkRates, CashFlowOutput};
use crate::time_value::{irr, npv};
use crate::types::*;
use crate::FeasibilityResult;

const IRR_GUESS: Rate = dec!(0.1);

/// IRR, NPV and paybacks of one net cash flow series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// `None` when the series has no sign change or the solver fails
    pub irr: Option<Rate>,
    pub npv: Money,
    /// Years from the start of construction; `None` if never recovered
    pub static_payback: Option<Years>,
    pub dynamic_payback: Option<Years>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReturns {
    pub pre_tax: ReturnMetrics,
    pub post_tax: ReturnMetrics,
    pub pre_tax_rate: Rate,
    pub post_tax_rate: Rate,
}

impl InvestmentReturns {
    pub fn empty(rates: &BenchmarkRates) -> Self {
        let blank = ReturnMetrics {
            irr: None,
            npv: Decimal::ZERO,
            static_payback: None,
            dynamic_payback: None,
        };
        InvestmentReturns {
            pre_tax: blank.clone(),
            post_tax: blank,
            pre_tax_rate: rates.pre_tax,
            post_tax_rate: rates.post_tax,
        }
    }
}

/// Years until the running total of `flows` turns from negative back to
/// non-negative, interpolated linearly within the crossing year. Leading
/// zero flows count toward the period. A series whose running total is
/// never negative has nothing to recover and pays back in zero years; an
/// empty series has no payback.
pub fn payback_period(flows: &[Money]) -> Option<Years> {
    let mut cumulative = Decimal::ZERO;
    let mut invested = false;
    for (i, cf) in flows.iter().enumerate() {
        let previous = cumulative;
        cumulative += cf;
        if cumulative < Decimal::ZERO {
            invested = true;
        } else if invested {
            let fraction = safe_ratio(previous.abs(), *cf);
            return Some(Decimal::from(i as u64) + fraction);
        }
    }
    if invested || flows.is_empty() {
        None
    } else {
        Some(Decimal::ZERO)
    }
}

/// NPV with every flow at the end of its year.
fn npv_end_of_year(rate: Rate, flows: &[Money]) -> FeasibilityResult<Money> {
    let shifted: Vec<Money> = std::iter::once(Decimal::ZERO)
        .chain(flows.iter().copied())
        .collect();
    npv(rate, &shifted)
}

fn metrics(
    label: &str,
    flows: &[Money],
    discounted: &[Money],
    rate: Rate,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<ReturnMetrics> {
    let irr = match irr(flows, IRR_GUESS) {
        Ok(r) => Some(r),
        Err(e) => {
            warnings.push(format!("{label} IRR not available: {e}"));
            None
        }
    };
    let static_payback = payback_period(flows);
    if static_payback.is_none() && !flows.is_empty() {
        warnings.push(format!("{label} investment is not recovered within the horizon"));
    }
    Ok(ReturnMetrics {
        irr,
        npv: npv_end_of_year(rate, flows)?,
        static_payback,
        dynamic_payback: payback_period(discounted),
    })
}

/// Pre-tax and post-tax returns of the project cash flow.
pub fn investment_returns(
    cash_flow: &CashFlowOutput,
    rates: &BenchmarkRates,
    warnings: &mut Vec<String>,
) -> FeasibilityResult<InvestmentReturns> {
    Ok(InvestmentReturns {
        pre_tax: metrics(
            "Pre-tax",
            &cash_flow.pre_tax,
            &cash_flow.pre_tax_discounted,
            rates.pre_tax,
            warnings,
        )?,
        post_tax: metrics(
            "Post-tax",
            &cash_flow.post_tax,
            &cash_flow.post_tax_discounted,
            rates.post_tax,
            warnings,
        )?,
        pre_tax_rate: rates.pre_tax,
        post_tax_rate: rates.post_tax,
    })
}
