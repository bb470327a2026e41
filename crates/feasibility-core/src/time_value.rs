use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FeasibilityError;
use crate::types::{Money, Rate};
use crate::FeasibilityResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const IRR_LOWER_BOUND: Rate = dec!(-0.5);
const IRR_UPPER_BOUND: Rate = dec!(10);

/// Net Present Value of a series of cash flows, first flow undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> FeasibilityResult<Money> {
    if rate <= dec!(-1) {
        return Err(FeasibilityError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                FeasibilityError::DivisionByZero {
                    context: format!("NPV discount factor overflow at period {t}"),
                }
            })?;
        }
        if discount.is_zero() {
            return Err(FeasibilityError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Discount factor `1 / (1 + rate)^period`.
pub fn discount_factor(rate: Rate, period: u32) -> FeasibilityResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(FeasibilityError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let growth = (Decimal::ONE + rate)
        .checked_powu(period as u64)
        .filter(|g| !g.is_zero())
        .ok_or_else(|| FeasibilityError::DivisionByZero {
            context: format!("discount factor at period {period}"),
        })?;
    Ok(Decimal::ONE / growth)
}

/// NPV and its derivative with respect to the rate, or None on overflow.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as u64);
            let term = t_dec.checked_mul(*cf)?.checked_div(discount.checked_mul(one_plus_r)?)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }
    Some((npv_val, dnpv))
}

/// Internal Rate of Return using Newton-Raphson, falling back to bisection.
pub fn irr(cash_flows: &[Money], guess: Rate) -> FeasibilityResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(FeasibilityError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_positive || !has_negative {
        return Err(FeasibilityError::InsufficientData(
            "IRR requires at least one sign change in the cash flows".into(),
        ));
    }

    let mut rate = guess;

    for _ in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(rate, cash_flows) else {
            break;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
        if dnpv.is_zero() {
            break;
        }

        let Some(step) = npv_val.checked_div(dnpv) else {
            break;
        };
        rate -= step;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    irr_bisection(cash_flows)
}

/// Bisection on [IRR_LOWER_BOUND, IRR_UPPER_BOUND]; requires a sign change between the bounds.
fn irr_bisection(cash_flows: &[Money]) -> FeasibilityResult<Rate> {
    let value_at = |r: Rate| npv_and_derivative(r, cash_flows).map(|(v, _)| v);

    let mut lo = IRR_LOWER_BOUND;
    let mut hi = IRR_UPPER_BOUND;
    let (Some(mut f_lo), Some(f_hi)) = (value_at(lo), value_at(hi)) else {
        return Err(FeasibilityError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 0,
            last_delta: Decimal::MAX,
        });
    };
    if f_lo.is_sign_positive() == f_hi.is_sign_positive() {
        return Err(FeasibilityError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 0,
            last_delta: f_lo,
        });
    }

    let mut f_mid = f_lo;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        f_mid = value_at(mid).unwrap_or(Decimal::MAX);
        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo).abs() < CONVERGENCE_THRESHOLD {
            return Ok(mid);
        }
        if f_mid.is_sign_positive() == f_lo.is_sign_positive() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(FeasibilityError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: f_mid,
    })
}

/// Payment (PMT), sign convention as in spreadsheet PMT.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> FeasibilityResult<Money> {
    if nper == 0 {
        return Err(FeasibilityError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let overflow = || FeasibilityError::InvalidInput {
        field: "nper".into(),
        reason: format!("Compound factor overflows over {nper} periods"),
    };
    let factor = one_plus_r.checked_powu(nper as u64).ok_or_else(overflow)?;
    let grown = present_value.checked_mul(factor).ok_or_else(overflow)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(FeasibilityError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(-(grown + future_value) / annuity_factor)
}
