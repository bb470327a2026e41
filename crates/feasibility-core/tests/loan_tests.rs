use feasibility_core::error::FeasibilityError;
use feasibility_core::loan::{
    build_loan_repayment_table, schedule_loan, LoanConfig, RepaymentMethod, RepaymentSources,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan(amount: Decimal, rate: Decimal, term_years: u32) -> LoanConfig {
    LoanConfig {
        loan_amount: amount,
        annual_interest_rate: rate,
        term_years,
        grace_period_years: 0,
        repayment_method: RepaymentMethod::EqualInstallment,
        guarantee_fee_rate: Decimal::ZERO,
    }
}

// ===========================================================================
// Equal instalment
// ===========================================================================

#[test]
fn test_principal_sums_to_loan_amount() {
    // 1000 at 6% over 10 years: 120 monthly payments of ~11.1021
    let schedule = schedule_loan(&loan(dec!(1000), dec!(0.06), 10), 10, &mut Vec::new()).unwrap();
    let payment = schedule.monthly_payment.unwrap();
    assert!((payment - dec!(11.1021)).abs() < dec!(0.001), "payment {payment}");
    assert!((schedule.total_principal - dec!(1000)).abs() <= dec!(0.01));
    assert_eq!(schedule.outstanding_at_horizon, Decimal::ZERO);
    assert_eq!(schedule.years.len(), 10);
}

#[test]
fn test_balances_chain_year_to_year() {
    let schedule = schedule_loan(&loan(dec!(1000), dec!(0.06), 10), 10, &mut Vec::new()).unwrap();
    for pair in schedule.years.windows(2) {
        assert_eq!(pair[0].ending_balance, pair[1].beginning_balance);
    }
    let first = &schedule.years[0];
    assert_eq!(first.beginning_balance, dec!(1000));
    assert!((first.beginning_balance - first.principal - first.ending_balance).abs() < dec!(0.0000001));
}

#[test]
fn test_interest_declines_over_the_term() {
    let schedule = schedule_loan(&loan(dec!(1000), dec!(0.06), 10), 10, &mut Vec::new()).unwrap();
    let interest = schedule.interest();
    assert!(interest.windows(2).all(|w| w[0] > w[1]));
    assert!(schedule.total_interest > dec!(330) && schedule.total_interest < dec!(333));
}

#[test]
fn test_horizon_shorter_than_term_leaves_balance() {
    let schedule = schedule_loan(&loan(dec!(1000), dec!(0.06), 10), 4, &mut Vec::new()).unwrap();
    assert_eq!(schedule.years.len(), 4);
    assert!(schedule.outstanding_at_horizon > dec!(600));
}

#[test]
fn test_horizon_longer_than_term_pads_zero_years() {
    let schedule = schedule_loan(&loan(dec!(300), dec!(0.05), 3), 5, &mut Vec::new()).unwrap();
    assert_eq!(schedule.years[3].principal, Decimal::ZERO);
    assert_eq!(schedule.years[4].interest, Decimal::ZERO);
    assert!((schedule.total_principal - dec!(300)).abs() <= dec!(0.01));
}

#[test]
fn test_zero_rate_repays_evenly() {
    let schedule = schedule_loan(&loan(dec!(1200), Decimal::ZERO, 2), 2, &mut Vec::new()).unwrap();
    assert_eq!(schedule.total_interest, Decimal::ZERO);
    assert!((schedule.years[0].principal - dec!(600)).abs() < dec!(0.0001));
}

// ===========================================================================
// Equal principal and grace period
// ===========================================================================

#[test]
fn test_equal_principal_method() {
    let config = LoanConfig {
        repayment_method: RepaymentMethod::EqualPrincipal,
        ..loan(dec!(1200), dec!(0.06), 5)
    };
    let schedule = schedule_loan(&config, 5, &mut Vec::new()).unwrap();
    assert!(schedule.monthly_payment.is_none());
    for year in &schedule.years {
        assert!((year.principal - dec!(240)).abs() < dec!(0.0001));
    }
}

#[test]
fn test_grace_period_is_interest_only() {
    let config = LoanConfig {
        grace_period_years: 2,
        ..loan(dec!(1000), dec!(0.12), 5)
    };
    let schedule = schedule_loan(&config, 5, &mut Vec::new()).unwrap();
    assert_eq!(schedule.years[0].principal, Decimal::ZERO);
    assert_eq!(schedule.years[1].principal, Decimal::ZERO);
    assert_eq!(schedule.years[0].interest, dec!(120));
    assert!((schedule.total_principal - dec!(1000)).abs() <= dec!(0.01));
}

#[test]
fn test_guarantee_fee_on_opening_balance() {
    let config = LoanConfig {
        guarantee_fee_rate: dec!(0.01),
        ..loan(dec!(1000), dec!(0.06), 5)
    };
    let schedule = schedule_loan(&config, 5, &mut Vec::new()).unwrap();
    assert_eq!(schedule.years[0].guarantee_fee, dec!(10));
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_zero_amount_is_no_loan() {
    let schedule = schedule_loan(&loan(Decimal::ZERO, dec!(0.06), 10), 3, &mut Vec::new()).unwrap();
    assert_eq!(schedule.years.len(), 3);
    assert_eq!(schedule.total_interest, Decimal::ZERO);
}

#[test]
fn test_zero_term_rejected() {
    let err = schedule_loan(&loan(dec!(100), dec!(0.06), 0), 3, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, FeasibilityError::InvalidInput { .. }));
}

#[test]
fn test_grace_covering_the_term_is_shortened() {
    let grace = LoanConfig {
        grace_period_years: 3,
        ..loan(dec!(120), Decimal::ZERO, 3)
    };
    let mut warnings = Vec::new();
    let schedule = schedule_loan(&grace, 3, &mut warnings).unwrap();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("Grace period"));
    // two interest-only years, everything repaid in the last one
    assert_eq!(schedule.years[0].principal, Decimal::ZERO);
    assert_eq!(schedule.years[1].principal, Decimal::ZERO);
    assert_eq!(schedule.years[2].principal, dec!(120));
    assert_eq!(schedule.outstanding_at_horizon, Decimal::ZERO);
}

#[test]
fn test_negative_rate_read_as_zero() {
    let mut warnings = Vec::new();
    let schedule = schedule_loan(&loan(dec!(120), dec!(-0.01), 1), 1, &mut warnings).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(schedule.total_interest, Decimal::ZERO);
    assert_eq!(schedule.years[0].principal, dec!(120));
}

#[test]
fn test_term_beyond_horizon_limit_is_capped() {
    let mut warnings = Vec::new();
    let schedule = schedule_loan(&loan(dec!(500), dec!(0.12), 1000), 5, &mut warnings).unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("capped at 100"));
    assert_eq!(schedule.years.len(), 5);
    assert!(schedule.outstanding_at_horizon > Decimal::ZERO);
    assert!(schedule.outstanding_at_horizon < dec!(500));
}

#[test]
fn test_overflowing_annuity_pays_interest_only() {
    // 200% a year over 100 years: the compound factor exceeds Decimal range
    let mut warnings = Vec::new();
    let schedule = schedule_loan(&loan(dec!(500), dec!(2), 100), 2, &mut warnings).unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("interest only"));
    assert_eq!(schedule.years[0].principal, Decimal::ZERO);
    assert!((schedule.years[0].interest - dec!(1000)).abs() < dec!(0.0000001));
    assert_eq!(schedule.outstanding_at_horizon, dec!(500));
}

// ===========================================================================
// 借款还本付息计划表
// ===========================================================================

#[test]
fn test_repayment_table_coverage_ratios() {
    let schedule = schedule_loan(&loan(dec!(1000), dec!(0.06), 10), 3, &mut Vec::new()).unwrap();
    let ebit = vec![dec!(300); 3];
    let ebitda = vec![dec!(400); 3];
    let tax = vec![dec!(50); 3];
    let dep = vec![dec!(100); 3];
    let net = vec![dec!(200); 3];
    let out = build_loan_repayment_table(
        &schedule,
        &RepaymentSources {
            depreciation_amortization: &dep,
            net_profit: &net,
            ebit: &ebit,
            ebitda: &ebitda,
            income_tax: &tax,
        },
    );

    let year1 = &schedule.years[0];
    assert_eq!(out.interest_coverage[0], dec!(300) / year1.interest);
    assert_eq!(
        out.debt_service_coverage[0],
        dec!(350) / (year1.interest + year1.principal)
    );
    assert!(out.table.row("1.1").unwrap().total.is_none());
    assert_eq!(out.table.value("1.2.1", 0), year1.principal);
    assert!(out.table.verify_totals().is_empty());
}
