use feasibility_core::cash_flow::{
    build_cash_flow, BenchmarkRates, CashFlowConfig, CashFlowOutput, CashFlowSources,
    InvestmentBreakdown,
};
use feasibility_core::indicators::{investment_returns, payback_period};
use feasibility_core::time_value::{irr, npv};
use feasibility_core::types::{ProjectContext, TaxConfig};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn cash_flow(revenue: Decimal, rates: &BenchmarkRates) -> CashFlowOutput {
    let ctx = ProjectContext {
        construction_years: 1,
        operation_years: 4,
        total_investment: dec!(1000),
    };
    let config = CashFlowConfig {
        investment: InvestmentBreakdown {
            building_installation: dec!(1000),
            ..Default::default()
        },
        ..Default::default()
    };
    let net_revenue = vec![revenue; 4];
    let operating_cost = vec![dec!(200); 4];
    let zero = vec![Decimal::ZERO; 4];
    let ebit = vec![revenue - dec!(300); 4];
    build_cash_flow(
        &ctx,
        &config,
        &CashFlowSources {
            net_revenue: &net_revenue,
            operating_cost: &operating_cost,
            surcharges: &zero,
            ebit: &ebit,
            depreciation: &[],
            subsidy_income: Decimal::ZERO,
        },
        &TaxConfig::default(),
        rates,
        &mut Vec::new(),
    )
    .unwrap()
}

// ===========================================================================
// Payback
// ===========================================================================

#[test]
fn test_static_payback_interpolates() {
    let flows = [dec!(-1000), dec!(300), dec!(300), dec!(300), dec!(300)];
    let payback = payback_period(&flows).unwrap();
    assert!((payback - dec!(4.3333)).abs() < dec!(0.001), "payback {payback}");
}

#[test]
fn test_payback_never_reached() {
    assert_eq!(payback_period(&[dec!(-1000), dec!(100), dec!(100)]), None);
    assert_eq!(payback_period(&[]), None);
}

#[test]
fn test_payback_without_investment() {
    assert_eq!(payback_period(&[dec!(10), dec!(5)]), Some(Decimal::ZERO));
}

#[test]
fn test_payback_counts_leading_zero_years() {
    // cumulative: 0, -100, -50, 0
    let flows = [Decimal::ZERO, dec!(-100), dec!(50), dec!(50), dec!(50)];
    assert_eq!(payback_period(&flows), Some(dec!(4)));
}

#[test]
fn test_paybacks_when_investment_starts_late() {
    // equipment is paid in the last construction year, so year 1 is empty
    let ctx = ProjectContext {
        construction_years: 2,
        operation_years: 4,
        total_investment: dec!(1000),
    };
    let config = CashFlowConfig {
        investment: InvestmentBreakdown {
            equipment: dec!(1000),
            ..Default::default()
        },
        ..Default::default()
    };
    let rates = BenchmarkRates::default();
    let zero = vec![Decimal::ZERO; 4];
    let cf = build_cash_flow(
        &ctx,
        &config,
        &CashFlowSources {
            net_revenue: &[dec!(700); 4],
            operating_cost: &[dec!(200); 4],
            surcharges: &zero,
            ebit: &zero,
            depreciation: &[],
            subsidy_income: Decimal::ZERO,
        },
        &TaxConfig::default(),
        &rates,
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(cf.pre_tax[0], Decimal::ZERO);
    assert_eq!(cf.pre_tax_discounted[0], Decimal::ZERO);

    let mut warnings = Vec::new();
    let returns = investment_returns(&cf, &rates, &mut warnings).unwrap();
    // cumulative: 0, -1000, -500, 0
    assert_eq!(returns.pre_tax.static_payback, Some(dec!(4)));
    let dynamic = returns.pre_tax.dynamic_payback.unwrap();
    assert!(dynamic > dec!(4) && dynamic < dec!(6), "dynamic payback {dynamic}");
}

// ===========================================================================
// IRR and NPV
// ===========================================================================

#[test]
fn test_irr_of_four_year_annuity() {
    // 1000 recovered by four payments of 300: IRR ~7.71%
    let flows = [dec!(-1000), dec!(300), dec!(300), dec!(300), dec!(300)];
    let rate = irr(&flows, dec!(0.1)).unwrap();
    assert!((rate - dec!(0.0771)).abs() < dec!(0.0005), "irr {rate}");
    let at_irr = npv(rate, &flows).unwrap();
    assert!(at_irr.abs() < dec!(0.01));
}

#[test]
fn test_irr_requires_sign_change() {
    assert!(irr(&[dec!(100), dec!(50)], dec!(0.1)).is_err());
}

#[test]
fn test_returns_from_project_cash_flow() {
    let rates = BenchmarkRates::default();
    let cf = cash_flow(dec!(500), &rates);
    let mut warnings = Vec::new();
    let returns = investment_returns(&cf, &rates, &mut warnings).unwrap();

    assert!(warnings.is_empty(), "{warnings:?}");
    let pre = &returns.pre_tax;
    assert!((pre.irr.unwrap() - dec!(0.0771)).abs() < dec!(0.0005));
    // NPV equals the sum of the discounted row
    let discounted: Decimal = cf.pre_tax_discounted.iter().copied().sum();
    assert!((pre.npv - discounted).abs() < dec!(0.0001));
    assert!(pre.npv > Decimal::ZERO);
    assert!(pre.dynamic_payback.unwrap() > pre.static_payback.unwrap());

    // Post-tax flows are lower, so is the IRR
    assert!(returns.post_tax.irr.unwrap() < pre.irr.unwrap());
    assert_eq!(returns.post_tax.static_payback, Some(dec!(5)));
}

#[test]
fn test_unrecovered_project_warns() {
    let rates = BenchmarkRates::default();
    let cf = cash_flow(dec!(250), &rates);
    let mut warnings = Vec::new();
    let returns = investment_returns(&cf, &rates, &mut warnings).unwrap();
    assert!(returns.pre_tax.static_payback.is_none());
    assert!(returns.pre_tax.npv < Decimal::ZERO);
    assert!(!warnings.is_empty());
}

#[test]
fn test_higher_benchmark_lowers_npv() {
    let low = BenchmarkRates::default();
    let high = BenchmarkRates {
        pre_tax: dec!(0.12),
        post_tax: dec!(0.12),
    };
    let npv_low = investment_returns(&cash_flow(dec!(500), &low), &low, &mut Vec::new())
        .unwrap()
        .pre_tax
        .npv;
    let npv_high = investment_returns(&cash_flow(dec!(500), &high), &high, &mut Vec::new())
        .unwrap()
        .pre_tax
        .npv;
    assert!(npv_high < npv_low);
}
